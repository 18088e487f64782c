//! Конфигурация боевой системы (все tunables в одном Resource)
//!
//! Загрузка: RON файл → serde. Отсутствующий или битый файл = warning + defaults.
//! Невалидные значения (отрицательные длительности, доли вне [0,1]) клампятся
//! после загрузки, загрузка никогда не отвергается целиком.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Настройки stamina-экономики (instant costs + hold drains)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaminaSettings {
    /// Master toggle всей stamina-экономики
    pub enable_stamina_management: bool,

    pub enable_jump_cost: bool,
    /// Стоимость прыжка (default: 10.0)
    pub jump_cost: f32,

    pub enable_block_hold_drain: bool,
    /// Drain за секунду удержания блока (default: 2.0)
    pub block_hold_cost_per_second: f32,

    pub enable_light_attack_stamina: bool,
    /// Лёгкая атака платит долю от стоимости power-атаки (default: 0.15)
    pub light_attack_cost_mult: f32,

    pub enable_ranged_cost: bool,
    pub enable_ranged_hold_drain: bool,
    /// Drain за секунду натянутого лука (default: 3.0)
    pub ranged_hold_cost_per_second: f32,
    pub enable_ranged_release_cost: bool,
    /// Фиксированная стоимость выстрела (default: 10.0)
    pub ranged_release_cost: f32,
    pub enable_rapid_combo_cost: bool,
    pub rapid_combo_cost: f32,
}

impl Default for StaminaSettings {
    fn default() -> Self {
        Self {
            enable_stamina_management: true,
            enable_jump_cost: true,
            jump_cost: 10.0,
            enable_block_hold_drain: true,
            block_hold_cost_per_second: 2.0,
            enable_light_attack_stamina: true,
            light_attack_cost_mult: 0.15,
            enable_ranged_cost: true,
            enable_ranged_hold_drain: true,
            ranged_hold_cost_per_second: 3.0,
            enable_ranged_release_cost: true,
            ranged_release_cost: 10.0,
            enable_rapid_combo_cost: false,
            rapid_combo_cost: 10.0,
        }
    }
}

/// Потеря stamina при получении удара
///
/// Формула: `max(0, intercept − scaling × max_stamina) + flat`, затем
/// × (100 − armor_skill)/100, затем × block-мультипликатор если удар заблокирован.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitStaminaSettings {
    pub enable_stamina_loss_on_hit: bool,
    pub loss_base_intercept: f32,
    pub loss_scaling_factor: f32,
    pub loss_flat_addition: f32,
    pub enable_regular_block_loss: bool,
    /// Мультипликатор потери при обычном блоке (default: 0.5)
    pub regular_block_mult: f32,
}

impl Default for HitStaminaSettings {
    fn default() -> Self {
        Self {
            enable_stamina_loss_on_hit: true,
            loss_base_intercept: 14.5,
            loss_scaling_factor: 0.018,
            loss_flat_addition: 1.0,
            enable_regular_block_loss: true,
            regular_block_mult: 0.5,
        }
    }
}

/// Exhaustion debuff (stamina ниже порога → штрафы к скорости/урону/резисту)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhaustionSettings {
    pub enabled: bool,
    /// Порог stamina (default: 20.0)
    pub stamina_threshold: f32,
    /// Доля снижения скорости движения (default: 0.20 = −20%)
    pub movement_speed_debuff: f32,
    /// Доля снижения урона атак (default: 0.25 = −25%)
    pub attack_damage_debuff: f32,
    /// Множитель получаемого урона; resist-штраф = (mult − 1) × 100 (default: 1.25)
    pub damage_received_mult: f32,
}

impl Default for ExhaustionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            stamina_threshold: 20.0,
            movement_speed_debuff: 0.20,
            attack_damage_debuff: 0.25,
            damage_received_mult: 1.25,
        }
    }
}

/// Timed blocking: прогрессивные окна + обмен stamina + slow time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedBlockSettings {
    pub enabled: bool,
    /// Окна для parry 1..5, сужаются с ростом серии
    /// (default: 0.3 / 0.25 / 0.2 / 0.15 / 0.1)
    pub windows: [f32; 5],
    /// Задержка синхронизации с анимацией поднятия блока (default: 0.05)
    pub animation_delay: f32,
    /// Взаимоисключающая политика: loss выигрывает если оба флага включены
    pub stamina_loss: bool,
    pub stamina_gain: bool,
    pub stamina_gain_amount: f32,
    /// Дополнительный мультипликатор потери на timed block (default: 0.5)
    pub stamina_loss_mult: f32,
    /// Доля возвращаемого урона, 1.0 = полная отмена (default: 1.0)
    pub damage_reduction: f32,
    pub slow_time_only_on_perfect: bool,
    pub slow_time_duration: f32,
    /// Целевая скорость времени, 0.4 = 40% (default: 0.4)
    pub slow_time_percentage: f32,
}

impl Default for TimedBlockSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            windows: [0.3, 0.25, 0.2, 0.15, 0.1],
            animation_delay: 0.05,
            stamina_loss: false,
            stamina_gain: true,
            stamina_gain_amount: 20.0,
            stamina_loss_mult: 0.5,
            damage_reduction: 1.0,
            slow_time_only_on_perfect: true,
            slow_time_duration: 0.5,
            slow_time_percentage: 0.4,
        }
    }
}

impl TimedBlockSettings {
    /// Окно для уровня parry (1..=5). Вне диапазона — fallback на окно 3.
    pub fn window_for_tier(&self, tier: u8) -> f32 {
        match tier {
            1..=5 => self.windows[(tier - 1) as usize],
            _ => self.windows[2],
        }
    }
}

/// Parry-серия: stagger по уровням + динамический timeout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParrySettings {
    pub enable_stagger: bool,
    /// Авторитетный гейт 5-го уровня: выключен → счётчик не превышает 3
    pub enable_perfect_parry: bool,
    /// База таймаута серии; полный таймаут = base + consecutive_count секунд
    pub sequence_timeout_base: f32,
    /// Stagger-магнитуды для parry 1..4 (default: 0.1 / 0.2 / 0.3 / 0.4)
    pub stagger_magnitudes: [f32; 4],
    /// Guard-break магнитуда для perfect parry (default: 10.0)
    pub perfect_stagger_magnitude: f32,
    pub enable_sparks: bool,
    pub sound_volume: f32,
}

impl Default for ParrySettings {
    fn default() -> Self {
        Self {
            enable_stagger: true,
            enable_perfect_parry: true,
            sequence_timeout_base: 2.0,
            stagger_magnitudes: [0.1, 0.2, 0.3, 0.4],
            perfect_stagger_magnitude: 10.0,
            enable_sparks: true,
            sound_volume: 1.0,
        }
    }
}

impl ParrySettings {
    /// Магнитуда stagger для уровня (1..=4 эскалация, 5 = guard break)
    pub fn stagger_magnitude_for_tier(&self, tier: u8) -> f32 {
        match tier {
            1..=4 => self.stagger_magnitudes[(tier - 1) as usize],
            5 => self.perfect_stagger_magnitude,
            _ => self.stagger_magnitudes[3],
        }
    }
}

/// Мост к стороннему counter-плагину (riposte hand-off)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSettings {
    pub enabled: bool,
    pub only_timed_blocks: bool,
    pub only_perfect_parry: bool,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            only_timed_blocks: true,
            only_perfect_parry: false,
        }
    }
}

/// Замедление актора при натянутом луке / касте
///
/// Мультипликаторы по 4 skill-тирам (≤25 / ≤50 / ≤75 / >75).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlowdownSettings {
    pub enabled: bool,
    pub enable_bow: bool,
    pub enable_crossbow: bool,
    pub enable_cast: bool,
    pub enable_dual_cast: bool,
    pub bow_multipliers: [f32; 4],
    pub crossbow_multipliers: [f32; 4],
    pub cast_multipliers: [f32; 4],
    pub dual_cast_multipliers: [f32; 4],
}

impl Default for SlowdownSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_bow: true,
            enable_crossbow: true,
            enable_cast: true,
            enable_dual_cast: true,
            bow_multipliers: [0.5, 0.6, 0.7, 0.8],
            crossbow_multipliers: [0.5, 0.6, 0.7, 0.8],
            cast_multipliers: [0.5, 0.6, 0.7, 0.8],
            dual_cast_multipliers: [0.4, 0.5, 0.6, 0.7],
        }
    }
}

/// Полная конфигурация боевой системы (Resource)
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    pub stamina: StaminaSettings,
    pub hit: HitStaminaSettings,
    pub exhaustion: ExhaustionSettings,
    pub timed_block: TimedBlockSettings,
    pub parry: ParrySettings,
    pub counter: CounterSettings,
    pub slowdown: SlowdownSettings,
    /// Применять ли трекинг к NPC (анимационные события, очистка при выходе из боя)
    pub apply_to_npcs: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            stamina: StaminaSettings::default(),
            hit: HitStaminaSettings::default(),
            exhaustion: ExhaustionSettings::default(),
            timed_block: TimedBlockSettings::default(),
            parry: ParrySettings::default(),
            counter: CounterSettings::default(),
            slowdown: SlowdownSettings::default(),
            apply_to_npcs: true,
        }
    }
}

impl CombatConfig {
    /// Загружает конфиг из RON файла. Отсутствие/ошибка парсинга → defaults + warning.
    pub fn load_from_path(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => match ron::from_str::<CombatConfig>(&text) {
                Ok(config) => {
                    crate::logger::log_info(&format!("Configuration loaded from {:?}", path));
                    config
                }
                Err(err) => {
                    crate::logger::log_warning(&format!(
                        "Failed to parse config {:?}: {} — using defaults",
                        path, err
                    ));
                    CombatConfig::default()
                }
            },
            Err(_) => {
                crate::logger::log_warning(&format!(
                    "Config file {:?} not found — using defaults",
                    path
                ));
                CombatConfig::default()
            }
        };
        config.sanitize();
        config
    }

    /// Клампит все значения в валидные диапазоны (политика: clamp, не reject)
    pub fn sanitize(&mut self) {
        let s = &mut self.stamina;
        s.jump_cost = s.jump_cost.max(0.0);
        s.block_hold_cost_per_second = s.block_hold_cost_per_second.max(0.0);
        s.light_attack_cost_mult = s.light_attack_cost_mult.clamp(0.0, 1.0);
        s.ranged_hold_cost_per_second = s.ranged_hold_cost_per_second.max(0.0);
        s.ranged_release_cost = s.ranged_release_cost.max(0.0);
        s.rapid_combo_cost = s.rapid_combo_cost.max(0.0);

        let h = &mut self.hit;
        h.loss_base_intercept = h.loss_base_intercept.max(0.0);
        h.loss_scaling_factor = h.loss_scaling_factor.max(0.0);
        h.loss_flat_addition = h.loss_flat_addition.max(0.0);
        h.regular_block_mult = h.regular_block_mult.clamp(0.0, 1.0);

        let e = &mut self.exhaustion;
        e.stamina_threshold = e.stamina_threshold.max(0.0);
        e.movement_speed_debuff = e.movement_speed_debuff.clamp(0.0, 1.0);
        e.attack_damage_debuff = e.attack_damage_debuff.clamp(0.0, 1.0);
        e.damage_received_mult = e.damage_received_mult.max(1.0);

        let t = &mut self.timed_block;
        for window in &mut t.windows {
            *window = window.max(0.0);
        }
        t.animation_delay = t.animation_delay.max(0.0);
        t.stamina_gain_amount = t.stamina_gain_amount.max(0.0);
        t.stamina_loss_mult = t.stamina_loss_mult.clamp(0.0, 1.0);
        t.damage_reduction = t.damage_reduction.clamp(0.0, 1.0);
        t.slow_time_duration = t.slow_time_duration.max(0.0);
        t.slow_time_percentage = t.slow_time_percentage.clamp(0.0, 1.0);

        let p = &mut self.parry;
        p.sequence_timeout_base = p.sequence_timeout_base.max(0.0);
        for magnitude in &mut p.stagger_magnitudes {
            *magnitude = magnitude.max(0.0);
        }
        p.perfect_stagger_magnitude = p.perfect_stagger_magnitude.max(0.0);
        p.sound_volume = p.sound_volume.clamp(0.0, 1.0);

        let d = &mut self.slowdown;
        for multipliers in [
            &mut d.bow_multipliers,
            &mut d.crossbow_multipliers,
            &mut d.cast_multipliers,
            &mut d.dual_cast_multipliers,
        ] {
            for mult in multipliers.iter_mut() {
                *mult = mult.clamp(0.0, 1.0);
            }
        }
    }
}
