//! Parry-серия: эскалация наград, guard break, динамический timeout
//!
//! Счётчик серии живёт отдельно от состояния кнопки: удержание кнопки —
//! жизнь одного окна, серия — жизнь нескольких ударов. Timed block state
//! machine спрашивает у серии «какой уровень следующий», но уровневую
//! логику не владеет.
//!
//! Порядок эффектов успешного timed block:
//! slow motion → counter-триггер → спарк/звук → stagger нападающего.
//! Bookkeeping серии (advance/reset + last_parry_time) происходит всегда;
//! без ссылки на нападающего удерживается только stagger-награда.

use bevy::prelude::*;

use crate::components::{BlockEquipmentClass, Hands};
use crate::config::{CombatConfig, ParrySettings};
use crate::effects::counter::CounterBridge;
use crate::effects::slow_motion::{self, SlowMotionState};
use crate::events::{BlockEffectRequest, CounterTrigger, StaggerRequest, TimeScaleRequest};
use crate::logger;

/// Состояние parry-серии актора
///
/// Инвариант: consecutive_count ∈ [0, 4]; пятый успех (perfect) сбрасывает
/// счётчик в 0, никогда не доводит до 5.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ParrySequence {
    pub consecutive_count: u8,
    /// Момент последнего успешного parry (для таймаута серии)
    pub last_parry_time: f32,
    pub perfect_active: bool,
}

impl ParrySequence {
    /// Уровень следующего parry: count + 1, кламп в 1..=5.
    ///
    /// Флаг perfect parry авторитетен: выключен → уровень не превышает 4.
    pub fn next_tier(&self, parry: &ParrySettings) -> u8 {
        let cap = if parry.enable_perfect_parry { 5 } else { 4 };
        (self.consecutive_count + 1).min(cap)
    }

    /// Bookkeeping после успешного timed block уровня tier.
    /// Perfect (5) → сброс; иначе продвижение с клампом под гейт perfect'а.
    pub fn advance(&mut self, tier: u8, now: f32, parry: &ParrySettings) {
        if tier >= 5 {
            self.consecutive_count = 0;
            self.perfect_active = false;
        } else {
            let cap = if parry.enable_perfect_parry { 4 } else { 3 };
            self.consecutive_count = (self.consecutive_count + 1).min(cap);
        }
        self.last_parry_time = now;
    }

    /// Любой обычный блок или незаблокированный удар рвёт серию.
    pub fn reset(&mut self) {
        self.consecutive_count = 0;
        self.perfect_active = false;
    }

    /// Таймаут серии динамический: base + count секунд.
    /// Длинная серия получает больший grace period, но он ограничен.
    pub fn timeout_expired(&self, now: f32, timeout_base: f32) -> bool {
        self.consecutive_count > 0
            && now - self.last_parry_time > timeout_base + self.consecutive_count as f32
    }
}

// ============================================================================
// Внутренние события исхода блока (hit-конвейер → parry-движок)
// ============================================================================

/// Успешный timed block (окно уже consumed конвейером ударов)
#[derive(Event, Debug, Clone, Copy)]
pub struct TimedBlockSucceeded {
    pub blocker: Entity,
    pub aggressor: Option<Entity>,
}

/// Обычный блок или незаблокированный удар — серия рвётся
#[derive(Event, Debug, Clone, Copy)]
pub struct TimedBlockFailed {
    pub blocker: Entity,
}

// ============================================================================
// Stagger-примитив
// ============================================================================

/// Угол курса цели относительно фронта актора, градусы в (-180, 180]
pub fn heading_angle_deg(from: &Transform, to: Vec3) -> f32 {
    let delta = to - from.translation;
    // Bevy forward = -Z
    let world_yaw = delta.x.atan2(-delta.z).to_degrees();
    let (facing_yaw, _, _) = from.rotation.to_euler(EulerRot::YXZ);
    let mut relative = world_yaw - facing_yaw.to_degrees();
    while relative > 180.0 {
        relative -= 360.0;
    }
    while relative <= -180.0 {
        relative += 360.0;
    }
    relative
}

/// Нормализация угла в параметр направления stagger-графа: [0, 1)
pub fn stagger_direction(relative_deg: f32) -> f32 {
    let wrapped = relative_deg.rem_euclid(360.0);
    wrapped / 360.0
}

// ============================================================================
// Системы
// ============================================================================

/// Система: обработка исходов timed block
///
/// Успех — награды по уровню + bookkeeping; провал — сброс серии.
pub fn process_timed_block_outcomes(
    mut succeeded: EventReader<TimedBlockSucceeded>,
    mut failed: EventReader<TimedBlockFailed>,
    mut commands: Commands,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    mut sequences: Query<&mut ParrySequence>,
    hands: Query<&Hands>,
    transforms: Query<&Transform>,
    mut slow_motion: ResMut<SlowMotionState>,
    counter: Res<CounterBridge>,
    mut stagger_writer: EventWriter<StaggerRequest>,
    mut effect_writer: EventWriter<BlockEffectRequest>,
    mut timescale_writer: EventWriter<TimeScaleRequest>,
    mut counter_writer: EventWriter<CounterTrigger>,
) {
    let now = time.elapsed_secs();

    for event in succeeded.read() {
        // Серия создаётся лениво при первом успехе
        let mut local = ParrySequence::default();
        let mut existing = sequences.get_mut(event.blocker).ok();
        let sequence: &mut ParrySequence = match existing.as_deref_mut() {
            Some(sequence) => sequence,
            None => &mut local,
        };

        let tier = sequence.next_tier(&config.parry);
        let perfect = tier == 5;
        sequence.perfect_active = perfect;

        logger::log_info(&format!(
            "TIMED BLOCK! parry {} (actor: {:?}{})",
            tier,
            event.blocker,
            if perfect { ", PERFECT" } else { "" }
        ));

        // 1. Slow motion (политика: только perfect или каждый parry)
        let slow_allowed = !config.timed_block.slow_time_only_on_perfect || perfect;
        if slow_allowed {
            slow_motion::apply_slow_time(
                &mut slow_motion,
                &mut timescale_writer,
                config.timed_block.slow_time_percentage,
                config.timed_block.slow_time_duration,
                now,
            );
        }

        // 2. Counter-триггер (no-op если мост недоступен или гейты не прошли)
        if counter.should_trigger(&config.counter, true, perfect) {
            counter_writer.write(CounterTrigger {
                actor: event.blocker,
                perfect,
            });
        }

        // 3. Спарк + звук, ключ (экипировка, уровень)
        let equipment = hands
            .get(event.blocker)
            .map(|hands| hands.block_equipment())
            .unwrap_or(BlockEquipmentClass::None);

        if equipment == BlockEquipmentClass::None {
            logger::log_warning(&format!(
                "Timed block succeeded but no valid blocking equipment found (actor: {:?})",
                event.blocker
            ));
        } else {
            effect_writer.write(BlockEffectRequest {
                actor: event.blocker,
                equipment,
                tier,
                spark: config.parry.enable_sparks,
                volume: config.parry.sound_volume,
            });
        }

        // 4. Stagger нападающего (эскалация 1-4, guard break на 5)
        if config.parry.enable_stagger {
            if let Some(aggressor) = event.aggressor {
                let direction = match (transforms.get(aggressor), transforms.get(event.blocker)) {
                    (Ok(aggressor_tf), Ok(blocker_tf)) => {
                        stagger_direction(heading_angle_deg(aggressor_tf, blocker_tf.translation))
                    }
                    // Без трансформов — stagger «от фронта»
                    _ => 0.0,
                };

                let magnitude = config.parry.stagger_magnitude_for_tier(tier);
                stagger_writer.write(StaggerRequest {
                    target: aggressor,
                    direction,
                    magnitude,
                });

                logger::log(&format!(
                    "Stagger (target: {:?}, magnitude: {:.1}, direction: {:.3})",
                    aggressor, magnitude, direction
                ));
            } else {
                logger::log("Timed block without aggressor — stagger withheld, sequence still advances");
            }
        }

        // 5. Bookkeeping серии — всегда, даже без нападающего
        sequence.advance(tier, now, &config.parry);
        if existing.is_none() {
            commands.entity(event.blocker).insert(local);
        }
    }

    for event in failed.read() {
        if let Ok(mut sequence) = sequences.get_mut(event.blocker) {
            if sequence.consecutive_count > 0 || sequence.perfect_active {
                sequence.reset();
                logger::log(&format!(
                    "Parry sequence broken (actor: {:?})",
                    event.blocker
                ));
            }
        }
    }
}

/// Система (тик): таймаут parry-серии
pub fn update_sequence_timeouts(
    mut query: Query<(Entity, &mut ParrySequence)>,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for (entity, mut sequence) in query.iter_mut() {
        if sequence.timeout_expired(now, config.parry.sequence_timeout_base) {
            logger::log(&format!(
                "Parry sequence timed out after {} parries (actor: {:?})",
                sequence.consecutive_count, entity
            ));
            sequence.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_parry() -> ParrySettings {
        ParrySettings::default()
    }

    #[test]
    fn test_count_stays_in_bounds() {
        let parry = default_parry();
        let mut sequence = ParrySequence::default();

        // 5 подряд: уровни 1,2,3,4,5 → после пятого сброс в 0
        for expected_tier in 1..=5u8 {
            let tier = sequence.next_tier(&parry);
            assert_eq!(tier, expected_tier);
            sequence.advance(tier, 0.0, &parry);
            assert!(sequence.consecutive_count <= 4);
        }
        assert_eq!(sequence.consecutive_count, 0);
    }

    #[test]
    fn test_reset_on_failure_from_any_count() {
        let parry = default_parry();
        for successes in 0..5 {
            let mut sequence = ParrySequence::default();
            for _ in 0..successes {
                let tier = sequence.next_tier(&parry);
                sequence.advance(tier, 0.0, &parry);
            }
            sequence.reset();
            assert_eq!(sequence.consecutive_count, 0);
            assert!(!sequence.perfect_active);
        }
    }

    #[test]
    fn test_perfect_parry_gate_caps_tier_at_4() {
        let mut parry = default_parry();
        parry.enable_perfect_parry = false;

        let mut sequence = ParrySequence::default();
        for _ in 0..10 {
            let tier = sequence.next_tier(&parry);
            assert!(tier <= 4, "tier 5 must be unreachable with the gate off");
            sequence.advance(tier, 0.0, &parry);
        }
        assert_eq!(sequence.consecutive_count, 3);
        assert_eq!(sequence.next_tier(&parry), 4);
    }

    #[test]
    fn test_dynamic_timeout() {
        let mut sequence = ParrySequence {
            consecutive_count: 2,
            last_parry_time: 10.0,
            perfect_active: false,
        };

        // Таймаут = base 2.0 + count 2 = 4 секунды
        assert!(!sequence.timeout_expired(13.9, 2.0));
        assert!(sequence.timeout_expired(14.1, 2.0));

        // Пустая серия не таймаутится
        sequence.consecutive_count = 0;
        assert!(!sequence.timeout_expired(100.0, 2.0));
    }

    #[test]
    fn test_stagger_direction_normalized() {
        assert_eq!(stagger_direction(0.0), 0.0);
        assert!((stagger_direction(90.0) - 0.25).abs() < 1e-6);
        assert!((stagger_direction(-90.0) - 0.75).abs() < 1e-6);
        assert!((stagger_direction(180.0) - 0.5).abs() < 1e-6);

        for deg in [-720.0, -359.0, 0.0, 45.0, 359.9, 1080.0] {
            let dir = stagger_direction(deg);
            assert!((0.0..1.0).contains(&dir), "direction {} out of [0,1)", dir);
        }
    }

    #[test]
    fn test_heading_angle_front_and_behind() {
        // Актор в origin смотрит в -Z (bevy forward)
        let actor = Transform::from_translation(Vec3::ZERO);

        // Цель прямо спереди
        let front = heading_angle_deg(&actor, Vec3::new(0.0, 0.0, -5.0));
        assert!(front.abs() < 1e-4);

        // Цель строго справа (+X) → +90°
        let right = heading_angle_deg(&actor, Vec3::new(5.0, 0.0, 0.0));
        assert!((right - 90.0).abs() < 1e-3);

        // Цель сзади → ±180°
        let behind = heading_angle_deg(&actor, Vec3::new(0.0, 0.0, 5.0));
        assert!((behind.abs() - 180.0).abs() < 1e-3);
    }
}
