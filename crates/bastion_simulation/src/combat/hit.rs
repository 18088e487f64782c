//! Конвейер обработки ударов: классификация блока, урон, потеря stamina
//!
//! Один синхронный проход на каждое HitLanded:
//! 1. фильтр источника (спеллы игнорируются);
//! 2. классификация блока — CheckBlockType пересчитывает окно от press_time
//!    прямо здесь, не доверяя флагу последнего тика;
//! 3. урон в Health (timed block возвращает долю через heal-back — полный
//!    урон применяется и тут же компенсируется, что безопасно компонуется
//!    с любыми другими модификаторами урона);
//! 4. stamina: timed → gain-или-loss политика, иначе gradual drain.
//!
//! Исход (Succeeded/Failed) уходит parry-движку событиями в том же тике.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat::parry::{heading_angle_deg, ParrySequence, TimedBlockFailed, TimedBlockSucceeded};
use crate::combat::stamina::GradualDrain;
use crate::combat::timed_block::{check_block_type, BlockType, TimedBlockState};
use crate::components::{Health, LocalPlayer, SkillSet, Stamina};
use crate::config::{CombatConfig, HitStaminaSettings};
use crate::events::{DamageDealt, HitLanded, HitSource};
use crate::logger;

/// Удары сзади не засчитываются как timed block (фронтальная дуга ±120°)
const FRONT_ARC_DEG: f32 = 120.0;

/// Длительность распределения потери stamina от удара
const GRADUAL_DRAIN_DURATION: f32 = 3.0;

/// Базовая потеря stamina при ударе.
///
/// `max(0, intercept − scaling × max_stamina) + flat`, затем armor skill
/// напрямую оффсетит потерю: × (100 − skill)/100, ноль при skill 100.
pub fn on_hit_stamina_loss(settings: &HitStaminaSettings, max_stamina: f32, armor_skill: f32) -> f32 {
    let base = (settings.loss_base_intercept - settings.loss_scaling_factor * max_stamina).max(0.0)
        + settings.loss_flat_addition;
    let skill_mult = (100.0 - armor_skill).clamp(0.0, 100.0) / 100.0;
    base * skill_mult
}

/// Система: обработка ударов по отслеживаемым акторам
pub fn process_hits(
    mut hits: EventReader<HitLanded>,
    mut commands: Commands,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    mut blocks: Query<&mut TimedBlockState>,
    sequences: Query<&ParrySequence>,
    mut victims: Query<(&mut Health, &mut Stamina, &SkillSet), With<LocalPlayer>>,
    transforms: Query<&Transform>,
    mut drains: Query<&mut GradualDrain>,
    mut succeeded_writer: EventWriter<TimedBlockSucceeded>,
    mut failed_writer: EventWriter<TimedBlockFailed>,
    mut damage_writer: EventWriter<DamageDealt>,
) {
    let now = time.elapsed_secs();

    // Коалесценция drain-вставок внутри одного тика: второй удар добавляется
    // к ожидающей записи, а не перетирает её через отложенные Commands
    let mut pending_drains: HashMap<Entity, GradualDrain> = HashMap::default();

    for hit in hits.read() {
        // Спеллы боевой конвейер не трогает
        if hit.source == HitSource::Spell {
            logger::log("Ignoring non-weapon hit (likely spell)");
            continue;
        }

        // Пока что конвейер ударов обслуживает локального игрока
        let Ok((mut health, mut stamina, skills)) = victims.get_mut(hit.victim) else {
            continue;
        };

        // --- Классификация блока ---
        let block_type = if !hit.was_blocked {
            BlockType::None
        } else {
            classify_block(
                &config,
                &blocks,
                &sequences,
                &transforms,
                hit.victim,
                hit.aggressor,
                now,
            )
        };

        let timed = block_type == BlockType::Timed && hit.was_blocked;

        if timed {
            // Окно тратится немедленно: одно удержание — один timed block
            if let Ok(mut state) = blocks.get_mut(hit.victim) {
                state.window_consumed = true;
                state.window_active = false;
            }
            succeeded_writer.write(TimedBlockSucceeded {
                blocker: hit.victim,
                aggressor: hit.aggressor,
            });
        } else {
            failed_writer.write(TimedBlockFailed { blocker: hit.victim });
        }

        // --- Урон ---
        let damage = hit.raw_damage.max(0.0);
        health.take_damage(damage);

        let healed_back = if timed {
            let heal = damage * config.timed_block.damage_reduction;
            health.heal(heal);
            heal
        } else {
            0.0
        };

        damage_writer.write(DamageDealt {
            attacker: hit.aggressor,
            target: hit.victim,
            damage: damage - healed_back,
            block: block_type,
            healed_back,
        });

        // --- Stamina ---
        if !config.stamina.enable_stamina_management {
            continue;
        }

        if timed {
            apply_timed_block_stamina(&config, &mut stamina, skills);
            continue;
        }

        if !config.hit.enable_stamina_loss_on_hit {
            continue;
        }

        let mut loss = on_hit_stamina_loss(&config.hit, stamina.max, skills.effective_armor());
        if hit.was_blocked {
            if !config.hit.enable_regular_block_loss {
                continue;
            }
            loss *= config.hit.regular_block_mult;
        }

        if loss <= 0.0 {
            continue;
        }

        // Потеря распределяется во времени, а не снимается мгновенно
        if let Ok(mut drain) = drains.get_mut(hit.victim) {
            drain.add(loss);
            logger::log(&format!(
                "Added {:.2} to existing drain (total: {:.2})",
                loss, drain.total_amount
            ));
        } else if let Some(pending) = pending_drains.get_mut(&hit.victim) {
            pending.add(loss);
        } else {
            pending_drains.insert(hit.victim, GradualDrain::new(loss, GRADUAL_DRAIN_DURATION, now));
            logger::log(&format!(
                "Started gradual stamina drain: {:.2} over {:.1}s",
                loss, GRADUAL_DRAIN_DURATION
            ));
        }
    }

    for (entity, drain) in pending_drains {
        commands.entity(entity).insert(drain);
    }
}

/// CheckBlockType: синхронная классификация в момент удара
fn classify_block(
    config: &CombatConfig,
    blocks: &Query<&mut TimedBlockState>,
    sequences: &Query<&ParrySequence>,
    transforms: &Query<&Transform>,
    victim: Entity,
    aggressor: Option<Entity>,
    now: f32,
) -> BlockType {
    if !config.timed_block.enabled {
        return BlockType::Regular;
    }

    // Нет отслеживаемого состояния — блокирует не через нашу систему
    let Ok(state) = blocks.get(victim) else {
        return BlockType::None;
    };

    // Удар из-за спины не может быть timed block
    if let Some(aggressor) = aggressor {
        if let (Ok(victim_tf), Ok(aggressor_tf)) = (transforms.get(victim), transforms.get(aggressor))
        {
            let angle = heading_angle_deg(victim_tf, aggressor_tf.translation).abs();
            if angle > FRONT_ARC_DEG {
                logger::log(&format!(
                    "Timed block rejected — hit from behind ({:.1} degrees)",
                    angle
                ));
                return BlockType::Regular;
            }
        }
    }

    let next_tier = sequences
        .get(victim)
        .copied()
        .unwrap_or_default()
        .next_tier(&config.parry);
    let window = config.timed_block.window_for_tier(next_tier);

    check_block_type(state, now, config.timed_block.animation_delay, window)
}

/// Взаимоисключающая политика stamina на timed block: loss выигрывает у gain
fn apply_timed_block_stamina(config: &CombatConfig, stamina: &mut Stamina, skills: &SkillSet) {
    if config.timed_block.stamina_loss {
        let base = on_hit_stamina_loss(&config.hit, stamina.max, skills.effective_armor());
        let loss = base * config.hit.regular_block_mult * config.timed_block.stamina_loss_mult;
        stamina.deplete(loss);
        logger::log(&format!("Timed block stamina loss: {:.2}", loss));
    } else if config.timed_block.stamina_gain {
        stamina.restore(config.timed_block.stamina_gain_amount);
        logger::log(&format!(
            "Timed block stamina gain: {:.2}",
            config.timed_block.stamina_gain_amount
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_formula_reference_values() {
        let settings = HitStaminaSettings::default();

        // max stamina 100: max(0, 14.5 − 1.8) + 1.0 = 13.7
        let loss = on_hit_stamina_loss(&settings, 100.0, 0.0);
        assert!((loss - 13.7).abs() < 1e-4);

        // Блокированный удар теряет половину (regular_block_mult 0.5)
        assert!((loss * settings.regular_block_mult - 6.85).abs() < 1e-4);
    }

    #[test]
    fn test_high_max_stamina_loses_less() {
        let settings = HitStaminaSettings::default();
        let small = on_hit_stamina_loss(&settings, 100.0, 0.0);
        let large = on_hit_stamina_loss(&settings, 400.0, 0.0);
        assert!(large < small);
    }

    #[test]
    fn test_intercept_floor_at_zero() {
        let settings = HitStaminaSettings::default();
        // 14.5 − 0.018 × 2000 < 0 → остаётся только flat addition
        let loss = on_hit_stamina_loss(&settings, 2000.0, 0.0);
        assert!((loss - settings.loss_flat_addition).abs() < 1e-4);
    }

    #[test]
    fn test_armor_skill_offsets_loss() {
        let settings = HitStaminaSettings::default();
        let untrained = on_hit_stamina_loss(&settings, 100.0, 0.0);
        let trained = on_hit_stamina_loss(&settings, 100.0, 50.0);
        let master = on_hit_stamina_loss(&settings, 100.0, 100.0);

        assert!((trained - untrained * 0.5).abs() < 1e-4);
        assert_eq!(master, 0.0);
    }
}
