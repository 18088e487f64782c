//! Замедление актора при натянутом луке и касте заклинаний
//!
//! Пока актор целится из лука/арбалета или держит каст, его speed_mult
//! умножается на skill-тировый множитель (новичка замедляет сильнее).
//! Одновременный каст обеими руками промоутится в dual-cast со своим
//! набором множителей.
//!
//! Оригинальная скорость снапшотится при ПЕРВОМ замедлении и
//! восстанавливается дословно, когда снимается ПОСЛЕДНЕЕ — источники
//! замедления не перемножаются.

use bevy::prelude::*;

use crate::components::{ActorAttributes, Hands, SkillSet, WeaponClass};
use crate::config::{CombatConfig, SlowdownSettings};
use crate::events::{AnimEvent, AnimTag, CastHand};
use crate::logger;

/// Вид источника замедления
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlowKind {
    Bow,
    Crossbow,
    Cast,
    DualCast,
}

/// Активные источники замедления + снапшот скорости
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct DrawSlowdown {
    pub original_speed_mult: f32,
    pub bow_active: bool,
    pub cast_left_active: bool,
    pub cast_right_active: bool,
}

impl DrawSlowdown {
    pub fn any_active(&self) -> bool {
        self.bow_active || self.cast_left_active || self.cast_right_active
    }

    pub fn is_dual_cast(&self) -> bool {
        self.cast_left_active && self.cast_right_active
    }
}

/// Skill-тир: ≤25 / ≤50 / ≤75 / >75
fn skill_tier(skill_level: f32) -> usize {
    if skill_level <= 25.0 {
        0
    } else if skill_level <= 50.0 {
        1
    } else if skill_level <= 75.0 {
        2
    } else {
        3
    }
}

/// Множитель скорости для вида замедления и уровня скилла
pub fn speed_multiplier(settings: &SlowdownSettings, kind: SlowKind, skill_level: f32) -> f32 {
    let tier = skill_tier(skill_level);
    match kind {
        SlowKind::Bow => settings.bow_multipliers[tier],
        SlowKind::Crossbow => settings.crossbow_multipliers[tier],
        SlowKind::Cast => settings.cast_multipliers[tier],
        SlowKind::DualCast => settings.dual_cast_multipliers[tier],
    }
}

fn kind_enabled(settings: &SlowdownSettings, kind: SlowKind) -> bool {
    match kind {
        SlowKind::Bow => settings.enable_bow,
        SlowKind::Crossbow => settings.enable_crossbow,
        SlowKind::Cast => settings.enable_cast,
        SlowKind::DualCast => settings.enable_dual_cast,
    }
}

/// Пересчитывает и применяет текущий множитель от снапшота (не от текущего
/// значения — повторное применение не компаундится)
fn refresh_speed(
    slowdown: &DrawSlowdown,
    attributes: &mut ActorAttributes,
    skills: &SkillSet,
    settings: &SlowdownSettings,
) {
    if !slowdown.any_active() {
        return;
    }

    // Dual cast перекрывает одиночный каст; лук сочетается выбором меньшего
    let mut multiplier = f32::MAX;
    if slowdown.bow_active {
        multiplier = multiplier.min(speed_multiplier(settings, SlowKind::Bow, skills.archery));
    }
    if slowdown.is_dual_cast() {
        multiplier = multiplier.min(speed_multiplier(
            settings,
            SlowKind::DualCast,
            skills.destruction,
        ));
    } else if slowdown.cast_left_active || slowdown.cast_right_active {
        multiplier = multiplier.min(speed_multiplier(settings, SlowKind::Cast, skills.destruction));
    }

    attributes.speed_mult = slowdown.original_speed_mult * multiplier;
    logger::log(&format!(
        "Slowdown: speed_mult {:.1} (original {:.1} × {:.2})",
        attributes.speed_mult, slowdown.original_speed_mult, multiplier
    ));
}

/// Система: включение/выключение источников замедления по анимационным тегам
pub fn handle_slowdown_events(
    mut events: EventReader<AnimEvent>,
    mut commands: Commands,
    config: Res<CombatConfig>,
    mut query: Query<(
        &mut ActorAttributes,
        &SkillSet,
        &Hands,
        Option<&mut DrawSlowdown>,
    )>,
) {
    let settings = &config.slowdown;

    for event in events.read() {
        if !settings.enabled {
            continue;
        }

        let Ok((mut attributes, skills, hands, slowdown)) = query.get_mut(event.actor) else {
            continue;
        };

        match event.tag {
            AnimTag::BowDrawn => {
                let kind = match hands.ranged_class() {
                    Some(WeaponClass::Crossbow) => SlowKind::Crossbow,
                    Some(_) => SlowKind::Bow,
                    None => continue,
                };
                if !kind_enabled(settings, kind) {
                    continue;
                }

                let mut state = match slowdown {
                    Some(state) => *state,
                    None => DrawSlowdown {
                        original_speed_mult: attributes.speed_mult,
                        ..Default::default()
                    },
                };
                if !state.any_active() {
                    // Первый источник — снапшот скорости до любых модификаций
                    state.original_speed_mult = attributes.speed_mult;
                }
                state.bow_active = true;
                refresh_speed(&state, &mut attributes, skills, settings);
                commands.entity(event.actor).insert(state);
            }

            AnimTag::BowRelease | AnimTag::AttackStop => {
                let Some(mut state) = slowdown else { continue };
                if !state.bow_active {
                    continue;
                }
                state.bow_active = false;
                finish_or_refresh(&mut commands, event.actor, &state, &mut attributes, skills, settings);
            }

            AnimTag::CastBegin(hand) => {
                if !kind_enabled(settings, SlowKind::Cast) {
                    continue;
                }
                let mut state = match slowdown {
                    Some(state) => *state,
                    None => DrawSlowdown {
                        original_speed_mult: attributes.speed_mult,
                        ..Default::default()
                    },
                };
                if !state.any_active() {
                    state.original_speed_mult = attributes.speed_mult;
                }
                match hand {
                    CastHand::Left => state.cast_left_active = true,
                    CastHand::Right => state.cast_right_active = true,
                }
                if state.is_dual_cast() {
                    logger::log("Dual casting detected");
                }
                refresh_speed(&state, &mut attributes, skills, settings);
                commands.entity(event.actor).insert(state);
            }

            AnimTag::CastEnd(hand) => {
                let Some(mut state) = slowdown else { continue };
                match hand {
                    CastHand::Left => state.cast_left_active = false,
                    CastHand::Right => state.cast_right_active = false,
                }
                finish_or_refresh(&mut commands, event.actor, &state, &mut attributes, skills, settings);
            }

            _ => {}
        }
    }
}

/// Последний источник снят → восстановить скорость и убрать компонент;
/// иначе пересчитать множитель по оставшимся источникам.
fn finish_or_refresh(
    commands: &mut Commands,
    actor: Entity,
    state: &DrawSlowdown,
    attributes: &mut ActorAttributes,
    skills: &SkillSet,
    settings: &SlowdownSettings,
) {
    if state.any_active() {
        refresh_speed(state, attributes, skills, settings);
        commands.entity(actor).insert(*state);
    } else {
        attributes.speed_mult = state.original_speed_mult;
        commands.entity(actor).remove::<DrawSlowdown>();
        logger::log(&format!(
            "Restored original speed: {:.1}",
            state.original_speed_mult
        ));
    }
}

/// Снимает все замедления актора, восстанавливая скорость (выход из боя)
pub fn clear_slowdown(
    commands: &mut Commands,
    actor: Entity,
    state: &DrawSlowdown,
    attributes: &mut ActorAttributes,
) {
    attributes.speed_mult = state.original_speed_mult;
    commands.entity(actor).remove::<DrawSlowdown>();
    logger::log("Cleared all slowdowns, restored speed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_tiers() {
        assert_eq!(skill_tier(0.0), 0);
        assert_eq!(skill_tier(25.0), 0);
        assert_eq!(skill_tier(26.0), 1);
        assert_eq!(skill_tier(50.0), 1);
        assert_eq!(skill_tier(75.0), 2);
        assert_eq!(skill_tier(100.0), 3);
    }

    #[test]
    fn test_higher_skill_slows_less() {
        let settings = SlowdownSettings::default();
        let novice = speed_multiplier(&settings, SlowKind::Bow, 10.0);
        let master = speed_multiplier(&settings, SlowKind::Bow, 90.0);
        assert!(novice < master);
    }

    #[test]
    fn test_dual_cast_slower_than_single() {
        let settings = SlowdownSettings::default();
        for skill in [10.0, 40.0, 60.0, 90.0] {
            assert!(
                speed_multiplier(&settings, SlowKind::DualCast, skill)
                    < speed_multiplier(&settings, SlowKind::Cast, skill)
            );
        }
    }

    #[test]
    fn test_dual_cast_promotion() {
        let mut state = DrawSlowdown::default();
        state.cast_left_active = true;
        assert!(!state.is_dual_cast());
        state.cast_right_active = true;
        assert!(state.is_dual_cast());

        state.cast_left_active = false;
        assert!(!state.is_dual_cast());
        assert!(state.any_active());
    }

    #[test]
    fn test_refresh_does_not_compound() {
        let settings = SlowdownSettings::default();
        let skills = SkillSet::default();
        let mut attributes = ActorAttributes::default();
        let state = DrawSlowdown {
            original_speed_mult: 100.0,
            bow_active: true,
            ..Default::default()
        };

        refresh_speed(&state, &mut attributes, &skills, &settings);
        let first = attributes.speed_mult;
        refresh_speed(&state, &mut attributes, &skills, &settings);

        // Повторное применение считает от снапшота, не от текущего значения
        assert_eq!(attributes.speed_mult, first);
        assert_eq!(first, 50.0); // novice bow multiplier 0.5
    }
}
