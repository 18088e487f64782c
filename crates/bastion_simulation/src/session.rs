//! Жизненный цикл сессии: выход актора из боя и полный сброс (new/load game)
//!
//! Всё боевое состояние session-transient: ничего не персистится, при сбросе
//! каждый снапшот атрибутов восстанавливается ПЕРЕД удалением компонента.

use bevy::prelude::*;

use crate::combat::exhaustion::{remove_exhaustion, Exhaustion};
use crate::combat::parry::ParrySequence;
use crate::combat::stamina::{BlockHoldState, GradualDrain, RangedDrawState};
use crate::combat::timed_block::TimedBlockState;
use crate::components::ActorAttributes;
use crate::effects::slow_motion::{self, SlowMotionState};
use crate::events::{CombatStateChanged, SessionResetEvent, TimeScaleRequest};
use crate::logger;
use crate::slowdown::{clear_slowdown, DrawSlowdown};

/// Система: очистка трекинга актора при выходе из боя
///
/// Состояние с мутированными атрибутами (slowdown) восстанавливается;
/// таймеры и серии просто снимаются.
pub fn handle_combat_state(
    mut events: EventReader<CombatStateChanged>,
    mut commands: Commands,
    mut query: Query<(&mut ActorAttributes, Option<&DrawSlowdown>)>,
) {
    for event in events.read() {
        if event.in_combat {
            continue;
        }

        let Ok((mut attributes, slowdown)) = query.get_mut(event.actor) else {
            continue;
        };

        if let Some(state) = slowdown {
            clear_slowdown(&mut commands, event.actor, state, &mut attributes);
        }

        commands
            .entity(event.actor)
            .remove::<RangedDrawState>()
            .remove::<BlockHoldState>()
            .remove::<GradualDrain>()
            .remove::<TimedBlockState>()
            .remove::<ParrySequence>();

        logger::log(&format!(
            "Combat tracking cleared (actor left combat: {:?})",
            event.actor
        ));
    }
}

/// Система: полный сброс сессии (new game / load game)
pub fn handle_session_reset(
    mut events: EventReader<SessionResetEvent>,
    mut commands: Commands,
    mut slow_motion: ResMut<SlowMotionState>,
    mut timescale_writer: EventWriter<TimeScaleRequest>,
    mut actors: Query<(
        Entity,
        &mut ActorAttributes,
        Option<&Exhaustion>,
        Option<&DrawSlowdown>,
    )>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();

    for (entity, mut attributes, exhaustion, slowdown) in actors.iter_mut() {
        // Сначала восстановить снапшоты, потом снимать компоненты
        if let Some(snapshot) = exhaustion {
            remove_exhaustion(&mut attributes, snapshot);
        }
        if let Some(state) = slowdown {
            attributes.speed_mult = state.original_speed_mult;
        }

        commands
            .entity(entity)
            .remove::<Exhaustion>()
            .remove::<DrawSlowdown>()
            .remove::<RangedDrawState>()
            .remove::<BlockHoldState>()
            .remove::<GradualDrain>()
            .remove::<TimedBlockState>()
            .remove::<ParrySequence>();
    }

    slow_motion::force_reset(&mut slow_motion, &mut timescale_writer);
    logger::log_info("Cleared all actor combat states (session reset)");
}
