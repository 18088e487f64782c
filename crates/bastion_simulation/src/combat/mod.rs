//! Боевой модуль: timed block, parry-серия, stamina-экономика, exhaustion
//!
//! ECS ответственность:
//! - Game state: TimedBlockState, ParrySequence, drains, Exhaustion
//! - Combat rules: окна парирования, эскалация наград, формулы stamina
//! - Events: исходы блоков, запросы эффектов хосту
//!
//! Хост (bridge) ответственность:
//! - Input polling и маппинг кнопок → BlockButtonInput
//! - Hit detection → HitLanded, анимационные теги → AnimEvent
//! - Проигрывание звука/спарков/stagger по запросам ядра

use bevy::prelude::*;

pub mod exhaustion;
pub mod hit;
pub mod parry;
pub mod stamina;
pub mod timed_block;

// Re-export основных типов
pub use exhaustion::{update_exhaustion, Exhaustion};
pub use hit::{on_hit_stamina_loss, process_hits};
pub use parry::{ParrySequence, TimedBlockFailed, TimedBlockSucceeded};
pub use stamina::{
    attack_stamina_cost, regenerate_stamina, BlockHoldState, GradualDrain, RangedDrawState,
};
pub use timed_block::{check_block_type, BlockType, TimedBlockState};

use crate::events::{
    AnimEvent, BlockButtonInput, BlockEffectRequest, CombatStateChanged, CounterTrigger,
    DamageDealt, ForceAnimRequest, HitLanded, SessionResetEvent, StaggerRequest, TimeScaleRequest,
};
use crate::effects::{slow_motion, CounterBridge, SlowMotionState};
use crate::session;
use crate::slowdown;

/// Combat Plugin
///
/// Регистрирует боевые системы в FixedUpdate (60Hz), строго последовательно.
///
/// Порядок выполнения:
/// 1. Приём событий: кнопка блока, анимационные теги, выход из боя
/// 2. Обработка ударов (классификация блока + урон + stamina)
/// 3. Исходы parry-серии (награды, stagger, эффекты)
/// 4. Тиковые апдейты: ranged hold → exhaustion → активация окон →
///    block hold → gradual drains → таймаут серии → сброс slow motion
/// 5. Регенерация stamina и teardown сессии
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация входящих событий
        app.add_event::<BlockButtonInput>()
            .add_event::<HitLanded>()
            .add_event::<AnimEvent>()
            .add_event::<CombatStateChanged>()
            .add_event::<SessionResetEvent>();

        // Внутренние события исходов блока
        app.add_event::<TimedBlockSucceeded>()
            .add_event::<TimedBlockFailed>();

        // Исходящие запросы хосту
        app.add_event::<StaggerRequest>()
            .add_event::<BlockEffectRequest>()
            .add_event::<TimeScaleRequest>()
            .add_event::<CounterTrigger>()
            .add_event::<ForceAnimRequest>()
            .add_event::<DamageDealt>();

        app.init_resource::<SlowMotionState>()
            .init_resource::<CounterBridge>();

        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: входящие события движка
                timed_block::handle_block_button,
                stamina::handle_block_hold_input,
                stamina::handle_anim_events,
                slowdown::handle_slowdown_events,
                session::handle_combat_state,

                // Фаза 2: удары этого тика (окно пересчитывается синхронно)
                hit::process_hits,

                // Фаза 3: награды и bookkeeping parry-серии
                parry::process_timed_block_outcomes,

                // Фаза 4: тиковые апдейты таймеров
                stamina::update_ranged_hold,
                exhaustion::update_exhaustion,
                timed_block::activate_windows,
                stamina::update_block_hold,
                stamina::update_gradual_drains,
                parry::update_sequence_timeouts,
                slow_motion::update_slow_motion,

                // Фаза 5: регенерация и teardown
                stamina::regenerate_stamina,
                session::handle_session_reset,
            )
                .chain(), // Последовательное выполнение: состояние тика
                          // консистентно для каждой следующей подсистемы
        );
    }
}
