//! Timed block state machine (прогрессивные окна парирования)
//!
//! Жизненный цикл на актора: Idle → кнопка зажата (animation delay) →
//! окно активно → окно consumed ИЛИ кнопка отпущена (state сброшен).
//!
//! Окно выбирается по СЛЕДУЮЩЕМУ уровню parry-серии (count + 1): чем длиннее
//! серия, тем короче окно. Activation-флаг, выставляемый тиком — только
//! bookkeeping/логирование; проверка попадания в окно ([`check_block_type`])
//! пересчитывает арифметику от press_time синхронно в момент удара, потому
//! что hit-событие может опередить тик.

use bevy::prelude::*;

use crate::combat::parry::ParrySequence;
use crate::config::CombatConfig;
use crate::events::BlockButtonInput;
use crate::logger;

/// Состояние зажатой кнопки блока
///
/// Добавляется при нажатии, безусловно снимается при отпускании.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct TimedBlockState {
    /// Момент нажатия кнопки (секунды fixed-часов)
    pub press_time: f32,
    /// Окно активировано тиком (информационный флаг, не источник истины)
    pub window_active: bool,
    /// Одно удержание кнопки даёт максимум один timed block
    pub window_consumed: bool,
}

impl TimedBlockState {
    pub fn new(press_time: f32) -> Self {
        Self {
            press_time,
            window_active: false,
            window_consumed: false,
        }
    }
}

/// Классификация блока в момент удара
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// Блок не отслеживается этой системой
    None,
    /// Обычный блок (слишком рано, слишком поздно, или окно уже потрачено)
    Regular,
    /// Попадание внутри окна → parry
    Timed,
}

/// Решающая лестница timed block'а. Чистая функция — вся точная арифметика
/// окон тестируется здесь, без ECS.
///
/// - окно потрачено → Regular
/// - animation delay ещё не прошёл → Regular (рано ≠ промах)
/// - время в окне ≤ длительности окна уровня → Timed, иначе Regular
pub fn check_block_type(
    state: &TimedBlockState,
    now: f32,
    animation_delay: f32,
    tier_window: f32,
) -> BlockType {
    if state.window_consumed {
        return BlockType::Regular;
    }

    let since_press = now - state.press_time;
    if since_press < animation_delay {
        return BlockType::Regular;
    }

    let time_in_window = since_press - animation_delay;
    if time_in_window <= tier_window {
        BlockType::Timed
    } else {
        BlockType::Regular
    }
}

/// Система: нажатие/отпускание кнопки блока
///
/// Нажатие (фича включена) → (пере)инициализация состояния с press_time = now.
/// Отпускание → безусловный сброс, где бы state ни находился в жизненном цикле.
pub fn handle_block_button(
    mut events: EventReader<BlockButtonInput>,
    mut commands: Commands,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    states: Query<(), With<TimedBlockState>>,
) {
    let now = time.elapsed_secs();

    for event in events.read() {
        if event.pressed {
            if !config.timed_block.enabled {
                continue;
            }

            commands
                .entity(event.actor)
                .insert(TimedBlockState::new(now));
            logger::log(&format!(
                "Block button pressed (actor: {:?}, animation delay: {:.3}s)",
                event.actor, config.timed_block.animation_delay
            ));
        } else if states.get(event.actor).is_ok() {
            commands.entity(event.actor).remove::<TimedBlockState>();
            logger::log(&format!(
                "Block button released — state cleared (actor: {:?})",
                event.actor
            ));
        }
    }
}

/// Система (тик): активация окон после animation delay
///
/// Выставляет window_active и логирует, какое окно будет использовано.
/// Сама проверка удара этому флагу не доверяет.
pub fn activate_windows(
    mut query: Query<(Entity, &mut TimedBlockState, Option<&ParrySequence>)>,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
) {
    if !config.timed_block.enabled {
        return;
    }

    let now = time.elapsed_secs();

    for (entity, mut state, sequence) in query.iter_mut() {
        if state.window_active || state.window_consumed {
            continue;
        }

        if now - state.press_time >= config.timed_block.animation_delay {
            state.window_active = true;

            let next_tier = sequence.copied().unwrap_or_default().next_tier(&config.parry);
            logger::log(&format!(
                "Timed block window active (actor: {:?}, parry {} window: {:.3}s)",
                entity,
                next_tier,
                config.timed_block.window_for_tier(next_tier)
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: f32 = 0.05;
    const WINDOW: f32 = 0.3;

    fn pressed_at(t: f32) -> TimedBlockState {
        TimedBlockState::new(t)
    }

    // Монотонность окна: Timed ⇔ delay ≤ t ≤ delay + window
    #[test]
    fn test_window_boundaries() {
        let state = pressed_at(0.0);

        // Внутри animation delay — рано, обычный блок
        assert_eq!(check_block_type(&state, 0.02, DELAY, WINDOW), BlockType::Regular);

        // Ровно на границе delay — окно открылось
        assert_eq!(check_block_type(&state, 0.05, DELAY, WINDOW), BlockType::Timed);

        // Глубоко в окне
        assert_eq!(check_block_type(&state, 0.2, DELAY, WINDOW), BlockType::Timed);

        // Ровно на дальней границе (delay + window)
        assert_eq!(check_block_type(&state, 0.35, DELAY, WINDOW), BlockType::Timed);

        // За окном
        assert_eq!(check_block_type(&state, 0.36, DELAY, WINDOW), BlockType::Regular);
        assert_eq!(check_block_type(&state, 5.0, DELAY, WINDOW), BlockType::Regular);
    }

    #[test]
    fn test_consumed_window_downgrades_to_regular() {
        let mut state = pressed_at(0.0);
        state.window_consumed = true;

        // Даже идеально по времени — окно уже потрачено
        assert_eq!(check_block_type(&state, 0.2, DELAY, WINDOW), BlockType::Regular);
    }

    #[test]
    fn test_nonzero_press_time_offset() {
        let state = pressed_at(10.0);

        assert_eq!(check_block_type(&state, 10.2, DELAY, WINDOW), BlockType::Timed);
        assert_eq!(check_block_type(&state, 10.5, DELAY, WINDOW), BlockType::Regular);
    }

    #[test]
    fn test_shrinking_tier_windows() {
        let state = pressed_at(0.0);

        // Попадание на 0.2s после делэя: проходит в окно 1 (0.3), не проходит в окно 5 (0.1)
        assert_eq!(check_block_type(&state, 0.25, DELAY, 0.3), BlockType::Timed);
        assert_eq!(check_block_type(&state, 0.25, DELAY, 0.1), BlockType::Regular);
    }

    #[test]
    fn test_stale_flag_is_ignored_by_hit_check() {
        // Тик не успел активировать окно, но удар уже пришёл:
        // решение принимается по press_time, не по флагу
        let state = pressed_at(0.0);
        assert!(!state.window_active);
        assert_eq!(check_block_type(&state, 0.1, DELAY, WINDOW), BlockType::Timed);
    }
}
