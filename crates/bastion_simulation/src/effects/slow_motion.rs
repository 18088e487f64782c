//! Глобальный slow motion с отложенным сбросом
//!
//! Применение шлёт хосту TimeScaleRequest(percentage) и взводит дедлайн;
//! тиковая система по дедлайну шлёт TimeScaleRequest(1.0). Никаких спящих
//! потоков — вызывающий контекст не блокируется.

use bevy::prelude::*;

use crate::events::TimeScaleRequest;
use crate::logger;

/// Активный slow motion и момент его сброса (Resource)
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SlowMotionState {
    pub active: bool,
    /// Секунды fixed-часов, когда time-scale вернётся к 1.0
    pub reset_at: f32,
}

/// Запрашивает замедление времени на duration секунд.
///
/// Невалидные параметры (duration ≤ 0, percentage вне (0, 1)) — молчаливый
/// отказ с debug-логом, не ошибка.
pub fn apply_slow_time(
    state: &mut SlowMotionState,
    writer: &mut EventWriter<TimeScaleRequest>,
    percentage: f32,
    duration: f32,
    now: f32,
) {
    if duration <= 0.0 || percentage <= 0.0 || percentage >= 1.0 {
        logger::log(&format!(
            "Slow time rejected (percentage: {:.2}, duration: {:.2})",
            percentage, duration
        ));
        return;
    }

    writer.write(TimeScaleRequest { scale: percentage });
    // Повторный parry во время активного slow motion продлевает дедлайн
    state.active = true;
    state.reset_at = state.reset_at.max(now + duration);

    logger::log(&format!(
        "Applied slow time: {:.0}% speed for {:.1}s",
        percentage * 100.0,
        duration
    ));
}

/// Система (тик): отложенный сброс time-scale
pub fn update_slow_motion(
    mut state: ResMut<SlowMotionState>,
    time: Res<Time<Fixed>>,
    mut writer: EventWriter<TimeScaleRequest>,
) {
    if state.active && time.elapsed_secs() >= state.reset_at {
        writer.write(TimeScaleRequest { scale: 1.0 });
        state.active = false;
        state.reset_at = 0.0;
        logger::log("Reset time to normal speed");
    }
}

/// Немедленный сброс (teardown сессии)
pub fn force_reset(state: &mut SlowMotionState, writer: &mut EventWriter<TimeScaleRequest>) {
    if state.active {
        writer.write(TimeScaleRequest { scale: 1.0 });
        state.active = false;
        state.reset_at = 0.0;
    }
}
