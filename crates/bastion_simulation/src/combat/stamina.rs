//! Stamina-экономика: мгновенные стоимости, hold-drains, gradual drain
//!
//! Три примитива:
//! - **instant**: прыжок / выстрел / rapid combo — плоская стоимость сразу;
//! - **hold-drain**: пока условие держится (блок поднят, лук натянут) —
//!   rate × elapsed каждые ≥200ms, с перепроверкой engine truth каждый тик;
//! - **gradual**: потеря от удара размазывается на 3 секунды тиками ≥100ms,
//!   повторные удары добавляются к существующей записи, не стекуются.

use bevy::prelude::*;

use crate::components::{AnimGraphState, Hands, Stamina};
use crate::config::CombatConfig;
use crate::events::{AnimEvent, AnimTag, BlockButtonInput, ForceAnimAction, ForceAnimRequest};
use crate::logger;

/// Минимальный интервал между списаниями hold-drain
const HOLD_DRAIN_INTERVAL: f32 = 0.2;
/// Минимальный интервал между списаниями gradual drain
const GRADUAL_DRAIN_INTERVAL: f32 = 0.1;
/// Stamina на этом уровне считается исчерпанной — drain останавливается
const STAMINA_FLOOR: f32 = 0.1;
/// Остаток, при котором gradual drain считается завершённым
const DRAIN_EPSILON: f32 = 0.01;

/// Стоимость атаки (аналог перехвата стоимости в конвейере хоста).
///
/// Power-атака платит полную стоимость движка, лёгкая — настроенную долю.
pub fn attack_stamina_cost(config: &CombatConfig, engine_cost: f32, is_power_attack: bool) -> f32 {
    if is_power_attack || !config.stamina.enable_light_attack_stamina {
        engine_cost
    } else {
        engine_cost * config.stamina.light_attack_cost_mult
    }
}

// ============================================================================
// Компоненты трекинга
// ============================================================================

/// Натянутый лук/арбалет — непрерывный drain до выстрела или исчерпания
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct RangedDrawState {
    pub draw_start_time: f32,
    pub last_drain_time: f32,
}

impl RangedDrawState {
    /// last_drain_time инициализируется в прошлом: первый же тик списывает.
    pub fn new(now: f32) -> Self {
        Self {
            draw_start_time: now,
            last_drain_time: now - HOLD_DRAIN_INTERVAL,
        }
    }
}

/// Поднятый блок — непрерывный drain, пока кнопка удерживается
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BlockHoldState {
    pub block_start_time: f32,
    pub last_drain_time: f32,
}

impl BlockHoldState {
    pub fn new(now: f32) -> Self {
        Self {
            block_start_time: now,
            last_drain_time: now - HOLD_DRAIN_INTERVAL,
        }
    }
}

/// Распределённая во времени потеря stamina (от ударов)
///
/// Инвариант: remaining монотонно не растёт; запись удаляется при
/// remaining ≤ epsilon. Повторная потеря добавляется к total и remaining.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct GradualDrain {
    pub total_amount: f32,
    pub remaining: f32,
    pub start_time: f32,
    pub last_drain_time: f32,
    pub duration: f32,
}

impl GradualDrain {
    pub fn new(amount: f32, duration: f32, now: f32) -> Self {
        Self {
            total_amount: amount,
            remaining: amount,
            start_time: now,
            last_drain_time: now,
            duration,
        }
    }

    /// Коалесценция: добавляет к обоим счётчикам, второй таймер не заводится
    pub fn add(&mut self, amount: f32) {
        self.total_amount += amount;
        self.remaining += amount;
    }

    /// Rate списания: полный объём за duration
    pub fn rate(&self) -> f32 {
        if self.duration > 0.0 {
            self.total_amount / self.duration
        } else {
            self.total_amount
        }
    }
}

// ============================================================================
// Системы: события
// ============================================================================

/// Система: мгновенные стоимости и старт/стоп draw-трекинга по анимационным тегам
pub fn handle_anim_events(
    mut events: EventReader<AnimEvent>,
    mut commands: Commands,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    mut actors: Query<(&mut Stamina, &Hands)>,
    draws: Query<(), With<RangedDrawState>>,
) {
    let now = time.elapsed_secs();
    let stamina_cfg = &config.stamina;

    for event in events.read() {
        let Ok((mut stamina, hands)) = actors.get_mut(event.actor) else {
            continue;
        };

        match event.tag {
            AnimTag::JumpUp => {
                if stamina_cfg.enable_stamina_management && stamina_cfg.enable_jump_cost {
                    let actual = stamina.deplete(stamina_cfg.jump_cost);
                    if actual > 0.0 {
                        logger::log(&format!("Jump stamina cost: {:.1}", actual));
                    }
                }
            }

            AnimTag::BowDrawn => {
                if !stamina_cfg.enable_stamina_management
                    || !stamina_cfg.enable_ranged_cost
                    || !stamina_cfg.enable_ranged_hold_drain
                {
                    continue;
                }
                // Повторный BowDrawn при живом трекинге не перезапускает таймер
                if draws.get(event.actor).is_err() {
                    commands
                        .entity(event.actor)
                        .insert(RangedDrawState::new(now));
                    logger::log("Ranged weapon drawn — continuous stamina drain begins");
                }
            }

            AnimTag::BowRelease => {
                if !hands.has_ranged_equipped() {
                    continue;
                }
                if stamina_cfg.enable_stamina_management
                    && stamina_cfg.enable_ranged_cost
                    && stamina_cfg.enable_ranged_release_cost
                {
                    let actual = stamina.deplete(stamina_cfg.ranged_release_cost);
                    logger::log(&format!("Ranged weapon release cost: {:.1}", actual));
                }
                commands.entity(event.actor).remove::<RangedDrawState>();
            }

            AnimTag::RapidCombo => {
                if !stamina_cfg.enable_stamina_management || !stamina_cfg.enable_ranged_cost {
                    continue;
                }
                if !hands.has_ranged_equipped() {
                    continue;
                }
                if stamina_cfg.enable_rapid_combo_cost {
                    let actual = stamina.deplete(stamina_cfg.rapid_combo_cost);
                    logger::log(&format!("Rapid combo stamina cost: {:.1}", actual));
                }
            }

            AnimTag::AttackStop => {
                // Draw прерван (смена оружия, стан) — трекинг снимается
                if draws.get(event.actor).is_ok() {
                    commands.entity(event.actor).remove::<RangedDrawState>();
                    logger::log("Bow draw interrupted — clearing tracking");
                }
            }

            // Каст обслуживает slowdown-модуль
            AnimTag::CastBegin(_) | AnimTag::CastEnd(_) => {}
        }
    }
}

/// Система: старт/стоп block-hold drain от кнопки блока
pub fn handle_block_hold_input(
    mut events: EventReader<BlockButtonInput>,
    mut commands: Commands,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    holds: Query<(), With<BlockHoldState>>,
) {
    let now = time.elapsed_secs();

    for event in events.read() {
        if event.pressed {
            if !config.stamina.enable_stamina_management
                || !config.stamina.enable_block_hold_drain
            {
                continue;
            }
            if holds.get(event.actor).is_err() {
                commands.entity(event.actor).insert(BlockHoldState::new(now));
                logger::log("Block started — continuous stamina drain begins");
            }
        } else if holds.get(event.actor).is_ok() {
            commands.entity(event.actor).remove::<BlockHoldState>();
            logger::log("Block stopped — stamina drain ends");
        }
    }
}

// ============================================================================
// Системы: тик
// ============================================================================

/// Система (тик): drain натянутого лука
///
/// Каждый тик перепроверяет engine truth (граф всё ещё в атаке, лук всё ещё
/// в руках) — внешнее состояние меняется между тиками, кэшу веры нет.
pub fn update_ranged_hold(
    mut commands: Commands,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    mut query: Query<(Entity, &mut RangedDrawState, &mut Stamina, &Hands, &AnimGraphState)>,
    mut force_writer: EventWriter<ForceAnimRequest>,
) {
    let stamina_cfg = &config.stamina;
    if !stamina_cfg.enable_stamina_management
        || !stamina_cfg.enable_ranged_cost
        || !stamina_cfg.enable_ranged_hold_drain
        || stamina_cfg.ranged_hold_cost_per_second <= 0.0
    {
        // Фича выключена — снимаем весь трекинг
        for (entity, _, _, _, _) in query.iter() {
            commands.entity(entity).remove::<RangedDrawState>();
        }
        return;
    }

    let now = time.elapsed_secs();

    for (entity, mut state, mut stamina, hands, graph) in query.iter_mut() {
        if !graph.is_attacking || !hands.has_ranged_equipped() {
            logger::log(&format!(
                "Bow draw interrupted — clearing tracking (IsAttacking: {}, HasBow: {})",
                graph.is_attacking,
                hands.has_ranged_equipped()
            ));
            commands.entity(entity).remove::<RangedDrawState>();
            continue;
        }

        let elapsed = now - state.last_drain_time;
        if elapsed < HOLD_DRAIN_INTERVAL {
            continue;
        }

        if stamina.current <= STAMINA_FLOOR {
            logger::log("Stamina exhausted — forcing bow release");
            force_writer.write(ForceAnimRequest {
                actor: entity,
                action: ForceAnimAction::StopAttack,
            });
            commands.entity(entity).remove::<RangedDrawState>();
            continue;
        }

        let cost = stamina_cfg.ranged_hold_cost_per_second * elapsed;
        let actual = stamina.deplete(cost);
        state.last_drain_time = now;
        logger::log(&format!(
            "Ranged weapon hold drain: {:.2} stamina ({:.0} ms since last)",
            actual,
            elapsed * 1000.0
        ));
    }
}

/// Система (тик): drain удержания блока
pub fn update_block_hold(
    mut commands: Commands,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    mut query: Query<(Entity, &mut BlockHoldState, &mut Stamina, &AnimGraphState)>,
    mut force_writer: EventWriter<ForceAnimRequest>,
) {
    let stamina_cfg = &config.stamina;
    if !stamina_cfg.enable_stamina_management || !stamina_cfg.enable_block_hold_drain {
        for (entity, _, _, _) in query.iter() {
            commands.entity(entity).remove::<BlockHoldState>();
        }
        return;
    }

    let now = time.elapsed_secs();

    for (entity, mut state, mut stamina, graph) in query.iter_mut() {
        // Engine truth: граф больше не блокирует → трекинг снимается
        if !graph.is_blocking {
            logger::log("Block interrupted — clearing tracking");
            commands.entity(entity).remove::<BlockHoldState>();
            continue;
        }

        let elapsed = now - state.last_drain_time;
        if elapsed < HOLD_DRAIN_INTERVAL {
            continue;
        }

        if stamina.current <= STAMINA_FLOOR {
            logger::log("Stamina exhausted — forcing block stop");
            force_writer.write(ForceAnimRequest {
                actor: entity,
                action: ForceAnimAction::StopBlock,
            });
            commands.entity(entity).remove::<BlockHoldState>();
            continue;
        }

        let cost = stamina_cfg.block_hold_cost_per_second * elapsed;
        let actual = stamina.deplete(cost);
        state.last_drain_time = now;
        logger::log(&format!(
            "Block hold drain: {:.2} stamina ({:.0} ms since last)",
            actual,
            elapsed * 1000.0
        ));
    }
}

/// Система (тик): gradual drains
pub fn update_gradual_drains(
    mut commands: Commands,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    mut query: Query<(Entity, &mut GradualDrain, &mut Stamina)>,
) {
    if !config.stamina.enable_stamina_management || !config.hit.enable_stamina_loss_on_hit {
        for (entity, _, _) in query.iter() {
            commands.entity(entity).remove::<GradualDrain>();
        }
        return;
    }

    let now = time.elapsed_secs();

    for (entity, mut drain, mut stamina) in query.iter_mut() {
        let elapsed = now - drain.last_drain_time;
        if elapsed < GRADUAL_DRAIN_INTERVAL {
            continue;
        }

        let cost = (drain.rate() * elapsed).min(drain.remaining);
        if cost > 0.0 {
            let actual = stamina.deplete(cost);
            drain.remaining -= cost;
            drain.last_drain_time = now;
            logger::log(&format!(
                "Gradual drain tick: {:.2} stamina ({:.2} remaining)",
                actual, drain.remaining
            ));
        }

        if drain.remaining <= DRAIN_EPSILON {
            logger::log("Gradual drain completed");
            commands.entity(entity).remove::<GradualDrain>();
        }
    }
}

/// Система (тик): восстановление stamina
pub fn regenerate_stamina(mut query: Query<&mut Stamina>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut stamina in query.iter_mut() {
        stamina.regenerate(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;

    #[test]
    fn test_gradual_drain_coalesces() {
        let mut drain = GradualDrain::new(10.0, 3.0, 0.0);
        drain.add(5.0);

        assert_eq!(drain.total_amount, 15.0);
        assert_eq!(drain.remaining, 15.0);
        // Rate пересчитывается от нового total
        assert!((drain.rate() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_drain_rate_spreads_over_duration() {
        let drain = GradualDrain::new(30.0, 3.0, 0.0);
        assert!((drain.rate() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_hold_state_first_tick_drains_immediately() {
        let state = RangedDrawState::new(10.0);
        // last_drain_time в прошлом ровно на интервал
        assert!((10.0 - state.last_drain_time - HOLD_DRAIN_INTERVAL).abs() < 1e-6);
    }

    #[test]
    fn test_attack_cost_shaping() {
        let config = CombatConfig::default();

        // Power-атака платит полную стоимость
        assert_eq!(attack_stamina_cost(&config, 40.0, true), 40.0);
        // Лёгкая — настроенную долю (default 0.15)
        assert!((attack_stamina_cost(&config, 40.0, false) - 6.0).abs() < 1e-4);

        let mut disabled = CombatConfig::default();
        disabled.stamina.enable_light_attack_stamina = false;
        assert_eq!(attack_stamina_cost(&disabled, 40.0, false), 40.0);
    }
}
