//! BASTION Simulation Core
//!
//! ECS-ядро боевого оверхола на Bevy 0.16: timed block / parry-серия,
//! stamina-экономика, exhaustion, замедление при прицеливании/касте.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = боевые правила и состояние (этот crate)
//! - Хост-движок = input, hit detection, анимации, звук, рендер (bridge
//!   транслирует события сюда и дренирует запросы эффектов обратно)
//!
//! Вся работа с состоянием однопоточна по построению: системы идут
//! последовательной цепочкой в FixedUpdate, event-хендлеры и тики не гоняются.

use bevy::prelude::*;

// Публичные модули
pub mod combat;
pub mod components;
pub mod config;
pub mod effects;
pub mod events;
pub mod logger;
pub mod session;
pub mod slowdown;

// Re-export базовых типов для удобства
pub use combat::{
    attack_stamina_cost, check_block_type, on_hit_stamina_loss, BlockHoldState, BlockType,
    CombatPlugin, Exhaustion, GradualDrain, ParrySequence, RangedDrawState, TimedBlockState,
};
pub use components::*;
pub use config::CombatConfig;
pub use effects::{CounterBridge, SlowMotionState};
pub use events::*;
pub use logger::init_logger;
pub use slowdown::DrawSlowdown;

/// Главный plugin симуляции (конфиг + боевые подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для combat tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Конфиг по умолчанию; хост перезаписывает загруженным из файла
            .init_resource::<CombatConfig>()
            .add_plugins(CombatPlugin);
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(Time::<Fixed>::from_hz(60.0));

    app
}

/// Snapshot мира для сравнения детерминизма
/// (байтовая конкатенация, отсортированная по Entity ID)
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
