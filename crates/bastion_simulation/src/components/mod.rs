//! ECS Components для боевых акторов
//!
//! Организация по доменам:
//! - actor: базовые характеристики (Health, Stamina, атрибуты, скиллы, graph state)
//! - equipment: экипировка рук (Hands, WeaponClass, разрешение блокирующего предмета)

pub mod actor;
pub mod equipment;

// Re-exports для удобного импорта
pub use actor::*;
pub use equipment::*;
