//! Исходящие эффекты: глобальный slow motion и мост к counter-плагину
//!
//! Оба модуля только ПРОСЯТ хост через события — сами время не трогают
//! и способности не выдают.

pub mod counter;
pub mod slow_motion;

pub use counter::CounterBridge;
pub use slow_motion::SlowMotionState;
