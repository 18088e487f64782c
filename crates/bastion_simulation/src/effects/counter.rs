//! Мост к стороннему counter-плагину (риспост после parry)
//!
//! Доступность определяется один раз на старте (хост сообщает, нашёл ли он
//! плагин); при недоступном мосте все вызовы — no-op. Сам риспост целиком
//! принадлежит другому плагину, мы только передаём триггер.

use bevy::prelude::*;

use crate::config::CounterSettings;
use crate::logger;

/// Состояние моста (Resource)
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct CounterBridge {
    pub available: bool,
}

impl CounterBridge {
    /// Однократная инициализация на старте сессии
    pub fn initialize(&mut self, available: bool) {
        self.available = available;
        if available {
            logger::log_info("Counter plugin bridge initialized");
        } else {
            logger::log_info("Counter plugin not found — bridge disabled");
        }
    }

    /// Прошёл ли триггер все гейты конфига
    pub fn should_trigger(
        &self,
        settings: &CounterSettings,
        was_timed_block: bool,
        perfect: bool,
    ) -> bool {
        if !self.available || !settings.enabled {
            return false;
        }
        if settings.only_timed_blocks && !was_timed_block {
            return false;
        }
        if settings.only_perfect_parry && !perfect {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_settings() -> CounterSettings {
        CounterSettings {
            enabled: true,
            only_timed_blocks: true,
            only_perfect_parry: false,
        }
    }

    #[test]
    fn test_unavailable_bridge_never_triggers() {
        let bridge = CounterBridge { available: false };
        assert!(!bridge.should_trigger(&enabled_settings(), true, true));
    }

    #[test]
    fn test_perfect_only_gate() {
        let bridge = CounterBridge { available: true };
        let mut settings = enabled_settings();
        settings.only_perfect_parry = true;

        assert!(!bridge.should_trigger(&settings, true, false));
        assert!(bridge.should_trigger(&settings, true, true));
    }

    #[test]
    fn test_timed_blocks_only_gate() {
        let bridge = CounterBridge { available: true };
        let settings = enabled_settings();

        assert!(!bridge.should_trigger(&settings, false, false));
        assert!(bridge.should_trigger(&settings, true, false));
    }

    #[test]
    fn test_disabled_in_config() {
        let bridge = CounterBridge { available: true };
        let mut settings = enabled_settings();
        settings.enabled = false;
        assert!(!bridge.should_trigger(&settings, true, true));
    }
}
