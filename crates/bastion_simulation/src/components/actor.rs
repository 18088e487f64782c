//! Базовые компоненты акторов: Actor, Health, Stamina, атрибуты, скиллы

use bevy::prelude::*;

/// Актор (игрок, NPC) — базовый компонент для участников боя
///
/// Автоматически добавляет Health, Stamina, ActorAttributes, SkillSet,
/// AnimGraphState через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, Stamina, ActorAttributes, SkillSet, AnimGraphState)]
pub struct Actor {
    /// Stable ID фракции (для фильтрации свой/чужой на стороне хоста)
    pub faction_id: u64,
}

/// Маркер локально управляемого актора
///
/// Exhaustion оценивается каждый тик только для него.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct LocalPlayer;

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }
}

/// Выносливость (stamina) — валюта всей боевой экономики
///
/// Инвариант: 0.0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Stamina {
    pub current: f32,
    pub max: f32,
    pub regen_rate: f32, // units per second
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Stamina {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            regen_rate: 10.0,
        }
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    /// Тратит cost только если хватает (атаки, прыжки по желанию хоста)
    pub fn consume(&mut self, cost: f32) -> bool {
        if self.can_afford(cost) {
            self.current -= cost;
            true
        } else {
            false
        }
    }

    /// Снимает amount с клампом в 0, возвращает фактически снятое.
    ///
    /// Drains никогда не уводят stamina ниже нуля.
    pub fn deplete(&mut self, amount: f32) -> f32 {
        let actual = amount.max(0.0).min(self.current);
        self.current -= actual;
        actual
    }

    pub fn restore(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    pub fn regenerate(&mut self, delta_time: f32) {
        self.current = (self.current + self.regen_rate * delta_time).min(self.max);
    }
}

/// Модифицируемые атрибуты актора (зеркало actor-value аксессора хоста)
///
/// Exhaustion и slowdown снапшотят и восстанавливают эти значения;
/// апплай/восстановление всегда строго парные.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ActorAttributes {
    /// Множитель скорости движения, 100.0 = нормальная скорость
    pub speed_mult: f32,
    /// Множитель урона атак, 1.0 = нормальный урон
    pub attack_damage_mult: f32,
    /// Плоский damage resist
    pub damage_resist: f32,
}

impl Default for ActorAttributes {
    fn default() -> Self {
        Self {
            speed_mult: 100.0,
            attack_damage_mult: 1.0,
            damage_resist: 0.0,
        }
    }
}

/// Скиллы, влияющие на боевую экономику
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct SkillSet {
    pub light_armor: f32,
    pub heavy_armor: f32,
    pub archery: f32,
    pub destruction: f32,
}

impl SkillSet {
    /// Эффективный armor skill = больший из двух (оффсет потери stamina при ударе)
    pub fn effective_armor(&self) -> f32 {
        self.light_armor.max(self.heavy_armor)
    }
}

/// Зеркало graph-переменных анимации хоста
///
/// Hold-drains каждый тик перепроверяют эти флаги (engine truth),
/// а не собственные кэшированные состояния.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct AnimGraphState {
    pub is_attacking: bool,
    pub is_blocking: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100.0);
        assert_eq!(health.current, 100.0);

        health.take_damage(30.0);
        assert_eq!(health.current, 70.0);
        assert!(health.is_alive());

        health.take_damage(100.0); // Кламп в 0
        assert_eq!(health.current, 0.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_heal_clamped_to_max() {
        let mut health = Health::new(100.0);
        health.take_damage(50.0);
        health.heal(30.0);
        assert_eq!(health.current, 80.0);

        health.heal(100.0);
        assert_eq!(health.current, 100.0);
    }

    #[test]
    fn test_stamina_consume() {
        let mut stamina = Stamina::new(100.0);

        assert!(stamina.consume(30.0));
        assert_eq!(stamina.current, 70.0);

        assert!(!stamina.consume(80.0)); // Недостаточно
        assert_eq!(stamina.current, 70.0); // Не изменилась
    }

    #[test]
    fn test_stamina_deplete_never_negative() {
        let mut stamina = Stamina::new(100.0);
        stamina.current = 5.0;

        let actual = stamina.deplete(20.0);
        assert_eq!(actual, 5.0);
        assert_eq!(stamina.current, 0.0);

        let actual = stamina.deplete(10.0);
        assert_eq!(actual, 0.0);
        assert_eq!(stamina.current, 0.0);
    }

    #[test]
    fn test_stamina_regenerate() {
        let mut stamina = Stamina::new(100.0);
        stamina.deplete(50.0);

        stamina.regenerate(2.0); // 2 sec × 10 units/sec = +20
        assert_eq!(stamina.current, 70.0);

        stamina.regenerate(10.0); // Кламп в max
        assert_eq!(stamina.current, 100.0);
    }

    #[test]
    fn test_effective_armor_takes_higher_skill() {
        let skills = SkillSet {
            light_armor: 30.0,
            heavy_armor: 70.0,
            ..Default::default()
        };
        assert_eq!(skills.effective_armor(), 70.0);
    }
}
