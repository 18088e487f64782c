//! Exhaustion debuff: stamina ниже порога → штрафы, выше → восстановление
//!
//! Стратегия восстановления — снапшот: абсолютные значения атрибутов
//! захватываются ДО мутации и восстанавливаются дословно. Delta-подход
//! (умножить обратно) дрейфует, если другой системе случится изменить тот же
//! атрибут пока debuff активен.
//!
//! Наличие компонента Exhaustion == состояние «exhausted»: insert/remove
//! строго чередуются, двойной апплай исключён проверкой наличия.

use bevy::prelude::*;

use crate::components::{ActorAttributes, LocalPlayer, Stamina};
use crate::config::CombatConfig;
use crate::logger;

/// Снапшот атрибутов, сделанный перед наложением debuff'а
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Exhaustion {
    pub original_speed: f32,
    pub original_attack_damage: f32,
    pub original_damage_resist: f32,
}

/// Накладывает debuff, возвращает снапшот для последующего восстановления
pub fn apply_exhaustion(attributes: &mut ActorAttributes, config: &CombatConfig) -> Exhaustion {
    let snapshot = Exhaustion {
        original_speed: attributes.speed_mult,
        original_attack_damage: attributes.attack_damage_mult,
        original_damage_resist: attributes.damage_resist,
    };

    let e = &config.exhaustion;
    attributes.speed_mult = snapshot.original_speed * (1.0 - e.movement_speed_debuff);
    attributes.attack_damage_mult = snapshot.original_attack_damage * (1.0 - e.attack_damage_debuff);
    attributes.damage_resist =
        snapshot.original_damage_resist - (e.damage_received_mult - 1.0) * 100.0;

    snapshot
}

/// Восстанавливает снапшот дословно
pub fn remove_exhaustion(attributes: &mut ActorAttributes, snapshot: &Exhaustion) {
    attributes.speed_mult = snapshot.original_speed;
    attributes.attack_damage_mult = snapshot.original_attack_damage;
    attributes.damage_resist = snapshot.original_damage_resist;
}

/// Система (тик): оценка exhausted/normal для локального игрока
///
/// Переход срабатывает ровно один раз на пересечение порога — текущее
/// состояние определяется наличием компонента, не пересчитывается.
pub fn update_exhaustion(
    mut commands: Commands,
    config: Res<CombatConfig>,
    mut query: Query<
        (Entity, &Stamina, &mut ActorAttributes, Option<&Exhaustion>),
        With<LocalPlayer>,
    >,
) {
    let enabled = config.stamina.enable_stamina_management && config.exhaustion.enabled;

    for (entity, stamina, mut attributes, exhaustion) in query.iter_mut() {
        if !enabled {
            // Фичу выключили при активном debuff'е — восстановить и снять
            if let Some(snapshot) = exhaustion {
                remove_exhaustion(&mut attributes, snapshot);
                commands.entity(entity).remove::<Exhaustion>();
                logger::log("Exhaustion cleared (feature disabled)");
            }
            continue;
        }

        let should_be_exhausted = stamina.current < config.exhaustion.stamina_threshold;

        match (should_be_exhausted, exhaustion) {
            (true, None) => {
                let snapshot = apply_exhaustion(&mut attributes, &config);
                commands.entity(entity).insert(snapshot);
                logger::log(&format!(
                    "Exhaustion applied — stamina: {:.1} < threshold: {:.1}",
                    stamina.current, config.exhaustion.stamina_threshold
                ));
            }
            (false, Some(snapshot)) => {
                remove_exhaustion(&mut attributes, snapshot);
                commands.entity(entity).remove::<Exhaustion>();
                logger::log(&format!(
                    "Exhaustion removed — stamina: {:.1} >= threshold: {:.1}",
                    stamina.current, config.exhaustion.stamina_threshold
                ));
            }
            // Уже в нужном состоянии — ничего не делаем (никаких двойных апплаев)
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_then_remove_is_exact_round_trip() {
        let config = CombatConfig::default();
        let mut attributes = ActorAttributes {
            speed_mult: 100.0,
            attack_damage_mult: 1.0,
            damage_resist: 50.0,
        };
        let before = attributes;

        let snapshot = apply_exhaustion(&mut attributes, &config);

        // Debuff действительно применён
        assert!((attributes.speed_mult - 80.0).abs() < 1e-4); // −20%
        assert!((attributes.attack_damage_mult - 0.75).abs() < 1e-4); // −25%
        assert!((attributes.damage_resist - 25.0).abs() < 1e-4); // −(1.25−1)×100

        remove_exhaustion(&mut attributes, &snapshot);

        // Точное равенство: снапшот восстанавливается дословно
        assert_eq!(attributes.speed_mult, before.speed_mult);
        assert_eq!(attributes.attack_damage_mult, before.attack_damage_mult);
        assert_eq!(attributes.damage_resist, before.damage_resist);
    }

    #[test]
    fn test_snapshot_survives_external_modification() {
        // Класс багов delta-стратегии: внешняя система меняет атрибут пока
        // debuff активен. Снапшот обязан вернуть ровно pre-apply значение.
        let config = CombatConfig::default();
        let mut attributes = ActorAttributes::default();
        let original_speed = attributes.speed_mult;

        let snapshot = apply_exhaustion(&mut attributes, &config);

        // «Другая система» пишет в speed_mult во время exhaustion
        attributes.speed_mult = 37.0;

        remove_exhaustion(&mut attributes, &snapshot);
        assert_eq!(attributes.speed_mult, original_speed);
    }

    #[test]
    fn test_nonstandard_base_values_round_trip() {
        let config = CombatConfig::default();
        let mut attributes = ActorAttributes {
            speed_mult: 123.4,
            attack_damage_mult: 1.7,
            damage_resist: -12.0,
        };
        let before = attributes;

        let snapshot = apply_exhaustion(&mut attributes, &config);
        remove_exhaustion(&mut attributes, &snapshot);

        assert_eq!(attributes.speed_mult, before.speed_mult);
        assert_eq!(attributes.attack_damage_mult, before.attack_damage_mult);
        assert_eq!(attributes.damage_resist, before.damage_resist);
    }
}
