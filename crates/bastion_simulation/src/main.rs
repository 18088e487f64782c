//! Headless симуляция BASTION
//!
//! Запускает Bevy App без рендера: один актор с блоком, скриптованные удары.

use bastion_simulation::*;
use bevy::prelude::*;

fn main() {
    println!("Starting BASTION headless simulation");

    let mut app = create_headless_app();
    app.add_plugins(SimulationPlugin);

    // Актор-блокер с экипированным щитом
    let blocker = app
        .world_mut()
        .spawn((
            Transform::default(),
            Actor::default(),
            LocalPlayer,
            Hands {
                left: Some(EquippedItem::Shield),
                right: Some(EquippedItem::Weapon(WeaponClass::OneHandSword)),
            },
        ))
        .id();

    let attacker = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
            Actor { faction_id: 1 },
        ))
        .id();

    // Немного тиков: зажать блок, получить удар, посмотреть исход
    app.world_mut().send_event(BlockButtonInput {
        actor: blocker,
        pressed: true,
    });

    for tick in 0..600 {
        if tick == 12 {
            app.world_mut().send_event(HitLanded {
                victim: blocker,
                aggressor: Some(attacker),
                raw_damage: 15.0,
                was_blocked: true,
                source: HitSource::Weapon,
            });
        }
        app.update();
    }

    let health = app.world().get::<Health>(blocker);
    let sequence = app.world().get::<ParrySequence>(blocker);
    println!("Blocker health: {:?}", health);
    println!("Parry sequence: {:?}", sequence);
    println!("Simulation complete!");
}
