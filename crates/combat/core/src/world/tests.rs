use std::f32::consts::PI;
use std::sync::Arc;

use glam::{Quat, Vec3};

use super::*;
use crate::behavior::BehaviorState;
use crate::director::CatalogEntry;
use crate::placement::flat_distance;
use crate::testing::ScriptedEnv;

const PLAYER: ActorId = ActorId::PLAYER;

fn config() -> CombatConfig {
    CombatConfig {
        tick_rate: 10,
        ..CombatConfig::default()
    }
}

/// Player at `(0, 0, 1.5)` facing the origin, where enemies are spawned.
fn arena(config: CombatConfig, catalog: ArchetypeCatalog) -> (ScriptedEnv, CombatWorld) {
    let scripted = ScriptedEnv::new();
    scripted.place(PLAYER, ActorTag::Player, Vec3::new(0.0, 0.0, 1.5));
    if let Some(body) = scripted.bodies.borrow_mut().get_mut(&PLAYER) {
        body.rotation = Quat::from_rotation_y(PI);
    }
    (scripted, CombatWorld::new(config, catalog, 42))
}

fn health(world: &CombatWorld, id: ActorId) -> f32 {
    world.actor(id).map_or(f32::NAN, |actor| actor.status.health())
}

fn make_player_invulnerable(world: &mut CombatWorld) {
    world
        .actor_mut(PLAYER)
        .unwrap()
        .status
        .set_invulnerable(true);
}

/// A skeleton whose slash carries `effect`.
fn skeleton_with(effect: SecondaryEffect) -> Arc<Archetype> {
    let mut archetype = Archetype::skeleton();
    archetype.attacks[0] = archetype.attacks[0].clone().secondary(effect);
    Arc::new(archetype)
}

fn count(events: &[CombatEvent], f: impl Fn(&CombatEvent) -> bool) -> usize {
    events.iter().filter(|event| f(event)).count()
}

#[test]
fn enemy_telegraph_damages_player() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let enemy = world.spawn(Arc::new(Archetype::skeleton()), Vec3::ZERO, &env);
    assert_eq!(enemy, ActorId(1));

    for _ in 0..8 {
        world.tick(&env);
    }
    assert_eq!(health(&world, PLAYER), 100.0);
    world.tick(&env);
    assert_eq!(health(&world, PLAYER), 88.0);

    let events = world.drain_events();
    assert!(events.contains(&CombatEvent::Telegraphed {
        actor: enemy,
        attack: "slash".into(),
    }));
    assert!(events.contains(&CombatEvent::Hit {
        source: enemy,
        target: PLAYER,
        damage: 12.0,
    }));
}

#[test]
fn staggering_enemy_cancels_its_telegraph() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let enemy = world.spawn(Arc::new(Archetype::skeleton()), Vec3::ZERO, &env);
    world.tick(&env);

    let outcome = world.apply_damage(PLAYER, enemy, 10.0, &env).unwrap();
    assert!(outcome.staggered);
    let state = world.actor(enemy).and_then(|a| a.behavior.as_ref()).map(|b| b.state());
    assert_eq!(state, Some(BehaviorState::Recovering));

    for _ in 0..12 {
        world.tick(&env);
    }
    assert_eq!(health(&world, PLAYER), 100.0);
    assert_eq!(health(&world, enemy), 30.0);
}

#[test]
fn imp_explodes_once_when_removed() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let imp = world.spawn(Arc::new(Archetype::imp()), Vec3::ZERO, &env);

    assert!(world.apply_damage(PLAYER, imp, 100.0, &env).unwrap().died);
    assert!(world.apply_damage(PLAYER, imp, 100.0, &env).is_none());

    // 0.75s death delay at 10 ticks per second.
    for _ in 0..7 {
        world.tick(&env);
    }
    assert!(world.actor(imp).is_some());
    assert_eq!(health(&world, PLAYER), 100.0);
    world.tick(&env);

    assert!(world.actor(imp).is_none());
    assert_eq!(health(&world, PLAYER), 80.0);
    assert_eq!(*scripted.despawned.borrow(), vec![imp]);
    assert_eq!(scripted.cue_count(imp, "Death"), 1);
    assert_eq!(scripted.cue_count(imp, "Explosion"), 1);

    let events = world.drain_events();
    let died = count(&events, |e| {
        matches!(e, CombatEvent::Status { actor, event: StatusEvent::Died } if *actor == imp)
    });
    assert_eq!(died, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        CombatEvent::Exploded { actor, victims, .. } if *actor == imp && victims == &vec![PLAYER]
    )));
    // Spawned by hand, so wave accounting is untouched.
    assert_eq!(world.director().enemies_defeated(), 0);
}

#[test]
fn director_counts_defeats_at_despawn() {
    let mut config = config();
    config.director.base_budget = 0;
    config.director.budget_per_wave = 5;
    config.director.wave_duration = 2.0;
    let catalog = ArchetypeCatalog::new(vec![CatalogEntry::new(Archetype::skeleton(), 5, 1)]).unwrap();
    let (scripted, mut world) = arena(config, catalog);
    let env = scripted.env();

    world.start(&env);
    assert_eq!(world.director().wave(), 1);
    world.tick(&env);

    let enemy = ActorId(1);
    assert!(world.actor(enemy).is_some());
    assert_eq!(world.director().enemies_spawned(), 1);
    let spawned_at = scripted.position_of(enemy);
    assert!(flat_distance(spawned_at, Vec3::new(0.0, 0.0, 1.5)) >= 10.0);

    world.apply_damage(PLAYER, enemy, 100.0, &env);
    // Skeleton death delay is 1.5s: removed on tick 16.
    for _ in 0..14 {
        world.tick(&env);
    }
    assert_eq!(world.director().enemies_defeated(), 0);
    world.tick(&env);
    assert_eq!(world.director().enemies_defeated(), 1);
    assert_eq!(world.director().total_defeated(), 1);

    let snapshot = world.snapshot();
    assert_eq!(snapshot.tick, Tick(16));
    assert_eq!(snapshot.wave, 1);
    assert!(snapshot.enemies.is_empty());

    let events = world.drain_events();
    assert!(events.iter().any(|e| matches!(e, CombatEvent::Spawned { actor, .. } if *actor == enemy)));
    assert!(events.contains(&CombatEvent::Despawned { actor: enemy }));
}

#[test]
fn vampire_attack_bleeds_and_heals_player() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let enemy = world.spawn(Arc::new(Archetype::skeleton()), Vec3::ZERO, &env);
    world.apply_damage(enemy, PLAYER, 50.0, &env);
    make_player_invulnerable(&mut world);

    assert_eq!(world.player_attack(&env).unwrap(), vec![enemy]);
    assert_eq!(health(&world, enemy), 30.0);
    assert_eq!(world.player().souls(), 5);

    // Three bleed ticks of 2, half a second apart, each healing the player.
    for _ in 0..15 {
        world.tick(&env);
    }
    assert_eq!(health(&world, enemy), 24.0);
    assert_eq!(health(&world, PLAYER), 56.0);
}

#[test]
fn ghost_special_marks_until_expiry() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let orc = world.spawn(Arc::new(Archetype::orc()), Vec3::ZERO, &env);
    make_player_invulnerable(&mut world);
    world.set_stance(Stance::Ghost);

    assert_eq!(
        world.player_special(&env),
        Err(PlayerActionError::NoCharges { souls: 0 })
    );
    for _ in 0..4 {
        world.player_attack(&env).unwrap();
    }
    assert_eq!(world.player().souls(), 20);

    assert_eq!(world.player_special(&env).unwrap(), vec![orc]);
    assert_eq!(world.player().souls(), 0);
    assert!(world.marks().is_marked_by(PLAYER, orc));
    let outcome = world.apply_damage(PLAYER, orc, 10.0, &env).unwrap();
    assert_eq!(outcome.applied, 15.0);

    for _ in 0..49 {
        world.tick(&env);
    }
    assert!(world.marks().is_marked_by(PLAYER, orc));
    world.tick(&env);
    assert!(world.marks().is_empty());
    assert_eq!(world.actor(orc).unwrap().status.mark_multiplier(), 1.0);

    let events = world.drain_events();
    assert!(events.contains(&CombatEvent::StanceChanged {
        stance: Stance::Ghost
    }));
    assert!(events.contains(&CombatEvent::SpecialUsed {
        stance: Stance::Ghost,
        charges: 1,
        targets: vec![orc],
    }));
}

#[test]
fn dodge_grants_invulnerability_and_cools_down() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();

    assert_eq!(world.dodge(), Ok(Tick(4)));
    assert_eq!(
        world.dodge(),
        Err(PlayerActionError::DodgeCooling { remaining_ticks: 10 })
    );
    let ignored = world.apply_damage(ActorId(9), PLAYER, 10.0, &env).unwrap();
    assert_eq!(ignored.applied, 0.0);

    for _ in 0..4 {
        world.tick(&env);
    }
    world.apply_damage(ActorId(9), PLAYER, 10.0, &env);
    assert_eq!(health(&world, PLAYER), 90.0);

    for _ in 0..6 {
        world.tick(&env);
    }
    assert!(world.dodge().is_ok());
}

#[test]
fn dead_player_cannot_act_and_enemies_stand_down() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    world.spawn(Arc::new(Archetype::skeleton()), Vec3::ZERO, &env);

    assert!(world.apply_damage(ActorId(9), PLAYER, 500.0, &env).unwrap().died);
    assert!(!world.is_player_alive());
    assert_eq!(world.player_attack(&env), Err(PlayerActionError::PlayerDead));
    assert_eq!(world.dodge(), Err(PlayerActionError::PlayerDead));

    for _ in 0..10 {
        world.tick(&env);
    }
    let events = world.drain_events();
    assert_eq!(count(&events, |e| *e == CombatEvent::PlayerDied), 1);
    assert_eq!(count(&events, |e| matches!(e, CombatEvent::Telegraphed { .. })), 0);
    assert!(!world.snapshot().player.alive);
}

#[test]
fn orc_knockback_collision_deals_collateral_once() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let struck = world.spawn(Arc::new(Archetype::skeleton()), Vec3::ZERO, &env);
    let bystander = world.spawn(Arc::new(Archetype::skeleton()), Vec3::new(5.0, 0.0, 0.0), &env);
    make_player_invulnerable(&mut world);
    assert_eq!(world.cycle_stance(true), Stance::Orc);

    assert_eq!(world.player_attack(&env).unwrap(), vec![struck]);
    assert_eq!(health(&world, struck), 30.0);
    let (pushed, impulse) = scripted.impulses.borrow()[0];
    assert_eq!(pushed, struck);
    assert!(impulse.abs_diff_eq(Vec3::new(0.0, 0.0, -24.0), 1e-4));

    assert_eq!(
        world.report_knockback_collision(struck, Some(bystander), &env),
        Some(15.0)
    );
    assert_eq!(health(&world, struck), 15.0);
    assert_eq!(health(&world, bystander), 25.0);
    assert_eq!(world.report_knockback_collision(struck, Some(bystander), &env), None);
}

#[test]
fn projectile_hit_is_reported_back_into_the_world() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let imp = world.spawn(Arc::new(Archetype::imp()), Vec3::new(0.0, 0.0, -8.0), &env);

    let outcome = world.report_projectile_hit(imp, PLAYER, 8.0, &env).unwrap();
    assert_eq!(outcome.applied, 8.0);
    assert_eq!(health(&world, PLAYER), 92.0);
    assert!(world.report_projectile_hit(imp, ActorId(99), 8.0, &env).is_none());
}

#[test]
fn enemy_bleed_drains_player_and_heals_attacker() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let bleed = SecondaryEffect::Bleed {
        damage_per_tick: 2.0,
        ticks: 3,
        interval: 0.5,
    };
    let enemy = world.spawn(skeleton_with(bleed), Vec3::ZERO, &env);
    world.apply_damage(PLAYER, enemy, 8.0, &env);

    for _ in 0..9 {
        world.tick(&env);
    }
    assert_eq!(health(&world, PLAYER), 88.0);
    assert!(world.player_status().unwrap().is_bleeding());

    // Three ticks half a second apart, well before the next slash.
    for _ in 0..16 {
        world.tick(&env);
    }
    assert_eq!(health(&world, PLAYER), 82.0);
    assert_eq!(health(&world, enemy), 38.0);
    assert!(!world.player_status().unwrap().is_bleeding());

    let events = world.drain_events();
    assert!(events.contains(&CombatEvent::Status {
        actor: PLAYER,
        event: StatusEvent::BleedStarted { special: false },
    }));
}

#[test]
fn enemy_knockback_pushes_player_for_one_charge() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let knockback = SecondaryEffect::Knockback {
        damage: 10.0,
        force: 12.0,
    };
    world.spawn(skeleton_with(knockback), Vec3::ZERO, &env);

    for _ in 0..9 {
        world.tick(&env);
    }
    assert_eq!(health(&world, PLAYER), 88.0);
    assert!(world.player_status().unwrap().is_knocked_back());

    // Enemy hits spend a single charge, so the force is not decayed.
    let impulses = scripted.impulses.borrow().clone();
    assert_eq!(impulses.len(), 1);
    let (pushed, impulse) = impulses[0];
    assert_eq!(pushed, PLAYER);
    assert!(impulse.abs_diff_eq(Vec3::new(0.0, 0.0, 12.0), 1e-4));

    assert_eq!(world.report_knockback_collision(PLAYER, None, &env), Some(10.0));
    assert_eq!(health(&world, PLAYER), 78.0);
    assert_eq!(world.report_knockback_collision(PLAYER, None, &env), None);

    // One charge keeps the window open for half a second.
    for _ in 0..6 {
        world.tick(&env);
    }
    assert!(!world.player_status().unwrap().is_knocked_back());
    assert!(scripted.halted.borrow().contains(&PLAYER));
}

#[test]
fn overlapping_enemy_marks_each_last_their_full_duration() {
    let (scripted, mut world) = arena(config(), ArchetypeCatalog::standard());
    let env = scripted.env();
    let mark = SecondaryEffect::Mark {
        increase: 0.5,
        duration: 1.0,
    };
    let first = world.spawn(skeleton_with(mark), Vec3::ZERO, &env);
    for _ in 0..8 {
        world.tick(&env);
    }
    let second = world.spawn(skeleton_with(mark), Vec3::ZERO, &env);

    // First mark lands on tick 9 and lapses around tick 19; the second lands
    // around tick 17 and holds until around tick 27.
    for _ in 0..14 {
        world.tick(&env);
    }
    assert!(!world.marks().is_marked_by(first, PLAYER));
    assert!(world.marks().is_marked_by(second, PLAYER));
    assert_eq!(world.player_status().unwrap().mark_multiplier(), 1.5);

    for _ in 0..10 {
        world.tick(&env);
    }
    assert!(world.marks().is_empty());
    assert_eq!(world.player_status().unwrap().mark_multiplier(), 1.0);
}
