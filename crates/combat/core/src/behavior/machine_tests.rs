use std::sync::Arc;

use glam::Vec3;

use super::*;
use crate::actor::ActorTag;
use crate::behavior::archetype::SpecialBehavior;
use crate::behavior::attack::AttackProfile;
use crate::behavior::special::FlyParams;
use crate::testing::ScriptedEnv;

const ENEMY: ActorId = ActorId(7);
const RATE: TickRate = TickRate(10);

struct Harness {
    env: ScriptedEnv,
    machine: BehaviorStateMachine,
    now: u64,
}

impl Harness {
    fn new(archetype: Archetype, player_at: Vec3) -> Self {
        let env = ScriptedEnv::new();
        env.place(ActorId::PLAYER, ActorTag::Player, player_at);
        env.place(ENEMY, ActorTag::Enemy, Vec3::ZERO);
        let machine =
            BehaviorStateMachine::new(ENEMY, Arc::new(archetype), SimRng::new(11), Tick(0), RATE);
        Self {
            env,
            machine,
            now: 0,
        }
    }

    fn with_ctx<R>(&mut self, f: impl FnOnce(&mut BehaviorStateMachine, &BehaviorContext<'_, '_>) -> R) -> R {
        let env = self.env.env();
        let target = Target {
            id: ActorId::PLAYER,
            position: self.env.position_of(ActorId::PLAYER),
            velocity: Vec3::ZERO,
        };
        let ctx = BehaviorContext {
            me: ENEMY,
            now: Tick(self.now),
            rate: RATE,
            env: &env,
            target: Some(target),
        };
        f(&mut self.machine, &ctx)
    }

    fn step(&mut self) -> Vec<BehaviorOutput> {
        self.now += 1;
        self.with_ctx(|machine, ctx| {
            machine.tick(ctx);
            machine.drain_outputs()
        })
    }

    fn run(&mut self, steps: u64) -> Vec<(u64, BehaviorOutput)> {
        let mut all = Vec::new();
        for _ in 0..steps {
            let outputs = self.step();
            all.extend(outputs.into_iter().map(|output| (self.now, output)));
        }
        all
    }

    fn stagger(&mut self) -> Vec<BehaviorOutput> {
        self.with_ctx(|machine, ctx| {
            machine.on_staggered(ctx);
            machine.drain_outputs()
        })
    }

    fn kill(&mut self) -> Vec<BehaviorOutput> {
        self.with_ctx(|machine, ctx| {
            machine.on_died(ctx);
            machine.drain_outputs()
        })
    }
}

fn hit_ticks(outputs: &[(u64, BehaviorOutput)]) -> Vec<u64> {
    outputs
        .iter()
        .filter(|(_, output)| matches!(output, BehaviorOutput::Hit { .. }))
        .map(|(tick, _)| *tick)
        .collect()
}

fn flurry(suppression: HitSuppression) -> Archetype {
    let mut archetype = Archetype::skeleton();
    archetype.attacks.clear();
    archetype.attacks.push(
        AttackProfile::melee("flurry", 3.0, 2.0, Vec3::ONE)
            .timing(0.8, 0.5, 2.0)
            .strikes(3, 0.1, suppression),
    );
    archetype
}

#[test]
fn telegraphed_attack_lands_after_charge_time() {
    let mut h = Harness::new(Archetype::skeleton(), Vec3::new(0.0, 0.0, 1.5));
    let first = h.step();
    assert_eq!(h.machine.state(), BehaviorState::Charging);
    assert!(first.contains(&BehaviorOutput::Telegraphed {
        attack: "slash".into()
    }));
    assert_eq!(h.env.cue_count(ENEMY, "Attack"), 1);

    let outputs = h.run(11);
    assert_eq!(hit_ticks(&outputs), vec![9]);
    assert!(outputs.iter().any(|(_, output)| *output
        == BehaviorOutput::Hit {
            target: ActorId::PLAYER,
            damage: 12.0,
            secondary: None,
        }));
    assert_eq!(h.machine.state(), BehaviorState::Recovering);
    assert!(!h.machine.is_ready(0));
}

#[test]
fn holds_in_place_while_cooling_then_attacks_again() {
    let mut h = Harness::new(Archetype::skeleton(), Vec3::new(0.0, 0.0, 1.5));
    h.run(13);
    assert_eq!(h.machine.state(), BehaviorState::Holding);
    assert!(h.env.body(ENEMY).unwrap().destination.is_none());

    // Cooldown of 2.5s started at tick 12.
    h.run(23);
    assert_eq!(h.machine.state(), BehaviorState::Holding);
    h.step();
    assert_eq!(h.machine.state(), BehaviorState::Charging);
}

#[test]
fn stagger_during_charge_cancels_attack_and_starts_cooldown() {
    let mut h = Harness::new(Archetype::skeleton(), Vec3::new(0.0, 0.0, 1.5));
    h.step();
    let outputs = h.stagger();
    assert!(outputs.contains(&BehaviorOutput::StateChanged {
        from: BehaviorState::Charging,
        to: BehaviorState::Recovering,
    }));
    assert!(!h.machine.is_ready(0));
    assert_eq!(h.env.cue_count(ENEMY, "Stagger"), 1);

    // Cancelled telegraph never lands; the cooldown (25 ticks from tick 1)
    // still elapses and the next telegraph starts on tick 26.
    let outputs = h.run(24);
    assert!(hit_ticks(&outputs).is_empty());
    assert_eq!(h.machine.state(), BehaviorState::Holding);
    h.step();
    assert_eq!(h.machine.state(), BehaviorState::Charging);
}

#[test]
fn stagger_while_attacking_has_no_effect() {
    let mut h = Harness::new(flurry(HitSuppression::PerStrike), Vec3::new(0.0, 0.0, 1.5));
    h.run(9);
    assert_eq!(h.machine.state(), BehaviorState::Attacking);

    assert!(h.stagger().is_empty());
    assert_eq!(h.machine.state(), BehaviorState::Attacking);
    let outputs = h.run(2);
    assert_eq!(hit_ticks(&outputs), vec![10, 11]);
}

#[test]
fn per_strike_suppression_hits_every_strike() {
    let mut h = Harness::new(flurry(HitSuppression::PerStrike), Vec3::new(0.0, 0.0, 1.5));
    let outputs = h.run(14);
    assert_eq!(hit_ticks(&outputs), vec![9, 10, 11]);
}

#[test]
fn per_activation_suppression_hits_once() {
    let mut h = Harness::new(flurry(HitSuppression::PerActivation), Vec3::new(0.0, 0.0, 1.5));
    let outputs = h.run(14);
    assert_eq!(hit_ticks(&outputs), vec![9]);
}

#[test]
fn chases_target_out_of_range() {
    let mut h = Harness::new(Archetype::skeleton(), Vec3::new(0.0, 0.0, 20.0));
    h.step();
    assert_eq!(h.machine.state(), BehaviorState::Chasing);
    assert_eq!(
        h.env.body(ENEMY).unwrap().destination,
        Some(Vec3::new(0.0, 0.0, 20.0))
    );
}

#[test]
fn death_cancels_everything_once() {
    let mut h = Harness::new(Archetype::skeleton(), Vec3::new(0.0, 0.0, 1.5));
    h.step();
    assert_eq!(h.machine.state(), BehaviorState::Charging);

    h.kill();
    assert_eq!(h.machine.state(), BehaviorState::Dead);
    assert!(h.kill().is_empty());
    assert_eq!(h.env.cue_count(ENEMY, "Death"), 1);
    assert!(h.run(30).is_empty());
    assert!(h.stagger().is_empty());
    assert_eq!(h.env.cue_count(ENEMY, "Stagger"), 0);
}

#[test]
fn activation_delay_keeps_actor_idle() {
    let mut h = Harness::new(Archetype::orc(), Vec3::new(0.0, 0.0, 20.0));
    h.run(9);
    assert!(!h.machine.is_active());
    assert_eq!(h.machine.state(), BehaviorState::Idle);
    h.step();
    assert!(h.machine.is_active());
    assert_eq!(h.machine.state(), BehaviorState::Chasing);
}

#[test]
fn imp_fires_then_retreats_and_stagger_cancels_retreat() {
    let mut h = Harness::new(Archetype::imp(), Vec3::new(0.0, 0.0, 5.0));
    h.run(10);
    assert_eq!(h.env.projectiles.borrow().len(), 1);
    assert_eq!(
        h.machine.state(),
        BehaviorState::Special(SpecialKind::Retreat)
    );
    let destination = h.env.body(ENEMY).unwrap().destination.unwrap();
    assert!(destination.z < 0.0, "retreat should move away from the target");

    h.stagger();
    assert!(h.env.body(ENEMY).unwrap().destination.is_none());
    h.run(15);
    assert_ne!(
        h.machine.state(),
        BehaviorState::Special(SpecialKind::Retreat)
    );
}

#[test]
fn necromancer_teleports_after_melee() {
    let mut h = Harness::new(Archetype::necromancer(), Vec3::new(0.0, 0.0, 1.5));
    let outputs = h.run(11);
    assert_eq!(hit_ticks(&outputs).len(), 1);
    assert!(outputs.iter().any(|(_, output)| *output
        == BehaviorOutput::StateChanged {
            from: BehaviorState::Recovering,
            to: BehaviorState::Special(SpecialKind::Teleport),
        }));
    assert_eq!(h.env.cue_count(ENEMY, "Teleport"), 1);

    let moved = h.env.position_of(ENEMY);
    assert!((flat_distance(moved, Vec3::ZERO) - 12.0).abs() < 1e-3);
    assert_ne!(
        h.machine.state(),
        BehaviorState::Special(SpecialKind::Teleport)
    );
}

#[test]
fn teleport_without_valid_point_stays_put() {
    let mut h = Harness::new(Archetype::necromancer(), Vec3::new(0.0, 0.0, 1.5));
    h.env.blocked_everywhere.set(true);
    h.run(11);
    assert_eq!(h.env.position_of(ENEMY), Vec3::ZERO);
    assert_eq!(h.env.cue_count(ENEMY, "Teleport"), 0);
    assert_eq!(h.env.obstruction_checks.get(), 50);
}

#[test]
fn dragon_takes_off_and_gains_range() {
    let mut dragon = Archetype::dragon();
    dragon.special = SpecialBehavior::FlyToggle(FlyParams {
        max_state_secs: 0.45,
        transition_secs: 0.5,
        ..FlyParams::default()
    });
    let mut h = Harness::new(dragon, Vec3::new(0.0, 0.0, 18.0));
    h.run(5);
    assert_eq!(
        h.machine.state(),
        BehaviorState::Special(SpecialKind::FlyToggle)
    );
    assert_eq!(h.env.cue_count(ENEMY, "Ascend"), 1);
    assert!(!h.env.body(ENEMY).unwrap().collision);

    let outputs = h.run(10);
    assert!(h.machine.is_airborne());
    assert_eq!(h.env.body(ENEMY).unwrap().elevation, 6.0);
    assert!(outputs.iter().any(|(_, output)| *output
        == BehaviorOutput::Telegraphed {
            attack: "fire".into()
        }));
}
