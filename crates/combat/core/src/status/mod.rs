//! Per-actor health and timed status effects.
//!
//! A [`StatusEngine`] owns one actor's health, invulnerability, damage
//! multiplier and the timers behind bleeds, knockback windows and passive
//! regeneration. It knows nothing about behavior or spawning: everything it
//! wants the outside world to react to (stagger, death, lifesteal, knockback
//! expiry) is queued as a [`StatusEvent`] for the world to drain.
//!
//! # Invariants
//!
//! - `0 <= health <= max_health` after every operation
//! - death is terminal; every operation after death is a no-op
//! - at most one bleed runs at a time; a new bleed cancels the running one
//! - the mark multiplier is either exactly `1.0` or the last applied mark
mod effects;

pub use effects::{BleedSpec, DamageOutcome, RegenSpec, StatusEvent};

use effects::{ActiveBleed, KnockbackWindow, Regeneration};

use crate::actor::ActorId;
use crate::config::StatusConfig;
use crate::env::{StatusIcon, StatusSink};
use crate::time::{Tick, TickRate, TimerHandle, Timers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusTimer {
    BleedTick,
    KnockbackExpired,
    InvulnerabilityEnded,
    Regenerate,
}

#[derive(Debug)]
pub struct StatusEngine {
    owner: ActorId,
    health: f32,
    max_health: f32,
    stagger_threshold: f32,
    dead: bool,
    invulnerable: bool,
    invulnerability_window: Option<TimerHandle>,
    mark_multiplier: f32,
    cursed: bool,
    bleed: Option<ActiveBleed>,
    knockback: Option<KnockbackWindow>,
    regen: Option<Regeneration>,
    config: StatusConfig,
    tick_rate: TickRate,
    now: Tick,
    timers: Timers<StatusTimer>,
    events: Vec<StatusEvent>,
}

impl StatusEngine {
    pub fn new(
        owner: ActorId,
        max_health: f32,
        stagger_threshold: f32,
        config: StatusConfig,
        tick_rate: TickRate,
    ) -> Self {
        let max_health = max_health.max(1.0);
        Self {
            owner,
            health: max_health,
            max_health,
            stagger_threshold,
            dead: false,
            invulnerable: false,
            invulnerability_window: None,
            mark_multiplier: 1.0,
            cursed: false,
            bleed: None,
            knockback: None,
            regen: None,
            config,
            tick_rate,
            now: Tick::ZERO,
            timers: Timers::new(),
            events: Vec::new(),
        }
    }

    /// Enables passive regeneration (player only).
    pub fn with_regeneration(mut self, spec: RegenSpec) -> Self {
        self.regen = Some(Regeneration { spec, timer: None });
        self
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable || self.invulnerability_window.is_some()
    }

    pub fn is_cursed(&self) -> bool {
        self.cursed
    }

    pub fn is_bleeding(&self) -> bool {
        self.bleed.is_some()
    }

    pub fn is_knocked_back(&self) -> bool {
        self.knockback.is_some()
    }

    pub fn mark_multiplier(&self) -> f32 {
        self.mark_multiplier
    }

    /// Applies incoming damage.
    ///
    /// Negative and non-finite amounts are treated as zero. Damage against a
    /// dead or invulnerable actor is ignored.
    pub fn damage(&mut self, amount: f32, ui: &dyn StatusSink) -> DamageOutcome {
        if self.dead || self.is_invulnerable() {
            return DamageOutcome::IGNORED;
        }
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let applied = amount * self.mark_multiplier;

        self.health = (self.health - applied).clamp(0.0, self.max_health);
        ui.set_health_bar(self.owner, self.health, self.max_health);
        self.events.push(StatusEvent::Damaged {
            amount: applied,
            health: self.health,
        });
        self.restart_regen_delay();

        if self.health <= 0.0 {
            self.die(ui);
            return DamageOutcome {
                applied,
                staggered: false,
                died: true,
            };
        }

        let staggered = amount >= self.stagger_threshold;
        if staggered {
            self.events.push(StatusEvent::Staggered { amount });
        }
        DamageOutcome {
            applied,
            staggered,
            died: false,
        }
    }

    /// Restores health up to the maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: f32, ui: &dyn StatusSink) -> f32 {
        if self.dead || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        let restored = self.health - before;
        if restored > 0.0 {
            ui.set_health_bar(self.owner, self.health, self.max_health);
            self.events.push(StatusEvent::Healed {
                amount: restored,
                health: self.health,
            });
        }
        restored
    }

    /// Starts or replaces a bleed. Returns false when the bleed was refused.
    ///
    /// A regular bleed is refused while a special bleed is running; a special
    /// bleed always replaces whatever is running.
    pub fn bleed(&mut self, spec: BleedSpec, ui: &dyn StatusSink) -> bool {
        if self.dead || spec.ticks == 0 {
            return false;
        }
        if !spec.special && self.cursed {
            tracing::trace!(actor = %self.owner, "regular bleed refused while cursed");
            return false;
        }

        if let Some(previous) = self.bleed.take() {
            self.timers.cancel(previous.timer);
            if !previous.spec.special {
                ui.set_status_icon(self.owner, StatusIcon::Bleed, false);
            }
        }

        if spec.special {
            self.cursed = true;
            ui.set_status_icon(self.owner, StatusIcon::Bleed, false);
            ui.set_status_icon(self.owner, StatusIcon::Curse, true);
        } else {
            ui.set_status_icon(self.owner, StatusIcon::Bleed, true);
        }

        let interval_ticks = self.tick_rate.ticks(spec.interval).max(1);
        let lifesteal_ratio = if spec.special {
            self.config.special_lifesteal_ratio
        } else {
            self.config.regular_lifesteal_ratio
        };
        let timer = self
            .timers
            .schedule(self.now, interval_ticks, StatusTimer::BleedTick);
        self.bleed = Some(ActiveBleed {
            spec,
            remaining: spec.ticks,
            interval_ticks,
            lifesteal_ratio,
            timer,
        });
        self.events.push(StatusEvent::BleedStarted {
            special: spec.special,
        });
        true
    }

    /// Arms the knockback window and returns the decayed force to apply.
    ///
    /// A second knockback replaces the stored damage and restarts the window.
    pub fn knockback(
        &mut self,
        damage: f32,
        force: f32,
        charges: u32,
        ui: &dyn StatusSink,
    ) -> Option<f32> {
        if self.dead {
            return None;
        }
        let charges = charges.max(1);
        let effective = self.config.knockback_force(force, charges);

        if let Some(previous) = self.knockback.take() {
            self.timers.cancel(previous.timer);
        }
        let duration = self.config.knockback_duration * charges as f32;
        let timer = self.timers.schedule(
            self.now,
            self.tick_rate.ticks(duration).max(1),
            StatusTimer::KnockbackExpired,
        );
        self.knockback = Some(KnockbackWindow {
            damage: damage.max(0.0),
            armed: true,
            timer,
        });
        ui.set_status_icon(self.owner, StatusIcon::Knockback, true);
        Some(effective)
    }

    /// Reports a qualifying collision while knocked back.
    ///
    /// Deals the stored knockback damage to this actor once per window and
    /// returns it so the caller can apply the same amount as collateral.
    pub fn knockback_collision(&mut self, ui: &dyn StatusSink) -> Option<f32> {
        let window = self.knockback.as_mut()?;
        if !window.armed {
            return None;
        }
        window.armed = false;
        let damage = window.damage;
        self.damage(damage, ui);
        Some(damage)
    }

    /// Applies a mark of `1 + increase`, replacing any previous mark.
    pub fn mark(&mut self, increase: f32, ui: &dyn StatusSink) {
        if self.dead {
            return;
        }
        self.mark_multiplier = 1.0 + increase.max(0.0);
        ui.set_status_icon(self.owner, StatusIcon::Mark, true);
        self.events.push(StatusEvent::Marked {
            multiplier: self.mark_multiplier,
        });
    }

    pub fn remove_mark(&mut self, ui: &dyn StatusSink) {
        if self.mark_multiplier == 1.0 {
            return;
        }
        self.mark_multiplier = 1.0;
        ui.set_status_icon(self.owner, StatusIcon::Mark, false);
        self.events.push(StatusEvent::MarkCleared);
    }

    /// Permanent invulnerability toggle.
    pub fn set_invulnerable(&mut self, invulnerable: bool) {
        self.invulnerable = invulnerable;
    }

    /// Invulnerability for `seconds`, replacing any running window.
    pub fn grant_invulnerability(&mut self, seconds: f32) {
        if self.dead {
            return;
        }
        self.timers.cancel_slot(&mut self.invulnerability_window);
        let ticks = self.tick_rate.ticks(seconds);
        if ticks > 0 {
            self.invulnerability_window = Some(self.timers.schedule(
                self.now,
                ticks,
                StatusTimer::InvulnerabilityEnded,
            ));
        }
    }

    /// Advances the clock to `now` and fires due status timers.
    pub fn advance(&mut self, now: Tick, ui: &dyn StatusSink) {
        self.now = now;
        for (handle, timer) in self.timers.advance(now) {
            if self.dead {
                break;
            }
            match timer {
                StatusTimer::BleedTick => self.bleed_tick(handle, ui),
                StatusTimer::KnockbackExpired => self.expire_knockback(handle, ui),
                StatusTimer::InvulnerabilityEnded => {
                    if self.invulnerability_window == Some(handle) {
                        self.invulnerability_window = None;
                    }
                }
                StatusTimer::Regenerate => self.regenerate(handle, ui),
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<StatusEvent> {
        std::mem::take(&mut self.events)
    }

    fn bleed_tick(&mut self, handle: TimerHandle, ui: &dyn StatusSink) {
        let Some(bleed) = self.bleed.as_mut() else {
            return;
        };
        if bleed.timer != handle {
            return;
        }
        bleed.remaining = bleed.remaining.saturating_sub(1);
        let spec = bleed.spec;
        let ratio = bleed.lifesteal_ratio;

        let outcome = self.damage(spec.damage_per_tick, ui);
        if let Some(target) = spec.heal_target
            && outcome.applied > 0.0
        {
            self.events.push(StatusEvent::Lifesteal {
                target,
                amount: outcome.applied * ratio,
            });
        }
        if self.dead {
            return;
        }

        let Some(bleed) = self.bleed.as_mut() else {
            return;
        };
        if bleed.remaining > 0 {
            bleed.timer = self
                .timers
                .schedule(self.now, bleed.interval_ticks, StatusTimer::BleedTick);
        } else {
            self.end_bleed(ui);
        }
    }

    fn end_bleed(&mut self, ui: &dyn StatusSink) {
        let Some(bleed) = self.bleed.take() else {
            return;
        };
        self.timers.cancel(bleed.timer);
        if bleed.spec.special {
            self.cursed = false;
            ui.set_status_icon(self.owner, StatusIcon::Curse, false);
        } else {
            ui.set_status_icon(self.owner, StatusIcon::Bleed, false);
        }
        self.events.push(StatusEvent::BleedEnded {
            special: bleed.spec.special,
        });
    }

    fn expire_knockback(&mut self, handle: TimerHandle, ui: &dyn StatusSink) {
        if self.knockback.as_ref().map(|window| window.timer) != Some(handle) {
            return;
        }
        self.knockback = None;
        ui.set_status_icon(self.owner, StatusIcon::Knockback, false);
        self.events.push(StatusEvent::KnockbackEnded);
    }

    fn restart_regen_delay(&mut self) {
        let Some(regen) = self.regen.as_mut() else {
            return;
        };
        if let Some(timer) = regen.timer.take() {
            self.timers.cancel(timer);
        }
        let delay = self.tick_rate.ticks(regen.spec.delay).max(1);
        regen.timer = Some(self.timers.schedule(self.now, delay, StatusTimer::Regenerate));
    }

    fn regenerate(&mut self, handle: TimerHandle, ui: &dyn StatusSink) {
        let Some(regen) = self.regen.as_mut() else {
            return;
        };
        if regen.timer != Some(handle) {
            return;
        }
        regen.timer = None;
        let spec = regen.spec;
        if self.health > self.max_health * spec.threshold {
            return;
        }
        self.heal(spec.amount, ui);

        let interval = self.tick_rate.ticks(spec.interval).max(1);
        let next = self.timers.schedule(self.now, interval, StatusTimer::Regenerate);
        if let Some(regen) = self.regen.as_mut() {
            regen.timer = Some(next);
        }
    }

    fn die(&mut self, ui: &dyn StatusSink) {
        self.dead = true;
        self.timers.clear();
        self.invulnerability_window = None;
        if let Some(bleed) = self.bleed.take() {
            let icon = if bleed.spec.special {
                StatusIcon::Curse
            } else {
                StatusIcon::Bleed
            };
            ui.set_status_icon(self.owner, icon, false);
        }
        self.cursed = false;
        if self.knockback.take().is_some() {
            ui.set_status_icon(self.owner, StatusIcon::Knockback, false);
        }
        if let Some(regen) = self.regen.as_mut() {
            regen.timer = None;
        }
        self.remove_mark(ui);
        tracing::debug!(actor = %self.owner, "died");
        self.events.push(StatusEvent::Died);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct RecordingUi {
        icons: RefCell<Vec<(StatusIcon, bool)>>,
        bars: RefCell<Vec<f32>>,
    }

    impl RecordingUi {
        fn icon(&self, icon: StatusIcon) -> Option<bool> {
            self.icons
                .borrow()
                .iter()
                .rev()
                .find(|(i, _)| *i == icon)
                .map(|(_, on)| *on)
        }
    }

    impl StatusSink for RecordingUi {
        fn set_status_icon(&self, _actor: ActorId, icon: StatusIcon, active: bool) {
            self.icons.borrow_mut().push((icon, active));
        }

        fn set_health_bar(&self, _actor: ActorId, current: f32, _max: f32) {
            self.bars.borrow_mut().push(current);
        }
    }

    fn engine(max: f32, threshold: f32) -> StatusEngine {
        StatusEngine::new(
            ActorId(1),
            max,
            threshold,
            StatusConfig::default(),
            TickRate(10),
        )
    }

    fn run(engine: &mut StatusEngine, ui: &RecordingUi, from: u64, to: u64) {
        for t in from..=to {
            engine.advance(Tick(t), ui);
        }
    }

    fn staggers(events: &[StatusEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, StatusEvent::Staggered { .. }))
            .count()
    }

    #[test]
    fn heavy_hit_staggers_once() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 25.0);
        let outcome = status.damage(30.0, &ui);

        assert_eq!(status.health(), 70.0);
        assert!(outcome.staggered);
        assert_eq!(staggers(&status.drain_events()), 1);
        assert_eq!(ui.bars.borrow().last(), Some(&70.0));
    }

    #[test]
    fn lethal_hit_dies_without_stagger() {
        let ui = RecordingUi::default();
        let mut status = engine(20.0, 5.0);
        let outcome = status.damage(50.0, &ui);

        assert!(outcome.died);
        assert!(!outcome.staggered);
        assert_eq!(status.health(), 0.0);
        let events = status.drain_events();
        assert_eq!(staggers(&events), 0);
        assert!(events.contains(&StatusEvent::Died));

        // Death is terminal and idempotent.
        assert_eq!(status.damage(10.0, &ui), DamageOutcome::IGNORED);
        assert_eq!(status.heal(10.0, &ui), 0.0);
        assert!(status.drain_events().is_empty());
    }

    #[test]
    fn invulnerable_and_negative_damage_leave_health_alone() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 25.0);
        status.damage(-15.0, &ui);
        assert_eq!(status.health(), 100.0);

        status.set_invulnerable(true);
        status.damage(60.0, &ui);
        assert_eq!(status.health(), 100.0);
    }

    #[test]
    fn heal_clamps_to_max() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 25.0);
        status.damage(10.0, &ui);
        assert_eq!(status.heal(50.0, &ui), 10.0);
        assert_eq!(status.health(), 100.0);
    }

    #[test]
    fn regular_bleed_runs_its_ticks_then_clears() {
        let ui = RecordingUi::default();
        let mut status = engine(50.0, 100.0);
        assert!(status.bleed(BleedSpec::regular(4.0, 5, 1.0), &ui));
        assert_eq!(ui.icon(StatusIcon::Bleed), Some(true));

        run(&mut status, &ui, 1, 49);
        assert_eq!(status.health(), 34.0);
        run(&mut status, &ui, 50, 60);
        assert_eq!(status.health(), 30.0);
        assert!(!status.is_bleeding());
        assert_eq!(ui.icon(StatusIcon::Bleed), Some(false));
    }

    #[test]
    fn special_bleed_blocks_regular_and_replaces_special() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 100.0);
        assert!(status.bleed(BleedSpec::regular(1.0, 10, 1.0), &ui));
        assert!(status.bleed(BleedSpec::special(2.0, 2, 1.0), &ui));
        assert!(status.is_cursed());
        assert_eq!(ui.icon(StatusIcon::Curse), Some(true));
        assert_eq!(ui.icon(StatusIcon::Bleed), Some(false));

        assert!(!status.bleed(BleedSpec::regular(1.0, 10, 1.0), &ui));
        assert!(status.bleed(BleedSpec::special(3.0, 1, 1.0), &ui));

        run(&mut status, &ui, 1, 10);
        assert_eq!(status.health(), 97.0);
        assert!(!status.is_cursed());
        assert_eq!(ui.icon(StatusIcon::Curse), Some(false));

        // Curse lifted: regular bleeds start again.
        assert!(status.bleed(BleedSpec::regular(1.0, 1, 1.0), &ui));
    }

    #[test]
    fn bleed_ticks_report_lifesteal() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 100.0);
        status.bleed(BleedSpec::regular(5.0, 1, 0.5).healing(ActorId::PLAYER), &ui);
        run(&mut status, &ui, 1, 5);

        let events = status.drain_events();
        assert!(events.contains(&StatusEvent::Lifesteal {
            target: ActorId::PLAYER,
            amount: 5.0,
        }));
    }

    #[test]
    fn knockback_force_decays_and_second_call_replaces_damage() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 100.0);
        let one = status.knockback(10.0, 24.0, 1, &ui).unwrap();
        let three = status.knockback(20.0, 24.0, 3, &ui).unwrap();
        assert!(three < one);

        assert_eq!(status.knockback_collision(&ui), Some(20.0));
        assert_eq!(status.health(), 80.0);
        // Window stays open but no longer deals damage.
        assert_eq!(status.knockback_collision(&ui), None);
        assert!(status.is_knocked_back());
    }

    #[test]
    fn knockback_window_clears_after_duration_times_charges() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 100.0);
        status.knockback(5.0, 10.0, 2, &ui);

        run(&mut status, &ui, 1, 9);
        assert!(status.is_knocked_back());
        run(&mut status, &ui, 10, 10);
        assert!(!status.is_knocked_back());
        assert!(status.drain_events().contains(&StatusEvent::KnockbackEnded));
        assert_eq!(ui.icon(StatusIcon::Knockback), Some(false));
    }

    #[test]
    fn mark_multiplies_and_resets_exactly() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 100.0);
        status.mark(0.5, &ui);
        status.mark(0.5, &ui);
        status.damage(10.0, &ui);
        assert_eq!(status.health(), 85.0);

        status.remove_mark(&ui);
        assert_eq!(status.mark_multiplier(), 1.0);
        status.damage(10.0, &ui);
        assert_eq!(status.health(), 75.0);
    }

    #[test]
    fn invulnerability_window_expires() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 100.0);
        status.grant_invulnerability(0.3);
        status.damage(10.0, &ui);
        assert_eq!(status.health(), 100.0);

        run(&mut status, &ui, 1, 3);
        status.damage(10.0, &ui);
        assert_eq!(status.health(), 90.0);
    }

    #[test]
    fn regeneration_waits_for_delay_and_stops_above_threshold() {
        let ui = RecordingUi::default();
        let mut status = engine(100.0, 1000.0).with_regeneration(RegenSpec {
            delay: 1.0,
            threshold: 0.3,
            amount: 2.0,
            interval: 0.1,
        });
        status.damage(75.0, &ui);
        run(&mut status, &ui, 1, 9);
        assert_eq!(status.health(), 25.0);

        run(&mut status, &ui, 10, 12);
        assert_eq!(status.health(), 31.0);
        run(&mut status, &ui, 13, 40);
        assert_eq!(status.health(), 31.0);
    }
}
