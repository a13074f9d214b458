//! Simulation clock and cancelable timer scheduling.
//!
//! Every delayed or repeating action in the simulation (attack telegraphs,
//! cooldowns, bleed ticks, knockback windows, despawns) is a [`TimerHandle`]
//! in a [`Timers`] schedule owned by whoever cares about it. Hosts advance the
//! schedule once per tick and act on the payloads that came due.
use std::collections::BTreeMap;
use std::fmt;

/// Discrete simulation step on the single global timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Ticks elapsed since `earlier`, saturating at zero.
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::AddAssign<u64> for Tick {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Fixed update cadence, used to convert authored durations into ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickRate(pub u32);

impl TickRate {
    pub const DEFAULT: Self = Self(50);

    /// Seconds covered by a single tick.
    pub fn delta(self) -> f32 {
        1.0 / self.0.max(1) as f32
    }

    /// Converts a duration to whole ticks.
    ///
    /// Positive durations always last at least one tick so that a timer never
    /// fires on the tick it was scheduled. Zero and negative durations map to
    /// zero ticks.
    pub fn ticks(self, seconds: f32) -> u64 {
        if seconds <= 0.0 || !seconds.is_finite() {
            return 0;
        }
        let ticks = (seconds * self.0.max(1) as f32 - 1e-4).ceil();
        (ticks as u64).max(1)
    }

    /// Converts a tick count back to seconds.
    pub fn seconds(self, ticks: u64) -> f32 {
        ticks as f32 * self.delta()
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Handle to a scheduled timer.
///
/// Handles are plain values: cancelling a handle whose timer already fired or
/// was already cancelled is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle {
    due: Tick,
    seq: u64,
}

impl TimerHandle {
    /// Tick at which the timer fires.
    pub fn due(&self) -> Tick {
        self.due
    }
}

/// Ordered schedule of pending timers carrying payload `P`.
///
/// Timers that come due on the same tick fire in the order they were
/// scheduled.
#[derive(Clone, Debug)]
pub struct Timers<P> {
    pending: BTreeMap<TimerHandle, P>,
    next_seq: u64,
}

impl<P> Timers<P> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedules `payload` to fire `delay` ticks after `now`.
    pub fn schedule(&mut self, now: Tick, delay: u64, payload: P) -> TimerHandle {
        let handle = TimerHandle {
            due: now + delay,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.insert(handle, payload);
        handle
    }

    /// Cancels a timer. Returns the payload if the timer was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<P> {
        self.pending.remove(&handle)
    }

    /// Cancels the timer behind an optional handle slot and clears the slot.
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerHandle>) -> Option<P> {
        slot.take().and_then(|handle| self.cancel(handle))
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    /// Removes and returns every payload due at or before `now`.
    pub fn advance(&mut self, now: Tick) -> Vec<(TimerHandle, P)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().due > now {
                break;
            }
            let (handle, payload) = entry.remove_entry();
            fired.push((handle, payload));
        }
        fired
    }

    /// Cancels every pending timer matching `predicate`.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&P) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, payload| !predicate(payload));
        before - self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<P> Default for Timers<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_convert_to_at_least_one_tick() {
        let rate = TickRate(50);
        assert_eq!(rate.ticks(1.0), 50);
        assert_eq!(rate.ticks(0.35), 18);
        assert_eq!(rate.ticks(0.001), 1);
        assert_eq!(rate.ticks(0.0), 0);
        assert_eq!(rate.ticks(-2.0), 0);
    }

    #[test]
    fn timers_fire_in_due_then_schedule_order() {
        let mut timers = Timers::new();
        timers.schedule(Tick(0), 5, "late");
        timers.schedule(Tick(0), 2, "first");
        timers.schedule(Tick(0), 2, "second");

        let fired: Vec<_> = timers.advance(Tick(2)).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["first", "second"]);
        assert_eq!(timers.len(), 1);
        assert!(timers.advance(Tick(4)).is_empty());
        assert_eq!(timers.advance(Tick(5)).len(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timers = Timers::new();
        let handle = timers.schedule(Tick(0), 3, ());
        assert!(timers.cancel(handle).is_some());
        assert!(timers.cancel(handle).is_none());
        assert!(timers.advance(Tick(10)).is_empty());
    }

    #[test]
    fn cancelling_fired_timer_is_noop() {
        let mut timers = Timers::new();
        let handle = timers.schedule(Tick(0), 1, 7u8);
        assert_eq!(timers.advance(Tick(1)).len(), 1);
        assert!(!timers.is_pending(handle));
        assert!(timers.cancel(handle).is_none());

        let mut slot = Some(handle);
        assert!(timers.cancel_slot(&mut slot).is_none());
        assert!(slot.is_none());
    }
}
