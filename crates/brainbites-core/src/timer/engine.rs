//! Timer engine: owns the spendable screen-time balance.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads -- the caller invokes `tick()` periodically (1 Hz while active)
//! and any gap (background, suspend, process restart) is reconciled in a
//! single elapsed-time step on the next access, so the balance after a
//! resume is identical to the balance had ticking continued uninterrupted.
//!
//! Persistence is best-effort on every mutation: a failed write is logged
//! and the in-memory state stays authoritative until the next successful
//! write.

use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::Clock;
use crate::notify::Notifier;
use crate::storage::{keys, KvStore};

/// Grace window of negative balance before score penalties begin.
pub const OVERTIME_BUFFER_SECONDS: i64 = 300;
/// First "time low" warning threshold (5 minutes remaining).
pub const LOW_WARNING_SECONDS: i64 = 300;
/// Final "time low" warning threshold (1 minute remaining).
pub const FINAL_WARNING_SECONDS: i64 = 60;
/// Seconds granted per rewarded ad watch, routed through `add_earned_time`.
pub const AD_REWARD_SECONDS: u64 = 300;

fn schema_version() -> u32 {
    1
}

/// Persisted balance state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimerData {
    #[serde(default = "schema_version")]
    version: u32,
    /// Signed seconds of spendable credit; negative means overtime.
    available_seconds: i64,
    /// Monotonic counter of everything ever credited.
    total_earned_seconds: u64,
    is_running: bool,
    last_observed_at: DateTime<Utc>,
}

impl TimerData {
    fn fresh(at: DateTime<Utc>) -> Self {
        Self {
            version: schema_version(),
            available_seconds: 0,
            total_earned_seconds: 0,
            is_running: false,
            last_observed_at: at,
        }
    }
}

/// Read-only projection of the balance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimerStatus {
    pub available_seconds: i64,
    pub is_running: bool,
    pub is_overtime: bool,
    pub in_buffer: bool,
    pub total_earned_seconds: u64,
}

/// Core timer engine. Exclusively owns [`keys::TIMER_DATA`].
pub struct TimerEngine {
    data: TimerData,
    store: Rc<dyn KvStore>,
    clock: Rc<dyn Clock>,
    notifier: Rc<dyn Notifier>,
}

impl TimerEngine {
    /// Load persisted state, applying the catch-up decrement for any gap
    /// the process was not alive to observe.
    ///
    /// Cold-start policy: if the timer was running when the process died,
    /// the entire gap is decremented once and the timer is left stopped --
    /// a running timer is never resumed silently across a restart.
    pub fn load(store: Rc<dyn KvStore>, clock: Rc<dyn Clock>, notifier: Rc<dyn Notifier>) -> Self {
        let now = clock.now();
        let data = match store.get(keys::TIMER_DATA) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("discarding unreadable timer data: {e}");
                TimerData::fresh(now)
            }),
            Ok(None) => TimerData::fresh(now),
            Err(e) => {
                warn!("failed to read timer data: {e}");
                TimerData::fresh(now)
            }
        };

        let mut engine = Self {
            data,
            store,
            clock,
            notifier,
        };
        if engine.data.is_running {
            engine.apply_elapsed(now);
            engine.data.is_running = false;
            engine.persist();
        }
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Snapshot of the current balance in whole seconds.
    ///
    /// This is the value the score engine reads for penalty computation;
    /// it is a copy, never a live reference.
    pub fn available_seconds(&self) -> i64 {
        self.data.available_seconds
    }

    pub fn total_earned_seconds(&self) -> u64 {
        self.data.total_earned_seconds
    }

    pub fn is_running(&self) -> bool {
        self.data.is_running
    }

    pub fn status(&self) -> TimerStatus {
        let available = self.data.available_seconds;
        TimerStatus {
            available_seconds: available,
            is_running: self.data.is_running,
            is_overtime: available < 0,
            in_buffer: available < 0 && available > -OVERTIME_BUFFER_SECONDS,
            total_earned_seconds: self.data.total_earned_seconds,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin spending the balance. Idempotent.
    pub fn start(&mut self) {
        if self.data.is_running {
            return;
        }
        self.data.is_running = true;
        self.data.last_observed_at = self.clock.now();
        self.persist();
        self.push_timer_notification();
    }

    /// Stop spending the balance. Idempotent. Flushes elapsed time first.
    pub fn stop(&mut self) {
        if !self.data.is_running {
            return;
        }
        self.apply_elapsed(self.clock.now());
        self.data.is_running = false;
        self.persist();
        self.push_timer_notification();
    }

    /// Advance the balance by whatever wall-clock time has elapsed.
    ///
    /// Call at least once per second while running; after any gap a single
    /// call applies the whole gap's decrement in one step.
    pub fn tick(&mut self) {
        if !self.data.is_running {
            return;
        }
        self.apply_elapsed(self.clock.now());
        self.persist();
        self.push_timer_notification();
    }

    /// Credit earned seconds and return the new balance.
    ///
    /// Every credit path (answer rewards, streak bonuses, ad rewards, goal
    /// reward deposits) goes through here so `total_earned_seconds` stays
    /// authoritative. Zero-second credits are rejected as a no-op.
    pub fn add_earned_time(&mut self, seconds: u64) -> i64 {
        if seconds == 0 {
            return self.data.available_seconds;
        }
        if self.data.is_running {
            self.apply_elapsed(self.clock.now());
        }
        self.data.available_seconds += seconds as i64;
        self.data.total_earned_seconds += seconds;
        self.persist();
        self.push_timer_notification();
        self.data.available_seconds
    }

    /// Zero all fields and clear the persistent timer notification.
    pub fn reset(&mut self) {
        self.data = TimerData::fresh(self.clock.now());
        self.persist();
        self.notifier.clear_timer();
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Decrement by elapsed whole seconds and fire edge-triggered warnings.
    ///
    /// `last_observed_at` advances by the applied whole seconds, not to
    /// `now`, so sub-second remainders are never dropped.
    fn apply_elapsed(&mut self, now: DateTime<Utc>) {
        let elapsed = (now - self.data.last_observed_at).num_seconds();
        if elapsed <= 0 {
            return;
        }
        let before = self.data.available_seconds;
        self.data.available_seconds -= elapsed;
        self.data.last_observed_at += Duration::seconds(elapsed);
        self.check_threshold_crossings(before, self.data.available_seconds);
    }

    /// A warning fires only on a downward crossing of its threshold, so
    /// each is delivered at most once until the balance climbs back above
    /// the threshold and falls through it again.
    fn check_threshold_crossings(&self, before: i64, after: i64) {
        for threshold in [LOW_WARNING_SECONDS, FINAL_WARNING_SECONDS] {
            if before > threshold && after <= threshold {
                self.notifier.time_low((threshold / 60) as u32);
            }
        }
        if before > 0 && after <= 0 {
            self.notifier.time_depleted();
        }
    }

    fn push_timer_notification(&self) {
        self.notifier.timer_update(
            self.data.available_seconds,
            self.data.available_seconds < 0,
        );
    }

    fn persist(&self) {
        match serde_json::to_string(&self.data) {
            Ok(json) => {
                if let Err(e) = self.store.set(keys::TIMER_DATA, &json) {
                    warn!("failed to persist timer data: {e}");
                }
            }
            Err(e) => warn!("failed to serialize timer data: {e}"),
        }
    }
}

/// Human-readable duration, sign dropped: "1h 5m", "4m 10s", "32s".
pub fn format_time(seconds: i64) -> String {
    let abs = seconds.unsigned_abs();
    let hours = abs / 3600;
    let minutes = (abs % 3600) / 60;
    let secs = abs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::testing::RecordingNotifier;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn harness() -> (
        Rc<MemoryStore>,
        Rc<FixedClock>,
        Rc<RecordingNotifier>,
        TimerEngine,
    ) {
        let store = Rc::new(MemoryStore::new());
        let clock = Rc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let notifier = Rc::new(RecordingNotifier::new());
        let engine = TimerEngine::load(store.clone(), clock.clone(), notifier.clone());
        (store, clock, notifier, engine)
    }

    #[test]
    fn starts_with_zero_balance() {
        let (_, _, _, engine) = harness();
        let status = engine.status();
        assert_eq!(status.available_seconds, 0);
        assert!(!status.is_running);
        assert!(!status.is_overtime);
        assert_eq!(status.total_earned_seconds, 0);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let (_, clock, _, mut engine) = harness();
        engine.add_earned_time(100);
        engine.start();
        engine.start();
        clock.advance(Duration::seconds(10));
        engine.stop();
        engine.stop();
        assert_eq!(engine.available_seconds(), 90);
        assert!(!engine.is_running());
    }

    #[test]
    fn tick_applies_whole_gap_in_one_step() {
        let (_, clock, _, mut engine) = harness();
        engine.add_earned_time(100);
        engine.start();
        clock.advance(Duration::seconds(150));
        engine.tick();
        assert_eq!(engine.available_seconds(), -50);
    }

    #[test]
    fn tick_while_stopped_does_nothing() {
        let (_, clock, _, mut engine) = harness();
        engine.add_earned_time(100);
        clock.advance(Duration::seconds(50));
        engine.tick();
        assert_eq!(engine.available_seconds(), 100);
    }

    #[test]
    fn zero_credit_is_rejected() {
        let (_, _, _, mut engine) = harness();
        engine.add_earned_time(0);
        assert_eq!(engine.total_earned_seconds(), 0);
        assert_eq!(engine.available_seconds(), 0);
    }

    #[test]
    fn restart_applies_catch_up_and_stops() {
        let store = Rc::new(MemoryStore::new());
        let clock = Rc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let notifier = Rc::new(RecordingNotifier::new());
        {
            let mut engine =
                TimerEngine::load(store.clone() as Rc<dyn KvStore>, clock.clone(), notifier.clone());
            engine.add_earned_time(100);
            engine.start();
        }
        // Simulate a cold start 150 s later.
        clock.advance(Duration::seconds(150));
        let engine = TimerEngine::load(store, clock, notifier);
        assert_eq!(engine.available_seconds(), -50);
        assert!(!engine.is_running());
    }

    #[test]
    fn warnings_fire_once_per_downward_crossing() {
        let (_, clock, notifier, mut engine) = harness();
        engine.add_earned_time(310);
        engine.start();
        notifier.take();

        clock.advance(Duration::seconds(20));
        engine.tick();
        let events = notifier.take();
        assert!(events.iter().any(|e| e == "time_low:5"), "{events:?}");

        // Still below the threshold: no repeat.
        clock.advance(Duration::seconds(5));
        engine.tick();
        assert!(!notifier.take().iter().any(|e| e.starts_with("time_low")));

        // Climb back above 300 and fall through again.
        engine.add_earned_time(60);
        notifier.take();
        clock.advance(Duration::seconds(50));
        engine.tick();
        assert!(notifier.take().iter().any(|e| e == "time_low:5"));
    }

    #[test]
    fn depletion_fires_on_zero_crossing() {
        let (_, clock, notifier, mut engine) = harness();
        engine.add_earned_time(70);
        engine.start();
        notifier.take();
        clock.advance(Duration::seconds(90));
        engine.tick();
        let events = notifier.take();
        assert!(events.iter().any(|e| e == "time_low:1"));
        assert!(events.iter().any(|e| e == "time_depleted"));
    }

    #[test]
    fn status_classifies_buffer_and_overtime() {
        let (_, clock, _, mut engine) = harness();
        engine.add_earned_time(10);
        engine.start();
        clock.advance(Duration::seconds(110));
        engine.tick();
        let status = engine.status();
        assert_eq!(status.available_seconds, -100);
        assert!(status.is_overtime);
        assert!(status.in_buffer);

        clock.advance(Duration::seconds(300));
        engine.tick();
        let status = engine.status();
        assert!(status.is_overtime);
        assert!(!status.in_buffer);
    }

    #[test]
    fn reset_zeroes_and_clears_notification() {
        let (_, _, notifier, mut engine) = harness();
        engine.add_earned_time(500);
        engine.reset();
        assert_eq!(engine.available_seconds(), 0);
        assert_eq!(engine.total_earned_seconds(), 0);
        assert!(notifier.take().iter().any(|e| e == "clear_timer"));
    }

    #[test]
    fn persists_across_reload() {
        let store = Rc::new(MemoryStore::new());
        let clock = Rc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let notifier = Rc::new(RecordingNotifier::new());
        {
            let mut engine =
                TimerEngine::load(store.clone() as Rc<dyn KvStore>, clock.clone(), notifier.clone());
            engine.add_earned_time(250);
        }
        let engine = TimerEngine::load(store, clock, notifier);
        assert_eq!(engine.available_seconds(), 250);
        assert_eq!(engine.total_earned_seconds(), 250);
    }

    #[test]
    fn corrupted_blob_falls_back_to_default() {
        let store = Rc::new(MemoryStore::new());
        store.set(keys::TIMER_DATA, "{not json").unwrap();
        let clock = Rc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let engine = TimerEngine::load(store, clock, Rc::new(RecordingNotifier::new()));
        assert_eq!(engine.available_seconds(), 0);
    }

    #[test]
    fn format_time_drops_sign() {
        assert_eq!(format_time(-3900), "1h 5m");
        assert_eq!(format_time(250), "4m 10s");
        assert_eq!(format_time(32), "32s");
    }
}
