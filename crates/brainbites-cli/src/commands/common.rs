//! Shared service wiring for the CLI commands.
//!
//! Every command opens the same on-disk store and wires the engines with the
//! system clock and a stderr notifier, so notifications never corrupt the
//! JSON the commands print on stdout.

use std::rc::Rc;

use brainbites_core::clock::{Clock, SystemClock};
use brainbites_core::notify::Notifier;
use brainbites_core::storage::SqliteStore;
use brainbites_core::timer::format_time;
use brainbites_core::{GoalsEngine, KvStore, ScoreEngine, TimerEngine};

/// Prints notification signals to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn time_low(&self, minutes_remaining: u32) {
        eprintln!("[notify] time low: {minutes_remaining} min remaining");
    }

    fn time_depleted(&self) {
        eprintln!("[notify] screen time depleted");
    }

    fn streak_milestone(&self, streak: u32) {
        eprintln!("[notify] streak milestone: {streak} in a row");
    }

    fn goal_completed(&self, title: &str, reward: &str) {
        eprintln!("[notify] goal completed: {title} ({reward})");
    }

    fn timer_update(&self, available_seconds: i64, is_negative: bool) {
        let sign = if is_negative { "-" } else { "" };
        eprintln!("[timer] {sign}{}", format_time(available_seconds.abs()));
    }
}

/// The three ports every engine is constructed from.
pub struct Services {
    pub store: Rc<dyn KvStore>,
    pub clock: Rc<dyn Clock>,
    pub notifier: Rc<dyn Notifier>,
}

impl Services {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let store = SqliteStore::open()?;
        Ok(Self {
            store: Rc::new(store),
            clock: Rc::new(SystemClock),
            notifier: Rc::new(ConsoleNotifier),
        })
    }

    pub fn timer(&self) -> TimerEngine {
        TimerEngine::load(self.store.clone(), self.clock.clone(), self.notifier.clone())
    }

    pub fn score(&self) -> ScoreEngine {
        ScoreEngine::load(self.store.clone(), self.clock.clone(), self.notifier.clone())
    }

    pub fn goals(&self, per_day: usize) -> GoalsEngine {
        GoalsEngine::load(self.store.clone(), self.clock.clone(), self.notifier.clone())
            .with_goals_per_day(per_day)
    }
}
