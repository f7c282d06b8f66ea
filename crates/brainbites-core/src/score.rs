//! Score engine: cumulative and per-day quiz performance.
//!
//! Owns the total/daily score, the answer streak, and the answer counters.
//! Wrong answers are free -- the only way to lose points is overtime past
//! the grace buffer, fed by a snapshot of the timer engine's balance.
//!
//! The daily rollover is detected lazily on access, never by a background
//! timer: every read or mutation first compares the stored day key against
//! the injected clock.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{day_key, Clock};
use crate::notify::Notifier;
use crate::storage::{keys, KvStore};
use crate::timer::OVERTIME_BUFFER_SECONDS;

/// Exact streak lengths that trigger a bonus and a notification.
///
/// Closed set, exact match only: a streak of 11 is not a milestone.
pub const STREAK_MILESTONES: [u32; 8] = [5, 10, 15, 20, 25, 30, 50, 100];

/// One point is deducted per this many seconds of overtime past the buffer.
const PENALTY_INTERVAL_SECONDS: i64 = 120;

/// Streak bonus is `min(streak - 1, 10) * 2`, so it caps at +20 points.
const STREAK_BONUS_CAP: u32 = 10;

fn schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScoreData {
    #[serde(default = "schema_version")]
    version: u32,
    total_score: u32,
    daily_score: u32,
    current_streak: u32,
    highest_streak: u32,
    questions_answered: u32,
    correct_answers: u32,
    wrong_answers: u32,
    last_reset_date: Option<String>,
    /// Points already deducted for the current overtime window. Makes
    /// `apply_overtime_penalty` idempotent however often the tick calls it.
    #[serde(default)]
    penalized_overtime_points: u32,
}

impl Default for ScoreData {
    fn default() -> Self {
        Self {
            version: schema_version(),
            total_score: 0,
            daily_score: 0,
            current_streak: 0,
            highest_streak: 0,
            questions_answered: 0,
            correct_answers: 0,
            wrong_answers: 0,
            last_reset_date: None,
            penalized_overtime_points: 0,
        }
    }
}

/// Result of recording a correct answer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CorrectAnswer {
    pub points_earned: u32,
    pub current_streak: u32,
    pub is_new_high_streak: bool,
}

/// Result of recording a wrong answer. `points_lost` is always zero.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WrongAnswer {
    pub streak_lost: u32,
    pub points_lost: u32,
}

/// Snapshot handed back when a day boundary is crossed.
#[derive(Debug, Clone, Serialize)]
pub struct DayRollover {
    pub yesterday_score: u32,
    pub day_key: String,
}

/// Read-only projection of the score record.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreInfo {
    pub total_score: u32,
    pub daily_score: u32,
    pub current_streak: u32,
    pub highest_streak: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    /// Rounded percentage; 0 when no questions have been answered.
    pub accuracy: u32,
}

/// [`ScoreInfo`] plus derived statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    #[serde(flatten)]
    pub info: ScoreInfo,
    pub average_points_per_question: u32,
}

/// Score engine. Exclusively owns [`keys::SCORE_DATA`].
pub struct ScoreEngine {
    data: ScoreData,
    store: Rc<dyn KvStore>,
    clock: Rc<dyn Clock>,
    notifier: Rc<dyn Notifier>,
}

impl ScoreEngine {
    /// Load persisted state, falling back to a zeroed default if the blob
    /// is missing or unreadable.
    pub fn load(store: Rc<dyn KvStore>, clock: Rc<dyn Clock>, notifier: Rc<dyn Notifier>) -> Self {
        let data = match store.get(keys::SCORE_DATA) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("discarding unreadable score data: {e}");
                ScoreData::default()
            }),
            Ok(None) => ScoreData::default(),
            Err(e) => {
                warn!("failed to read score data: {e}");
                ScoreData::default()
            }
        };
        let mut engine = Self {
            data,
            store,
            clock,
            notifier,
        };
        engine.ensure_daily_rollover();
        engine
    }

    /// True iff `streak` is exactly one of the milestone values.
    pub fn is_streak_milestone(streak: u32) -> bool {
        STREAK_MILESTONES.contains(&streak)
    }

    /// Record a correct answer. Must be called exactly once per correct
    /// answer. Fires the streak-milestone notification when the new streak
    /// lands exactly on a milestone.
    pub fn record_correct_answer(&mut self, base_points: u32) -> CorrectAnswer {
        self.ensure_daily_rollover();

        self.data.questions_answered += 1;
        self.data.correct_answers += 1;
        self.data.current_streak += 1;

        let mut points = base_points;
        if self.data.current_streak > 1 {
            points += (self.data.current_streak - 1).min(STREAK_BONUS_CAP) * 2;
        }
        self.data.total_score += points;
        self.data.daily_score += points;

        if self.data.current_streak > self.data.highest_streak {
            self.data.highest_streak = self.data.current_streak;
        }
        if Self::is_streak_milestone(self.data.current_streak) {
            self.notifier.streak_milestone(self.data.current_streak);
        }
        self.persist();

        CorrectAnswer {
            points_earned: points,
            current_streak: self.data.current_streak,
            is_new_high_streak: self.data.current_streak == self.data.highest_streak,
        }
    }

    /// Record a wrong answer: the streak resets, no points are lost.
    pub fn record_wrong_answer(&mut self) -> WrongAnswer {
        self.ensure_daily_rollover();

        self.data.questions_answered += 1;
        self.data.wrong_answers += 1;
        let streak_lost = self.data.current_streak;
        self.data.current_streak = 0;
        self.persist();

        WrongAnswer {
            streak_lost,
            points_lost: 0,
        }
    }

    /// Deduct points for overtime past the grace buffer.
    ///
    /// `available_seconds` is a snapshot of the timer engine's balance.
    /// One point per full [`PENALTY_INTERVAL_SECONDS`] past the buffer,
    /// floor-clamped at zero on both scores. Only the delta against the
    /// already-penalized window is deducted, so calling this every tick
    /// never over-penalizes; the window resets once the balance is
    /// non-negative again. Returns the points deducted by this call.
    pub fn apply_overtime_penalty(&mut self, available_seconds: i64) -> u32 {
        self.ensure_daily_rollover();

        if available_seconds >= 0 {
            if self.data.penalized_overtime_points != 0 {
                self.data.penalized_overtime_points = 0;
                self.persist();
            }
            return 0;
        }

        let effective_overtime = (-available_seconds - OVERTIME_BUFFER_SECONDS).max(0);
        let window_points = (effective_overtime / PENALTY_INTERVAL_SECONDS) as u32;
        let delta = window_points.saturating_sub(self.data.penalized_overtime_points);
        if delta == 0 {
            return 0;
        }

        self.data.total_score = self.data.total_score.saturating_sub(delta);
        self.data.daily_score = self.data.daily_score.saturating_sub(delta);
        self.data.penalized_overtime_points = window_points;
        self.persist();
        delta
    }

    /// Compare the stored day key against today and reset per-day state on
    /// a boundary crossing. Returns yesterday's snapshot when it fired.
    pub fn ensure_daily_rollover(&mut self) -> Option<DayRollover> {
        let today = day_key(self.clock.now());
        if self.data.last_reset_date.as_deref() == Some(today.as_str()) {
            return None;
        }
        debug!("score rollover to {today}");
        let yesterday_score = self.data.daily_score;
        self.data.daily_score = 0;
        self.data.penalized_overtime_points = 0;
        self.data.last_reset_date = Some(today.clone());
        self.persist();
        Some(DayRollover {
            yesterday_score,
            day_key: today,
        })
    }

    pub fn score_info(&mut self) -> ScoreInfo {
        self.ensure_daily_rollover();
        let accuracy = if self.data.questions_answered > 0 {
            (self.data.correct_answers as f64 / self.data.questions_answered as f64 * 100.0).round()
                as u32
        } else {
            0
        };
        ScoreInfo {
            total_score: self.data.total_score,
            daily_score: self.data.daily_score,
            current_streak: self.data.current_streak,
            highest_streak: self.data.highest_streak,
            questions_answered: self.data.questions_answered,
            correct_answers: self.data.correct_answers,
            wrong_answers: self.data.wrong_answers,
            accuracy,
        }
    }

    pub fn statistics(&mut self) -> Statistics {
        let info = self.score_info();
        let average_points_per_question = if info.questions_answered > 0 {
            (info.total_score as f64 / info.questions_answered as f64).round() as u32
        } else {
            0
        };
        Statistics {
            info,
            average_points_per_question,
        }
    }

    pub fn current_streak(&self) -> u32 {
        self.data.current_streak
    }

    /// Zero every field and stamp the reset date to today.
    pub fn reset_all(&mut self) {
        self.data = ScoreData {
            last_reset_date: Some(day_key(self.clock.now())),
            ..ScoreData::default()
        };
        self.persist();
    }

    fn persist(&self) {
        match serde_json::to_string(&self.data) {
            Ok(json) => {
                if let Err(e) = self.store.set(keys::SCORE_DATA, &json) {
                    warn!("failed to persist score data: {e}");
                }
            }
            Err(e) => warn!("failed to serialize score data: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::testing::RecordingNotifier;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn harness() -> (Rc<FixedClock>, Rc<RecordingNotifier>, ScoreEngine) {
        let store = Rc::new(MemoryStore::new());
        let clock = Rc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let notifier = Rc::new(RecordingNotifier::new());
        let engine = ScoreEngine::load(store, clock.clone(), notifier.clone());
        (clock, notifier, engine)
    }

    #[test]
    fn first_correct_answer_earns_base_points() {
        let (_, _, mut engine) = harness();
        let r = engine.record_correct_answer(10);
        assert_eq!(r.points_earned, 10);
        assert_eq!(r.current_streak, 1);
        assert!(r.is_new_high_streak);
    }

    #[test]
    fn streak_bonus_scales_and_caps() {
        let (_, _, mut engine) = harness();
        // Streak 5 earns 10 + min(4, 10) * 2 = 18.
        for _ in 0..4 {
            engine.record_correct_answer(10);
        }
        let r = engine.record_correct_answer(10);
        assert_eq!(r.current_streak, 5);
        assert_eq!(r.points_earned, 18);

        // Far past the cap the bonus stays at +20.
        for _ in 0..20 {
            engine.record_correct_answer(10);
        }
        let r = engine.record_correct_answer(10);
        assert_eq!(r.points_earned, 30);
    }

    #[test]
    fn wrong_answer_resets_streak_keeps_high() {
        let (_, _, mut engine) = harness();
        for _ in 0..7 {
            engine.record_correct_answer(10);
        }
        let r = engine.record_wrong_answer();
        assert_eq!(r.streak_lost, 7);
        assert_eq!(r.points_lost, 0);
        let info = engine.score_info();
        assert_eq!(info.current_streak, 0);
        assert_eq!(info.highest_streak, 7);
        assert_eq!(info.questions_answered, 8);
        assert_eq!(info.wrong_answers, 1);
    }

    #[test]
    fn milestones_are_exact_matches() {
        assert!(ScoreEngine::is_streak_milestone(5));
        assert!(ScoreEngine::is_streak_milestone(100));
        assert!(!ScoreEngine::is_streak_milestone(11));
        assert!(!ScoreEngine::is_streak_milestone(0));
    }

    #[test]
    fn milestone_notification_fires_on_fifth() {
        let (_, notifier, mut engine) = harness();
        for _ in 0..5 {
            engine.record_correct_answer(10);
        }
        let events = notifier.take();
        assert_eq!(
            events
                .iter()
                .filter(|e| e.starts_with("streak_milestone"))
                .count(),
            1
        );
        assert!(events.contains(&"streak_milestone:5".to_string()));
    }

    #[test]
    fn penalty_respects_buffer() {
        let (_, _, mut engine) = harness();
        engine.record_correct_answer(10);
        // Just past the buffer is not yet enough to lose a point.
        assert_eq!(engine.apply_overtime_penalty(-400), 0);
        // 120 s past the buffer loses exactly one.
        assert_eq!(engine.apply_overtime_penalty(-420), 1);
        assert_eq!(engine.score_info().total_score, 9);
    }

    #[test]
    fn penalty_is_idempotent_per_window() {
        let (_, _, mut engine) = harness();
        for _ in 0..3 {
            engine.record_correct_answer(10);
        }
        assert_eq!(engine.apply_overtime_penalty(-420), 1);
        // Same window, repeated ticks: nothing more comes off.
        assert_eq!(engine.apply_overtime_penalty(-420), 0);
        assert_eq!(engine.apply_overtime_penalty(-430), 0);
        // Window deepens by another interval: one more point.
        assert_eq!(engine.apply_overtime_penalty(-540), 1);
        // Balance recovers; a later overtime window penalizes afresh.
        assert_eq!(engine.apply_overtime_penalty(50), 0);
        assert_eq!(engine.apply_overtime_penalty(-420), 1);
    }

    #[test]
    fn penalty_floors_at_zero() {
        let (_, _, mut engine) = harness();
        engine.record_correct_answer(10);
        let deducted = engine.apply_overtime_penalty(-300 - 120 * 1000);
        assert!(deducted >= 10);
        let info = engine.score_info();
        assert_eq!(info.total_score, 0);
        assert_eq!(info.daily_score, 0);
    }

    #[test]
    fn no_penalty_with_positive_balance() {
        let (_, _, mut engine) = harness();
        engine.record_correct_answer(10);
        assert_eq!(engine.apply_overtime_penalty(500), 0);
        assert_eq!(engine.score_info().total_score, 10);
    }

    #[test]
    fn accuracy_rounds_and_handles_empty() {
        let (_, _, mut engine) = harness();
        assert_eq!(engine.score_info().accuracy, 0);
        engine.record_correct_answer(10);
        engine.record_correct_answer(10);
        engine.record_wrong_answer();
        // 2/3 = 66.67 -> 67.
        assert_eq!(engine.score_info().accuracy, 67);
    }

    #[test]
    fn daily_rollover_resets_daily_score_only() {
        let (clock, _, mut engine) = harness();
        engine.record_correct_answer(10);
        assert_eq!(engine.score_info().daily_score, 10);

        clock.advance(Duration::days(1));
        let rollover = engine.ensure_daily_rollover().expect("boundary crossed");
        assert_eq!(rollover.yesterday_score, 10);

        let info = engine.score_info();
        assert_eq!(info.daily_score, 0);
        assert_eq!(info.total_score, 10);
        // Checked lazily: no second rollover the same day.
        assert!(engine.ensure_daily_rollover().is_none());
    }

    #[test]
    fn reset_all_zeroes_and_stamps_today() {
        let (clock, _, mut engine) = harness();
        for _ in 0..5 {
            engine.record_correct_answer(10);
        }
        engine.reset_all();
        let info = engine.score_info();
        assert_eq!(info.total_score, 0);
        assert_eq!(info.highest_streak, 0);
        assert_eq!(info.questions_answered, 0);
        assert_eq!(
            engine.data.last_reset_date.as_deref(),
            Some(day_key(clock.now()).as_str())
        );
    }

    proptest! {
        /// For any interleaving of answers and penalties, the scores never
        /// go negative, the counters stay consistent, and the highest
        /// streak never falls below the current one.
        #[test]
        fn invariants_hold_under_any_sequence(ops in prop::collection::vec(0u8..3, 1..120)) {
            let (_, _, mut engine) = harness();
            for op in ops {
                match op {
                    0 => { engine.record_correct_answer(10); }
                    1 => { engine.record_wrong_answer(); }
                    _ => { engine.apply_overtime_penalty(-450); }
                }
                let info = engine.score_info();
                prop_assert!(info.highest_streak >= info.current_streak);
                prop_assert_eq!(
                    info.questions_answered,
                    info.correct_answers + info.wrong_answers
                );
            }
        }
    }
}
