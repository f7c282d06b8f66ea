//! Daily goals engine.
//!
//! Selects three goals from the catalog each calendar day, accumulates
//! per-goal progress from [`ProgressEvent`]s, and handles one-time reward
//! claiming that deposits time back into the timer engine.
//!
//! The selection is persisted eagerly the moment it is rolled; the only
//! re-roll trigger is the absence of a selection for today's day key, so a
//! mid-day re-initialization can never swap goals the user already has
//! progress against.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use chrono::Timelike;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{day_key, Clock};
use crate::goals::catalog::{self, GoalDefinition, ProgressKind};
use crate::goals::ProgressEvent;
use crate::notify::Notifier;
use crate::storage::{keys, KvStore};
use crate::timer::TimerEngine;

/// Sessions completed strictly before this hour count as morning sessions.
const MORNING_CUTOFF_HOUR: u32 = 10;
/// A perfect session needs at least this many questions.
const PERFECT_SESSION_MIN_QUESTIONS: u32 = 10;
/// Streak length a milestone must reach to count toward milestone-count goals.
const MILESTONE_COUNT_FLOOR: u32 = 5;

fn schema_version() -> u32 {
    1
}

/// Persisted selection: which goals are active for which day.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SelectionData {
    #[serde(default = "schema_version")]
    version: u32,
    day_key: Option<String>,
    goal_ids: Vec<String>,
}

/// Per-day, per-goal mutable progress.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoalProgress {
    /// Numeric accumulator, or the label set's cardinality for the
    /// "played" kinds.
    pub current: u32,
    /// One-way false -> true.
    pub completed: bool,
    /// One-way false -> true; only settable once completed.
    pub claimed: bool,
    /// Distinct labels seen, for set-cardinality kinds. Repeats of the
    /// same label must not double count.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
}

/// A goal definition joined with today's progress.
#[derive(Debug, Clone, Serialize)]
pub struct GoalStatus {
    #[serde(flatten)]
    pub definition: &'static GoalDefinition,
    pub progress: GoalProgress,
}

/// Completion summary across today's goals.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    pub claimed: usize,
    pub percentage: u32,
}

/// Daily goals engine. Exclusively owns [`keys::DAILY_GOALS`] and
/// [`keys::DAILY_GOALS_PROGRESS`].
pub struct GoalsEngine {
    selection: SelectionData,
    progress: BTreeMap<String, GoalProgress>,
    goals_per_day: usize,
    seed: Option<u64>,
    store: Rc<dyn KvStore>,
    clock: Rc<dyn Clock>,
    notifier: Rc<dyn Notifier>,
}

impl GoalsEngine {
    /// Load persisted selection and progress; each blob is independently
    /// guarded, so one corrupted key cannot take the other down.
    pub fn load(store: Rc<dyn KvStore>, clock: Rc<dyn Clock>, notifier: Rc<dyn Notifier>) -> Self {
        let selection = match store.get(keys::DAILY_GOALS) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("discarding unreadable goal selection: {e}");
                SelectionData::default()
            }),
            Ok(None) => SelectionData::default(),
            Err(e) => {
                warn!("failed to read goal selection: {e}");
                SelectionData::default()
            }
        };
        let progress = match store.get(keys::DAILY_GOALS_PROGRESS) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("discarding unreadable goal progress: {e}");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("failed to read goal progress: {e}");
                BTreeMap::new()
            }
        };
        Self {
            selection,
            progress,
            goals_per_day: 3,
            seed: None,
            store,
            clock,
            notifier,
        }
    }

    /// Override the number of goals drawn per day.
    pub fn with_goals_per_day(mut self, per_day: usize) -> Self {
        self.goals_per_day = per_day;
        self
    }

    /// Fix the selection RNG seed, for reproducible draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Ensure a selection exists for today. Idempotent once selected:
    /// calling again the same day never re-rolls.
    pub fn select_todays_goals(&mut self) {
        let today = day_key(self.clock.now());
        if self.selection.day_key.as_deref() == Some(today.as_str())
            && !self.selection.goal_ids.is_empty()
        {
            return;
        }
        debug!("selecting daily goals for {today}");

        let mut rng = match self.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        let picked: Vec<String> = catalog::catalog()
            .choose_multiple(&mut rng, self.goals_per_day)
            .map(|g| g.id.to_string())
            .collect();

        self.progress = picked
            .iter()
            .map(|id| (id.clone(), GoalProgress::default()))
            .collect();
        self.selection = SelectionData {
            version: schema_version(),
            day_key: Some(today),
            goal_ids: picked,
        };
        self.persist();
    }

    /// Fan an event out to today's active goals. Returns whether any
    /// goal's state changed. Fires the goal-completed notification exactly
    /// once per goal, on the accumulation that first reaches its target.
    pub fn record_event(&mut self, event: &ProgressEvent) -> bool {
        self.select_todays_goals();

        let mut changed = false;
        for id in self.selection.goal_ids.clone() {
            let Some(def) = catalog::find(&id) else {
                continue;
            };
            let progress = self.progress.entry(id).or_default();
            if progress.completed {
                continue;
            }
            if !apply_event(def.kind, def.target, event, progress, &*self.clock) {
                continue;
            }
            changed = true;
            if progress.current >= def.target {
                progress.completed = true;
                self.notifier.goal_completed(def.title, def.reward);
            }
        }
        if changed {
            self.persist();
        }
        changed
    }

    /// Claim a completed goal's reward, depositing it into the timer.
    ///
    /// Returns false without side effects unless the goal is completed and
    /// unclaimed -- a double claim is a silent no-op, not an error.
    pub fn claim_reward(&mut self, goal_id: &str, timer: &mut TimerEngine) -> bool {
        self.select_todays_goals();

        let Some(def) = catalog::find(goal_id) else {
            return false;
        };
        let Some(progress) = self.progress.get_mut(goal_id) else {
            return false;
        };
        if !progress.completed || progress.claimed {
            return false;
        }
        timer.add_earned_time(def.reward_seconds);
        progress.claimed = true;
        self.persist();
        true
    }

    /// Today's three goals joined with their progress.
    pub fn todays_goals(&mut self) -> Vec<GoalStatus> {
        self.select_todays_goals();
        self.selection
            .goal_ids
            .iter()
            .filter_map(|id| catalog::find(id))
            .map(|def| GoalStatus {
                definition: def,
                progress: self.progress.get(def.id).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub fn completion_stats(&mut self) -> CompletionStats {
        self.select_todays_goals();
        let total = self.selection.goal_ids.len();
        let completed = self.progress.values().filter(|p| p.completed).count();
        let claimed = self.progress.values().filter(|p| p.claimed).count();
        let percentage = if total > 0 {
            (completed as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };
        CompletionStats {
            total,
            completed,
            claimed,
            percentage,
        }
    }

    /// Drop today's selection and roll a fresh one.
    pub fn reroll(&mut self) {
        self.selection = SelectionData::default();
        self.progress.clear();
        self.select_todays_goals();
    }

    fn persist(&self) {
        match serde_json::to_string(&self.selection) {
            Ok(json) => {
                if let Err(e) = self.store.set(keys::DAILY_GOALS, &json) {
                    warn!("failed to persist goal selection: {e}");
                }
            }
            Err(e) => warn!("failed to serialize goal selection: {e}"),
        }
        match serde_json::to_string(&self.progress) {
            Ok(json) => {
                if let Err(e) = self.store.set(keys::DAILY_GOALS_PROGRESS, &json) {
                    warn!("failed to persist goal progress: {e}");
                }
            }
            Err(e) => warn!("failed to serialize goal progress: {e}"),
        }
    }
}

/// Kind-specific accumulation. Returns whether the progress changed.
fn apply_event(
    kind: ProgressKind,
    target: u32,
    event: &ProgressEvent,
    progress: &mut GoalProgress,
    clock: &dyn Clock,
) -> bool {
    match (kind, event) {
        (ProgressKind::QuestionsAnswered, ProgressEvent::QuestionAnswered) => {
            progress.current += 1;
            true
        }
        (ProgressKind::CorrectAnswers, ProgressEvent::CorrectAnswer) => {
            progress.current += 1;
            true
        }
        (ProgressKind::StreakReached, ProgressEvent::StreakReached { streak }) => {
            if *streak >= target {
                progress.current = target;
                true
            } else {
                false
            }
        }
        (ProgressKind::StreakMilestoneCount, ProgressEvent::StreakMilestone { streak }) => {
            if *streak >= MILESTONE_COUNT_FLOOR {
                progress.current += 1;
                true
            } else {
                false
            }
        }
        (ProgressKind::CategoriesPlayed, ProgressEvent::CategoryPlayed { category }) => {
            progress.labels.insert(category.clone());
            progress.current = progress.labels.len() as u32;
            true
        }
        (ProgressKind::DifficultiesPlayed, ProgressEvent::DifficultyPlayed { difficulty }) => {
            progress.labels.insert(difficulty.clone());
            progress.current = progress.labels.len() as u32;
            true
        }
        (ProgressKind::TimeEarned, ProgressEvent::TimeEarned { seconds }) => {
            if *seconds > 0 {
                progress.current += *seconds as u32;
                true
            } else {
                false
            }
        }
        (
            ProgressKind::PerfectSession,
            ProgressEvent::SessionCompleted {
                questions,
                accuracy,
            },
        ) => {
            if *accuracy == 100 && *questions >= PERFECT_SESSION_MIN_QUESTIONS {
                progress.current = 1;
                true
            } else {
                false
            }
        }
        (ProgressKind::MorningSession, ProgressEvent::SessionCompleted { .. }) => {
            if clock.now().hour() < MORNING_CUTOFF_HOUR {
                progress.current = 1;
                true
            } else {
                false
            }
        }
        _ => false,
    }
}
