//! Quiz session orchestrator.
//!
//! Turns one answered question into exactly one ordered sequence of engine
//! updates: score first, then timer, then goals, so goal progress always
//! reads the already-updated streak and balance. The session itself owns no
//! persisted state; everything durable lives in the engines it borrows.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::config::RewardsConfig;
use crate::goals::{GoalsEngine, ProgressEvent};
use crate::quiz::bank::{Choice, Difficulty, Question, QuestionBank};
use crate::score::ScoreEngine;
use crate::timer::TimerEngine;

/// No question in the bank matches even the fully relaxed filters.
#[derive(Debug, Error)]
#[error("question bank has no questions left")]
pub struct BankExhausted;

/// Where the session currently is in its presenting/answering cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A question is on display, waiting for an answer.
    Presenting,
    /// The current question was answered; waiting for `advance`.
    Answered,
    /// `finish` was called; the session accepts no further input.
    Finished,
}

/// What one answer produced, for display.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_choice: Choice,
    pub explanation: String,
    pub points_earned: u32,
    pub seconds_earned: u64,
    pub current_streak: u32,
    pub streak_milestone: bool,
}

/// End-of-session totals.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SessionSummary {
    pub questions_answered: u32,
    pub correct_answers: u32,
    /// Rounded percentage; 0 when nothing was answered.
    pub accuracy: u32,
    pub points_earned: u32,
    pub seconds_earned: u64,
}

/// One quiz session over borrowed engines.
///
/// The caller drives the loop: `next_question`, `answer`, repeat, then
/// `finish`. Session-scoped goal events (categories played, the session
/// completion itself) are withheld until `finish`, which is idempotent.
pub struct QuizSession<'a> {
    bank: &'a mut dyn QuestionBank,
    score: &'a mut ScoreEngine,
    timer: &'a mut TimerEngine,
    goals: &'a mut GoalsEngine,
    rewards: RewardsConfig,
    category: Option<String>,
    difficulty: Option<Difficulty>,
    state: SessionState,
    current: Option<Question>,
    questions_answered: u32,
    correct_answers: u32,
    points_earned: u32,
    seconds_earned: u64,
    categories_played: BTreeSet<String>,
    difficulties_played: BTreeSet<String>,
}

impl<'a> QuizSession<'a> {
    pub fn new(
        bank: &'a mut dyn QuestionBank,
        score: &'a mut ScoreEngine,
        timer: &'a mut TimerEngine,
        goals: &'a mut GoalsEngine,
        rewards: RewardsConfig,
        category: Option<String>,
        difficulty: Option<Difficulty>,
    ) -> Self {
        Self {
            bank,
            score,
            timer,
            goals,
            rewards,
            category,
            difficulty,
            state: SessionState::Presenting,
            current: None,
            questions_answered: 0,
            correct_answers: 0,
            points_earned: 0,
            seconds_earned: 0,
            categories_played: BTreeSet::new(),
            difficulties_played: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    /// Draw the next question into the presenting slot.
    ///
    /// Filters relax in order when nothing matches: drop the difficulty
    /// first, then the category. Only a fully empty bank is an error.
    pub fn next_question(&mut self) -> Result<&Question, BankExhausted> {
        assert_ne!(self.state, SessionState::Finished, "session already finished");

        let category = self.category.clone();
        let question = self
            .bank
            .pick(category.as_deref(), self.difficulty)
            .or_else(|| {
                debug!("relaxing difficulty filter");
                self.bank.pick(category.as_deref(), None)
            })
            .or_else(|| {
                debug!("relaxing category filter");
                self.bank.pick(None, None)
            })
            .ok_or(BankExhausted)?;

        self.current = Some(question);
        self.state = SessionState::Presenting;
        Ok(self.current.as_ref().unwrap())
    }

    /// Score the answer to the current question and run the engine cascade.
    ///
    /// Panics if no question is presenting; the caller owns the loop shape.
    pub fn answer(&mut self, choice: Choice) -> AnswerOutcome {
        assert_eq!(self.state, SessionState::Presenting, "no question presenting");
        let question = self.current.take().expect("presenting state has a question");

        self.questions_answered += 1;
        self.categories_played.insert(question.category.clone());
        self.difficulties_played.insert(question.level.to_string());

        let correct = choice == question.correct;
        let outcome = if correct {
            self.correct_answers += 1;
            let result = self.score.record_correct_answer(self.rewards.base_points);
            let milestone = ScoreEngine::is_streak_milestone(result.current_streak);

            let mut seconds = self.rewards.correct_answer_seconds;
            if milestone {
                seconds += self.rewards.streak_milestone_seconds;
            }
            self.timer.add_earned_time(seconds);

            self.points_earned += result.points_earned;
            self.seconds_earned += seconds;

            self.goals.record_event(&ProgressEvent::QuestionAnswered);
            self.goals.record_event(&ProgressEvent::CorrectAnswer);
            self.goals.record_event(&ProgressEvent::TimeEarned { seconds });
            self.goals.record_event(&ProgressEvent::StreakReached {
                streak: result.current_streak,
            });
            if milestone {
                self.goals.record_event(&ProgressEvent::StreakMilestone {
                    streak: result.current_streak,
                });
            }

            AnswerOutcome {
                correct: true,
                correct_choice: question.correct,
                explanation: question.explanation,
                points_earned: result.points_earned,
                seconds_earned: seconds,
                current_streak: result.current_streak,
                streak_milestone: milestone,
            }
        } else {
            self.score.record_wrong_answer();
            self.goals.record_event(&ProgressEvent::QuestionAnswered);

            AnswerOutcome {
                correct: false,
                correct_choice: question.correct,
                explanation: question.explanation,
                points_earned: 0,
                seconds_earned: 0,
                current_streak: 0,
                streak_milestone: false,
            }
        };

        self.state = SessionState::Answered;
        outcome
    }

    /// Close the session and flush the session-scoped goal events.
    ///
    /// Idempotent: a second call returns the same summary without
    /// re-recording anything.
    pub fn finish(&mut self) -> SessionSummary {
        let summary = self.summary();
        if self.state == SessionState::Finished {
            return summary;
        }
        self.state = SessionState::Finished;
        self.current = None;

        if summary.questions_answered == 0 {
            return summary;
        }

        for category in &self.categories_played {
            self.goals.record_event(&ProgressEvent::CategoryPlayed {
                category: category.clone(),
            });
        }
        for difficulty in &self.difficulties_played {
            self.goals.record_event(&ProgressEvent::DifficultyPlayed {
                difficulty: difficulty.clone(),
            });
        }
        self.goals.record_event(&ProgressEvent::SessionCompleted {
            questions: summary.questions_answered,
            accuracy: summary.accuracy,
        });
        summary
    }

    fn summary(&self) -> SessionSummary {
        let accuracy = if self.questions_answered > 0 {
            (self.correct_answers as f64 / self.questions_answered as f64 * 100.0).round() as u32
        } else {
            0
        };
        SessionSummary {
            questions_answered: self.questions_answered,
            correct_answers: self.correct_answers,
            accuracy,
            points_earned: self.points_earned,
            seconds_earned: self.seconds_earned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::testing::RecordingNotifier;
    use crate::quiz::bank::InMemoryBank;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::rc::Rc;

    struct World {
        bank: InMemoryBank,
        score: ScoreEngine,
        timer: TimerEngine,
        goals: GoalsEngine,
        notifier: Rc<RecordingNotifier>,
    }

    fn world() -> World {
        let store = Rc::new(MemoryStore::new());
        let clock = Rc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let notifier = Rc::new(RecordingNotifier::new());
        let clock: Rc<dyn crate::clock::Clock> = clock;
        let notifier_dyn: Rc<dyn crate::notify::Notifier> = notifier.clone();
        World {
            bank: InMemoryBank::with_defaults(store.clone()).with_seed(3),
            score: ScoreEngine::load(store.clone(), clock.clone(), notifier_dyn.clone()),
            timer: TimerEngine::load(store.clone(), clock.clone(), notifier_dyn.clone()),
            goals: GoalsEngine::load(store, clock, notifier_dyn).with_seed(1),
            notifier,
        }
    }

    fn rewards() -> RewardsConfig {
        RewardsConfig {
            base_points: 10,
            correct_answer_seconds: 30,
            streak_milestone_seconds: 120,
            ad_bonus_seconds: 300,
        }
    }

    fn session(world: &mut World) -> QuizSession<'_> {
        QuizSession::new(
            &mut world.bank,
            &mut world.score,
            &mut world.timer,
            &mut world.goals,
            rewards(),
            None,
            None,
        )
    }

    #[test]
    fn correct_answer_credits_points_and_time() {
        let mut world = world();
        let mut session = session(&mut world);
        let question = session.next_question().unwrap().clone();
        let outcome = session.answer(question.correct);
        assert!(outcome.correct);
        assert_eq!(outcome.points_earned, 10);
        assert_eq!(outcome.seconds_earned, 30);
        assert_eq!(outcome.current_streak, 1);
        drop(session);
        assert_eq!(world.timer.available_seconds(), 30);
        assert_eq!(world.score.score_info().total_score, 10);
    }

    #[test]
    fn wrong_answer_earns_nothing_and_resets_streak() {
        let mut world = world();
        let mut session = session(&mut world);
        let question = session.next_question().unwrap().clone();
        let correct = question.correct;
        session.answer(correct);

        let question = session.next_question().unwrap().clone();
        let wrong = if question.correct == Choice::A {
            Choice::B
        } else {
            Choice::A
        };
        let outcome = session.answer(wrong);
        assert!(!outcome.correct);
        assert_eq!(outcome.seconds_earned, 0);
        assert_eq!(outcome.current_streak, 0);
        drop(session);
        assert_eq!(world.timer.available_seconds(), 30);
    }

    #[test]
    fn fifth_correct_answer_is_a_milestone() {
        let mut world = world();
        let mut session = session(&mut world);
        let mut last = None;
        for _ in 0..5 {
            let q = session.next_question().unwrap().clone();
            last = Some(session.answer(q.correct));
        }
        let outcome = last.unwrap();
        assert!(outcome.streak_milestone);
        assert_eq!(outcome.current_streak, 5);
        // Streak 5 earns 10 + 4 * 2 points and 30 + 120 seconds.
        assert_eq!(outcome.points_earned, 18);
        assert_eq!(outcome.seconds_earned, 150);
        drop(session);
        // 4 * 30 + 150.
        assert_eq!(world.timer.available_seconds(), 270);
        assert!(world
            .notifier
            .take()
            .contains(&"streak_milestone:5".to_string()));
    }

    #[test]
    fn filters_relax_rather_than_fail() {
        let mut world = world();
        let mut session = QuizSession::new(
            &mut world.bank,
            &mut world.score,
            &mut world.timer,
            &mut world.goals,
            rewards(),
            Some("Philosophy".to_string()),
            Some(Difficulty::Hard),
        );
        // Nothing matches the category, so the pick falls through to the
        // whole bank instead of erroring.
        assert!(session.next_question().is_ok());
    }

    #[test]
    fn finish_reports_accuracy_and_is_idempotent() {
        let mut world = world();
        let mut session = session(&mut world);
        for i in 0..4 {
            let q = session.next_question().unwrap().clone();
            let choice = if i < 3 {
                q.correct
            } else if q.correct == Choice::A {
                Choice::B
            } else {
                Choice::A
            };
            session.answer(choice);
        }
        let summary = session.finish();
        assert_eq!(summary.questions_answered, 4);
        assert_eq!(summary.correct_answers, 3);
        assert_eq!(summary.accuracy, 75);
        let again = session.finish();
        assert_eq!(again.questions_answered, 4);
        drop(session);
        // Goal counters saw each question exactly once.
        let stats = world.score.score_info();
        assert_eq!(stats.questions_answered, 4);
    }

    #[test]
    fn finish_emits_one_event_per_distinct_category() {
        let mut world = world();
        let mut session = QuizSession::new(
            &mut world.bank,
            &mut world.score,
            &mut world.timer,
            &mut world.goals,
            rewards(),
            Some("Science".to_string()),
            None,
        );
        for _ in 0..3 {
            let q = session.next_question().unwrap().clone();
            session.answer(q.correct);
        }
        let summary = session.finish();
        assert_eq!(summary.correct_answers, 3);
        assert_eq!(session.categories_played.len(), 1);
    }

    #[test]
    fn empty_session_finish_records_nothing() {
        let mut world = world();
        let mut session = session(&mut world);
        let summary = session.finish();
        assert_eq!(summary.questions_answered, 0);
        assert_eq!(summary.accuracy, 0);
        drop(session);
        assert_eq!(world.score.score_info().questions_answered, 0);
    }
}
