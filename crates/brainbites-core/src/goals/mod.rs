mod catalog;
mod engine;

pub use catalog::{catalog, GoalDefinition, ProgressKind};
pub use engine::{CompletionStats, GoalProgress, GoalStatus, GoalsEngine};

/// One observed unit of quiz activity, fanned out to whichever active
/// goals care about it.
///
/// A closed set: each variant carries exactly the metadata its progress
/// kind needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A question was answered, right or wrong.
    QuestionAnswered,
    /// A question was answered correctly.
    CorrectAnswer,
    /// The streak counter reached a new value (already updated by the
    /// score engine before this event is recorded).
    StreakReached { streak: u32 },
    /// The streak landed exactly on a milestone value.
    StreakMilestone { streak: u32 },
    /// A question from this category was played this session.
    CategoryPlayed { category: String },
    /// A question at this difficulty was played this session.
    DifficultyPlayed { difficulty: String },
    /// Screen time was credited.
    TimeEarned { seconds: u64 },
    /// A quiz session ended.
    SessionCompleted { questions: u32, accuracy: u32 },
}
