//! The fixed daily goal catalog.
//!
//! Ten templates; three are drawn uniformly without replacement each day.

use serde::{Deserialize, Serialize};

/// How a goal's `current` value accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// Count of answered questions.
    QuestionsAnswered,
    /// Count of correct answers.
    CorrectAnswers,
    /// Reached a streak of at least the target length.
    StreakReached,
    /// Count of streak milestones hit.
    StreakMilestoneCount,
    /// Cardinality of the set of distinct categories played.
    CategoriesPlayed,
    /// Cardinality of the set of distinct difficulties played.
    DifficultiesPlayed,
    /// Sum of screen-time seconds earned.
    TimeEarned,
    /// A session of at least 10 questions at 100% accuracy.
    PerfectSession,
    /// A session completed before 10:00.
    MorningSession,
}

/// Static goal template. Only ids are persisted; definitions are always
/// rejoined from this catalog, so the template itself is serialize-only.
#[derive(Debug, Clone, Serialize)]
pub struct GoalDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub target: u32,
    pub kind: ProgressKind,
    pub reward: &'static str,
    pub reward_seconds: u64,
}

/// The full catalog of possible daily goals.
pub fn catalog() -> &'static [GoalDefinition] {
    &[
        GoalDefinition {
            id: "answer_15",
            title: "Knowledge Seeker",
            description: "Answer 15 questions",
            target: 15,
            kind: ProgressKind::QuestionsAnswered,
            reward: "1 hour of extra screen time",
            reward_seconds: 3600,
        },
        GoalDefinition {
            id: "streak_10",
            title: "Streak Master",
            description: "Get a 10 question streak",
            target: 10,
            kind: ProgressKind::StreakReached,
            reward: "1 hour of extra screen time",
            reward_seconds: 3600,
        },
        GoalDefinition {
            id: "answer_25",
            title: "Quiz Champion",
            description: "Answer 25 questions",
            target: 25,
            kind: ProgressKind::QuestionsAnswered,
            reward: "90 minutes of extra screen time",
            reward_seconds: 5400,
        },
        GoalDefinition {
            id: "correct_20",
            title: "Accuracy Expert",
            description: "Get 20 correct answers",
            target: 20,
            kind: ProgressKind::CorrectAnswers,
            reward: "75 minutes of extra screen time",
            reward_seconds: 4500,
        },
        GoalDefinition {
            id: "streak_5_twice",
            title: "Consistent Learner",
            description: "Get two 5+ question streaks",
            target: 2,
            kind: ProgressKind::StreakMilestoneCount,
            reward: "45 minutes of extra screen time",
            reward_seconds: 2700,
        },
        GoalDefinition {
            id: "play_3_categories",
            title: "Well Rounded",
            description: "Play in 3 different categories",
            target: 3,
            kind: ProgressKind::CategoriesPlayed,
            reward: "1 hour of extra screen time",
            reward_seconds: 3600,
        },
        GoalDefinition {
            id: "perfect_quiz",
            title: "Perfect Score",
            description: "Complete a quiz with 100% accuracy (min 10 questions)",
            target: 1,
            kind: ProgressKind::PerfectSession,
            reward: "2 hours of extra screen time",
            reward_seconds: 7200,
        },
        GoalDefinition {
            id: "earn_30_min",
            title: "Time Builder",
            description: "Earn 30 minutes of screen time",
            target: 1800,
            kind: ProgressKind::TimeEarned,
            reward: "30 bonus minutes",
            reward_seconds: 1800,
        },
        GoalDefinition {
            id: "morning_session",
            title: "Early Bird",
            description: "Complete a quiz before 10 AM",
            target: 1,
            kind: ProgressKind::MorningSession,
            reward: "45 minutes of extra screen time",
            reward_seconds: 2700,
        },
        GoalDefinition {
            id: "difficulty_master",
            title: "Difficulty Master",
            description: "Play all 3 difficulty levels",
            target: 3,
            kind: ProgressKind::DifficultiesPlayed,
            reward: "1 hour of extra screen time",
            reward_seconds: 3600,
        },
    ]
}

/// Look up a catalog entry by id.
pub(crate) fn find(id: &str) -> Option<&'static GoalDefinition> {
    catalog().iter().find(|g| g.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn catalog_has_ten_distinct_entries() {
        let ids: BTreeSet<_> = catalog().iter().map(|g| g.id).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(catalog().len(), 10);
    }

    #[test]
    fn every_entry_has_a_positive_target_and_reward() {
        for goal in catalog() {
            assert!(goal.target > 0, "{}", goal.id);
            assert!(goal.reward_seconds > 0, "{}", goal.id);
        }
    }
}
