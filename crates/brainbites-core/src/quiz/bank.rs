//! Question bank port and its in-memory implementation.
//!
//! The bank owns its "don't repeat until exhausted" bookkeeping: picked
//! question ids are remembered (and persisted) until most of the bank has
//! been seen, then recycled. The engines consume the bank as a black box.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{keys, KvStore};

/// Fraction of the bank that may be marked used before the used set resets.
const USED_RECYCLE_RATIO: f64 = 0.8;

/// Question difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        };
        f.write_str(s)
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            other => Err(format!("expected one of A-D, got: {other}")),
        }
    }
}

/// The four option texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

impl Options {
    pub fn get(&self, choice: Choice) -> &str {
        match choice {
            Choice::A => &self.a,
            Choice::B => &self.b,
            Choice::C => &self.c,
            Choice::D => &self.d,
        }
    }
}

/// A single quiz question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub category: String,
    pub prompt: String,
    pub options: Options,
    pub correct: Choice,
    pub explanation: String,
    pub level: Difficulty,
}

/// Question bank port: pick a question matching the given filters.
///
/// `None` filters mean "All" / "Mixed".
pub trait QuestionBank {
    fn categories(&self) -> Vec<String>;
    fn pick(&mut self, category: Option<&str>, difficulty: Option<Difficulty>) -> Option<Question>;
}

fn schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct UsedQuestions {
    #[serde(default = "schema_version")]
    version: u32,
    ids: Vec<u32>,
}

/// In-memory bank over a fixed question list, with persisted used-id
/// bookkeeping. Exclusively owns [`keys::USED_QUESTIONS`].
pub struct InMemoryBank {
    questions: Vec<Question>,
    used: BTreeSet<u32>,
    rng: Mcg128Xsl64,
    store: Rc<dyn KvStore>,
}

impl InMemoryBank {
    /// Build a bank over the given questions, restoring the used-id set
    /// from the store. If most of the bank has already been seen, the used
    /// set is recycled immediately.
    pub fn new(questions: Vec<Question>, store: Rc<dyn KvStore>) -> Self {
        let used: BTreeSet<u32> = match store.get(keys::USED_QUESTIONS) {
            Ok(Some(json)) => serde_json::from_str::<UsedQuestions>(&json)
                .map(|u| u.ids.into_iter().collect())
                .unwrap_or_else(|e| {
                    warn!("discarding unreadable used-question data: {e}");
                    BTreeSet::new()
                }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("failed to read used-question data: {e}");
                BTreeSet::new()
            }
        };
        let mut bank = Self {
            questions,
            used,
            rng: Mcg128Xsl64::from_entropy(),
            store,
        };
        if bank.used.len() as f64 > bank.questions.len() as f64 * USED_RECYCLE_RATIO {
            bank.reset_used();
        }
        bank
    }

    /// Build a bank with the bundled default question set.
    pub fn with_defaults(store: Rc<dyn KvStore>) -> Self {
        Self::new(default_questions(), store)
    }

    /// Fix the pick RNG seed, for reproducible tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mcg128Xsl64::seed_from_u64(seed);
        self
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    fn reset_used(&mut self) {
        debug!("recycling used-question set");
        self.used.clear();
        if let Err(e) = self.store.remove(keys::USED_QUESTIONS) {
            warn!("failed to clear used-question data: {e}");
        }
    }

    fn persist_used(&self) {
        let data = UsedQuestions {
            version: schema_version(),
            ids: self.used.iter().copied().collect(),
        };
        match serde_json::to_string(&data) {
            Ok(json) => {
                if let Err(e) = self.store.set(keys::USED_QUESTIONS, &json) {
                    warn!("failed to persist used-question data: {e}");
                }
            }
            Err(e) => warn!("failed to serialize used-question data: {e}"),
        }
    }

    fn matches(q: &Question, category: Option<&str>, difficulty: Option<Difficulty>) -> bool {
        category.map_or(true, |c| q.category == c) && difficulty.map_or(true, |d| q.level == d)
    }
}

impl QuestionBank for InMemoryBank {
    fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.questions.iter().map(|q| q.category.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    fn pick(&mut self, category: Option<&str>, difficulty: Option<Difficulty>) -> Option<Question> {
        let mut candidates: Vec<usize> = self
            .questions
            .iter()
            .enumerate()
            .filter(|(_, q)| !self.used.contains(&q.id) && Self::matches(q, category, difficulty))
            .map(|(i, _)| i)
            .collect();

        // Everything matching has been seen: recycle and try again.
        if candidates.is_empty() {
            candidates = self
                .questions
                .iter()
                .enumerate()
                .filter(|(_, q)| Self::matches(q, category, difficulty))
                .map(|(i, _)| i)
                .collect();
            if candidates.is_empty() {
                return None;
            }
            self.reset_used();
        }

        let index = *candidates.choose(&mut self.rng)?;
        let question = self.questions[index].clone();
        self.used.insert(question.id);
        self.persist_used();
        Some(question)
    }
}

/// Bundled fallback question set, used when no external bank is supplied.
pub fn default_questions() -> Vec<Question> {
    fn q(
        id: u32,
        category: &str,
        prompt: &str,
        options: [&str; 4],
        correct: Choice,
        explanation: &str,
        level: Difficulty,
    ) -> Question {
        Question {
            id,
            category: category.into(),
            prompt: prompt.into(),
            options: Options {
                a: options[0].into(),
                b: options[1].into(),
                c: options[2].into(),
                d: options[3].into(),
            },
            correct,
            explanation: explanation.into(),
            level,
        }
    }

    vec![
        q(
            1,
            "Science",
            "What is the chemical symbol for water?",
            ["H2O", "CO2", "O2", "NaCl"],
            Choice::A,
            "Water is two hydrogen atoms and one oxygen atom, written H2O.",
            Difficulty::Easy,
        ),
        q(
            2,
            "Math",
            "What is 15% of 200?",
            ["20", "25", "30", "35"],
            Choice::C,
            "15% of 200 = 0.15 x 200 = 30.",
            Difficulty::Medium,
        ),
        q(
            3,
            "History",
            "In which year did World War II end?",
            ["1943", "1944", "1945", "1946"],
            Choice::C,
            "World War II ended in 1945 with the surrender of Japan in August.",
            Difficulty::Easy,
        ),
        q(
            4,
            "Science",
            "Which planet is known as the Red Planet?",
            ["Venus", "Mars", "Jupiter", "Mercury"],
            Choice::B,
            "Iron oxide on its surface gives Mars its reddish appearance.",
            Difficulty::Easy,
        ),
        q(
            5,
            "Geography",
            "What is the capital of Australia?",
            ["Sydney", "Melbourne", "Canberra", "Perth"],
            Choice::C,
            "Canberra was purpose-built as the capital in 1913.",
            Difficulty::Medium,
        ),
        q(
            6,
            "Science",
            "What gas do plants absorb during photosynthesis?",
            ["Oxygen", "Nitrogen", "Carbon dioxide", "Hydrogen"],
            Choice::C,
            "Plants take in carbon dioxide and release oxygen.",
            Difficulty::Easy,
        ),
        q(
            7,
            "Math",
            "What is the square root of 144?",
            ["10", "11", "12", "14"],
            Choice::C,
            "12 x 12 = 144.",
            Difficulty::Easy,
        ),
        q(
            8,
            "History",
            "Who was the first President of the United States?",
            [
                "Thomas Jefferson",
                "George Washington",
                "John Adams",
                "Benjamin Franklin",
            ],
            Choice::B,
            "George Washington served from 1789 to 1797.",
            Difficulty::Easy,
        ),
        q(
            9,
            "Geography",
            "Which is the longest river in the world?",
            ["Amazon", "Nile", "Yangtze", "Mississippi"],
            Choice::B,
            "The Nile runs about 6,650 km through northeastern Africa.",
            Difficulty::Medium,
        ),
        q(
            10,
            "Science",
            "What is the most abundant element in the universe?",
            ["Oxygen", "Carbon", "Helium", "Hydrogen"],
            Choice::D,
            "Hydrogen makes up roughly 75% of normal matter by mass.",
            Difficulty::Hard,
        ),
        q(
            11,
            "Math",
            "What is the next prime number after 13?",
            ["15", "17", "19", "21"],
            Choice::B,
            "15 and 21 are divisible by 3; 17 is prime.",
            Difficulty::Medium,
        ),
        q(
            12,
            "History",
            "Which empire built the Colosseum?",
            ["Greek", "Ottoman", "Roman", "Byzantine"],
            Choice::C,
            "The Colosseum was completed in Rome around 80 AD.",
            Difficulty::Hard,
        ),
    ]
}
