mod bank;
mod session;

pub use bank::{default_questions, Choice, Difficulty, InMemoryBank, Options, Question, QuestionBank};
pub use session::{AnswerOutcome, BankExhausted, QuizSession, SessionState, SessionSummary};
