//! # BrainBites Core Library
//!
//! This library implements the time-economy core of BrainBites: users earn
//! screen time by answering quiz questions. It is a CLI-first core -- all
//! operations are available through the engines below, with any GUI being a
//! thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: owns the spendable time balance; a wall-clock-based
//!   state machine that requires the caller to invoke `tick()` periodically
//!   and reconciles arbitrary gaps in one step
//! - **Score Engine**: total/daily score, streaks, answer counters, and the
//!   grace-buffered overtime penalty scheme
//! - **Daily Goals Engine**: three randomly selected daily challenges with
//!   idempotent progress accumulation and one-time reward claiming
//! - **Quiz Session**: the orchestrator that turns one answered question into
//!   exactly one ordered sequence of engine updates
//! - **Storage**: SQLite-backed key-value store for all persisted blobs
//!
//! Engines are constructed with their dependencies (clock, store, notifier)
//! passed in explicitly; there is no global state.

pub mod clock;
pub mod config;
pub mod error;
pub mod goals;
pub mod notify;
pub mod quiz;
pub mod score;
pub mod storage;
pub mod timer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{ConfigError, CoreError, StoreError};
pub use goals::{GoalsEngine, ProgressEvent, ProgressKind};
pub use notify::{Notifier, NullNotifier};
pub use quiz::{Choice, Difficulty, InMemoryBank, Question, QuestionBank, QuizSession};
pub use score::ScoreEngine;
pub use storage::{KvStore, MemoryStore, SqliteStore};
pub use timer::TimerEngine;
