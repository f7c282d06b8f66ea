mod store;

pub use store::{KvStore, MemoryStore, SqliteStore};

use std::path::PathBuf;

/// Fixed namespaced keys for every persisted blob.
///
/// Each engine exclusively owns its keys; no two engines write the same key.
pub mod keys {
    pub const TIMER_DATA: &str = "brainbites_timer_data";
    pub const SCORE_DATA: &str = "brainbites_score_data";
    pub const DAILY_GOALS: &str = "brainbites_daily_goals";
    pub const DAILY_GOALS_PROGRESS: &str = "brainbites_daily_goals_progress";
    pub const USED_QUESTIONS: &str = "brainbites_used_questions";
}

/// Returns `~/.config/brainbites[-dev]/` based on BRAINBITES_ENV.
///
/// Set BRAINBITES_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BRAINBITES_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("brainbites-dev")
    } else {
        base_dir.join("brainbites")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
