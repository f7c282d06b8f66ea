mod engine;

pub use engine::{
    format_time, TimerEngine, TimerStatus, AD_REWARD_SECONDS, FINAL_WARNING_SECONDS,
    LOW_WARNING_SECONDS, OVERTIME_BUFFER_SECONDS,
};
