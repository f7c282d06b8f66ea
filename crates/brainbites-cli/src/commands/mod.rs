pub mod common;
pub mod config;
pub mod goals;
pub mod quiz;
pub mod score;
pub mod timer;
