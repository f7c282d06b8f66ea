use clap::Subcommand;

use super::common::Services;

#[derive(Subcommand)]
pub enum ScoreAction {
    /// Print the current score record as JSON
    Info,
    /// Print derived statistics as JSON
    Stats,
    /// Zero all score state
    Reset,
}

pub fn run(action: ScoreAction) -> Result<(), Box<dyn std::error::Error>> {
    let services = Services::open()?;
    let mut score = services.score();

    match action {
        ScoreAction::Info => {
            println!("{}", serde_json::to_string_pretty(&score.score_info())?);
        }
        ScoreAction::Stats => {
            println!("{}", serde_json::to_string_pretty(&score.statistics())?);
        }
        ScoreAction::Reset => {
            score.reset_all();
            println!("{{\"type\": \"score_reset\"}}");
        }
    }

    Ok(())
}
