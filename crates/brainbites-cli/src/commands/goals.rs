use clap::Subcommand;

use brainbites_core::Config;

use super::common::Services;

#[derive(Subcommand)]
pub enum GoalsAction {
    /// Print today's goals with progress as JSON
    List,
    /// Claim a completed goal's time reward
    Claim {
        /// Goal id, as shown by `goals list`
        id: String,
    },
    /// Print completion counts for today as JSON
    Stats,
    /// Discard today's selection and draw a fresh one
    Reroll,
}

pub fn run(action: GoalsAction) -> Result<(), Box<dyn std::error::Error>> {
    let services = Services::open()?;
    let config = Config::load_or_default();
    let mut goals = services.goals(config.goals.per_day);

    match action {
        GoalsAction::List => {
            println!("{}", serde_json::to_string_pretty(&goals.todays_goals())?);
        }
        GoalsAction::Claim { id } => {
            let mut timer = services.timer();
            if goals.claim_reward(&id, &mut timer) {
                println!("{}", serde_json::to_string_pretty(&timer.status())?);
            } else {
                eprintln!("goal {id} is not claimable");
                std::process::exit(1);
            }
        }
        GoalsAction::Stats => {
            println!(
                "{}",
                serde_json::to_string_pretty(&goals.completion_stats())?
            );
        }
        GoalsAction::Reroll => {
            goals.reroll();
            println!("{}", serde_json::to_string_pretty(&goals.todays_goals())?);
        }
    }

    Ok(())
}
