use clap::Subcommand;

use brainbites_core::goals::ProgressEvent;
use brainbites_core::timer::format_time;
use brainbites_core::Config;

use super::common::Services;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start spending the balance
    Start,
    /// Stop spending the balance
    Stop,
    /// Reconcile elapsed time and apply any overtime penalty
    Tick,
    /// Print the current balance as JSON
    Status,
    /// Credit earned seconds directly
    Add {
        /// Seconds to credit
        #[arg(long)]
        seconds: u64,
    },
    /// Credit the rewarded-ad bonus
    Bonus,
    /// Reset the balance to zero
    Reset,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let services = Services::open()?;
    let config = Config::load_or_default();
    let mut timer = services.timer();

    match action {
        TimerAction::Start => {
            timer.start();
            println!("{}", serde_json::to_string_pretty(&timer.status())?);
        }
        TimerAction::Stop => {
            timer.stop();
            println!("{}", serde_json::to_string_pretty(&timer.status())?);
        }
        TimerAction::Tick => {
            timer.tick();
            // The penalty reads a snapshot of the balance; calling this on
            // every tick is safe because the deduction is windowed.
            let mut score = services.score();
            score.apply_overtime_penalty(timer.available_seconds());
            println!("{}", serde_json::to_string_pretty(&timer.status())?);
        }
        TimerAction::Status => {
            let status = timer.status();
            println!("{}", serde_json::to_string_pretty(&status)?);
            eprintln!(
                "balance: {}{}",
                if status.available_seconds < 0 { "-" } else { "" },
                format_time(status.available_seconds.abs())
            );
        }
        TimerAction::Add { seconds } => {
            timer.add_earned_time(seconds);
            let mut goals = services.goals(config.goals.per_day);
            goals.record_event(&ProgressEvent::TimeEarned { seconds });
            println!("{}", serde_json::to_string_pretty(&timer.status())?);
        }
        TimerAction::Bonus => {
            let seconds = config.rewards.ad_bonus_seconds;
            timer.add_earned_time(seconds);
            let mut goals = services.goals(config.goals.per_day);
            goals.record_event(&ProgressEvent::TimeEarned { seconds });
            println!("{}", serde_json::to_string_pretty(&timer.status())?);
        }
        TimerAction::Reset => {
            timer.reset();
            println!("{{\"type\": \"timer_reset\"}}");
        }
    }

    Ok(())
}
