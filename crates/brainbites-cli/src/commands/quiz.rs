use std::io::{self, BufRead, Write};

use clap::Subcommand;

use brainbites_core::quiz::{Choice, Difficulty, InMemoryBank, QuestionBank, QuizSession};
use brainbites_core::timer::format_time;
use brainbites_core::Config;

use super::common::Services;

#[derive(Subcommand)]
pub enum QuizAction {
    /// Run an interactive quiz session
    Play {
        /// Restrict questions to one category
        #[arg(long)]
        category: Option<String>,
        /// Restrict questions to one difficulty (easy/medium/hard)
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Number of questions to ask
        #[arg(long, default_value = "10")]
        questions: u32,
    },
    /// List available question categories
    Categories,
}

pub fn run(action: QuizAction) -> Result<(), Box<dyn std::error::Error>> {
    let services = Services::open()?;

    match action {
        QuizAction::Categories => {
            let bank = InMemoryBank::with_defaults(services.store.clone());
            println!("{}", serde_json::to_string_pretty(&bank.categories())?);
            Ok(())
        }
        QuizAction::Play {
            category,
            difficulty,
            questions,
        } => play(&services, category, difficulty, questions),
    }
}

fn play(
    services: &Services,
    category: Option<String>,
    difficulty: Option<Difficulty>,
    questions: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut bank = InMemoryBank::with_defaults(services.store.clone());
    let mut score = services.score();
    let mut timer = services.timer();
    let mut goals = services.goals(config.goals.per_day);

    let mut session = QuizSession::new(
        &mut bank,
        &mut score,
        &mut timer,
        &mut goals,
        config.rewards.clone(),
        category,
        difficulty,
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    for number in 1..=questions {
        let question = match session.next_question() {
            Ok(q) => q.clone(),
            Err(e) => {
                eprintln!("{e}");
                break;
            }
        };

        println!();
        println!(
            "Q{number} [{} / {}] {}",
            question.category, question.level, question.prompt
        );
        println!("  A) {}", question.options.a);
        println!("  B) {}", question.options.b);
        println!("  C) {}", question.options.c);
        println!("  D) {}", question.options.d);

        let choice = loop {
            print!("> ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                // stdin closed mid-session; settle what was answered.
                let summary = session.finish();
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            };
            match line?.parse::<Choice>() {
                Ok(choice) => break choice,
                Err(e) => println!("{e}"),
            }
        };

        let outcome = session.answer(choice);
        if outcome.correct {
            println!(
                "Correct! +{} points, +{} screen time (streak {})",
                outcome.points_earned,
                format_time(outcome.seconds_earned as i64),
                outcome.current_streak
            );
            if outcome.streak_milestone {
                println!("Streak milestone!");
            }
        } else {
            println!(
                "Wrong. The answer was {}: {}",
                outcome.correct_choice, outcome.explanation
            );
        }
    }

    let summary = session.finish();
    println!();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
