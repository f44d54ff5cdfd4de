use anyhow::Result;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

/// Recent attempts shown in plain output
const RECENT_ATTEMPTS: usize = 10;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let progress = app.ctx.progress();
    let summary = progress.summary();
    let review = app.ctx.review_status();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "summary": summary,
                "review": review,
                "missed": progress.missed_question_ids(),
                "bankSize": app.ctx.bank().len(),
                "dataDir": app.data_dir.to_string_lossy(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::paint("Progress", Color::BOLD, use_color));
            println!(
                "  {} of {} questions seen \u{2022} {} attempts \u{2022} {} accuracy",
                summary.questions_seen,
                app.ctx.bank().len(),
                summary.attempts,
                terminal::percent(summary.accuracy)
            );
            println!("  {} missed on the last attempt", summary.missed);
            println!("  {} due \u{2022} {} scheduled for review", review.due, review.scheduled);

            if !progress.quiz_history.is_empty() {
                println!("\n{}", terminal::paint("Recent attempts", Color::BOLD, use_color));
                for entry in progress.quiz_history.iter().rev().take(RECENT_ATTEMPTS) {
                    let mark = if entry.correct {
                        terminal::paint("\u{2713}", Color::GREEN, use_color)
                    } else {
                        terminal::paint("\u{2717}", Color::RED, use_color)
                    };
                    println!(
                        "  {} {} {:<12} {}",
                        mark,
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.context,
                        entry.question_id
                    );
                }
            }
        }
    }

    Ok(())
}
