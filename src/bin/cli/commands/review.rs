use anyhow::{bail, Result};

use chd_study_lib::review::{format_interval, ReviewSession, ReviewUpdate, SessionState};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run_status(app: &App, format: &OutputFormat, _use_color: bool) -> Result<()> {
    let status = app.ctx.review_status();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Plain => {
            println!("{} due \u{2022} {} scheduled", status.due, status.scheduled);
        }
    }

    Ok(())
}

pub fn run_next(app: &mut App, show_rationale: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mut session = ReviewSession::new();
    session.next(&mut app.ctx)?;
    let rationale = if show_rationale && matches!(session.state(), SessionState::Presenting { .. }) {
        Some(session.show_rationale()?.to_string())
    } else {
        None
    };

    let SessionState::Presenting { card, .. } = session.state() else {
        match format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Plain => println!("Review queue is empty."),
        }
        return Ok(());
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "card": card,
                "rationale": rationale,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::render_card(card, use_color));
            if let Some(rationale) = rationale {
                println!();
                for line in terminal::wrap_lines(&rationale, "", 80) {
                    println!("{}", line);
                }
            }

            let preview = card
                .intervals
                .iter()
                .enumerate()
                .map(|(quality, days)| format!("{}={}", quality, format_interval(*days)))
                .collect::<Vec<_>>()
                .join("  ");
            println!("\n{}", terminal::paint(&format!("Grade: {}", preview), Color::DIM, use_color));
            println!(
                "{}",
                terminal::paint(
                    &format!("chd-study-cli review grade {} <0-5>", card.question_id),
                    Color::DIM,
                    use_color
                )
            );
        }
    }

    Ok(())
}

pub fn run_grade(app: &mut App, id: &str, quality: u8, format: &OutputFormat, use_color: bool) -> Result<()> {
    // Ids of deleted questions can still be graded, which purges them
    let question_id = app.resolve_id(id).unwrap_or_else(|_| id.to_string());

    match app.ctx.update_review_item(&question_id, quality) {
        ReviewUpdate::Scheduled(item) => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&item)?),
            OutputFormat::Plain => {
                println!(
                    "{} next review in {} ({})",
                    terminal::paint(&question_id, Color::CYAN, use_color),
                    format_interval(item.interval),
                    item.due.format("%Y-%m-%d %H:%M")
                );
                println!("  ease {:.2} \u{2022} repetition {}", item.ease, item.repetition);
            }
        },
        ReviewUpdate::Purged => bail!("Question '{}' no longer exists; removed it from review", question_id),
    }

    Ok(())
}

pub fn run_queue(app: &mut App, id: &str, format: &OutputFormat, _use_color: bool) -> Result<()> {
    let question_id = app.resolve_id(id)?;
    app.ctx.enqueue_for_review(&question_id, true);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&app.ctx.review().get(&question_id))?);
        }
        OutputFormat::Plain => println!("Queued {} for review.", question_id),
    }

    Ok(())
}
