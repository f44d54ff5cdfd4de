use anyhow::{bail, Context, Result};

use crate::app::{parse_keys, App};
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &mut App, id: &str, keys: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let question_id = app.resolve_id(id)?;
    let selected = parse_keys(keys);
    if selected.is_empty() {
        bail!("Select at least one option key");
    }

    let feedback = app
        .ctx
        .answer_study(&question_id, &selected)
        .with_context(|| format!("Question '{}' disappeared from the bank", question_id))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&feedback)?),
        OutputFormat::Plain => {
            if feedback.correct {
                println!("{}", terminal::paint("\u{2713} Correct", Color::GREEN, use_color));
            } else {
                println!(
                    "{} (answer: {})",
                    terminal::paint("\u{2717} Keep reviewing", Color::RED, use_color),
                    feedback.correct_keys.join(", ")
                );
            }
            println!();
            for line in terminal::wrap_lines(&feedback.rationale, "", 80) {
                println!("{}", line);
            }
            if !feedback.remediation.is_empty() {
                println!();
                for line in terminal::wrap_lines(&feedback.remediation, "  ", 80) {
                    println!("{}", terminal::paint(&line, Color::YELLOW, use_color));
                }
            }
            if !feedback.correct {
                println!("\nAdded to the review queue.");
            }
        }
    }

    Ok(())
}
