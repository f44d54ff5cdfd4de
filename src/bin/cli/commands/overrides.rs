use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use chd_study_lib::bank::{normalize_question_value, Question};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let overrides = app.ctx.overrides();
    let summary = app.ctx.override_summary();
    let core_ids: Vec<&str> = app.ctx.core_bank().iter().map(|q| q.id.as_str()).collect();

    match format {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = overrides
                .iter()
                .map(|(id, q)| {
                    serde_json::json!({
                        "id": id,
                        "lesion": q.lesion_group,
                        "isNew": !core_ids.contains(&id.as_str()),
                    })
                })
                .collect();
            let output = serde_json::json!({ "summary": summary, "overrides": items });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if overrides.is_empty() {
                println!("No overrides stored.");
                return Ok(());
            }

            for (id, q) in overrides {
                let kind = if core_ids.contains(&id.as_str()) { "edited" } else { "new" };
                println!(
                    "{} {} {}",
                    terminal::paint(&format!("{:<7}", kind), Color::DIM, use_color),
                    id,
                    q.lesion_group
                );
            }
            println!(
                "\n{} overrides \u{2022} {} new questions \u{2022} {} core questions",
                summary.total, summary.new_questions, summary.core_size
            );
        }
    }

    Ok(())
}

pub fn run_set(app: &mut App, file: &Path, format: &OutputFormat, _use_color: bool) -> Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let mut value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", file.display()))?;
    normalize_question_value(&mut value);
    let question: Question = serde_json::from_value(value).context("Not a valid question")?;
    let id = question.id.trim().to_string();

    app.ctx.save_override(question)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&app.ctx.question(&id))?),
        OutputFormat::Plain => println!("Saved override {}.", id),
    }

    Ok(())
}

pub fn run_delete(app: &mut App, id: &str, format: &OutputFormat, _use_color: bool) -> Result<()> {
    if !app.ctx.delete_override(id) {
        bail!("No override stored for '{}'", id);
    }

    let restored = app.ctx.question(id).is_some();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "deleted": id, "restoredCore": restored }));
        }
        OutputFormat::Plain => {
            if restored {
                println!("Deleted override {}; the core version is back.", id);
            } else {
                println!("Deleted question {}.", id);
            }
        }
    }

    Ok(())
}
