use anyhow::Result;

use chd_study_lib::bank::{filter_bank, lesions, StudyFilter};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, filter: &StudyFilter, format: &OutputFormat, use_color: bool) -> Result<()> {
    let questions = filter_bank(app.ctx.bank(), filter);

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = questions
                .iter()
                .map(|q| {
                    serde_json::json!({
                        "id": q.id,
                        "lesion": q.lesion_group,
                        "lesionKey": q.lesion_key,
                        "classification": q.classification,
                        "category": q.category,
                        "difficulty": q.difficulty,
                        "type": q.question_type,
                        "prompt": q.prompt,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if questions.is_empty() {
                println!("No questions match.");
                return Ok(());
            }

            let id_width = questions.iter().map(|q| q.id.len()).max().unwrap_or(2).max(2);
            println!("{:<width$} {:<28} {:<10} Prompt", "Id", "Lesion", "Level", width = id_width);
            println!(
                "{} {} {} {}",
                terminal::rule(id_width),
                terminal::rule(28),
                terminal::rule(10),
                terminal::rule(30)
            );

            for q in &questions {
                let lesion: String = q.lesion_group.chars().take(28).collect();
                let prompt: String = q.prompt.chars().take(50).collect();
                println!(
                    "{} {:<28} {:<10} {}",
                    terminal::paint(&format!("{:<width$}", q.id, width = id_width), Color::CYAN, use_color),
                    lesion,
                    q.difficulty.as_str(),
                    prompt
                );
            }

            println!("\n{} of {} questions", questions.len(), app.ctx.bank().len());
        }
    }

    Ok(())
}

pub fn run_show(app: &App, id: &str, answer: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let question = app.find_question(id)?;

    match format {
        OutputFormat::Json => {
            if answer {
                println!("{}", serde_json::to_string_pretty(question)?);
            } else {
                let options: Vec<serde_json::Value> = question
                    .options
                    .iter()
                    .map(|o| serde_json::json!({ "key": o.key, "text": o.text }))
                    .collect();
                let output = serde_json::json!({
                    "id": question.id,
                    "lesion": question.lesion_group,
                    "category": question.category,
                    "difficulty": question.difficulty,
                    "type": question.question_type,
                    "prompt": question.prompt,
                    "options": options,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        OutputFormat::Plain => {
            println!("{}", terminal::render_question(question, answer, use_color));
            if let Some(stats) = app.ctx.progress().stats(&question.id) {
                println!(
                    "\n{}",
                    terminal::paint(
                        &format!("Attempts: {} \u{2022} correct: {}", stats.attempts, stats.correct),
                        Color::DIM,
                        use_color
                    )
                );
            }
        }
    }

    Ok(())
}

pub fn run_lesions(app: &App, format: &OutputFormat, _use_color: bool) -> Result<()> {
    let entries = lesions(app.ctx.bank());

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Plain => {
            if entries.is_empty() {
                println!("No lesions found.");
                return Ok(());
            }

            let label_width = entries.iter().map(|e| e.label.len()).max().unwrap_or(6).max(6);
            println!("{:<width$} {:<10} Questions", "Lesion", "Type", width = label_width);
            println!("{} {} {}", terminal::rule(label_width), terminal::rule(10), terminal::rule(9));
            for entry in &entries {
                println!(
                    "{:<width$} {:<10} {}",
                    entry.label,
                    entry.classification.as_str(),
                    entry.question_count,
                    width = label_width
                );
            }
            println!("\n{} lesions total", entries.len());
        }
    }

    Ok(())
}
