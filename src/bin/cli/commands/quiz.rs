use std::io::{self, BufRead, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};

use chd_study_lib::quiz::{
    build_quiz_pool, format_elapsed, missed_pool, QuizConfig, QuizError, QuizResults, QuizSession,
};
use chd_study_lib::{AnswerFeedback, StudyContext};

use crate::app::{parse_keys, App};
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &mut App, config: &QuizConfig, missed: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mut rng = rand::thread_rng();
    let pool = if missed {
        missed_pool(app.ctx.bank(), app.ctx.progress(), &mut rng)
    } else {
        build_quiz_pool(app.ctx.bank(), config, app.config.quiz.shuffle, &mut rng)
    };

    if pool.is_empty() {
        if missed {
            println!("No missed questions recorded yet. Complete a quiz first!");
        } else {
            println!("No questions match the quiz settings.");
        }
        return Ok(());
    }

    let timer = if missed { 0 } else { config.timer_minutes };
    let mut quiz = QuizSession::new(pool, Utc::now()).with_timer(timer);
    let stdin = io::stdin();
    let mut input = stdin.lock().lines();

    let results = loop {
        let now = Utc::now();
        if quiz.is_expired(now) {
            println!("\nTime expired. Remaining questions were marked for review.");
            break quiz.expire(&mut app.ctx, now);
        }
        let Some(question) = quiz.current().cloned() else {
            break quiz.finish(&mut app.ctx, now);
        };

        let mut header = format!("Question {} of {}", quiz.position(), quiz.total());
        if let Some(left) = quiz.remaining(now) {
            header.push_str(&format!(" \u{2022} {} left", format_elapsed(left.num_seconds())));
        }
        if quiz.is_flagged(&question.id) {
            header.push_str(" \u{2022} flagged");
        }
        println!("\n{}", terminal::paint(&header, Color::BOLD, use_color));
        println!("{}", terminal::render_question(&question, false, use_color));
        print!("\nAnswer (e.g. A or A,C), f = flag, u = unflag, q = finish: ");
        io::stdout().flush()?;

        let Some(line) = input.next() else {
            break quiz.finish(&mut app.ctx, Utc::now());
        };
        let line = line?;
        let now = Utc::now();

        match handle_input(&mut quiz, &mut app.ctx, &line, now)? {
            Step::Prompt => {}
            Step::Finish => break quiz.finish(&mut app.ctx, now),
            Step::Flagged => println!("Flagged for review."),
            Step::Unflagged(removed) => {
                if removed {
                    println!("Flag removed.");
                }
            }
            Step::NoSelection => println!("Select an answer before submitting."),
            Step::Answered(feedback) => {
                if feedback.correct {
                    println!("{}", terminal::paint("\u{2713} Correct", Color::GREEN, use_color));
                } else {
                    println!(
                        "{} (answer: {})",
                        terminal::paint("\u{2717} Keep reviewing", Color::RED, use_color),
                        feedback.correct_keys.join(", ")
                    );
                }
                for line in terminal::wrap_lines(&feedback.rationale, "  ", 80) {
                    println!("{}", line);
                }
            }
        }
    };

    print_results(&results, format, use_color)
}

/// Outcome of one line typed at the quiz prompt
#[derive(Debug)]
enum Step {
    /// Nothing to report, show the prompt again
    Prompt,
    Finish,
    Flagged,
    Unflagged(bool),
    /// Input held no option keys
    NoSelection,
    Answered(AnswerFeedback),
}

fn handle_input(quiz: &mut QuizSession, ctx: &mut StudyContext, line: &str, now: DateTime<Utc>) -> Result<Step> {
    let step = match line.trim().to_lowercase().as_str() {
        "" => Step::Prompt,
        "q" => Step::Finish,
        "f" => {
            quiz.flag(ctx, now)?;
            Step::Flagged
        }
        "u" => Step::Unflagged(quiz.unflag()?),
        _ if quiz.is_expired(now) => Step::Prompt,
        answer => match quiz.answer(ctx, &parse_keys(answer), now) {
            Ok(feedback) => Step::Answered(feedback),
            Err(QuizError::NoSelection) => Step::NoSelection,
            Err(e) => return Err(e.into()),
        },
    };
    Ok(step)
}

fn print_results(results: &QuizResults, format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        OutputFormat::Plain => {
            let mut summary = format!(
                "Score: {} / {} \u{2022} Time: {}",
                results.correct,
                results.total,
                format_elapsed(results.elapsed_seconds)
            );
            if results.timed_out {
                summary.push_str(" \u{2022} Quiz ended when the timer expired.");
            }
            println!("\n{}", terminal::paint(&summary, Color::BOLD, use_color));

            let width = results.breakdown.iter().map(|s| s.label.len()).max().unwrap_or(6).max(6);
            println!("\n{:<width$} Score", "Lesion", width = width);
            println!("{} {}", terminal::rule(width), terminal::rule(7));
            for score in &results.breakdown {
                println!("{:<width$} {}/{}", score.label, score.correct, score.total, width = width);
            }

            let missed = results.total - results.correct;
            if missed > 0 {
                println!("\n{} questions added to the review queue.", missed);
            }
        }
    }

    Ok(())
}
