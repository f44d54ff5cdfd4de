mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use chd_study_lib::bank::{Category, Classification, Difficulty};

#[derive(Parser)]
#[command(name = "chd-study-cli", about = "CHD question bank, quizzes and spaced repetition review", version)]
struct Cli {
    /// Config file (default: <config dir>/chd-study/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Browse the merged question bank
    #[command(subcommand)]
    Bank(BankCommand),

    /// Spaced repetition review queue
    #[command(subcommand)]
    Review(ReviewCommand),

    /// Check an answer to one question
    Study {
        /// Question id
        id: String,
        /// Selected option keys, comma separated (e.g. "A" or "A,C")
        keys: String,
    },

    /// Take a quiz on the terminal
    Quiz {
        /// Lesion key to include (repeatable)
        #[arg(long = "lesion")]
        lesions: Vec<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Number of questions (default from config)
        #[arg(long)]
        count: Option<usize>,
        /// Time limit in minutes
        #[arg(long, default_value = "0")]
        timer: u32,
        /// Quiz only on questions last answered incorrectly
        #[arg(long)]
        missed: bool,
    },

    /// Import questions from a JSON file
    Import {
        file: PathBuf,
        /// Keep existing overrides instead of replacing them
        #[arg(long)]
        merge: bool,
        /// Also restore progress and review data from an export file
        #[arg(long)]
        with_state: bool,
    },

    /// Export the merged bank and study state
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Manage local question overrides
    #[command(subcommand)]
    Override(OverrideCommand),

    /// Attempt statistics
    Stats,

    /// Delete all local overrides, progress and review data
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum BankCommand {
    /// List questions
    List {
        #[arg(long)]
        classification: Option<Classification>,
        /// Lesion key
        #[arg(long)]
        lesion: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },

    /// Show one question
    Show {
        /// Question id (case-insensitive prefix match)
        id: String,
        /// Include the answer and rationale
        #[arg(long)]
        answer: bool,
    },

    /// List lesions with question counts
    Lesions,
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// Due and scheduled counts
    Status,

    /// Show the next question to review
    Next {
        /// Also show the rationale
        #[arg(long)]
        rationale: bool,
    },

    /// Grade a reviewed question (0 = blackout .. 5 = perfect)
    Grade {
        id: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=5))]
        quality: u8,
    },

    /// Put a question on the review queue, due now
    Queue { id: String },
}

#[derive(Subcommand)]
enum OverrideCommand {
    /// List stored overrides
    List,

    /// Save a question (internal JSON shape) as an override
    Set { file: PathBuf },

    /// Delete an override, restoring the core version if any
    Delete { id: String },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let mut app = app::App::new(cli.config.as_deref(), cli.data_dir.as_deref())?;

    match cli.command {
        Command::Bank(subcmd) => match subcmd {
            BankCommand::List {
                classification,
                lesion,
                category,
                difficulty,
            } => {
                let filter = chd_study_lib::bank::StudyFilter {
                    classification,
                    lesion_key: lesion,
                    category,
                    difficulty,
                };
                commands::bank::run_list(&app, &filter, &cli.format, use_color)?;
            }
            BankCommand::Show { id, answer } => {
                commands::bank::run_show(&app, &id, answer, &cli.format, use_color)?;
            }
            BankCommand::Lesions => {
                commands::bank::run_lesions(&app, &cli.format, use_color)?;
            }
        },
        Command::Review(subcmd) => match subcmd {
            ReviewCommand::Status => commands::review::run_status(&app, &cli.format, use_color)?,
            ReviewCommand::Next { rationale } => {
                commands::review::run_next(&mut app, rationale, &cli.format, use_color)?;
            }
            ReviewCommand::Grade { id, quality } => {
                commands::review::run_grade(&mut app, &id, quality, &cli.format, use_color)?;
            }
            ReviewCommand::Queue { id } => {
                commands::review::run_queue(&mut app, &id, &cli.format, use_color)?;
            }
        },
        Command::Study { id, keys } => {
            commands::study::run(&mut app, &id, &keys, &cli.format, use_color)?;
        }
        Command::Quiz {
            lesions,
            category,
            difficulty,
            count,
            timer,
            missed,
        } => {
            let config = chd_study_lib::quiz::QuizConfig {
                lesions,
                category,
                difficulty,
                count: count.unwrap_or(app.config.quiz.default_count),
                timer_minutes: timer,
            };
            commands::quiz::run(&mut app, &config, missed, &cli.format, use_color)?;
        }
        Command::Import { file, merge, with_state } => {
            commands::import::run(&mut app, &file, merge, with_state, &cli.format, use_color)?;
        }
        Command::Export { out } => {
            commands::export::run(&app, out.as_deref())?;
        }
        Command::Override(subcmd) => match subcmd {
            OverrideCommand::List => commands::overrides::run_list(&app, &cli.format, use_color)?,
            OverrideCommand::Set { file } => {
                commands::overrides::run_set(&mut app, &file, &cli.format, use_color)?;
            }
            OverrideCommand::Delete { id } => {
                commands::overrides::run_delete(&mut app, &id, &cli.format, use_color)?;
            }
        },
        Command::Stats => commands::stats::run(&app, &cli.format, use_color)?,
        Command::Reset { yes } => commands::reset::run(&mut app, yes, &cli.format)?,
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
