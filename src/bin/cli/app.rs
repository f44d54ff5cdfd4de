use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use chd_study_lib::bank::Question;
use chd_study_lib::interchange::load_core_bank;
use chd_study_lib::storage::FileStore;
use chd_study_lib::{Config, StudyContext};

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
    pub data_dir: PathBuf,
    pub ctx: StudyContext,
}

impl App {
    /// Load config, the core bank and stored study state
    pub fn new(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Config::default_path().context("Failed to locate config directory")?,
        };
        let mut config = Config::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        if let Some(dir) = data_dir {
            config.data_dir = Some(dir.to_path_buf());
        }

        let data_dir = config.data_dir().context("Failed to get data directory")?;
        let store = FileStore::new(data_dir.clone());
        store.init().context("Failed to initialize data directory")?;

        let bank_path = config.question_bank().context("Failed to resolve question bank path")?;
        let core_bank = if bank_path.exists() {
            load_core_bank(&bank_path)
                .with_context(|| format!("Failed to load question bank {}", bank_path.display()))?
        } else if config.question_bank.is_some() {
            bail!("Question bank not found: {}", bank_path.display());
        } else {
            log::warn!(
                "No question bank at {}; only imported questions are available",
                bank_path.display()
            );
            Vec::new()
        };

        let ctx = StudyContext::new(core_bank, Box::new(store));

        Ok(Self { config, data_dir, ctx })
    }

    /// Find a question by id (case-insensitive, unique prefix allowed)
    pub fn find_question(&self, id: &str) -> Result<&Question> {
        let bank = self.ctx.bank();
        let id_lower = id.to_lowercase();

        // Exact match first
        if let Some(q) = bank.iter().find(|q| q.id.to_lowercase() == id_lower) {
            return Ok(q);
        }

        let matches: Vec<&Question> = bank
            .iter()
            .filter(|q| q.id.to_lowercase().starts_with(&id_lower))
            .collect();

        match matches.len() {
            0 => bail!("No question matching '{}'", id),
            1 => Ok(matches[0]),
            _ => bail!(
                "Ambiguous question id '{}'. Matches:\n{}",
                id,
                matches
                    .iter()
                    .map(|q| format!("  - {}", q.id))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    /// Resolve a question id to the bank's spelling
    pub fn resolve_id(&self, id: &str) -> Result<String> {
        self.find_question(id).map(|q| q.id.clone())
    }
}

/// Split "A,c" or "A C" into upper-case option keys
pub fn parse_keys(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|k| !k.is_empty())
        .map(|k| k.to_uppercase())
        .collect()
}
