//! User configuration
//!
//! Read from `<config_dir>/chd-study/config.toml`. Every field is optional; a
//! missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quiz::DEFAULT_QUIZ_COUNT;

const APP_DIR: &str = "chd-study";
const CONFIG_FILE: &str = "config.toml";
const QUESTION_BANK_FILE: &str = "questions.v1.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine a {0} directory")]
    NoDirectory(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    pub default_count: usize,
    pub shuffle: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            default_count: DEFAULT_QUIZ_COUNT,
            shuffle: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where study state is stored
    pub data_dir: Option<PathBuf>,
    /// Core question bank (JSON array in the interchange schema)
    pub question_bank: Option<PathBuf>,
    pub quiz: QuizSettings,
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoDirectory("config"))
    }

    /// Load from `path`, or defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(ConfigError::NoDirectory("data")),
        }
    }

    /// Resolved core bank path, `<data_dir>/questions.v1.json` by default
    pub fn question_bank(&self) -> Result<PathBuf> {
        match &self.question_bank {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join(QUESTION_BANK_FILE)),
        }
    }
}
