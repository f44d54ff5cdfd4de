//! Data models for the question bank

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum length of a derived lesion key
const LESION_KEY_MAX_LEN: usize = 40;

/// Hemodynamic grouping of a lesion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Acyanotic,
    Cyanotic,
    /// Cross-cutting material that applies to several lesions
    Cross,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acyanotic => "acyanotic",
            Self::Cyanotic => "cyanotic",
            Self::Cross => "cross",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "acyanotic" => Ok(Self::Acyanotic),
            "cyanotic" => Ok(Self::Cyanotic),
            "cross" | "cross-cutting" => Ok(Self::Cross),
            other => Err(format!("unknown classification '{}'", other)),
        }
    }
}

/// Fixed set of question categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "pathophysiology")]
    Pathophysiology,
    #[serde(rename = "presentation")]
    Presentation,
    #[serde(rename = "exam/murmur")]
    ExamMurmur,
    #[serde(rename = "imaging_ecg_cxr")]
    ImagingEcgCxr,
    #[serde(rename = "management_initial")]
    ManagementInitial,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Pathophysiology,
        Category::Presentation,
        Category::ExamMurmur,
        Category::ImagingEcgCxr,
        Category::ManagementInitial,
    ];

    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pathophysiology => "pathophysiology",
            Self::Presentation => "presentation",
            Self::ExamMurmur => "exam/murmur",
            Self::ImagingEcgCxr => "imaging_ecg_cxr",
            Self::ManagementInitial => "management_initial",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pathophysiology => "Pathophysiology",
            Self::Presentation => "Presentation",
            Self::ExamMurmur => "Exam / Murmur",
            Self::ImagingEcgCxr => "Imaging / ECG / CXR",
            Self::ManagementInitial => "Initial Management",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Difficulty tier; the numeric level (1-5) is carried separately on the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Foundation,
    Core,
    Advanced,
}

impl Difficulty {
    /// Default numeric level for this tier
    pub fn level(&self) -> u8 {
        match self {
            Self::Foundation => 1,
            Self::Core => 2,
            Self::Advanced => 3,
        }
    }

    /// Map a numeric level back to a tier. Unknown levels fall back to core.
    pub fn from_level(level: u8) -> Self {
        match level {
            1 => Self::Foundation,
            2 => Self::Core,
            3..=5 => Self::Advanced,
            _ => Self::Core,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Foundation => "foundation",
            Self::Core => "core",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "foundation" => Ok(Self::Foundation),
            "core" => Ok(Self::Core),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Answer format of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Single best answer
    #[default]
    Mcq,
    /// Select all that apply
    Multi,
    /// True / False
    Tf,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::Multi => "multi",
            Self::Tf => "tf",
        }
    }
}

/// One answer choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

impl QuestionOption {
    pub fn new(key: impl Into<String>, text: impl Into<String>, correct: bool) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            correct,
        }
    }
}

/// A question in the merged bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub lesion_group: String,
    /// Normalized slug of `lesion_group`, derived when empty
    #[serde(default)]
    pub lesion_key: String,
    pub classification: Classification,
    pub category: Category,
    pub difficulty: Difficulty,
    /// Numeric difficulty (1-5); 0 means "not set"
    #[serde(default)]
    pub difficulty_level: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    pub rationale: String,
    /// Targeted follow-up shown after a miss
    #[serde(default)]
    pub remediation: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub references: Vec<String>,
}

pub(crate) fn default_version() -> String {
    "v1".to_string()
}

impl Question {
    /// Keys of every option marked correct, in option order
    pub fn correct_keys(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| o.correct)
            .map(|o| o.key.as_str())
            .collect()
    }

    pub fn has_correct_option(&self) -> bool {
        self.options.iter().any(|o| o.correct)
    }

    /// Grade a set of selected option keys (case-insensitive).
    ///
    /// Multi-select questions need the exact set of correct keys; single-answer
    /// types need exactly one selected key matching the correct one.
    pub fn is_correct(&self, selected: &[String]) -> bool {
        let mut chosen: Vec<String> = selected.iter().map(|k| k.trim().to_uppercase()).collect();
        chosen.sort();
        chosen.dedup();

        let mut expected: Vec<String> = self.correct_keys().iter().map(|k| k.to_uppercase()).collect();
        expected.sort();

        match self.question_type {
            QuestionType::Multi => !expected.is_empty() && chosen == expected,
            QuestionType::Mcq | QuestionType::Tf => {
                chosen.len() == 1 && expected.first() == chosen.first()
            }
        }
    }

    pub fn option(&self, key: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.key.eq_ignore_ascii_case(key))
    }
}

/// Fill in best-effort defaults on a question.
///
/// Missing difficulty level comes from the tier, a missing lesion key is derived
/// from the lesion group, a missing version becomes `v1`.
pub fn normalize_question(mut question: Question) -> Question {
    if question.difficulty_level == 0 {
        question.difficulty_level = question.difficulty.level();
    }
    if question.lesion_key.trim().is_empty() {
        question.lesion_key = slugify_lesion(&question.lesion_group);
    }
    if question.version.trim().is_empty() {
        question.version = default_version();
    }
    question
}

/// Coerce a raw JSON question into a decodable shape.
///
/// `tags`, `options` and `references` that are not arrays are replaced with
/// empty arrays, and a missing or non-string `type` becomes `mcq`.
pub fn normalize_question_value(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    for field in ["tags", "options", "references"] {
        if !obj.get(field).map_or(false, Value::is_array) {
            obj.insert(field.to_string(), Value::Array(Vec::new()));
        }
    }
    if !obj.get("type").map_or(false, Value::is_string) {
        obj.insert("type".to_string(), Value::String("mcq".to_string()));
    }
}

fn non_alnum_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Z0-9]+").expect("lesion slug pattern is valid"))
}

/// Derive a lesion key: uppercase, non-alphanumeric runs collapsed to `_`,
/// trimmed and capped at 40 characters. Empty labels become `LESION`.
pub fn slugify_lesion(label: &str) -> String {
    let upper = label.to_uppercase();
    let replaced = non_alnum_runs().replace_all(&upper, "_");
    let slug: String = replaced
        .trim_matches('_')
        .chars()
        .take(LESION_KEY_MAX_LEN)
        .collect();

    if slug.is_empty() {
        "LESION".to_string()
    } else {
        slug
    }
}
