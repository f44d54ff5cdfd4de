//! External question schema and conversion

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bank::models::default_version;
use crate::bank::{
    normalize_question, slugify_lesion, Category, Classification, Difficulty, Question, QuestionOption,
    QuestionType,
};

/// Topic field of the external schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "acyanotic")]
    Acyanotic,
    #[serde(rename = "cyanotic")]
    Cyanotic,
    #[serde(rename = "cross-cutting")]
    CrossCutting,
}

impl From<Topic> for Classification {
    fn from(topic: Topic) -> Self {
        match topic {
            Topic::Acyanotic => Classification::Acyanotic,
            Topic::Cyanotic => Classification::Cyanotic,
            Topic::CrossCutting => Classification::Cross,
        }
    }
}

impl From<Classification> for Topic {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Acyanotic => Topic::Acyanotic,
            Classification::Cyanotic => Topic::Cyanotic,
            Classification::Cross => Topic::CrossCutting,
        }
    }
}

/// A question in the interchange schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaQuestion {
    pub id: String,
    pub topic: Topic,
    pub lesion: String,
    pub category: Category,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    pub stem: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_indices: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_bool: Option<bool>,
    pub explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Numeric difficulty, 1-5
    pub difficulty: u8,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

/// An item rejected during import, with every problem found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidItem {
    pub id: String,
    pub errors: Vec<String>,
}

/// Option keys are letters in order: A, B, C, ...
fn option_key(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    if index < 26 {
        letter.to_string()
    } else {
        format!("{}{}", letter, index / 26)
    }
}

/// Convert an external question into the internal shape
pub fn from_schema(raw: &SchemaQuestion) -> Question {
    let question_type = raw.question_type;

    let mut options: Vec<QuestionOption> = raw
        .options
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let correct = match question_type {
                QuestionType::Multi => raw
                    .answer_indices
                    .as_ref()
                    .map_or(false, |indices| indices.contains(&index)),
                QuestionType::Tf => match raw.answer_bool {
                    Some(true) => index == 0,
                    Some(false) => index == 1,
                    None => false,
                },
                QuestionType::Mcq => raw.answer_index == Some(index),
            };
            QuestionOption::new(option_key(index), text.clone(), correct)
        })
        .collect();

    if question_type == QuestionType::Tf && options.is_empty() {
        options.push(QuestionOption::new("A", "True", raw.answer_bool == Some(true)));
        options.push(QuestionOption::new("B", "False", raw.answer_bool == Some(false)));
    }

    Question {
        id: raw.id.clone(),
        lesion_group: raw.lesion.clone(),
        lesion_key: slugify_lesion(&raw.lesion),
        classification: raw.topic.into(),
        category: raw.category,
        difficulty: Difficulty::from_level(raw.difficulty),
        difficulty_level: raw.difficulty,
        tags: raw.tags.clone(),
        prompt: raw.stem.clone(),
        options,
        rationale: raw.explanation.clone(),
        remediation: raw.objective.clone(),
        question_type,
        version: if raw.version.is_empty() {
            default_version()
        } else {
            raw.version.clone()
        },
        references: raw.references.clone(),
    }
}

/// Convert an internal question into the external schema
pub fn to_schema(question: &Question) -> SchemaQuestion {
    let difficulty = if question.difficulty_level > 0 {
        question.difficulty_level
    } else {
        question.difficulty.level()
    };

    let mut schema = SchemaQuestion {
        id: question.id.clone(),
        topic: question.classification.into(),
        lesion: question.lesion_group.clone(),
        category: question.category,
        question_type: question.question_type,
        stem: question.prompt.clone(),
        options: Vec::new(),
        answer_index: None,
        answer_indices: None,
        answer_bool: None,
        explanation: question.rationale.clone(),
        tags: question.tags.clone(),
        difficulty,
        objective: question.remediation.clone(),
        references: question.references.clone(),
        version: if question.version.is_empty() {
            default_version()
        } else {
            question.version.clone()
        },
    };

    match question.question_type {
        QuestionType::Tf => {
            schema.answer_bool = Some(question.options.first().map_or(false, |o| o.correct));
            schema.options = vec!["True".to_string(), "False".to_string()];
        }
        QuestionType::Multi => {
            schema.options = question.options.iter().map(|o| o.text.clone()).collect();
            schema.answer_indices = Some(
                question
                    .options
                    .iter()
                    .enumerate()
                    .filter(|(_, o)| o.correct)
                    .map(|(index, _)| index)
                    .collect(),
            );
        }
        QuestionType::Mcq => {
            schema.options = question.options.iter().map(|o| o.text.clone()).collect();
            schema.answer_index = question.options.iter().position(|o| o.correct);
        }
    }

    schema
}

/// Two questions are equal when they export identically
pub fn questions_equal(a: &Question, b: &Question) -> bool {
    to_schema(a) == to_schema(b)
}

fn semantic_errors(raw: &SchemaQuestion) -> Vec<String> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("id", &raw.id),
        ("lesion", &raw.lesion),
        ("stem", &raw.stem),
        ("explanation", &raw.explanation),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{} must not be empty", field));
        }
    }

    if !(1..=5).contains(&raw.difficulty) {
        errors.push(format!("difficulty must be between 1 and 5, got {}", raw.difficulty));
    }

    let option_count = raw.options.len();
    match raw.question_type {
        QuestionType::Mcq => {
            if option_count < 2 {
                errors.push("mcq questions need at least 2 options".to_string());
            }
            match raw.answer_index {
                None => errors.push("mcq questions need answerIndex".to_string()),
                Some(index) if index >= option_count => {
                    errors.push(format!("answerIndex {} is out of range", index));
                }
                Some(_) => {}
            }
        }
        QuestionType::Multi => {
            if option_count < 2 {
                errors.push("multi questions need at least 2 options".to_string());
            }
            match raw.answer_indices.as_deref() {
                None | Some([]) => errors.push("multi questions need answerIndices".to_string()),
                Some(indices) => {
                    let mut seen = HashSet::new();
                    for index in indices {
                        if *index >= option_count {
                            errors.push(format!("answerIndices entry {} is out of range", index));
                        }
                        if !seen.insert(*index) {
                            errors.push(format!("answerIndices entry {} is repeated", index));
                        }
                    }
                }
            }
        }
        QuestionType::Tf => {
            if raw.answer_bool.is_none() {
                errors.push("tf questions need answerBool".to_string());
            }
            if option_count != 0 && option_count != 2 {
                errors.push("tf questions take no options or exactly 2".to_string());
            }
        }
    }

    errors
}

/// Validate one raw import item and convert it.
///
/// `index` is only used to name items that carry no usable id.
pub fn validate_item(value: &Value, index: usize) -> Result<Question, InvalidItem> {
    let fallback_id = value
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("item-{}", index + 1));

    let raw: SchemaQuestion = serde_json::from_value(value.clone()).map_err(|e| InvalidItem {
        id: fallback_id.clone(),
        errors: vec![e.to_string()],
    })?;

    let errors = semantic_errors(&raw);
    if !errors.is_empty() {
        return Err(InvalidItem {
            id: fallback_id,
            errors,
        });
    }

    Ok(normalize_question(from_schema(&raw)))
}
