//! Question bank
//!
//! The quiz content is an external collaborator; rounds only need a pool of
//! questions per language key. A built-in bank ships as embedded JSON.

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Embedded default question set
const BUILTIN_JSON: &str = include_str!("../assets/questions.json");

/// A quiz question with exactly three answer choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub choices: [String; 3],
    /// Must equal exactly one of `choices`
    pub answer: String,
}

impl Question {
    /// True when `answer` matches exactly one choice
    pub fn has_single_answer(&self) -> bool {
        self.choices.iter().filter(|c| **c == self.answer).count() == 1
    }
}

/// Source of question pools, keyed by language
pub trait QuestionBank {
    /// Pool for a language key, if the bank knows it
    fn pool(&self, language: &str) -> Option<&[Question]>;

    /// Key used when a requested language is unknown
    fn default_language(&self) -> &str;

    /// Pool for a language key, falling back to the default pool
    fn pool_or_default(&self, language: &str) -> &[Question] {
        self.pool(language)
            .or_else(|| self.pool(self.default_language()))
            .unwrap_or(&[])
    }
}

#[derive(Debug)]
pub enum BankError {
    Parse(serde_json::Error),
    NoPools,
    MissingDefault { language: String },
    EmptyPool { language: String },
    AnswerNotInChoices { question_id: String },
    DuplicateQuestionId { question_id: String },
}

impl fmt::Display for BankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "question bank JSON is malformed: {e}"),
            Self::NoPools => write!(f, "question bank has no pools"),
            Self::MissingDefault { language } => {
                write!(f, "default language `{language}` has no pool")
            }
            Self::EmptyPool { language } => write!(f, "pool `{language}` has no questions"),
            Self::AnswerNotInChoices { question_id } => {
                write!(f, "question `{question_id}` must list its answer exactly once")
            }
            Self::DuplicateQuestionId { question_id } => {
                write!(f, "question id `{question_id}` appears more than once")
            }
        }
    }
}

impl std::error::Error for BankError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BankError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

/// JSON-backed question bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinBank {
    /// Fallback language key
    pub default: String,
    pub pools: BTreeMap<String, Vec<Question>>,
}

impl BuiltinBank {
    /// The question set compiled into the crate
    pub fn load() -> Result<Self, BankError> {
        Self::from_json(BUILTIN_JSON)
    }

    /// Parse and validate a bank from JSON
    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let bank: Self = serde_json::from_str(json)?;
        bank.validate()?;
        log::debug!(
            "Question bank loaded: {} pools, default `{}`",
            bank.pools.len(),
            bank.default
        );
        Ok(bank)
    }

    /// Enforce the bank contract: a default pool exists, no pool is empty,
    /// every answer matches exactly one choice, ids are unique per pool.
    pub fn validate(&self) -> Result<(), BankError> {
        if self.pools.is_empty() {
            return Err(BankError::NoPools);
        }
        if !self.pools.contains_key(&self.default) {
            return Err(BankError::MissingDefault {
                language: self.default.clone(),
            });
        }

        for (language, questions) in &self.pools {
            if questions.is_empty() {
                return Err(BankError::EmptyPool {
                    language: language.clone(),
                });
            }

            let mut seen = BTreeSet::new();
            for q in questions {
                if !seen.insert(q.id.as_str()) {
                    return Err(BankError::DuplicateQuestionId {
                        question_id: q.id.clone(),
                    });
                }
                if !q.has_single_answer() {
                    return Err(BankError::AnswerNotInChoices {
                        question_id: q.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Known language keys (sorted)
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }
}

impl QuestionBank for BuiltinBank {
    fn pool(&self, language: &str) -> Option<&[Question]> {
        self.pools
            .get(language.trim().to_lowercase().as_str())
            .map(Vec::as_slice)
    }

    fn default_language(&self) -> &str {
        &self.default
    }
}
