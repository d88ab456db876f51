//! Round generation
//!
//! A round is one question plus its three answers, each pinned to a lane.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::bank::{BankError, Question, QuestionBank};
use crate::consts::LANE_COUNT;

/// One answer, pinned to a lane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
    pub lane: usize,
}

/// The active question and its lane-tagged answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub question_id: String,
    pub prompt: String,
    /// Sorted by lane: `options[i].lane == i`
    pub options: [AnswerOption; LANE_COUNT],
}

impl Round {
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

/// Deals rounds from one language pool
#[derive(Debug, Clone)]
pub struct RoundGenerator {
    language: String,
    pool: Vec<Question>,
}

impl RoundGenerator {
    /// Snapshot the pool for `language` (or the bank's default pool)
    pub fn new(bank: &dyn QuestionBank, language: &str) -> Result<Self, BankError> {
        let pool = bank.pool_or_default(language).to_vec();
        if pool.is_empty() {
            return Err(BankError::EmptyPool {
                language: language.to_string(),
            });
        }
        if let Some(bad) = pool.iter().find(|q| !q.has_single_answer()) {
            return Err(BankError::AnswerNotInChoices {
                question_id: bad.id.clone(),
            });
        }

        let language = if bank.pool(language).is_some() {
            language.trim().to_lowercase()
        } else {
            log::warn!(
                "Unknown language `{}`, using `{}`",
                language,
                bank.default_language()
            );
            bank.default_language().to_string()
        };

        Ok(Self { language, pool })
    }

    /// Language key the pool was taken from
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Pick a question (never `previous` unless it is the only one) and
    /// spread its shuffled answers over a random lane permutation.
    pub fn next_round<R: Rng + ?Sized>(&self, previous: Option<&str>, rng: &mut R) -> Round {
        let mut candidates: Vec<&Question> = self
            .pool
            .iter()
            .filter(|q| Some(q.id.as_str()) != previous)
            .collect();
        if candidates.is_empty() {
            candidates = self.pool.iter().collect();
        }
        let question = candidates[rng.random_range(0..candidates.len())];

        let mut lane_order: [usize; LANE_COUNT] = [0, 1, 2];
        lane_order.shuffle(rng);

        let mut choice_order: [usize; LANE_COUNT] = [0, 1, 2];
        choice_order.shuffle(rng);

        let mut options: [AnswerOption; LANE_COUNT] = std::array::from_fn(|idx| {
            let choice = choice_order[idx];
            let text = question.choices[choice].clone();
            AnswerOption {
                id: format!("{}#{}", question.id, choice),
                is_correct: text == question.answer,
                text,
                lane: lane_order[idx % LANE_COUNT],
            }
        });
        options.sort_by_key(|o| o.lane);

        log::debug!("New round `{}` ({})", question.id, self.language);

        Round {
            question_id: question.id.clone(),
            prompt: question.prompt.clone(),
            options,
        }
    }
}
