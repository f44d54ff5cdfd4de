//! Drawing quiz questions from the bank

use rand::seq::SliceRandom;
use rand::Rng;

use super::models::QuizConfig;
use crate::bank::Question;
use crate::progress::ProgressState;

/// Filter the bank by `config`, optionally shuffle, and keep `config.count`
/// questions (clamped to at least one and at most the bank size).
pub fn build_quiz_pool<R: Rng + ?Sized>(
    bank: &[Question],
    config: &QuizConfig,
    shuffle: bool,
    rng: &mut R,
) -> Vec<Question> {
    let mut pool: Vec<Question> = bank
        .iter()
        .filter(|q| {
            config.lesions.is_empty()
                || config
                    .lesions
                    .iter()
                    .any(|key| key.eq_ignore_ascii_case(&q.lesion_key))
        })
        .filter(|q| config.category.map_or(true, |c| q.category == c))
        .filter(|q| config.difficulty.map_or(true, |d| q.difficulty == d))
        .cloned()
        .collect();

    if shuffle {
        pool.shuffle(rng);
    }

    let count = config.count.clamp(1, bank.len().max(1));
    pool.truncate(count);
    pool
}

/// Shuffled questions whose most recent attempt was incorrect
pub fn missed_pool<R: Rng + ?Sized>(bank: &[Question], progress: &ProgressState, rng: &mut R) -> Vec<Question> {
    let missed = progress.missed_question_ids();
    let mut pool: Vec<Question> = bank
        .iter()
        .filter(|q| missed.contains(&q.id.as_str()))
        .cloned()
        .collect();
    pool.shuffle(rng);
    pool
}
