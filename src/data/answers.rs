// ============================================================
// Layer 4 — Answer Resolution and Soft Scoring
// ============================================================
// A record carries its answer in one of two shapes:
//
//   answer_tokens:        "two"                      (one label)
//   valid_answers_tokens: ["2", "two", "two", ...]   (≤ 10 humans)
//
// For the second shape one annotation is drawn uniformly at
// random as the training label, and every annotation also
// feeds a soft score per answer:
//
//   score(a) = min(0.3 × count(a), 1.0)      score(<unk>) = 0
//
// So one vote earns 0.3, three earn 0.9, and four or more
// earn full credit.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::vocab::VocabDict;
use crate::domain::error::{DatasetError, Result};
use crate::domain::record::ImdbRecord;
use crate::domain::sample::{ValidAnswers, MAX_VALID_ANSWERS, VALID_ANSWER_PAD};

/// Credit contributed by each agreeing annotator
pub const SCORE_PER_ANNOTATOR: f32 = 0.3;

/// Soft score for every entry of the answer vocabulary.
pub fn compute_answer_scores(
    answers:     &[usize],
    num_answers: usize,
    unk_idx:     Option<usize>,
) -> Vec<f32> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for &a in answers {
        *counts.entry(a).or_insert(0) += 1;
    }

    let mut scores = vec![0.0f32; num_answers];
    for (answer, count) in counts {
        if Some(answer) == unk_idx {
            continue;
        }
        if let Some(score) = scores.get_mut(answer) {
            *score = (count as f32 * SCORE_PER_ANNOTATOR).min(1.0);
        }
    }
    scores
}

/// Fill the fixed label buffer with one slot per annotation.
pub fn valid_answer_labels(answers: &[usize]) -> Result<[i32; MAX_VALID_ANSWERS]> {
    if answers.len() > MAX_VALID_ANSWERS {
        return Err(DatasetError::CapacityExceeded {
            count:    answers.len(),
            capacity: MAX_VALID_ANSWERS,
        });
    }
    let mut labels = [VALID_ANSWER_PAD; MAX_VALID_ANSWERS];
    for (slot, &a) in labels.iter_mut().zip(answers) {
        *slot = a as i32;
    }
    Ok(labels)
}

/// Answer fields for one example
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAnswer {
    /// Index of the training target
    pub answer_label: i32,
    /// Present only for multi-annotation records
    pub valid_answers: Option<ValidAnswers>,
}

/// Pick the training answer for `record` and, for multiple
/// annotations, build labels and soft scores.
pub fn resolve_answer<R: Rng + ?Sized>(
    idx:    usize,
    record: &ImdbRecord,
    vocab:  &VocabDict,
    rng:    &mut R,
) -> Result<ResolvedAnswer> {
    if let Some(token) = &record.answer_tokens {
        return Ok(ResolvedAnswer {
            answer_label:  vocab.word_to_index(token)? as i32,
            valid_answers: None,
        });
    }

    let Some(tokens) = &record.valid_answers_tokens else {
        return Err(DatasetError::MissingField {
            idx,
            field: "answer_tokens",
        });
    };

    let chosen = tokens
        .choose(rng)
        .ok_or(DatasetError::NoValidAnswers { idx })?;

    let indices = tokens
        .iter()
        .map(|t| vocab.word_to_index(t))
        .collect::<Result<Vec<_>>>()?;

    let labels = valid_answer_labels(&indices)?;
    let scores = compute_answer_scores(&indices, vocab.num_vocab(), vocab.unk_idx());

    Ok(ResolvedAnswer {
        answer_label:  vocab.word_to_index(chosen)? as i32,
        valid_answers: Some(ValidAnswers { labels, scores }),
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    fn answer_vocab() -> VocabDict {
        VocabDict::from_words(["<unk>", "yes", "no", "2", "two", "red"])
    }

    #[test]
    fn test_scores_reference_example() {
        let scores = compute_answer_scores(&[5, 5, 5, 2], 10, Some(0));
        assert_eq!(scores.len(), 10);
        assert!(approx(scores[5], 0.9));
        assert!(approx(scores[2], 0.3));
        for (i, s) in scores.iter().enumerate() {
            if i != 5 && i != 2 {
                assert_eq!(*s, 0.0, "index {i} should be zero");
            }
        }
    }

    #[test]
    fn test_scores_saturate_at_one() {
        let scores = compute_answer_scores(&[1, 1, 1, 1, 1, 1, 1], 3, Some(0));
        assert_eq!(scores[1], 1.0);
    }

    #[test]
    fn test_unk_never_scores() {
        let scores = compute_answer_scores(&[0, 0, 0, 0, 1], 3, Some(0));
        assert_eq!(scores[0], 0.0);
        assert!(approx(scores[1], 0.3));
    }

    #[test]
    fn test_scores_without_unk_in_vocab() {
        let scores = compute_answer_scores(&[0, 0], 2, None);
        assert!(approx(scores[0], 0.6));
    }

    #[test]
    fn test_labels_padded_with_sentinel() {
        let labels = valid_answer_labels(&[4, 1, 4]).unwrap();
        assert_eq!(&labels[..3], &[4, 1, 4]);
        assert!(labels[3..].iter().all(|&l| l == VALID_ANSWER_PAD));
    }

    #[test]
    fn test_labels_full_capacity() {
        let answers: Vec<usize> = (0..MAX_VALID_ANSWERS).collect();
        let labels = valid_answer_labels(&answers).unwrap();
        assert_eq!(labels[9], 9);
    }

    #[test]
    fn test_labels_over_capacity_fails() {
        let answers = vec![1usize; MAX_VALID_ANSWERS + 1];
        let err = valid_answer_labels(&answers).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::CapacityExceeded { count: 11, capacity: 10 }
        ));
    }

    #[test]
    fn test_single_answer_is_used_directly() {
        let record = ImdbRecord {
            answer_tokens: Some("no".into()),
            ..ImdbRecord::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let r = resolve_answer(0, &record, &answer_vocab(), &mut rng).unwrap();
        assert_eq!(r.answer_label, 2);
        assert!(r.valid_answers.is_none());
    }

    #[test]
    fn test_valid_answers_pick_one_and_score_all() {
        let record = ImdbRecord {
            valid_answers_tokens: Some(
                ["two", "two", "2", "banana"].iter().map(|s| s.to_string()).collect(),
            ),
            ..ImdbRecord::default()
        };
        let vocab = answer_vocab();
        let mut rng = StdRng::seed_from_u64(7);
        let r = resolve_answer(3, &record, &vocab, &mut rng).unwrap();

        // "banana" is unknown → <unk> (0)
        assert!([4, 3, 0].contains(&r.answer_label));

        let valid = r.valid_answers.unwrap();
        assert_eq!(&valid.labels[..4], &[4, 4, 3, 0]);
        assert!(valid.labels[4..].iter().all(|&l| l == -1));
        assert_eq!(valid.scores.len(), vocab.num_vocab());
        assert!(approx(valid.scores[4], 0.6));
        assert!(approx(valid.scores[3], 0.3));
        assert_eq!(valid.scores[0], 0.0);
    }

    #[test]
    fn test_same_seed_same_choice() {
        let record = ImdbRecord {
            valid_answers_tokens: Some(
                ["yes", "no", "red", "two", "2"].iter().map(|s| s.to_string()).collect(),
            ),
            ..ImdbRecord::default()
        };
        let vocab = answer_vocab();
        let a = resolve_answer(0, &record, &vocab, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = resolve_answer(0, &record, &vocab, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a.answer_label, b.answer_label);
    }

    #[test]
    fn test_empty_valid_answers_fails() {
        let record = ImdbRecord {
            valid_answers_tokens: Some(Vec::new()),
            ..ImdbRecord::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let err = resolve_answer(5, &record, &answer_vocab(), &mut rng).unwrap_err();
        assert!(matches!(err, DatasetError::NoValidAnswers { idx: 5 }));
    }

    #[test]
    fn test_missing_answers_fails() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = resolve_answer(2, &ImdbRecord::default(), &answer_vocab(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, DatasetError::MissingField { idx: 2, .. }));
    }

    #[test]
    fn test_too_many_annotations_fails() {
        let record = ImdbRecord {
            valid_answers_tokens: Some(vec!["yes".to_string(); 11]),
            ..ImdbRecord::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let err = resolve_answer(0, &record, &answer_vocab(), &mut rng).unwrap_err();
        assert!(matches!(err, DatasetError::CapacityExceeded { .. }));
    }
}
