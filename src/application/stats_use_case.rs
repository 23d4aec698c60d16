// ============================================================
// Layer 2 — StatsUseCase
// ============================================================
// Scans every imdb record through the question and answer
// vocabularies and reports how well they cover the data. Does
// not touch image features, so it runs without them.
//
// Typical use: picking T_encoder (how many questions get cut)
// and checking an answer vocabulary against a new split.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::answers::valid_answer_labels;
use crate::data::params::DatasetParams;
use crate::data::question::encode_question;
use crate::data::vocab::VocabDict;
use crate::domain::record::ImdbRecord;
use crate::domain::traits::IndexDatabase;
use crate::infra::imdb::{ImageIndexDatabase, IMDB_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    pub params_file: PathBuf,
    pub imdb_file:   PathBuf,
}

/// Coverage report for one imdb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub examples:              usize,
    pub t_encoder:             usize,
    pub max_question_len:      usize,
    pub mean_question_len:     f64,
    /// Questions longer than T_encoder
    pub truncated_questions:   usize,
    /// Fraction of question tokens mapped to <unk>
    pub unk_question_rate:     f64,
    /// Records with a single answer
    pub single_answer:         usize,
    /// Records with a valid-answer list
    pub multi_answer:          usize,
    /// Records with more annotations than the label buffer holds
    pub over_capacity:         usize,
    /// Fraction of annotations mapped to <unk>
    pub unk_answer_rate:       f64,
    pub with_gt_layout:        usize,
}

pub struct StatsUseCase {
    config: StatsConfig,
}

impl StatsUseCase {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<DatasetStats> {
        let cfg = &self.config;

        let params = DatasetParams::from_json_file(&cfg.params_file).with_context(|| {
            format!("Cannot read dataset params '{}'", cfg.params_file.display())
        })?;
        let imdb = ImageIndexDatabase::open(&cfg.imdb_file)
            .with_context(|| format!("Cannot open imdb '{}'", cfg.imdb_file.display()))?;
        if imdb.version() != IMDB_VERSION {
            anyhow::bail!(
                "imdb version {} does not match expected {}",
                imdb.version(),
                IMDB_VERSION
            );
        }

        let question_vocab = VocabDict::from_file(&params.vocab_question_file)
            .context("Cannot load question vocabulary")?;
        let answer_vocab = VocabDict::from_file(&params.vocab_answer_file)
            .context("Cannot load answer vocabulary")?;

        let records = (0..imdb.len())
            .map(|i| imdb.record(i))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let stats = collect_stats(&records, &question_vocab, &answer_vocab, params.t_encoder)?;
        tracing::info!(
            "Scanned {} examples: {} truncated, unk answer rate {:.3}",
            stats.examples,
            stats.truncated_questions,
            stats.unk_answer_rate
        );
        Ok(stats)
    }
}

pub fn collect_stats(
    records:        &[ImdbRecord],
    question_vocab: &VocabDict,
    answer_vocab:   &VocabDict,
    t_encoder:      usize,
) -> Result<DatasetStats> {
    let mut stats = DatasetStats {
        examples: records.len(),
        t_encoder,
        ..DatasetStats::default()
    };

    let mut question_tokens = 0usize;
    let mut unk_question    = 0usize;
    let mut annotations     = 0usize;
    let mut unk_answers     = 0usize;

    let q_unk = question_vocab.unk_idx().map(|i| i as i32);
    let a_unk = answer_vocab.unk_idx();

    for record in records {
        let q = encode_question(&record.question_tokens, question_vocab, t_encoder)?;
        stats.max_question_len = stats.max_question_len.max(q.seq_length);
        question_tokens += q.seq_length;
        if q.seq_length > t_encoder {
            stats.truncated_questions += 1;
        }
        for token in &record.question_tokens {
            if Some(question_vocab.word_to_index(token)? as i32) == q_unk {
                unk_question += 1;
            }
        }

        if record.answer_tokens.is_some() {
            stats.single_answer += 1;
        }
        if let Some(tokens) = &record.valid_answers_tokens {
            stats.multi_answer += 1;
            let indices = tokens
                .iter()
                .map(|t| answer_vocab.word_to_index(t))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            if valid_answer_labels(&indices).is_err() {
                stats.over_capacity += 1;
            }
            annotations += indices.len();
            unk_answers += indices.iter().filter(|&&i| Some(i) == a_unk).count();
        }

        if record.gt_layout_tokens.is_some() {
            stats.with_gt_layout += 1;
        }
    }

    let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };
    stats.mean_question_len = ratio(question_tokens, records.len());
    stats.unk_question_rate = ratio(unk_question, question_tokens);
    stats.unk_answer_rate   = ratio(unk_answers, annotations);

    Ok(stats)
}
