// ============================================================
// Layer 3 — Imdb Record Domain Type
// ============================================================
// One entry of the image index database (imdb): the metadata
// for a single question about a single image.
//
// A record carries the question tokens and, depending on the
// split, either one ground-truth answer, a list of human
// annotations, or no answer at all (test split). Layout tokens
// are only present in imdbs built for modular networks.
//
// Fields this crate does not interpret are kept in `extra` so
// verbose output can echo the record back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-example metadata, as stored in the imdb.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImdbRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<u64>,

    /// Relative path of the feature file inside each feature directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_str: Option<String>,

    pub question_tokens: Vec<String>,

    /// Single ground-truth answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_tokens: Option<String>,

    /// Human annotations, possibly repeated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_answers_tokens: Option<Vec<String>>,

    /// Module names of the reference program
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt_layout_tokens: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImdbRecord {
    /// Minimal record with only question tokens set
    pub fn with_question<S: Into<String>>(tokens: impl IntoIterator<Item = S>) -> Self {
        Self {
            question_tokens: tokens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Header fields stored alongside the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImdbHeader {
    pub version: u32,

    #[serde(default)]
    pub has_answer: bool,

    #[serde(default)]
    pub has_gt_layout: bool,
}
