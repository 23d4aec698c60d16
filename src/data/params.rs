// ============================================================
// Layer 4 — Dataset Parameters
// ============================================================
// The configuration bundle for one dataset, loadable from JSON.
// Key names follow the data_params files used by existing
// training configs, e.g.
//
//   {
//     "image_depth_first": false,
//     "image_max_loc": 100,
//     "vocab_question_file": "vocabs/vocabulary_vqa.txt",
//     "vocab_answer_file": "vocabs/answers_vqa.txt",
//     "T_encoder": 14,
//     "load_gt_layout": true,
//     "T_decoder": 13,
//     "assembler_vocab_file": "vocabs/vocabulary_layout.txt",
//     "prune_filter_module": true
//   }

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetParams {
    /// Return feature arrays as [dim, regions]
    #[serde(default)]
    pub image_depth_first: bool,

    /// Pad/truncate region features to this many regions
    #[serde(default)]
    pub image_max_loc: Option<usize>,

    /// Question vocabulary, one word per line
    pub vocab_question_file: PathBuf,

    /// Answer vocabulary, one answer per line.
    /// Loaded even when answers are off so indices stay stable
    pub vocab_answer_file: PathBuf,

    /// Fixed question length; longer questions are cut, shorter
    /// ones zero-padded
    #[serde(rename = "T_encoder", alias = "t_encoder")]
    pub t_encoder: usize,

    /// Resolve answer labels and soft scores; off for test splits
    /// without annotations
    #[serde(default = "default_true")]
    pub load_answer: bool,

    /// Encode each record's reference layout. Also makes the
    /// feature store return image info (region count, boxes)
    #[serde(default)]
    pub load_gt_layout: bool,

    /// Fixed layout length; required with load_gt_layout
    #[serde(default, rename = "T_decoder", alias = "t_decoder")]
    pub t_decoder: Option<usize>,

    /// Module vocabulary used to build a ModuleAssembler
    #[serde(default)]
    pub assembler_vocab_file: Option<PathBuf>,

    /// Drop `_Filter` modules that follow `_Find` or `_Filter`
    /// before encoding the layout
    #[serde(default)]
    pub prune_filter_module: bool,

    /// Attach the raw imdb record to every sample
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}

impl DatasetParams {
    /// Parameters with every optional feature switched off
    /// except answer loading.
    pub fn new(
        vocab_question_file: impl Into<PathBuf>,
        vocab_answer_file:   impl Into<PathBuf>,
        t_encoder:           usize,
    ) -> Self {
        Self {
            image_depth_first:    false,
            image_max_loc:        None,
            vocab_question_file:  vocab_question_file.into(),
            vocab_answer_file:    vocab_answer_file.into(),
            t_encoder,
            load_answer:          true,
            load_gt_layout:       false,
            t_decoder:            None,
            assembler_vocab_file: None,
            prune_filter_module:  false,
            verbose:              false,
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
