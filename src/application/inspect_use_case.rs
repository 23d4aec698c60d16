// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Builds the dataset exactly as a training job would and
// assembles a single sample for a human to look at.
//
//   Step 1: Load dataset params         (data)
//   Step 2: Build the layout assembler  (infra, if needed)
//   Step 3: Open the dataset            (data + infra)
//   Step 4: Assemble one sample         (data)
//   Step 5: Re-encode a raw question    (data, optional)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::data::dataset::VqaDataset;
use crate::data::params::DatasetParams;
use crate::data::question::encode_question;
use crate::data::vocab::tokenize;
use crate::domain::sample::VqaSample;
use crate::domain::traits::LayoutAssembler;
use crate::infra::assembler::ModuleAssembler;

// ─── Inspect Configuration ───────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectConfig {
    pub params_file:  PathBuf,
    pub imdb_file:    PathBuf,
    pub feature_dirs: Vec<PathBuf>,
    pub index:        usize,
    /// Fixed seed for the valid-answer draw
    pub seed:         Option<u64>,
    /// Force verbose output regardless of the params file
    pub verbose:      bool,
    /// Raw question to tokenize and encode in place of the
    /// record's question tokens
    #[serde(default)]
    pub question:     Option<String>,
}

pub struct InspectUseCase {
    config: InspectConfig,
}

impl InspectUseCase {
    pub fn new(config: InspectConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<VqaSample> {
        let cfg = &self.config;

        // ── Step 1: Dataset params ────────────────────────────────────────────
        let mut params = DatasetParams::from_json_file(&cfg.params_file).with_context(|| {
            format!("Cannot read dataset params '{}'", cfg.params_file.display())
        })?;
        params.verbose |= cfg.verbose;

        // ── Steps 2–3: Assembler and dataset ──────────────────────────────────
        let dataset = open_dataset(&cfg.imdb_file, cfg.feature_dirs.clone(), &params)?;

        if cfg.index >= dataset.len() {
            anyhow::bail!(
                "index {} out of range: dataset has {} examples",
                cfg.index,
                dataset.len()
            );
        }

        // ── Step 4: Assemble ──────────────────────────────────────────────────
        let mut sample = match cfg.seed {
            Some(seed) => dataset.get_with_rng(cfg.index, &mut StdRng::seed_from_u64(seed)),
            None => dataset.get(cfg.index),
        }
        .with_context(|| format!("Cannot assemble example {}", cfg.index))?;

        // ── Step 5: Raw question override ─────────────────────────────────────
        if let Some(question) = &cfg.question {
            let tokens  = tokenize(question);
            let encoded = encode_question(&tokens, dataset.question_vocab(), dataset.t_encoder())
                .with_context(|| format!("Cannot encode question '{question}'"))?;
            tracing::info!("Encoded raw question as {:?}", tokens);
            sample.input_seq  = encoded.input_seq;
            sample.seq_length = encoded.seq_length;
        }

        tracing::info!(
            "Assembled example {} ({} feature slots)",
            cfg.index,
            sample.image_features.len()
        );
        Ok(sample)
    }
}

/// Open a dataset from params, building a ModuleAssembler from
/// `assembler_vocab_file` when layouts are requested.
pub fn open_dataset(
    imdb_file:    &Path,
    feature_dirs: Vec<PathBuf>,
    params:       &DatasetParams,
) -> Result<VqaDataset> {
    let assembler: Option<Arc<dyn LayoutAssembler>> = match &params.assembler_vocab_file {
        Some(path) if params.load_gt_layout => {
            let asm = ModuleAssembler::from_file(path).with_context(|| {
                format!("Cannot load layout modules from '{}'", path.display())
            })?;
            Some(Arc::new(asm))
        }
        _ => None,
    };

    VqaDataset::open(imdb_file, feature_dirs, params, assembler)
        .with_context(|| format!("Cannot open dataset from imdb '{}'", imdb_file.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::domain::record::{ImdbHeader, ImdbRecord};
    use crate::domain::sample::FeatureArray;
    use crate::infra::feature_store::{write_tensors, FEATURES_KEY};
    use crate::infra::imdb::{ImageIndexDatabase, IMDB_VERSION};

    /// Lays out a complete on-disk dataset in a temp dir.
    fn write_dataset(dir: &std::path::Path) -> InspectConfig {
        fs::write(dir.join("q.txt"), "<unk>\nwhat\nis\nthis\n").unwrap();
        fs::write(dir.join("a.txt"), "<unk>\npizza\nfood\n").unwrap();
        fs::write(dir.join("layout.txt"), "_Find\n_Filter\n_Describe\n<eos>\n").unwrap();

        let params = serde_json::json!({
            "vocab_question_file": dir.join("q.txt"),
            "vocab_answer_file": dir.join("a.txt"),
            "T_encoder": 5,
            "image_max_loc": 3,
            "load_gt_layout": true,
            "T_decoder": 4,
            "assembler_vocab_file": dir.join("layout.txt"),
            "prune_filter_module": true
        });
        fs::write(dir.join("params.json"), params.to_string()).unwrap();

        let mut rec = ImdbRecord::with_question(["what", "is", "this"]);
        rec.feature_path = Some("img.safetensors".into());
        rec.valid_answers_tokens = Some(vec!["pizza".into(), "pizza".into(), "food".into()]);
        rec.gt_layout_tokens = Some(vec!["_Find".into(), "_Filter".into(), "_Describe".into()]);
        let header = ImdbHeader { version: IMDB_VERSION, has_answer: true, has_gt_layout: true };
        ImageIndexDatabase::new(header, vec![rec]).save(dir.join("imdb.json")).unwrap();

        let feats = dir.join("feats");
        fs::create_dir_all(&feats).unwrap();
        let array = FeatureArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        write_tensors(&feats.join("img.safetensors"), &[(FEATURES_KEY, &array)]).unwrap();

        InspectConfig {
            params_file:  dir.join("params.json"),
            imdb_file:    dir.join("imdb.json"),
            feature_dirs: vec![feats],
            index:        0,
            seed:         Some(11),
            verbose:      false,
            question:     None,
        }
    }

    #[test]
    fn test_inspect_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = write_dataset(dir.path());

        let sample = InspectUseCase::new(cfg).execute().unwrap();
        assert_eq!(sample.input_seq, vec![1, 2, 3, 0, 0]);
        assert_eq!(sample.image_features[0].shape, vec![3, 2]);
        assert_eq!(sample.image_dim, Some(2));
        // _Find _Describe <eos> <eos>
        assert_eq!(sample.gt_layout, Some(vec![0, 2, 3, 3]));
        assert!(sample.valid_answers.is_some());
        assert!(sample.verbose_info.is_none());
    }

    #[test]
    fn test_verbose_override_and_seed_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = write_dataset(dir.path());
        cfg.verbose = true;

        let a = InspectUseCase::new(cfg.clone()).execute().unwrap();
        let b = InspectUseCase::new(cfg).execute().unwrap();
        assert!(a.verbose_info.is_some());
        assert_eq!(a.answer_label, b.answer_label);
    }

    #[test]
    fn test_raw_question_replaces_record_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = write_dataset(dir.path());
        cfg.question = Some("What is THIS, doc?".into());

        let sample = InspectUseCase::new(cfg).execute().unwrap();
        // what is this , doc ? → the last three are <unk>; cut to T_encoder = 5
        assert_eq!(sample.input_seq, vec![1, 2, 3, 0, 0]);
        assert_eq!(sample.seq_length, 6);
    }

    #[test]
    fn test_index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = write_dataset(dir.path());
        cfg.index = 4;
        assert!(InspectUseCase::new(cfg).execute().is_err());
    }
}
