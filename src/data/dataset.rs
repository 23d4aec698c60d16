// ============================================================
// Layer 4 — VQA Dataset
// ============================================================
// Joins the imdb, the vocabularies and the feature store into
// one VqaSample per index.
//
// Construction (fails fast, in this order):
//   1. imdb version must equal IMDB_VERSION
//   2. load_gt_layout requires T_decoder and an assembler
//   3. question and answer vocabularies are loaded
//   4. the feature store is opened; bounding boxes are only
//      requested when layouts are loaded
//
// get(idx):
//   record → encode question → fetch features → resolve
//   answer → prune/encode layout → VqaSample
//
// Nothing is cached between calls; every sample is built fresh.
// The only shared state is read-only behind Arc, so the dataset
// can be read from many data-loader workers at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;

use crate::data::answers::resolve_answer;
use crate::data::features::merge_feature_slots;
use crate::data::layout::encode_layout;
use crate::data::params::DatasetParams;
use crate::data::question::encode_question;
use crate::data::vocab::VocabDict;
use crate::domain::error::{DatasetError, FormatError, Result};
use crate::domain::record::ImdbHeader;
use crate::domain::sample::VqaSample;
use crate::domain::traits::{FeatureStore, FeatureStoreConfig, IndexDatabase, LayoutAssembler};
use crate::infra::feature_store::SafetensorsFeatureStore;
use crate::infra::imdb::{ImageIndexDatabase, IMDB_VERSION};

/// Layout settings, only present when ground-truth layouts load
#[derive(Clone)]
struct LayoutOptions {
    t_decoder: usize,
    assembler: Arc<dyn LayoutAssembler>,
    prune:     bool,
}

/// One VQA split: imdb records joined with vocabularies and
/// region features.
///
/// `F` is the feature store. It defaults to safetensors files on
/// disk; tests plug in an in-memory store.
pub struct VqaDataset<F: FeatureStore = SafetensorsFeatureStore> {
    /// Per-example metadata, shared with the feature store
    imdb: Arc<dyn IndexDatabase>,

    /// Region features, one slot per configured directory
    features: F,

    /// Question word → index; unknown words map to <unk>
    question_vocab: Arc<VocabDict>,

    /// Answer word → index; also sizes the soft-score vector
    answer_vocab: Arc<VocabDict>,

    /// Fixed length of `input_seq`
    t_encoder: usize,

    /// Resolve answer labels and soft scores per sample
    load_answer: bool,

    /// Present only when ground-truth layouts are loaded
    layout: Option<LayoutOptions>,

    /// Attach the raw record to every sample
    verbose: bool,
}

impl VqaDataset<SafetensorsFeatureStore> {
    /// Open the imdb file and build a dataset reading
    /// safetensors features from `feature_dirs`.
    pub fn open(
        imdb_path:    impl AsRef<Path>,
        feature_dirs: Vec<PathBuf>,
        params:       &DatasetParams,
        assembler:    Option<Arc<dyn LayoutAssembler>>,
    ) -> Result<Self> {
        let imdb = ImageIndexDatabase::open(imdb_path)?;
        Self::from_database(Arc::new(imdb), feature_dirs, params, assembler)
    }
}

impl<F: FeatureStore> VqaDataset<F> {
    pub fn from_database(
        imdb:         Arc<dyn IndexDatabase>,
        feature_dirs: Vec<PathBuf>,
        params:       &DatasetParams,
        assembler:    Option<Arc<dyn LayoutAssembler>>,
    ) -> Result<Self> {
        // ── Step 1: schema version ────────────────────────────────────────────
        let observed = imdb.version();
        if observed != IMDB_VERSION {
            tracing::error!(
                "observed imdb version is {}, expected imdb version is {}",
                observed,
                IMDB_VERSION
            );
            return Err(FormatError::VersionMismatch { expected: IMDB_VERSION, observed }.into());
        }

        // ── Step 2: layout options ────────────────────────────────────────────
        let layout = if params.load_gt_layout {
            let t_decoder = params.t_decoder.ok_or(DatasetError::MissingConfig {
                key:    "T_decoder",
                reason: "load_gt_layout is set",
            })?;
            let assembler = assembler.ok_or(DatasetError::MissingConfig {
                key:    "assembler",
                reason: "load_gt_layout is set",
            })?;
            Some(LayoutOptions {
                t_decoder,
                assembler,
                prune: params.prune_filter_module,
            })
        } else {
            tracing::info!("Not loading ground-truth layout");
            None
        };

        for warning in header_mismatches(imdb.header(), params) {
            tracing::warn!("{}", warning);
        }

        // ── Step 3: vocabularies ──────────────────────────────────────────────
        // The answer vocabulary loads even without load_answer so
        // answer indices stay consistent with other datasets.
        let question_vocab = Arc::new(VocabDict::from_file(&params.vocab_question_file)?);
        let answer_vocab   = Arc::new(VocabDict::from_file(&params.vocab_answer_file)?);

        // ── Step 4: feature store ─────────────────────────────────────────────
        let store_config = FeatureStoreConfig {
            feature_dirs,
            channel_first: params.image_depth_first,
            max_regions:   params.image_max_loc,
            return_info:   layout.is_some(),
        };
        let features = F::open(store_config, Arc::clone(&imdb))?;

        tracing::info!(
            "Dataset ready: {} examples, {} question words, {} answers",
            imdb.len(),
            question_vocab.num_vocab(),
            answer_vocab.num_vocab()
        );

        Ok(Self {
            imdb,
            features,
            question_vocab,
            answer_vocab,
            t_encoder: params.t_encoder,
            load_answer: params.load_answer,
            layout,
            verbose: params.verbose,
        })
    }

    pub fn len(&self) -> usize {
        self.imdb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imdb.is_empty()
    }

    pub fn question_vocab(&self) -> &Arc<VocabDict> {
        &self.question_vocab
    }

    pub fn answer_vocab(&self) -> &Arc<VocabDict> {
        &self.answer_vocab
    }

    pub fn imdb(&self) -> &Arc<dyn IndexDatabase> {
        &self.imdb
    }

    pub fn feature_store(&self) -> &F {
        &self.features
    }

    pub fn t_encoder(&self) -> usize {
        self.t_encoder
    }

    /// Assemble sample `idx`, drawing the training answer with
    /// the thread-local RNG.
    pub fn get(&self, idx: usize) -> Result<VqaSample> {
        self.get_with_rng(idx, &mut rand::thread_rng())
    }

    /// Assemble sample `idx` with an explicit random source.
    pub fn get_with_rng<R: Rng + ?Sized>(&self, idx: usize, rng: &mut R) -> Result<VqaSample> {
        let record = self.imdb.record(idx)?;

        let question = encode_question(&record.question_tokens, &self.question_vocab, self.t_encoder)?;
        let merged   = merge_feature_slots(self.features.features(idx)?);

        let (answer_label, valid_answers) = if self.load_answer {
            let answer = resolve_answer(idx, &record, &self.answer_vocab, rng)?;
            (Some(answer.answer_label), answer.valid_answers)
        } else {
            (None, None)
        };

        let gt_layout = match &self.layout {
            Some(opts) => {
                let tokens = record
                    .gt_layout_tokens
                    .clone()
                    .ok_or(DatasetError::MissingField { idx, field: "gt_layout_tokens" })?;
                Some(encode_layout(tokens, opts.prune, opts.assembler.as_ref(), opts.t_decoder)?)
            }
            None => None,
        };

        Ok(VqaSample {
            input_seq:      question.input_seq,
            seq_length:     question.seq_length,
            image_features: merged.image_features,
            image_dim:      merged.image_dim,
            image_boxes:    merged.image_boxes,
            answer_label,
            valid_answers,
            gt_layout,
            verbose_info:   self.verbose.then_some(record),
        })
    }
}

/// Settings that ask for data the imdb header says it lacks.
/// Records are still read; a record that really lacks the field
/// fails in `get`.
fn header_mismatches(header: ImdbHeader, params: &DatasetParams) -> Vec<&'static str> {
    let mut out = Vec::new();
    if params.load_answer && !header.has_answer {
        out.push("Answers requested but imdb header says it has none");
    }
    if params.load_gt_layout && !header.has_gt_layout {
        out.push("Ground-truth layouts requested but imdb header says it has none");
    }
    out
}

// ─── Burn Dataset Trait Implementation ────────────────────────────────────────
// Lets a burn DataLoader pull samples directly.
//
// burn's trait has no error channel, and its loader reads None
// as the end of the dataset. A failed example therefore panics
// with the index and the error instead of cutting the epoch
// short. Callers that want to recover should use `get`.
impl<F: FeatureStore> burn::data::dataset::Dataset<VqaSample> for VqaDataset<F> {
    fn get(&self, index: usize) -> Option<VqaSample> {
        if index >= VqaDataset::<F>::len(self) {
            return None;
        }
        match VqaDataset::<F>::get(self, index) {
            Ok(sample) => Some(sample),
            Err(e) => {
                tracing::error!("Cannot assemble example {}: {}", index, e);
                panic!("cannot assemble example {index}: {e}");
            }
        }
    }

    fn len(&self) -> usize {
        VqaDataset::<F>::len(self)
    }
}
