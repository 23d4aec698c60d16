// ============================================================
// Layer 3 — Dataset Errors
// ============================================================
// Every failure the dataset can report, as one typed enum.
// The application layer wraps these in anyhow with context;
// library callers can match on the variant.
//
// Unknown question/answer words are NOT errors: they degrade
// to the vocabulary's <unk> index. Only a vocabulary without
// <unk> produces UnknownWord.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dataset operations
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Problems with the imdb file itself. Always fatal at construction.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The file extension is not one we know how to read
    #[error("unknown imdb format: '{}'", path.display())]
    UnknownFormat { path: PathBuf },

    /// The file parsed as the right format but its contents are wrong
    #[error("malformed imdb '{}': {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    /// Header version differs from the schema this crate reads
    #[error("imdb version does not match: expected {expected}, observed {observed}")]
    VersionMismatch { expected: u32, observed: u32 },
}

/// Errors raised while constructing the dataset or assembling a sample
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A configuration key required by the enabled options is absent
    #[error("missing required configuration '{key}' (needed when {reason})")]
    MissingConfig { key: &'static str, reason: &'static str },

    /// More human annotations than the valid-answer buffer holds
    #[error("{count} valid answers exceed the fixed capacity of {capacity}")]
    CapacityExceeded { count: usize, capacity: usize },

    /// Answer loading is on but the record lists no valid answers
    #[error("example {idx} has an empty valid-answer list")]
    NoValidAnswers { idx: usize },

    /// A record lacks a field the current configuration needs
    #[error("example {idx} is missing field '{field}'")]
    MissingField { idx: usize, field: &'static str },

    #[error("index {idx} out of range for dataset of length {len}")]
    IndexOutOfRange { idx: usize, len: usize },

    /// Lookup miss in a vocabulary that has no <unk> entry
    #[error("word '{word}' not in vocabulary (and vocabulary has no <unk>)")]
    UnknownWord { word: String },

    #[error("layout module '{name}' is not in the module vocabulary")]
    UnknownModule { name: String },

    /// The decoder needs one step left over for <eos>
    #[error("layout of {len} modules does not fit T_decoder={t_decoder} with <eos>")]
    LayoutTooLong { len: usize, t_decoder: usize },

    #[error("feature file '{}': {message}", path.display())]
    FeatureFile { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
