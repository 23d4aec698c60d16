// ============================================================
// Layer 5 — Image Index Database (imdb)
// ============================================================
// Loads the imdb from a JSON file:
//
//   {
//     "version": 1,
//     "has_answer": true,
//     "has_gt_layout": false,
//     "records": [
//       { "image_name": "COCO_val2014_000000000042",
//         "feature_path": "COCO_val2014_000000000042.safetensors",
//         "question_tokens": ["what", "is", "this"],
//         "valid_answers_tokens": ["pizza", "pizza", "food"] },
//       ...
//     ]
//   }
//
// Only the format is checked here. The version is checked by
// the dataset against IMDB_VERSION so injected databases get
// the same treatment.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::error::{DatasetError, FormatError, Result};
use crate::domain::record::{ImdbHeader, ImdbRecord};
use crate::domain::traits::IndexDatabase;

/// Schema version this crate reads
pub const IMDB_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ImdbFile {
    #[serde(flatten)]
    header: ImdbHeader,
    records: Vec<ImdbRecord>,
}

/// In-memory imdb; records are cloned out on access.
#[derive(Debug, Clone)]
pub struct ImageIndexDatabase {
    header:  ImdbHeader,
    records: Vec<ImdbRecord>,
}

impl ImageIndexDatabase {
    pub fn new(header: ImdbHeader, records: Vec<ImdbRecord>) -> Self {
        Self { header, records }
    }

    /// Open an imdb file. Only `.json` is recognised.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(FormatError::UnknownFormat { path: path.to_path_buf() }.into());
        }

        let text = fs::read_to_string(path)?;
        let file: ImdbFile = serde_json::from_str(&text).map_err(|e| FormatError::Malformed {
            path:    path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::info!(
            "Opened imdb '{}': version {}, {} records",
            path.display(),
            file.header.version,
            file.records.len()
        );
        Ok(Self::new(file.header, file.records))
    }

    /// Write the imdb back out as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = ImdbFile {
            header:  self.header,
            records: self.records.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

impl IndexDatabase for ImageIndexDatabase {
    fn header(&self) -> ImdbHeader {
        self.header
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn record(&self, idx: usize) -> Result<ImdbRecord> {
        self.records
            .get(idx)
            .cloned()
            .ok_or(DatasetError::IndexOutOfRange { idx, len: self.records.len() })
    }
}
