// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The dataset talks to its three collaborators only through
// these traits:
//   - IndexDatabase   → ImageIndexDatabase (JSON imdb)
//   - FeatureStore    → SafetensorsFeatureStore
//   - LayoutAssembler → ModuleAssembler
//
// All of them are shared read-only across data-loader workers,
// hence the Send + Sync bounds.

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::error::Result;
use crate::domain::record::{ImdbHeader, ImdbRecord};
use crate::domain::sample::ImageFeatures;

// ─── IndexDatabase ────────────────────────────────────────────────────────────
/// Ordered, versioned collection of per-example records.
pub trait IndexDatabase: Send + Sync {
    fn header(&self) -> ImdbHeader;

    /// Number of examples (the header is not counted)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch one record. Returns an owned copy; callers may mutate it.
    fn record(&self, idx: usize) -> Result<ImdbRecord>;

    fn version(&self) -> u32 {
        self.header().version
    }
}

// ─── FeatureStore ─────────────────────────────────────────────────────────────
/// Options the dataset resolves before opening its feature store.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStoreConfig {
    /// One directory per feature slot
    pub feature_dirs: Vec<PathBuf>,
    /// Return arrays as [dim, regions] instead of [regions, dim]
    pub channel_first: bool,
    /// Pad/truncate every array to this many regions
    pub max_regions: Option<usize>,
    /// Also return bounding boxes
    pub return_info: bool,
}

/// Random-access source of region features.
pub trait FeatureStore: Send + Sync + Sized {
    fn open(config: FeatureStoreConfig, imdb: Arc<dyn IndexDatabase>) -> Result<Self>;

    fn features(&self, idx: usize) -> Result<ImageFeatures>;
}

// ─── LayoutAssembler ──────────────────────────────────────────────────────────
/// Encodes module-name layouts into fixed-length decoder targets.
pub trait LayoutAssembler: Send + Sync {
    /// Encode `modules` into exactly `t_decoder` indices.
    fn module_list_to_tokens(&self, modules: &[String], t_decoder: usize) -> Result<Vec<i32>>;

    /// Inverse of `module_list_to_tokens`, dropping the padding.
    fn tokens_to_module_list(&self, tokens: &[i32]) -> Result<Vec<String>>;
}
