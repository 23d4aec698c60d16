// ============================================================
// Layer 4 — Feature Merge
// ============================================================
// Copies what the feature store returned into sample fields.
//
// Slots are taken in order 0, 1, 2, ... and the copy stops at
// the first missing slot. A store returning {0, 2} therefore
// yields only image_feature_0. Stores built from a list of
// feature directories always fill slots contiguously, so this
// only bites hand-made stores.

use crate::domain::sample::{FeatureArray, ImageFeatures};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedFeatures {
    pub image_features: Vec<FeatureArray>,
    pub image_dim: Option<usize>,
    pub image_boxes: Option<FeatureArray>,
}

pub fn merge_feature_slots(features: ImageFeatures) -> MergedFeatures {
    let ImageFeatures { mut slots, info } = features;

    let mut image_features = Vec::with_capacity(slots.len());
    for slot in 0usize.. {
        match slots.remove(&slot) {
            Some(array) => image_features.push(array),
            None => break,
        }
    }
    if !slots.is_empty() {
        tracing::trace!("Dropped {} non-contiguous feature slots", slots.len());
    }

    let (image_dim, image_boxes) = match info {
        Some(info) => (info.max_bboxes, info.bboxes),
        None => (None, None),
    };

    MergedFeatures { image_features, image_dim, image_boxes }
}
