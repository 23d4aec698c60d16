// ============================================================
// Layer 3 — VqaSample Domain Type
// ============================================================
// The output of the dataset: everything one training step
// needs about one example.
//
// Optional fields are present only when the matching option is
// enabled (load_answer, load_gt_layout, verbose). Serialising a
// sample produces the flat key layout downstream tooling reads:
//
//   input_seq_batch, seq_length_batch,
//   image_feature_0 .. image_feature_k,
//   image_dim, image_boxes,
//   answer_label_batch, valid_ans_label_batch, answers,
//   gt_layout_batch, verbose_info

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::domain::record::ImdbRecord;

/// Capacity of the valid-answer label buffer
pub const MAX_VALID_ANSWERS: usize = 10;

/// Sentinel for unused valid-answer slots
pub const VALID_ANSWER_PAD: i32 = -1;

// ─── FeatureArray ─────────────────────────────────────────────────────────────
/// Dense row-major f32 array with its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureArray {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl FeatureArray {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data }
    }

    /// Number of rows (first dimension), 0 for a scalar
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Keep exactly `rows` rows: truncate, or append zero rows.
    /// Only meaningful for 2-D arrays; others are returned unchanged.
    pub fn fit_rows(self, rows: usize) -> Self {
        if self.shape.len() != 2 {
            return self;
        }
        let cols = self.shape[1];
        let mut data = self.data;
        data.resize(rows * cols, 0.0);
        Self { shape: vec![rows, cols], data }
    }

    /// Swap the two axes of a 2-D array.
    pub fn transposed(&self) -> Self {
        if self.shape.len() != 2 {
            return self.clone();
        }
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let mut data = vec![0.0f32; self.data.len()];
        for r in 0..rows {
            for c in 0..cols {
                data[c * rows + r] = self.data[r * cols + c];
            }
        }
        Self { shape: vec![cols, rows], data }
    }
}

// ─── ImageFeatures ────────────────────────────────────────────────────────────
/// Auxiliary per-image info attached to feature slot 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureInfo {
    /// Number of real (unpadded) regions
    pub max_bboxes: Option<usize>,
    /// Region boxes, shape [regions, 4]
    pub bboxes: Option<FeatureArray>,
}

/// What a feature store returns for one example.
/// Slots are keyed by feature-directory position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageFeatures {
    pub slots: BTreeMap<usize, FeatureArray>,
    pub info: Option<FeatureInfo>,
}

// ─── ValidAnswers ─────────────────────────────────────────────────────────────
/// Labels and soft scores derived from multiple human annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAnswers {
    /// One slot per annotation, in order, padded with -1
    pub labels: [i32; MAX_VALID_ANSWERS],
    /// Soft score per answer-vocabulary entry
    pub scores: Vec<f32>,
}

// ─── VqaSample ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct VqaSample {
    /// Question indices, zero-padded to T_encoder
    pub input_seq: Vec<i32>,
    /// Question length before truncation
    pub seq_length: usize,
    /// Feature slots 0..k, contiguous
    pub image_features: Vec<FeatureArray>,
    /// Real region count of slot 0 under the region cap
    pub image_dim: Option<usize>,
    /// Region boxes of slot 0, row-aligned with its features
    pub image_boxes: Option<FeatureArray>,
    /// Answer index to train on
    pub answer_label: Option<i32>,
    /// Present only for records with several annotations
    pub valid_answers: Option<ValidAnswers>,
    /// Layout module indices, <eos>-padded to T_decoder
    pub gt_layout: Option<Vec<i32>>,
    /// The raw record, when the dataset is verbose
    pub verbose_info: Option<ImdbRecord>,
}

impl Serialize for VqaSample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("input_seq_batch", &self.input_seq)?;
        map.serialize_entry("seq_length_batch", &self.seq_length)?;

        for (slot, feature) in self.image_features.iter().enumerate() {
            map.serialize_entry(&format!("image_feature_{slot}"), feature)?;
        }
        if let Some(dim) = self.image_dim {
            map.serialize_entry("image_dim", &dim)?;
        }
        if let Some(boxes) = &self.image_boxes {
            map.serialize_entry("image_boxes", boxes)?;
        }
        if let Some(label) = self.answer_label {
            map.serialize_entry("answer_label_batch", &label)?;
        }
        if let Some(valid) = &self.valid_answers {
            map.serialize_entry("valid_ans_label_batch", &valid.labels)?;
            map.serialize_entry("answers", &valid.scores)?;
        }
        if let Some(layout) = &self.gt_layout {
            map.serialize_entry("gt_layout_batch", layout)?;
        }
        if let Some(info) = &self.verbose_info {
            map.serialize_entry("verbose_info", info)?;
        }
        map.end()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_rows_pads_with_zeros() {
        let a = FeatureArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        let padded = a.fit_rows(3);
        assert_eq!(padded.shape, vec![3, 2]);
        assert_eq!(padded.data, vec![1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fit_rows_truncates() {
        let a = FeatureArray::new(vec![3, 1], vec![1.0, 2.0, 3.0]);
        let cut = a.fit_rows(2);
        assert_eq!(cut.shape, vec![2, 1]);
        assert_eq!(cut.data, vec![1.0, 2.0]);
    }

    #[test]
    fn test_transpose() {
        // [[1,2,3],[4,5,6]] → [[1,4],[2,5],[3,6]]
        let a = FeatureArray::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = a.transposed();
        assert_eq!(t.shape, vec![3, 2]);
        assert_eq!(t.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let sample = VqaSample {
            input_seq: vec![3, 4, 0],
            seq_length: 2,
            image_features: vec![FeatureArray::new(vec![1, 2], vec![0.5, 0.5])],
            image_dim: None,
            image_boxes: None,
            answer_label: Some(7),
            valid_answers: None,
            gt_layout: None,
            verbose_info: None,
        };
        let json = serde_json::to_value(&sample).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["input_seq_batch"], serde_json::json!([3, 4, 0]));
        assert_eq!(obj["seq_length_batch"], 2);
        assert_eq!(obj["answer_label_batch"], 7);
        assert!(obj.contains_key("image_feature_0"));
        assert!(!obj.contains_key("image_feature_1"));
        assert!(!obj.contains_key("answers"));
        assert!(!obj.contains_key("gt_layout_batch"));
        assert!(!obj.contains_key("verbose_info"));
    }
}
