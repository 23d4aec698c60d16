// ============================================================
// Layer 4 — VQA Batcher
// ============================================================
// Implements Burn's Batcher trait to stack Vec<VqaSample> into
// backend tensors.
//
//   input_seq      [N, T_encoder]        Int
//   seq_length     [N]                   Int
//   image_feature  [N, regions, dim]     Float  (slot 0)
//   answer_label   [N]                   Int    (optional)
//   valid_answers  [N, 10]               Int    (optional)
//   answer_scores  [N, num_answers]      Float  (optional)
//   gt_layout      [N, T_decoder]        Int    (optional)
//
// Optional tensors are built only when every sample in the
// batch carries the field. Feature arrays must share one shape
// across the batch, so datasets feeding this batcher should set
// image_max_loc.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::{VqaSample, MAX_VALID_ANSWERS};

// ─── VqaBatch ─────────────────────────────────────────────────────────────────
/// A batch of VQA samples ready for a model forward pass.
/// Every tensor has the batch size N as its first dimension.
///
/// Optional tensors are `None` unless every sample in the batch
/// carried the field.
#[derive(Debug, Clone)]
pub struct VqaBatch<B: Backend> {
    /// Question indices — shape: [N, T_encoder]
    /// Zero-padded; rows longer than T_encoder were cut
    pub input_seq: Tensor<B, 2, Int>,

    /// Question lengths before truncation — shape: [N]
    /// May exceed T_encoder, so clamp before using as a mask
    pub seq_length: Tensor<B, 1, Int>,

    /// Region features of slot 0 — shape: [N, regions, dim]
    /// ([N, dim, regions] when the dataset is channel-first)
    pub image_feature: Option<Tensor<B, 3>>,

    /// Training answer index — shape: [N]
    /// A random annotator's answer for multi-answer records
    pub answer_label: Option<Tensor<B, 1, Int>>,

    /// Annotator answer indices — shape: [N, 10]
    /// Unused slots hold -1
    pub valid_answers: Option<Tensor<B, 2, Int>>,

    /// Soft answer scores — shape: [N, num_answers]
    /// 0.3 per agreeing annotator, capped at 1.0
    pub answer_scores: Option<Tensor<B, 2>>,

    /// Reference layout module indices — shape: [N, T_decoder]
    /// Padded with the assembler's <eos> index
    pub gt_layout: Option<Tensor<B, 2, Int>>,
}

// ─── VqaBatcher ───────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created where the
/// model runs.
///
/// # Panics
///
/// `batch` panics when samples disagree on a shape: question or
/// layout rows of different lengths, or slot-0 feature arrays of
/// different shapes. burn's `Batcher` has no error channel; the
/// message names the offending sample.
#[derive(Clone, Debug)]
pub struct VqaBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
}

impl<B: Backend> VqaBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn int_matrix(&self, field: &str, rows: Vec<&[i32]>) -> Tensor<B, 2, Int> {
        let n = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        if let Some(i) = rows.iter().position(|r| r.len() != width) {
            panic!(
                "{field}: sample {i} in batch has {} entries, sample 0 has {width}",
                rows[i].len()
            );
        }

        let flat: Vec<i32> = rows.into_iter().flatten().copied().collect();
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([n, width])
    }

    fn image_features(&self, items: &[VqaSample]) -> Option<Tensor<B, 3>> {
        let first = items.first()?.image_features.first()?;
        if first.shape.len() != 2 {
            return None;
        }
        let (rows, cols) = (first.shape[0], first.shape[1]);

        let mut flat = Vec::with_capacity(items.len() * rows * cols);
        for (i, item) in items.iter().enumerate() {
            let f = item.image_features.first()?;
            if f.shape != first.shape {
                panic!(
                    "image_feature: sample {i} in batch has shape {:?}, sample 0 has {:?}; \
                     set image_max_loc",
                    f.shape, first.shape
                );
            }
            flat.extend_from_slice(&f.data);
        }

        Some(
            Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
                .reshape([items.len(), rows, cols]),
        )
    }
}

impl<B: Backend> Batcher<VqaSample, VqaBatch<B>> for VqaBatcher<B> {
    fn batch(&self, items: Vec<VqaSample>) -> VqaBatch<B> {
        let n = items.len();

        let input_seq = self.int_matrix(
            "input_seq",
            items.iter().map(|s| s.input_seq.as_slice()).collect(),
        );

        let lengths: Vec<i32> = items.iter().map(|s| s.seq_length as i32).collect();
        let seq_length = Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), &self.device);

        let image_feature = self.image_features(&items);

        // ── Answers ───────────────────────────────────────────────────────────
        let answer_label = items
            .iter()
            .map(|s| s.answer_label)
            .collect::<Option<Vec<i32>>>()
            .map(|labels| Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device));

        let valid: Option<Vec<_>> = items.iter().map(|s| s.valid_answers.as_ref()).collect();

        let (valid_answers, answer_scores) = match valid {
            Some(valid) if n > 0 => {
                let rows   = valid.iter().map(|v| &v.labels[..]).collect();
                let labels = self.int_matrix("valid_answers", rows);
                debug_assert_eq!(labels.dims(), [n, MAX_VALID_ANSWERS]);

                let num_answers = valid[0].scores.len();
                let flat: Vec<f32> = valid.iter().flat_map(|v| v.scores.iter().copied()).collect();
                let scores = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
                    .reshape([n, num_answers]);
                (Some(labels), Some(scores))
            }
            _ => (None, None),
        };

        // ── Layouts ───────────────────────────────────────────────────────────
        let gt_layout = items
            .iter()
            .map(|s| s.gt_layout.as_deref())
            .collect::<Option<Vec<&[i32]>>>()
            .filter(|rows| !rows.is_empty())
            .map(|rows| self.int_matrix("gt_layout", rows));

        VqaBatch {
            input_seq,
            seq_length,
            image_feature,
            answer_label,
            valid_answers,
            answer_scores,
            gt_layout,
        }
    }
}
