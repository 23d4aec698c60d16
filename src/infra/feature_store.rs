// ============================================================
// Layer 5 — Safetensors Feature Store
// ============================================================
// Reads precomputed region features for one image.
//
// Layout on disk, one directory per feature slot:
//
//   features/detectron/COCO_val2014_000000000042.safetensors
//   features/resnet/COCO_val2014_000000000042.safetensors
//
// The file name comes from the record's `feature_path`. Each
// file holds a "features" tensor [regions, dim] (f32 or f64);
// files in the first directory may also hold "bboxes"
// [regions, 4].
//
// With a region cap the array is zero-padded (or cut) to the
// cap. With channel_first it is returned as [dim, regions].
//
// Image info (max_bboxes, bboxes) is read only when the config
// asks for it. Boxes are padded or cut to the same cap as the
// features; max_bboxes is the real region count under the cap.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use safetensors::{Dtype, SafeTensors};

use crate::domain::error::{DatasetError, Result};
use crate::domain::sample::{FeatureArray, FeatureInfo, ImageFeatures};
use crate::domain::traits::{FeatureStore, FeatureStoreConfig, IndexDatabase};

/// Tensor name holding region features
pub const FEATURES_KEY: &str = "features";

/// Tensor name holding region boxes
pub const BBOXES_KEY: &str = "bboxes";

pub struct SafetensorsFeatureStore {
    config: FeatureStoreConfig,
    imdb:   Arc<dyn IndexDatabase>,
}

impl SafetensorsFeatureStore {
    pub fn config(&self) -> &FeatureStoreConfig {
        &self.config
    }

    fn feature_file(&self, dir: &Path, idx: usize) -> Result<PathBuf> {
        let record = self.imdb.record(idx)?;
        let rel = record
            .feature_path
            .ok_or(DatasetError::MissingField { idx, field: "feature_path" })?;
        Ok(dir.join(rel))
    }

    fn shape_features(&self, array: FeatureArray) -> FeatureArray {
        let array = match self.config.max_regions {
            Some(cap) => array.fit_rows(cap),
            None => array,
        };
        if self.config.channel_first {
            array.transposed()
        } else {
            array
        }
    }
}

impl FeatureStore for SafetensorsFeatureStore {
    fn open(config: FeatureStoreConfig, imdb: Arc<dyn IndexDatabase>) -> Result<Self> {
        for dir in &config.feature_dirs {
            if !dir.is_dir() {
                tracing::warn!("Feature directory '{}' does not exist", dir.display());
            }
        }
        tracing::debug!(
            "Feature store: {} dirs, channel_first={}, max_regions={:?}, return_info={}",
            config.feature_dirs.len(),
            config.channel_first,
            config.max_regions,
            config.return_info
        );
        Ok(Self { config, imdb })
    }

    fn features(&self, idx: usize) -> Result<ImageFeatures> {
        let mut out = ImageFeatures::default();

        for (slot, dir) in self.config.feature_dirs.iter().enumerate() {
            let path    = self.feature_file(dir, idx)?;
            let mut map = read_tensors(&path)?;

            let features = map.remove(FEATURES_KEY).ok_or_else(|| DatasetError::FeatureFile {
                path:    path.clone(),
                message: format!("no '{FEATURES_KEY}' tensor"),
            })?;

            if slot == 0 && self.config.return_info {
                let cap = self.config.max_regions;
                out.info = Some(FeatureInfo {
                    max_bboxes: cap.map(|cap| features.rows().min(cap)),
                    // Boxes stay row-aligned with the capped features
                    bboxes:     map.remove(BBOXES_KEY).map(|b| match cap {
                        Some(cap) => b.fit_rows(cap),
                        None => b,
                    }),
                });
            }

            out.slots.insert(slot, self.shape_features(features));
        }

        Ok(out)
    }
}

/// Read every f32/f64 tensor of a safetensors file.
pub fn read_tensors(path: &Path) -> Result<HashMap<String, FeatureArray>> {
    let bytes = fs::read(path)?;
    let file_err = |message: String| DatasetError::FeatureFile {
        path: path.to_path_buf(),
        message,
    };

    let tensors = SafeTensors::deserialize(&bytes).map_err(|e| file_err(e.to_string()))?;

    let mut out = HashMap::new();
    for (name, view) in tensors.tensors() {
        let data: Vec<f32> = match view.dtype() {
            Dtype::F32 => view
                .data()
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            Dtype::F64 => view
                .data()
                .chunks_exact(8)
                .map(|c| {
                    f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
                })
                .collect(),
            other => {
                return Err(file_err(format!("tensor '{name}' has unsupported dtype {other:?}")));
            }
        };
        out.insert(name, FeatureArray::new(view.shape().to_vec(), data));
    }
    Ok(out)
}

/// Write f32 arrays to a safetensors file.
pub fn write_tensors(path: &Path, arrays: &[(&str, &FeatureArray)]) -> Result<()> {
    let bytes: Vec<Vec<u8>> = arrays
        .iter()
        .map(|(_, a)| a.data.iter().flat_map(|v| v.to_le_bytes()).collect())
        .collect();

    let mut views = Vec::with_capacity(arrays.len());
    for ((name, array), raw) in arrays.iter().zip(&bytes) {
        let view = safetensors::tensor::TensorView::new(Dtype::F32, array.shape.clone(), raw)
            .map_err(|e| DatasetError::FeatureFile {
                path:    path.to_path_buf(),
                message: e.to_string(),
            })?;
        views.push((name.to_string(), view));
    }

    let serialized = safetensors::serialize(views, &None).map_err(|e| DatasetError::FeatureFile {
        path:    path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, serialized)?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{ImdbHeader, ImdbRecord};
    use crate::infra::imdb::{ImageIndexDatabase, IMDB_VERSION};

    fn imdb() -> Arc<dyn IndexDatabase> {
        let mut rec = ImdbRecord::with_question(["what"]);
        rec.feature_path = Some("img_1.safetensors".into());
        let header = ImdbHeader { version: IMDB_VERSION, has_answer: false, has_gt_layout: false };
        Arc::new(ImageIndexDatabase::new(header, vec![rec]))
    }

    fn config(dirs: Vec<PathBuf>) -> FeatureStoreConfig {
        FeatureStoreConfig {
            feature_dirs: dirs,
            channel_first: false,
            max_regions: None,
            return_info: false,
        }
    }

    // 2 regions × 3 dims
    fn features() -> FeatureArray {
        FeatureArray::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
    }

    fn boxes() -> FeatureArray {
        FeatureArray::new(vec![2, 4], vec![0.0, 0.0, 5.0, 5.0, 1.0, 1.0, 9.0, 9.0])
    }

    fn write_fixture(dir: &Path, with_boxes: bool) {
        let f = features();
        let b = boxes();
        let mut arrays = vec![(FEATURES_KEY, &f)];
        if with_boxes {
            arrays.push((BBOXES_KEY, &b));
        }
        write_tensors(&dir.join("img_1.safetensors"), &arrays).unwrap();
    }

    #[test]
    fn test_reads_one_slot_per_directory() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write_fixture(a.path(), false);
        write_fixture(b.path(), false);

        let store = SafetensorsFeatureStore::open(
            config(vec![a.path().to_path_buf(), b.path().to_path_buf()]),
            imdb(),
        )
        .unwrap();
        let out = store.features(0).unwrap();

        assert_eq!(out.slots.len(), 2);
        assert_eq!(out.slots[&0], features());
        assert_eq!(out.slots[&1], features());
        assert!(out.info.is_none());
    }

    #[test]
    fn test_region_cap_pads_and_reports_count() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), false);

        let mut cfg = config(vec![dir.path().to_path_buf()]);
        cfg.max_regions = Some(4);
        cfg.return_info = true;
        let store = SafetensorsFeatureStore::open(cfg, imdb()).unwrap();
        let out = store.features(0).unwrap();

        assert_eq!(out.slots[&0].shape, vec![4, 3]);
        assert_eq!(&out.slots[&0].data[6..], &[0.0; 6]);
        assert_eq!(out.info.unwrap().max_bboxes, Some(2));
    }

    #[test]
    fn test_region_cap_without_info_request_returns_no_info() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), true);

        let mut cfg = config(vec![dir.path().to_path_buf()]);
        cfg.max_regions = Some(4);
        let store = SafetensorsFeatureStore::open(cfg, imdb()).unwrap();
        let out = store.features(0).unwrap();

        assert_eq!(out.slots[&0].shape, vec![4, 3]);
        assert!(out.info.is_none());
    }

    #[test]
    fn test_boxes_follow_region_cap() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), true);

        // Cap above the stored count: boxes are zero-padded
        let mut cfg = config(vec![dir.path().to_path_buf()]);
        cfg.max_regions = Some(3);
        cfg.return_info = true;
        let store = SafetensorsFeatureStore::open(cfg, imdb()).unwrap();
        let out = store.features(0).unwrap();
        let info = out.info.unwrap();
        let bboxes = info.bboxes.unwrap();
        assert_eq!(bboxes.shape, vec![3, 4]);
        assert_eq!(bboxes.rows(), out.slots[&0].rows());
        assert_eq!(&bboxes.data[..8], &boxes().data[..]);
        assert_eq!(&bboxes.data[8..], &[0.0; 4]);
        assert_eq!(info.max_bboxes, Some(2));

        // Cap below the stored count: boxes of dropped regions go too
        let mut cfg = config(vec![dir.path().to_path_buf()]);
        cfg.max_regions = Some(1);
        cfg.return_info = true;
        let store = SafetensorsFeatureStore::open(cfg, imdb()).unwrap();
        let out = store.features(0).unwrap();
        let info = out.info.unwrap();
        assert_eq!(info.bboxes, Some(FeatureArray::new(vec![1, 4], vec![0.0, 0.0, 5.0, 5.0])));
        assert_eq!(out.slots[&0].shape, vec![1, 3]);
        assert_eq!(info.max_bboxes, Some(1));
    }

    #[test]
    fn test_channel_first_transposes() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), false);

        let mut cfg = config(vec![dir.path().to_path_buf()]);
        cfg.channel_first = true;
        let store = SafetensorsFeatureStore::open(cfg, imdb()).unwrap();

        assert_eq!(store.features(0).unwrap().slots[&0].shape, vec![3, 2]);
    }

    #[test]
    fn test_boxes_only_when_info_requested() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), true);

        let plain = SafetensorsFeatureStore::open(config(vec![dir.path().to_path_buf()]), imdb())
            .unwrap();
        assert!(plain.features(0).unwrap().info.is_none());

        let mut cfg = config(vec![dir.path().to_path_buf()]);
        cfg.return_info = true;
        let with_info = SafetensorsFeatureStore::open(cfg, imdb()).unwrap();
        let info = with_info.features(0).unwrap().info.unwrap();
        assert_eq!(info.bboxes, Some(boxes()));
    }

    #[test]
    fn test_missing_file_propagates_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SafetensorsFeatureStore::open(config(vec![dir.path().to_path_buf()]), imdb())
            .unwrap();
        assert!(matches!(store.features(0).unwrap_err(), DatasetError::Io(_)));
    }

    #[test]
    fn test_out_of_range_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = SafetensorsFeatureStore::open(config(vec![dir.path().to_path_buf()]), imdb())
            .unwrap();
        assert!(matches!(
            store.features(9).unwrap_err(),
            DatasetError::IndexOutOfRange { idx: 9, .. }
        ));
    }
}
