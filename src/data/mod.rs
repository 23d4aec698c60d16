// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between an imdb record and a batch of tensors.
//
//   imdb record
//       │
//       ▼
//   question.rs  → vocabulary lookup, pad/truncate to T_encoder
//   answers.rs   → pick a training answer, soft scores
//   layout.rs    → prune filter chains, encode with assembler
//   features.rs  → copy feature slots and image info
//       │
//       ▼
//   VqaDataset   → one VqaSample per index (burn Dataset)
//       │
//       ▼
//   VqaBatcher   → stacks samples into tensors (burn Batcher)

/// Token ↔ index vocabularies
pub mod vocab;

/// Dataset configuration bundle
pub mod params;

/// Question encoding
pub mod question;

/// Answer selection and soft scoring
pub mod answers;

/// Ground-truth layout pruning
pub mod layout;

/// Feature slot merge
pub mod features;

/// The dataset itself
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
