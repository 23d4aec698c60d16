// ============================================================
// Layer 5 — Infrastructure Layer
// ============================================================
// Concrete, file-backed implementations of the domain traits:
//
//   imdb.rs          — JSON image index database
//   feature_store.rs — region features from safetensors files
//   assembler.rs     — module vocabulary layout assembler
//
// The dataset only sees the traits, so tests and other storage
// backends can stand in for any of these.

/// JSON imdb reader/writer
pub mod imdb;

/// Safetensors region-feature reader
pub mod feature_store;

/// Layout module ↔ index assembler
pub mod assembler;
