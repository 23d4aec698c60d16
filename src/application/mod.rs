// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the data and infra layers for one goal each:
// assembling a sample for inspection, or scanning an imdb for
// vocabulary coverage.
//
// Rules for this layer:
//   - No printing here (that's Layer 1)
//   - No file formats here (that's Layer 5)
//   - Errors are wrapped with context for the CLI

// Assemble and return one sample
pub mod inspect_use_case;

// Vocabulary and length statistics over an imdb
pub mod stats_use_case;
