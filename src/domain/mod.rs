// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits that name the concepts of the
// system: imdb records, assembled samples, errors, and the
// interfaces of the external stores.
//
// Nothing here reads files or touches burn tensors.

// One imdb entry plus the imdb header
pub mod record;

// The assembled per-example output
pub mod sample;

// Typed errors shared by every layer below the CLI
pub mod error;

// Interfaces of the index database, feature store, and assembler
pub mod traits;
