// ============================================================
// vqa_dataset — VQA sample assembly
// ============================================================
// Layers:
//   1. cli          argument parsing, JSON output
//   2. application  inspect / stats workflows
//   3. domain       records, samples, errors, seams
//   4. data         vocab, question/answer/layout encoding,
//                   the dataset and the burn batcher
//   5. infra        imdb files, safetensors features, layout
//                   module assembler

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
