// ============================================================
// Layer 4 — Question Encoder
// ============================================================
// Turns question tokens into a fixed-length index sequence.
//
//   tokens:  ["what", "color", "is", "the", "cat"]
//   T_encoder = 8
//   output:  [1, 2, 3, 4, 5, 0, 0, 0]   seq_length = 5
//
// Longer questions are cut at T_encoder; seq_length still
// reports the full token count.

use crate::data::vocab::VocabDict;
use crate::domain::error::Result;

/// A question after vocabulary lookup and padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedQuestion {
    /// Exactly T_encoder entries, zero-filled
    pub input_seq: Vec<i32>,
    /// Token count before truncation
    pub seq_length: usize,
}

pub fn encode_question(
    tokens:    &[String],
    vocab:     &VocabDict,
    t_encoder: usize,
) -> Result<EncodedQuestion> {
    let indices = tokens
        .iter()
        .map(|t| vocab.word_to_index(t).map(|i| i as i32))
        .collect::<Result<Vec<_>>>()?;

    let mut input_seq = vec![0i32; t_encoder];
    let read_len = indices.len().min(t_encoder);
    input_seq[..read_len].copy_from_slice(&indices[..read_len]);

    Ok(EncodedQuestion {
        input_seq,
        seq_length: indices.len(),
    })
}
