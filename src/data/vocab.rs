// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Bidirectional token ↔ index mapping loaded from a plain text
// file, one token per line. The line number is the index.
//
// If the file contains "<unk>", lookups of unknown words return
// its index. Without "<unk>", an unknown word is an error.
//
// Example vocabulary file:
//   <unk>
//   what
//   color
//   is

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::domain::error::{DatasetError, Result};

/// Token reserved for out-of-vocabulary words
pub const UNK_TOKEN: &str = "<unk>";

#[derive(Debug, Clone)]
pub struct VocabDict {
    word_list: Vec<String>,
    word2idx:  HashMap<String, usize>,
    unk_idx:   Option<usize>,
}

impl VocabDict {
    /// Load a vocabulary file. Blank lines are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let words: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();

        let vocab = Self::from_words(words);
        tracing::debug!(
            "Loaded vocabulary '{}' ({} words, unk={:?})",
            path.display(),
            vocab.num_vocab(),
            vocab.unk_idx
        );
        Ok(vocab)
    }

    /// Build from an in-memory word list. Index = position.
    /// When a word repeats, its first position wins.
    pub fn from_words<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        let word_list: Vec<String> = words.into_iter().map(Into::into).collect();
        let mut word2idx = HashMap::with_capacity(word_list.len());
        for (idx, word) in word_list.iter().enumerate() {
            word2idx.entry(word.clone()).or_insert(idx);
        }
        let unk_idx = word2idx.get(UNK_TOKEN).copied();
        Self { word_list, word2idx, unk_idx }
    }

    pub fn num_vocab(&self) -> usize {
        self.word_list.len()
    }

    pub fn unk_idx(&self) -> Option<usize> {
        self.unk_idx
    }

    /// Index of `word`, falling back to <unk>.
    pub fn word_to_index(&self, word: &str) -> Result<usize> {
        match self.word2idx.get(word) {
            Some(&idx) => Ok(idx),
            None => self.unk_idx.ok_or_else(|| DatasetError::UnknownWord {
                word: word.to_string(),
            }),
        }
    }

    pub fn index_to_word(&self, idx: usize) -> Option<&str> {
        self.word_list.get(idx).map(String::as_str)
    }
}

/// Lower-case `sentence` and split it into runs of word
/// characters and runs of punctuation; whitespace is dropped.
///
/// "What color is it?" → ["what", "color", "is", "it", "?"]
pub fn tokenize(sentence: &str) -> Vec<String> {
    let lower = sentence.to_lowercase();
    let mut tokens  = Vec::new();
    let mut current = String::new();
    let mut in_word = true;

    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    for c in lower.chars() {
        if is_word(c) != in_word && !current.is_empty() {
            push_stripped(&mut tokens, &current);
            current.clear();
        }
        in_word = is_word(c);
        current.push(c);
    }
    push_stripped(&mut tokens, &current);
    tokens
}

fn push_stripped(tokens: &mut Vec<String>, raw: &str) {
    let t = raw.trim();
    if !t.is_empty() {
        tokens.push(t.to_string());
    }
}
