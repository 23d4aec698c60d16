// ============================================================
// Layer 5 — Module Layout Assembler
// ============================================================
// Maps module names of a reference layout to decoder indices.
//
// The module vocabulary is a text file, one module per line,
// which must contain "<eos>":
//
//   _Find
//   _Transform
//   _And
//   _Describe
//   <eos>
//
// A layout is encoded as its module indices followed by <eos>
// repeated up to T_decoder, so at least one <eos> always fits:
//
//   ["_Find", "_Describe"], T_decoder = 4  →  [0, 3, 4, 4]

use std::path::Path;

use crate::data::vocab::{VocabDict, UNK_TOKEN};
use crate::domain::error::{DatasetError, Result};
use crate::domain::traits::LayoutAssembler;

pub const EOS_TOKEN: &str = "<eos>";

#[derive(Debug, Clone)]
pub struct ModuleAssembler {
    modules: VocabDict,
    eos_idx: usize,
}

impl ModuleAssembler {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let modules = VocabDict::from_file(path)?;
        let assembler = Self::from_vocab(modules)?;
        tracing::info!(
            "Loaded {} layout modules from '{}'",
            assembler.num_modules(),
            path.display()
        );
        Ok(assembler)
    }

    pub fn from_modules<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self> {
        Self::from_vocab(VocabDict::from_words(names))
    }

    fn from_vocab(modules: VocabDict) -> Result<Self> {
        // The lookup must not fall back to <unk>; check membership directly
        let eos_idx = (0..modules.num_vocab())
            .find(|&i| modules.index_to_word(i) == Some(EOS_TOKEN))
            .ok_or_else(|| DatasetError::UnknownModule { name: EOS_TOKEN.to_string() })?;
        Ok(Self { modules, eos_idx })
    }

    pub fn num_modules(&self) -> usize {
        self.modules.num_vocab()
    }

    pub fn eos_idx(&self) -> usize {
        self.eos_idx
    }

    fn module_index(&self, name: &str) -> Result<usize> {
        let unknown = || DatasetError::UnknownModule { name: name.to_string() };
        // A module vocabulary may list <unk>; it is never a real module
        if name == UNK_TOKEN {
            return Err(unknown());
        }
        let idx = self.modules.word_to_index(name).map_err(|_| unknown())?;
        if self.modules.index_to_word(idx) != Some(name) {
            return Err(unknown());
        }
        Ok(idx)
    }
}

impl LayoutAssembler for ModuleAssembler {
    fn module_list_to_tokens(&self, modules: &[String], t_decoder: usize) -> Result<Vec<i32>> {
        if modules.len() >= t_decoder {
            return Err(DatasetError::LayoutTooLong { len: modules.len(), t_decoder });
        }

        let mut tokens = modules
            .iter()
            .map(|m| self.module_index(m).map(|i| i as i32))
            .collect::<Result<Vec<_>>>()?;
        tokens.resize(t_decoder, self.eos_idx as i32);
        Ok(tokens)
    }

    fn tokens_to_module_list(&self, tokens: &[i32]) -> Result<Vec<String>> {
        tokens
            .iter()
            .take_while(|&&t| t != self.eos_idx as i32)
            .map(|&t| {
                usize::try_from(t)
                    .ok()
                    .and_then(|i| self.modules.index_to_word(i))
                    .map(str::to_string)
                    .ok_or_else(|| DatasetError::UnknownModule { name: t.to_string() })
            })
            .collect()
    }
}
