// ============================================================
// Layer 4 — Ground-Truth Layout Pruning
// ============================================================
// Reference layouts sometimes chain filters that the modular
// network treats as one step:
//
//   _Find _Filter _Filter _Describe   →   _Find _Describe
//
// Every "_Filter" whose predecessor in the ORIGINAL list is
// "_Filter" or "_Find" is dropped. Positions are marked from
// the back so a removal never shifts an index still to be
// checked; surviving tokens keep their order.

use crate::domain::error::Result;
use crate::domain::traits::LayoutAssembler;

const FILTER: &str = "_Filter";
const FIND: &str = "_Find";

pub fn prune_filter_modules(tokens: Vec<String>) -> Vec<String> {
    let mut keep = vec![true; tokens.len()];

    for n in (1..tokens.len()).rev() {
        let prev = tokens[n - 1].as_str();
        if tokens[n] == FILTER && (prev == FILTER || prev == FIND) {
            keep[n] = false;
        }
    }

    tokens
        .into_iter()
        .zip(keep)
        .filter_map(|(t, k)| k.then_some(t))
        .collect()
}

/// Optionally prune, then hand the layout to the assembler.
pub fn encode_layout(
    tokens:    Vec<String>,
    prune:     bool,
    assembler: &dyn LayoutAssembler,
    t_decoder: usize,
) -> Result<Vec<i32>> {
    let tokens = if prune { prune_filter_modules(tokens) } else { tokens };
    assembler.module_list_to_tokens(&tokens, t_decoder)
}
