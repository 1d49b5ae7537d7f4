//! Loop-Call Analyzer: a loop whose body can reach an external-kind call
//! is treated conservatively — every declared state variable of the
//! enclosing contract is folded into the loop header's write set, so the
//! phi inserter is forced to model "this variable may hold any
//! post-reentrancy value" at every subsequent use.
//!
//! This is deliberately coarse: it does not attempt to prove which state
//! variables the loop body actually touches. A tighter analysis is listed
//! as an open question in the design notes; the coarse version is cheap,
//! always sound (never under-approximates), and matches how a first-pass
//! static analyzer in this space is expected to behave.

use std::collections::HashSet;

use crate::model::BasicBlock;

pub fn apply_loop_call_effects(blocks: &mut [BasicBlock], state_variables: &HashSet<String>) {
    let headers_with_ranges: Vec<(usize, usize, usize)> =
        blocks.iter().filter_map(|b| b.loop_range.map(|(lo, hi)| (b.id, lo, hi))).collect();

    for (header_id, lo, hi) in headers_with_ranges {
        let has_external_call = blocks[lo..=hi.min(blocks.len() - 1)]
            .iter()
            .any(|b| b.has_external_call_effects);
        if !has_external_call {
            continue;
        }
        let kinds: Vec<_> = blocks[lo..=hi.min(blocks.len() - 1)]
            .iter()
            .flat_map(|b| b.external_call_kinds.clone())
            .collect();

        let header = &mut blocks[header_id];
        header.writes.extend(state_variables.iter().cloned());
        header.has_external_call_effects = true;
        for kind in kinds {
            if !header.external_call_kinds.contains(&kind) {
                header.external_call_kinds.push(kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CallKind;

    #[test]
    fn loop_with_external_call_forces_all_state_vars_into_header_writes() {
        let mut blocks = vec![BasicBlock::new(0), BasicBlock::new(1), BasicBlock::new(2)];
        blocks[0].is_loop_header = true;
        blocks[0].loop_range = Some((1, 1));
        blocks[1].has_external_call_effects = true;
        blocks[1].external_call_kinds = vec![CallKind::External];

        let state_vars: HashSet<String> = ["balances".to_string(), "totalSupply".to_string()].into_iter().collect();
        apply_loop_call_effects(&mut blocks, &state_vars);

        assert!(blocks[0].writes.contains("balances"));
        assert!(blocks[0].writes.contains("totalSupply"));
        assert!(blocks[0].has_external_call_effects);
    }

    #[test]
    fn loop_without_external_call_is_untouched() {
        let mut blocks = vec![BasicBlock::new(0), BasicBlock::new(1)];
        blocks[0].is_loop_header = true;
        blocks[0].loop_range = Some((1, 1));
        let state_vars: HashSet<String> = ["balances".to_string()].into_iter().collect();
        apply_loop_call_effects(&mut blocks, &state_vars);
        assert!(blocks[0].writes.is_empty());
    }
}
