//! Terminator Finalizer: the only block ever left `Unset` by construction
//! is the function's trailing block (and only if inlining didn't hand it a
//! terminator already); give it a `return` so every function ends cleanly.

use crate::model::{BasicBlock, Terminator};

pub fn finalize_terminators(blocks: &mut [BasicBlock]) {
    let last = blocks.len().saturating_sub(1);
    for (i, block) in blocks.iter_mut().enumerate() {
        if matches!(block.terminator, Terminator::Unset) {
            block.terminator = if i == last { Terminator::Return(None) } else { Terminator::Goto(i + 1) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_unset_block_becomes_return() {
        let mut blocks = vec![BasicBlock::new(0)];
        finalize_terminators(&mut blocks);
        assert!(matches!(blocks[0].terminator, Terminator::Return(None)));
    }

    #[test]
    fn already_terminated_blocks_are_untouched() {
        let mut blocks = vec![BasicBlock::new(0), BasicBlock::new(1)];
        blocks[0].terminator = Terminator::Revert(None);
        finalize_terminators(&mut blocks);
        assert!(matches!(blocks[0].terminator, Terminator::Revert(None)));
        assert!(matches!(blocks[1].terminator, Terminator::Return(None)));
    }
}
