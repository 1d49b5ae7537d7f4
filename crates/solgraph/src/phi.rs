//! φ-Function Inserter: builds a predecessor map from terminators, then for
//! every merge block and every loop header inserts a φ-statement for each
//! variable whose incoming version differs across predecessors (or whose
//! write set was conservatively forced by the loop-call analyzer).
//!
//! Rewriting is scoped to the block the φ is inserted into, per the source
//! design note — downstream blocks were already emitted against the
//! pre-phi version numbers and are left untouched; the φ's own bookkeeping
//! (`ssa_writes`) is still updated so later merge points computing their own
//! incoming versions see the post-phi value.

use std::collections::HashMap;

use crate::model::{BasicBlock, Terminator};

fn predecessors(blocks: &[BasicBlock]) -> HashMap<usize, Vec<usize>> {
    let mut preds: HashMap<usize, Vec<usize>> = HashMap::new();
    for block in blocks {
        match &block.terminator {
            Terminator::Goto(t) => preds.entry(*t).or_default().push(block.id),
            Terminator::If { then_block, else_block, .. } => {
                preds.entry(*then_block).or_default().push(block.id);
                preds.entry(*else_block).or_default().push(block.id);
            }
            Terminator::Unset if block.id + 1 < blocks.len() => {
                preds.entry(block.id + 1).or_default().push(block.id);
            }
            _ => {}
        }
    }
    preds
}

fn is_back_edge_target(blocks: &[BasicBlock], target: usize) -> bool {
    blocks.iter().any(|b| {
        let sources = match &b.terminator {
            Terminator::Goto(t) => vec![*t],
            Terminator::If { then_block, else_block, .. } => vec![*then_block, *else_block],
            _ => vec![],
        };
        sources.contains(&target) && b.id > target
    })
}

fn version_of(block: &BasicBlock, var: &str) -> u32 {
    block.ssa_writes.get(var).copied().or_else(|| block.ssa_reads.get(var).copied()).unwrap_or(0)
}

pub fn insert_phi_functions(blocks: &mut Vec<BasicBlock>) {
    let preds = predecessors(blocks);
    let mut merge_or_header: Vec<usize> = blocks
        .iter()
        .map(|b| b.id)
        .filter(|id| {
            let pred_count = preds.get(id).map(|p| p.len()).unwrap_or(0);
            pred_count >= 2 || blocks[*id].is_loop_header || is_back_edge_target(blocks, *id)
        })
        .collect();
    merge_or_header.sort_unstable();

    for block_id in merge_or_header {
        let predecessor_ids = preds.get(&block_id).cloned().unwrap_or_default();
        if predecessor_ids.is_empty() {
            continue;
        }

        let is_header = blocks[block_id].is_loop_header;
        let forced_vars: Vec<String> = if is_header { blocks[block_id].writes.iter().cloned().collect() } else { Vec::new() };

        let mut candidates: Vec<String> = predecessor_ids
            .iter()
            .flat_map(|p| blocks[*p].ssa_writes.keys().cloned())
            .collect();
        candidates.extend(forced_vars.iter().cloned());
        candidates.sort();
        candidates.dedup();

        for var in candidates {
            let incoming: Vec<u32> = predecessor_ids.iter().map(|p| version_of(&blocks[*p], &var)).collect();
            let distinct = incoming.iter().collect::<std::collections::HashSet<_>>().len();
            let forced = is_header && forced_vars.contains(&var);
            let read_with_incoming_write = blocks[block_id].reads.contains(&var) && predecessor_ids.iter().any(|p| blocks[*p].ssa_writes.contains_key(&var));

            if distinct <= 1 && !forced && !read_with_incoming_write {
                continue;
            }

            let new_version = incoming.iter().copied().max().unwrap_or(0) + 1;
            let operands = incoming.iter().map(|v| format!("{var}_{v}")).collect::<Vec<_>>().join(", ");
            let line = format!("{var}_{new_version} = phi({operands})");

            let block = &mut blocks[block_id];
            block.ssa_statements.insert(0, line);
            block.ssa_writes.insert(var, new_version);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_blocks;
    use crate::model::{Expr, SourceLocation, Stmt};
    use crate::ssa::SsaBuilder;
    use std::collections::HashSet;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn merge_block_gets_phi_for_variable_with_differing_versions() {
        let body = vec![Stmt::If {
            condition: Expr::Identifier("ok".into()),
            true_body: vec![Stmt::ExpressionStatement(Expr::Assignment {
                op: "=".into(),
                left: Box::new(Expr::Identifier("x".into())),
                right: Box::new(Expr::Literal("1".into())),
            })],
            false_body: Some(vec![Stmt::ExpressionStatement(Expr::Assignment {
                op: "=".into(),
                left: Box::new(Expr::Identifier("x".into())),
                right: Box::new(Expr::Literal("2".into())),
            })]),
            location: loc(),
        }];
        let mut blocks = build_blocks(&body);
        let empty_set = HashSet::new();
        let mut builder = SsaBuilder::new(&empty_set);
        builder.build(&mut blocks).unwrap();
        insert_phi_functions(&mut blocks);

        let merge = blocks.last().unwrap();
        assert!(merge.ssa_statements.iter().any(|s| s.contains("phi(")));
    }

    #[test]
    fn loop_with_no_body_writes_only_phis_the_induction_variable() {
        let body = vec![Stmt::For {
            init: Some(Box::new(Stmt::VariableDeclaration { name: "i".into(), type_name: "uint".into(), initializer: Some(Expr::Literal("0".into())), location: loc() })),
            condition: Some(Expr::BinaryOperation { op: "<".into(), left: Box::new(Expr::Identifier("i".into())), right: Box::new(Expr::Identifier("n".into())) }),
            increment: Some(Box::new(Stmt::ExpressionStatement(Expr::UnaryOperation { op: "++".into(), operand: Box::new(Expr::Identifier("i".into())), prefix: false }))),
            body: vec![],
            location: loc(),
        }];
        let mut blocks = build_blocks(&body);
        let empty_set = HashSet::new();
        let mut builder = SsaBuilder::new(&empty_set);
        builder.build(&mut blocks).unwrap();
        insert_phi_functions(&mut blocks);

        let header = blocks.iter().find(|b| b.is_loop_header).unwrap();
        let phi_vars: Vec<&str> = header
            .ssa_statements
            .iter()
            .filter(|s| s.contains("phi("))
            .map(|s| s.split('_').next().unwrap())
            .collect();
        assert_eq!(phi_vars, vec!["i"]);
    }
}
