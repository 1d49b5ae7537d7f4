//! Internal-Call Inliner: splices a fully-built internal callee's SSA
//! statements into the caller immediately after the `call[internal](...)`
//! statement that invoked it, so the reentrancy detector can see straight
//! through same-contract helper functions.
//!
//! The original call statement is always retained (it documents the call
//! site); each of the callee's non-phi statements becomes its own new
//! block, spliced right after the call's block and before whatever
//! followed it — this both preserves execution order and keeps
//! mint/burn-shaped operations from a callee in their own blocks, the same
//! way ordinary statements are one-per-block everywhere else in this IR.
//!
//! Variable tokens copied from the callee are renamed into a per-call-site
//! namespace (`name_inl<N>_<version>`) to guarantee they cannot collide
//! with the caller's own versions; a parameter's initial (version 0)
//! occurrences are then replaced with the literal, already-versioned
//! argument text from the call site, so reads of the parameter resolve to
//! the value actually passed in.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::error::AnalysisError;
use crate::model::{BasicBlock, CallKind, CallSite, FunctionIr, Terminator};

pub fn inline_internal_calls(blocks: &mut Vec<BasicBlock>, call_sites: &mut Vec<CallSite>, callees: &HashMap<String, FunctionIr>) -> Result<(), AnalysisError> {
    let mut call_index = 0u32;
    let mut guard = 0usize;

    loop {
        guard += 1;
        if guard > 10_000 {
            return Err(AnalysisError::InternalInvariantViolated { detail: "internal-call inlining did not terminate".to_string() });
        }
        let Some(site_idx) = call_sites.iter().position(|c| c.kind == CallKind::Internal && !c.inlined) else {
            break;
        };
        call_index += 1;
        let site = call_sites[site_idx].clone();
        call_sites[site_idx].inlined = true;

        let Some(callee) = callees.get(&site.callee_name) else {
            debug!(callee = %site.callee_name, "internal call target not found, leaving uninlined");
            continue;
        };
        call_sites[site_idx].location = callee.location.clone();

        let param_map: HashMap<String, String> =
            callee.parameters.iter().zip(site.arg_texts.iter()).map(|(p, a)| (p.name.clone(), a.clone())).collect();

        let mut new_lines = Vec::new();
        for callee_block in &callee.blocks {
            for line in &callee_block.ssa_statements {
                if line.contains("= phi(") {
                    continue;
                }
                new_lines.push(rewrite_line(line, &param_map, call_index));
            }
        }

        let new_call_sites = find_call_sites_in_lines(&new_lines, &site);

        let call_block = find_call_block(blocks, site.block_id, &site);
        let Some(call_block) = call_block else { continue };

        let new_blocks: Vec<BasicBlock> = new_lines
            .into_iter()
            .map(|line| {
                let mut b = BasicBlock::new(0);
                b.ssa_statements.push(line);
                b
            })
            .collect();

        let inserted_at = splice_blocks_after(blocks, call_block, new_blocks);
        for (offset, mut cs) in new_call_sites.into_iter().enumerate() {
            cs.block_id = inserted_at + offset;
            call_sites.push(cs);
        }
    }
    Ok(())
}

fn find_call_block(blocks: &[BasicBlock], original_hint: usize, site: &CallSite) -> Option<usize> {
    if original_hint < blocks.len() && blocks[original_hint].ssa_statements.iter().any(|l| is_matching_call_line(l, site)) {
        return Some(original_hint);
    }
    blocks.iter().position(|b| b.ssa_statements.iter().any(|l| is_matching_call_line(l, site)))
}

fn is_matching_call_line(line: &str, site: &CallSite) -> bool {
    line.starts_with(&format!("ret_{} = call[internal]({}", site.ret_version, site.callee_name))
}

fn rewrite_line(line: &str, param_map: &HashMap<String, String>, call_index: u32) -> String {
    let token_re = Regex::new(r"([A-Za-z_][A-Za-z0-9_\[\]\.]*)_(\d+)").expect("valid regex");
    let suffixed = token_re
        .replace_all(line, |caps: &regex::Captures| format!("{}_inl{}_{}", &caps[1], call_index, &caps[2]))
        .to_string();

    let mut out = suffixed;
    for (param, arg_text) in param_map {
        let marker = format!("{param}_inl{call_index}_0");
        out = out.replace(&marker, arg_text);
    }
    out
}

fn find_call_sites_in_lines(lines: &[String], origin: &CallSite) -> Vec<CallSite> {
    let call_re = Regex::new(r"^ret_(\S+) = call\[(\w+)\]\(([^,)]+)(?:, (.*))?\)$").expect("valid regex");
    let mut out = Vec::new();
    for line in lines {
        if let Some(caps) = call_re.captures(line) {
            let kind = match &caps[2] {
                "internal" => CallKind::Internal,
                "external" => CallKind::External,
                "low_level_external" => CallKind::LowLevelExternal,
                "delegatecall" => CallKind::Delegatecall,
                "staticcall" => CallKind::Staticcall,
                _ => CallKind::External,
            };
            let arg_texts = caps.get(4).map(|m| m.as_str().split(", ").map(|s| s.to_string()).collect()).unwrap_or_default();
            out.push(CallSite {
                block_id: 0,
                kind,
                callee_name: caps[3].to_string(),
                arg_texts,
                ret_version: caps[1].parse().unwrap_or(0),
                location: origin.location.clone(),
                inlined: false,
            });
        }
    }
    out
}

/// Splices `new_blocks` immediately after `after_idx`, remapping every
/// existing terminator's block ids to account for the shift, and handing
/// the terminator that used to follow `after_idx` to the last new block.
fn splice_blocks_after(blocks: &mut Vec<BasicBlock>, after_idx: usize, new_blocks: Vec<BasicBlock>) -> usize {
    let k = new_blocks.len();
    if k == 0 {
        return after_idx + 1;
    }
    let old_len = blocks.len();
    let remap = |old_id: usize| -> usize {
        if old_id <= after_idx {
            old_id
        } else {
            old_id + k
        }
    };

    for block in blocks.iter_mut() {
        block.terminator = remap_terminator(&block.terminator, &remap);
        if let Some((lo, hi)) = block.loop_range {
            block.loop_range = Some((remap(lo), remap(hi)));
        }
    }

    let stolen_terminator = blocks[after_idx].terminator.clone();
    blocks[after_idx].terminator = Terminator::Goto(after_idx + 1);

    let mut new_blocks = new_blocks;
    for (i, nb) in new_blocks.iter_mut().enumerate() {
        let abs_id = after_idx + 1 + i;
        nb.terminator = if i + 1 < k { Terminator::Goto(abs_id + 1) } else { stolen_terminator.clone() };
    }

    blocks.splice(after_idx + 1..after_idx + 1, new_blocks);
    for (i, block) in blocks.iter_mut().enumerate() {
        block.id = i;
    }
    debug_assert_eq!(blocks.len(), old_len + k);
    after_idx + 1
}

fn remap_terminator(term: &Terminator, remap: &impl Fn(usize) -> usize) -> Terminator {
    match term {
        Terminator::Goto(t) => Terminator::Goto(remap(*t)),
        Terminator::If { cond, then_block, else_block } => {
            Terminator::If { cond: cond.clone(), then_block: remap(*then_block), else_block: remap(*else_block) }
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Parameter, SourceLocation, Visibility};

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn callee_loc() -> SourceLocation {
        SourceLocation::new(42, 5)
    }

    fn simple_callee() -> FunctionIr {
        let mut write_block = BasicBlock::new(0);
        write_block.ssa_statements.push("balances[msg.sender]_1 = 0".to_string());
        write_block.terminator = Terminator::Unset;

        let mut call_block = BasicBlock::new(1);
        call_block.ssa_statements.push("ret_1 = call[low_level_external](msg.sender.call, amount_0)".to_string());
        call_block.terminator = Terminator::Unset;

        FunctionIr {
            name: "_performTransfer".to_string(),
            visibility: Visibility::Internal,
            parameters: vec![Parameter { name: "amount".to_string(), type_name: "uint256".to_string() }],
            location: callee_loc(),
            blocks: vec![write_block, call_block],
            call_sites: vec![],
            build_error: None,
        }
    }

    #[test]
    fn inlining_splices_callee_statements_after_the_call_block() {
        let mut call_block = BasicBlock::new(0);
        call_block.ssa_statements.push("ret_1 = call[internal](_performTransfer, amount_3)".to_string());
        call_block.terminator = Terminator::Return(None);
        let mut blocks = vec![call_block];

        let mut call_sites = vec![CallSite {
            block_id: 0,
            kind: CallKind::Internal,
            callee_name: "_performTransfer".to_string(),
            arg_texts: vec!["amount_3".to_string()],
            ret_version: 1,
            location: loc(),
            inlined: false,
        }];

        let mut callees = HashMap::new();
        callees.insert("_performTransfer".to_string(), simple_callee());

        inline_internal_calls(&mut blocks, &mut call_sites, &callees).unwrap();

        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].ssa_statements[0].contains("call[internal](_performTransfer"));
        assert!(blocks[1].ssa_statements[0].contains("balances[msg.sender]"));
        assert!(blocks[2].ssa_statements[0].contains("call[low_level_external]"));
        assert!(matches!(blocks[2].terminator, Terminator::Return(None)));
        assert!(call_sites[0].inlined);
        assert_eq!(call_sites[0].location, callee_loc());
    }
}
