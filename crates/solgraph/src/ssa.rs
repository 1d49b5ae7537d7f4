//! Access Tracker driver + SSA Versioner. Walks the already-built block
//! list twice: once to populate each block's read/write sets (§4.4), once
//! to thread per-variable version counters and emit the textual SSA form
//! (§4.5). Call classification (§4.6) is folded into the emission pass
//! since the textual `call[<kind>](...)` form needs the callee's kind at
//! the moment the line is produced; [`crate::calls::classify`] stays a
//! pure, independently-testable function either way.
//!
//! SSA statements are plain `String`s rather than a typed expression tree —
//! the version-rewriting the phi inserter and the internal-call inliner both
//! need to do is naturally a text substitution, and a typed tree would just
//! be flattened back to text at the same two call sites.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::access::{self, expr_text};
use crate::calls;
use crate::error::AnalysisError;
use crate::model::{BasicBlock, CallKind, CallSite, Expr, Stmt};

pub struct SsaBuilder<'a> {
    same_contract_functions: &'a HashSet<String>,
    current: HashMap<String, u32>,
    ret_counter: u32,
}

impl<'a> SsaBuilder<'a> {
    pub fn new(same_contract_functions: &'a HashSet<String>) -> Self {
        SsaBuilder { same_contract_functions, current: HashMap::new(), ret_counter: 0 }
    }

    pub fn build(&mut self, blocks: &mut [BasicBlock]) -> Result<Vec<CallSite>, AnalysisError> {
        track_accesses(blocks);

        let mut call_sites = Vec::new();
        for i in 0..blocks.len() {
            self.build_block(blocks, i, &mut call_sites)?;
        }
        self.finish()?;
        Ok(call_sites)
    }

    fn build_block(&mut self, blocks: &mut [BasicBlock], idx: usize, call_sites: &mut Vec<CallSite>) -> Result<(), AnalysisError> {
        let reads: Vec<String> = blocks[idx].reads.iter().cloned().collect();
        let mut reads_v = HashMap::new();
        for var in &reads {
            reads_v.insert(var.clone(), self.current.get(var).copied().unwrap_or(0));
        }

        let writes: Vec<String> = blocks[idx].writes.iter().cloned().collect();
        let mut writes_v = HashMap::new();
        for var in &writes {
            let new_v = self.current.get(var).copied().unwrap_or(0) + 1;
            self.current.insert(var.clone(), new_v);
            writes_v.insert(var.clone(), new_v);
        }

        let statements = blocks[idx].statements.clone();
        let mut lines = Vec::new();
        for stmt in &statements {
            if let Some((line, call_site)) = self.emit(stmt, idx, &reads_v, &writes_v)? {
                lines.push(line);
                if let Some(cs) = call_site {
                    call_sites.push(cs);
                }
            }
        }

        blocks[idx].ssa_reads = reads_v;
        blocks[idx].ssa_writes = writes_v;
        blocks[idx].ssa_statements = lines;
        Ok(())
    }

    fn emit(
        &mut self,
        stmt: &Stmt,
        block_id: usize,
        reads_v: &HashMap<String, u32>,
        writes_v: &HashMap<String, u32>,
    ) -> Result<Option<(String, Option<CallSite>)>, AnalysisError> {
        match stmt {
            Stmt::Condition(expr) => Ok(Some((format!("if ({})", render(expr, reads_v)), None))),
            Stmt::VariableDeclaration { name, initializer, .. } => {
                let v = writes_v.get(name).copied().unwrap_or(0);
                let rhs = initializer.as_ref().map(|e| render(e, reads_v)).unwrap_or_else(|| "decl".to_string());
                Ok(Some((format!("{name}_{v} = {rhs}"), None)))
            }
            Stmt::ExpressionStatement(Expr::Assignment { op, left, right }) => {
                let name = expr_text(left);
                let v = writes_v.get(&name).copied().unwrap_or(0);
                let rhs = if op == "=" {
                    render(right, reads_v)
                } else {
                    let old_v = reads_v.get(&name).copied().unwrap_or(0);
                    let bin_op = op.trim_end_matches('=');
                    format!("{}_{} {} {}", name, old_v, bin_op, render(right, reads_v))
                };
                Ok(Some((format!("{name}_{v} = {rhs}"), None)))
            }
            Stmt::ExpressionStatement(Expr::UnaryOperation { op, operand, .. }) if op == "++" || op == "--" => {
                let name = expr_text(operand);
                let v = writes_v.get(&name).copied().unwrap_or(0);
                let old_v = reads_v.get(&name).copied().unwrap_or(0);
                let bin_op = &op[0..1];
                Ok(Some((format!("{name}_{v} = {name}_{old_v} {bin_op} 1"), None)))
            }
            Stmt::ExpressionStatement(Expr::FunctionCall { callee, args }) => {
                let kind = calls::classify(callee, self.same_contract_functions);
                let callee_name = expr_text(callee);
                let arg_texts: Vec<String> = args.iter().map(|a| render(a, reads_v)).collect();
                self.ret_counter += 1;
                let ret_v = self.ret_counter;
                let line = format!("ret_{ret_v} = call[{}]({}{})", kind.as_str(), callee_name, prefix_args(&arg_texts));
                trace!(block = block_id, kind = kind.as_str(), callee = %callee_name, "emitted call");
                let call_site = CallSite {
                    block_id,
                    kind,
                    callee_name,
                    arg_texts,
                    ret_version: ret_v,
                    location: stmt.location(),
                    inlined: false,
                };
                Ok(Some((line, Some(call_site))))
            }
            Stmt::ExpressionStatement(expr) => Ok(Some((render(expr, reads_v), None))),
            Stmt::Emit { event, args, .. } => {
                let rendered: Vec<String> = args.iter().map(|a| render(a, reads_v)).collect();
                Ok(Some((format!("emit {}({})", event, rendered.join(", ")), None)))
            }
            Stmt::Return { value, .. } => match value {
                Some(expr) => Ok(Some((format!("return {}", render(expr, reads_v)), None))),
                None => Ok(Some(("return".to_string(), None))),
            },
            Stmt::Revert { message, .. } => match message {
                Some(msg) => Ok(Some((format!("revert(\"{msg}\")"), None))),
                None => Ok(Some(("revert()".to_string(), None))),
            },
            Stmt::Block(_) | Stmt::Unknown { .. } | Stmt::If { .. } | Stmt::For { .. } | Stmt::While { .. } => {
                Err(AnalysisError::InternalInvariantViolated {
                    detail: "control-flow or unsupported statement reached SSA emission".to_string(),
                })
            }
        }
    }

    fn finish(&self) -> Result<(), AnalysisError> {
        if self.current.values().any(|v| *v == u32::MAX) {
            return Err(AnalysisError::InternalInvariantViolated { detail: "SSA version counter overflow".to_string() });
        }
        Ok(())
    }
}

fn prefix_args(args: &[String]) -> String {
    if args.is_empty() {
        String::new()
    } else {
        format!(", {}", args.join(", "))
    }
}

fn render(expr: &Expr, versions: &HashMap<String, u32>) -> String {
    match expr {
        Expr::Identifier(_) | Expr::MemberAccess { .. } | Expr::IndexAccess { .. } => {
            let name = expr_text(expr);
            if access::is_real_variable(&name) {
                let v = versions.get(&name).copied().unwrap_or(0);
                format!("{name}_{v}")
            } else {
                name
            }
        }
        Expr::Literal(lit) => lit.clone(),
        Expr::BinaryOperation { op, left, right } => format!("({} {} {})", render(left, versions), op, render(right, versions)),
        Expr::UnaryOperation { op, operand, prefix } => {
            if *prefix {
                format!("{}{}", op, render(operand, versions))
            } else {
                format!("{}{}", render(operand, versions), op)
            }
        }
        Expr::Assignment { op, left, right } => format!("{} {} {}", render(left, versions), op, render(right, versions)),
        Expr::FunctionCall { callee, args } => {
            format!("{}({})", expr_text(callee), args.iter().map(|a| render(a, versions)).collect::<Vec<_>>().join(", "))
        }
    }
}

fn track_accesses(blocks: &mut [BasicBlock]) {
    for block in blocks.iter_mut() {
        let mut reads = HashSet::new();
        let mut writes = HashSet::new();
        for stmt in &block.statements {
            let (r, w) = access::statement_accesses(stmt);
            reads.extend(r);
            writes.extend(w);
        }
        block.reads = reads;
        block.writes = writes;
    }
}
