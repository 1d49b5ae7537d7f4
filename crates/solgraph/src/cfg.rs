//! Block Splitter + CFG Refiner: turns a flattened statement list into a
//! list of single-purpose [`BasicBlock`]s linked by [`Terminator`]s.
//!
//! Every non-control-flow statement that is not the last one in its
//! enclosing list ends the block it is in; control-flow statements expand
//! into the fixed block shapes described for `if`/`for`/`while`. Building
//! one block per effectful statement this way also gives the
//! mint/burn-shaped re-splitting the internal-call inliner otherwise needs
//! as a dedicated pass: state-mutating statements never end up sharing a
//! block in the first place.

use crate::model::{BasicBlock, Expr, Stmt, Terminator};

pub struct CfgBuilder {
    pub blocks: Vec<BasicBlock>,
}

impl CfgBuilder {
    pub fn new() -> Self {
        CfgBuilder { blocks: vec![BasicBlock::new(0)] }
    }

    fn new_block(&mut self) -> usize {
        let id = self.blocks.len();
        self.blocks.push(BasicBlock::new(id));
        id
    }

    fn set_terminator_if_unset(&mut self, block: usize, term: Terminator) {
        if matches!(self.blocks[block].terminator, Terminator::Unset) {
            self.blocks[block].terminator = term;
        }
    }

    /// Appends `stmts` starting at `start`, returning the id of the still-open
    /// trailing block subsequent statements (from the caller) should append to.
    pub fn build(&mut self, stmts: &[Stmt], start: usize) -> usize {
        let mut current = start;
        let n = stmts.len();
        for (i, stmt) in stmts.iter().enumerate() {
            let is_last = i == n - 1;
            current = self.build_one(stmt, current, is_last);
        }
        current
    }

    fn build_one(&mut self, stmt: &Stmt, mut current: usize, is_last: bool) -> usize {
        match stmt {
            Stmt::If { condition, true_body, false_body, .. } => {
                self.blocks[current].statements.push(Stmt::Condition(condition.clone()));
                let then_start = self.new_block();
                let else_start = self.new_block();
                self.blocks[current].terminator = Terminator::If { cond: condition.clone(), then_block: then_start, else_block: else_start };

                let then_end = self.build(true_body, then_start);
                let else_end = match false_body {
                    Some(fb) => self.build(fb, else_start),
                    None => else_start,
                };

                let next = self.new_block();
                self.set_terminator_if_unset(then_end, Terminator::Goto(next));
                self.set_terminator_if_unset(else_end, Terminator::Goto(next));
                next
            }
            Stmt::For { init, condition, increment, body, .. } => {
                if let Some(init_stmt) = init {
                    current = self.build_one(init_stmt, current, true);
                }
                self.blocks[current].is_loop_init = true;

                let header = self.new_block();
                self.set_terminator_if_unset(current, Terminator::Goto(header));
                self.blocks[header].is_loop_header = true;
                let cond = condition.clone().unwrap_or(Expr::Literal("true".to_string()));
                self.blocks[header].statements.push(Stmt::Condition(cond.clone()));

                let body_start = self.new_block();
                self.blocks[body_start].is_loop_body = true;
                let body_end = self.build(body, body_start);

                let increment_start = self.new_block();
                self.blocks[increment_start].is_loop_increment = true;
                let increment_end = match increment {
                    Some(inc) => self.build_one(inc, increment_start, true),
                    None => increment_start,
                };
                self.set_terminator_if_unset(body_end, Terminator::Goto(increment_start));
                self.set_terminator_if_unset(increment_end, Terminator::Goto(header));

                let exit = self.new_block();
                self.blocks[exit].is_loop_exit = true;
                self.blocks[header].terminator = Terminator::If { cond, then_block: body_start, else_block: exit };
                self.blocks[header].loop_range = Some((body_start, increment_end));
                exit
            }
            Stmt::While { condition, body, .. } => {
                let pre = current;
                self.blocks[pre].is_loop_init = true;
                let header = self.new_block();
                self.set_terminator_if_unset(pre, Terminator::Goto(header));
                self.blocks[header].is_loop_header = true;
                self.blocks[header].statements.push(Stmt::Condition(condition.clone()));

                let body_start = self.new_block();
                self.blocks[body_start].is_loop_body = true;
                let body_end = self.build(body, body_start);
                self.set_terminator_if_unset(body_end, Terminator::Goto(header));

                let exit = self.new_block();
                self.blocks[exit].is_loop_exit = true;
                self.blocks[header].terminator = Terminator::If { cond: condition.clone(), then_block: body_start, else_block: exit };
                self.blocks[header].loop_range = Some((body_start, body_end));
                exit
            }
            Stmt::Return { value, .. } => {
                self.blocks[current].statements.push(stmt.clone());
                self.blocks[current].terminator = Terminator::Return(value.clone());
                current
            }
            Stmt::Revert { message, .. } => {
                self.blocks[current].statements.push(stmt.clone());
                self.blocks[current].terminator = Terminator::Revert(message.clone());
                current
            }
            Stmt::Block(_) | Stmt::Unknown { .. } => current,
            other => {
                self.blocks[current].statements.push(other.clone());
                if !is_last {
                    let next = self.new_block();
                    self.blocks[current].terminator = Terminator::Goto(next);
                    next
                } else {
                    current
                }
            }
        }
    }
}

/// Builds the full block list for a (already flattened, already validated)
/// function body.
pub fn build_blocks(body: &[Stmt]) -> Vec<BasicBlock> {
    let mut builder = CfgBuilder::new();
    builder.build(body, 0);
    builder.blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceLocation;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn empty_body_is_a_single_open_block() {
        let blocks = build_blocks(&[]);
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0].terminator, Terminator::Unset));
    }

    #[test]
    fn single_revert_is_one_block() {
        let blocks = build_blocks(&[Stmt::Revert { message: Some("no".into()), location: loc() }]);
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0].terminator, Terminator::Revert(_)));
    }

    #[test]
    fn three_straight_line_statements_become_three_blocks() {
        let body = vec![
            Stmt::VariableDeclaration { name: "bal".into(), type_name: "uint".into(), initializer: None, location: loc() },
            Stmt::ExpressionStatement(Expr::FunctionCall { callee: Box::new(Expr::Identifier("transfer".into())), args: vec![] }),
            Stmt::ExpressionStatement(Expr::Assignment {
                op: "=".into(),
                left: Box::new(Expr::Identifier("x".into())),
                right: Box::new(Expr::Literal("0".into())),
            }),
        ];
        let blocks = build_blocks(&body);
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0].terminator, Terminator::Goto(1)));
        assert!(matches!(blocks[1].terminator, Terminator::Goto(2)));
        assert!(matches!(blocks[2].terminator, Terminator::Unset));
    }

    #[test]
    fn if_statement_produces_condition_then_else_and_merge_blocks() {
        let body = vec![Stmt::If {
            condition: Expr::Identifier("ok".into()),
            true_body: vec![Stmt::Return { value: None, location: loc() }],
            false_body: None,
            location: loc(),
        }];
        let blocks = build_blocks(&body);
        // block0: condition, block1: then (returns), block2: else (empty, goto merge), block3: merge
        assert_eq!(blocks.len(), 4);
        assert!(matches!(blocks[0].terminator, Terminator::If { then_block: 1, else_block: 2, .. }));
        assert!(matches!(blocks[1].terminator, Terminator::Return(None)));
        assert!(matches!(blocks[2].terminator, Terminator::Goto(3)));
    }

    #[test]
    fn for_loop_has_five_role_tagged_blocks_with_back_edge() {
        let body = vec![Stmt::For {
            init: Some(Box::new(Stmt::VariableDeclaration { name: "i".into(), type_name: "uint".into(), initializer: Some(Expr::Literal("0".into())), location: loc() })),
            condition: Some(Expr::BinaryOperation { op: "<".into(), left: Box::new(Expr::Identifier("i".into())), right: Box::new(Expr::Identifier("n".into())) }),
            increment: Some(Box::new(Stmt::ExpressionStatement(Expr::UnaryOperation { op: "++".into(), operand: Box::new(Expr::Identifier("i".into())), prefix: false }))),
            body: vec![],
            location: loc(),
        }];
        let blocks = build_blocks(&body);
        assert!(blocks.iter().any(|b| b.is_loop_init));
        assert!(blocks.iter().any(|b| b.is_loop_header));
        assert!(blocks.iter().any(|b| b.is_loop_body));
        assert!(blocks.iter().any(|b| b.is_loop_increment));
        assert!(blocks.iter().any(|b| b.is_loop_exit));
        let increment_idx = blocks.iter().position(|b| b.is_loop_increment).unwrap();
        let header_idx = blocks.iter().position(|b| b.is_loop_header).unwrap();
        assert!(matches!(blocks[increment_idx].terminator, Terminator::Goto(t) if t == header_idx));
    }
}
