//! Access Tracker: derives the read/write variable sets for a single
//! statement, including structured names (`balances[msg.sender]`) and the
//! base-name coarsening invariant writes must carry.

use crate::model::{Expr, Stmt};

/// Renders an expression into a canonical textual name. Used both for
/// structured variable naming and for SSA operand rendering.
pub fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(name) => name.clone(),
        Expr::Literal(lit) => lit.clone(),
        Expr::MemberAccess { base, member } => format!("{}.{}", expr_text(base), member),
        Expr::IndexAccess { base, index } => format!("{}[{}]", expr_text(base), expr_text(index)),
        Expr::BinaryOperation { op, left, right } => format!("({} {} {})", expr_text(left), op, expr_text(right)),
        Expr::UnaryOperation { op, operand, prefix } => {
            if *prefix {
                format!("{}{}", op, expr_text(operand))
            } else {
                format!("{}{}", expr_text(operand), op)
            }
        }
        Expr::Assignment { op, left, right } => format!("{} {} {}", expr_text(left), op, expr_text(right)),
        Expr::FunctionCall { callee, args } => {
            format!("{}({})", expr_text(callee), args.iter().map(expr_text).collect::<Vec<_>>().join(", "))
        }
    }
}

/// Returns the full chain of structured names for a member/index access
/// expression: for `allowance[owner][spender]` this is
/// `["allowance", "allowance[owner]", "allowance[owner][spender]"]`.
pub fn variable_chain(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Identifier(name) => vec![name.clone()],
        Expr::MemberAccess { base, .. } => {
            let mut chain = variable_chain(base);
            chain.push(expr_text(expr));
            chain
        }
        Expr::IndexAccess { base, .. } => {
            let mut chain = variable_chain(base);
            chain.push(expr_text(expr));
            chain
        }
        _ => vec![expr_text(expr)],
    }
}

/// A synthesized name such as `call[external](...)` is not a real
/// variable; such text is produced only by SSA rendering, never by a
/// source identifier, so filtering on these substrings is exact.
pub fn is_real_variable(name: &str) -> bool {
    !(name.contains("call[") || name.contains("call(") || name.contains(')'))
}

pub fn collect_reads(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Identifier(name) => out.push(name.clone()),
        Expr::Literal(_) => {}
        Expr::MemberAccess { base, .. } => {
            out.extend(variable_chain(expr));
            collect_reads(base, out);
        }
        Expr::IndexAccess { base, index } => {
            out.extend(variable_chain(expr));
            collect_reads(base, out);
            collect_reads(index, out);
        }
        Expr::BinaryOperation { left, right, .. } => {
            collect_reads(left, out);
            collect_reads(right, out);
        }
        Expr::UnaryOperation { operand, .. } => collect_reads(operand, out),
        Expr::Assignment { left, right, .. } => {
            collect_reads(left, out);
            collect_reads(right, out);
        }
        Expr::FunctionCall { callee, args } => {
            if !matches!(callee.as_ref(), Expr::Identifier(_)) {
                collect_reads(callee, out);
            }
            for arg in args {
                collect_reads(arg, out);
            }
        }
    }
}

fn is_increment_decrement(op: &str) -> bool {
    op == "++" || op == "--"
}

/// Returns `(reads, writes)` for a single basic-block statement. Control
/// flow statements (`If`/`For`/`While`) never reach this function directly;
/// the CFG builder extracts their condition into a `Stmt::Condition`.
pub fn statement_accesses(stmt: &Stmt) -> (Vec<String>, Vec<String>) {
    let mut reads = Vec::new();
    let mut writes = Vec::new();
    match stmt {
        Stmt::ExpressionStatement(Expr::Assignment { op, left, right }) => {
            writes.extend(variable_chain(left));
            if op != "=" {
                reads.extend(variable_chain(left));
            }
            collect_reads(right, &mut reads);
        }
        Stmt::ExpressionStatement(Expr::UnaryOperation { op, operand, .. }) if is_increment_decrement(op) => {
            writes.extend(variable_chain(operand));
            reads.extend(variable_chain(operand));
        }
        Stmt::ExpressionStatement(expr) => collect_reads(expr, &mut reads),
        Stmt::VariableDeclaration { name, initializer, .. } => {
            writes.push(name.clone());
            if let Some(init) = initializer {
                collect_reads(init, &mut reads);
            }
        }
        Stmt::Condition(expr) => collect_reads(expr, &mut reads),
        Stmt::Emit { args, .. } => {
            for arg in args {
                collect_reads(arg, &mut reads);
            }
        }
        Stmt::Return { value: Some(expr), .. } => collect_reads(expr, &mut reads),
        Stmt::Return { value: None, .. } | Stmt::Revert { .. } | Stmt::Block(_) | Stmt::Unknown { .. } => {}
        Stmt::If { .. } | Stmt::For { .. } | Stmt::While { .. } => {}
    }
    reads.retain(|n| is_real_variable(n));
    writes.retain(|n| is_real_variable(n));
    (reads, writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceLocation;

    fn ident(name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    #[test]
    fn nested_index_write_produces_full_chain() {
        let expr = Expr::IndexAccess {
            base: Box::new(Expr::IndexAccess { base: Box::new(ident("allowance")), index: Box::new(ident("owner")) }),
            index: Box::new(ident("spender")),
        };
        let chain = variable_chain(&expr);
        assert_eq!(chain, vec!["allowance", "allowance[owner]", "allowance[owner][spender]"]);
    }

    #[test]
    fn compound_assignment_reads_and_writes_same_name() {
        let stmt = Stmt::ExpressionStatement(Expr::Assignment {
            op: "+=".into(),
            left: Box::new(ident("totalSupply")),
            right: Box::new(ident("amount")),
        });
        let (reads, writes) = statement_accesses(&stmt);
        assert!(reads.contains(&"totalSupply".to_string()));
        assert!(reads.contains(&"amount".to_string()));
        assert_eq!(writes, vec!["totalSupply"]);
    }

    #[test]
    fn plain_assignment_does_not_read_its_target() {
        let stmt = Stmt::ExpressionStatement(Expr::Assignment { op: "=".into(), left: Box::new(ident("x")), right: Box::new(ident("y")) });
        let (reads, writes) = statement_accesses(&stmt);
        assert_eq!(reads, vec!["y"]);
        assert_eq!(writes, vec!["x"]);
    }

    #[test]
    fn increment_decrement_is_both_read_and_write() {
        let stmt = Stmt::ExpressionStatement(Expr::UnaryOperation { op: "++".into(), operand: Box::new(ident("i")), prefix: false });
        let (reads, writes) = statement_accesses(&stmt);
        assert_eq!(reads, vec!["i"]);
        assert_eq!(writes, vec!["i"]);
    }

    #[test]
    fn call_callee_identifier_is_not_a_read() {
        let stmt = Stmt::ExpressionStatement(Expr::FunctionCall { callee: Box::new(ident("withdraw")), args: vec![ident("amount")] });
        let (reads, _) = statement_accesses(&stmt);
        assert_eq!(reads, vec!["amount"]);
    }

    #[test]
    fn synthesized_call_text_is_filtered_from_variable_names() {
        assert!(!is_real_variable("call[external](msg.sender, value)"));
        let _ = SourceLocation::new(0, 0);
    }
}
