//! Statement Classifier: maps a parsed [`Stmt`] to its closed
//! [`StatementKind`], and provides the two whole-body passes the pipeline
//! needs before CFG construction — flattening nested `Block` statements and
//! detecting unsupported constructs.

use crate::model::{Expr, Stmt, StatementKind};

pub fn classify_stmt(stmt: &Stmt) -> StatementKind {
    match stmt {
        Stmt::ExpressionStatement(expr) => match expr {
            Expr::Assignment { .. } => StatementKind::Assignment,
            Expr::FunctionCall { .. } => StatementKind::FunctionCall,
            _ => StatementKind::Expression,
        },
        Stmt::VariableDeclaration { .. } => StatementKind::VariableDeclaration,
        Stmt::If { .. } => StatementKind::IfStatement,
        Stmt::For { .. } => StatementKind::ForLoop,
        Stmt::While { .. } => StatementKind::WhileLoop,
        Stmt::Return { .. } => StatementKind::Return,
        Stmt::Emit { .. } => StatementKind::EmitStatement,
        Stmt::Revert { .. } => StatementKind::Revert,
        Stmt::Block(_) => StatementKind::Block,
        Stmt::Condition(_) => StatementKind::Expression,
        Stmt::Unknown { .. } => StatementKind::Unknown,
    }
}

/// A nested `Block` statement introduces no control flow of its own; splice
/// its contents into the surrounding list. Recurses into `if`/`for`/`while`
/// bodies so nesting at any depth is normalized before the CFG builder sees it.
pub fn flatten_stmts(stmts: Vec<Stmt>) -> Vec<Stmt> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        match stmt {
            Stmt::Block(inner) => out.extend(flatten_stmts(inner)),
            Stmt::If { condition, true_body, false_body, location } => out.push(Stmt::If {
                condition,
                true_body: flatten_stmts(true_body),
                false_body: false_body.map(flatten_stmts),
                location,
            }),
            Stmt::For { init, condition, increment, body, location } => out.push(Stmt::For {
                init,
                condition,
                increment,
                body: flatten_stmts(body),
                location,
            }),
            Stmt::While { condition, body, location } => out.push(Stmt::While { condition, body: flatten_stmts(body), location }),
            other => out.push(other),
        }
    }
    out
}

/// Finds the first `Stmt::Unknown` anywhere in a (already-flattened)
/// statement tree, if any.
pub fn find_unknown(stmts: &[Stmt]) -> Option<&Stmt> {
    for stmt in stmts {
        match stmt {
            Stmt::Unknown { .. } => return Some(stmt),
            Stmt::If { true_body, false_body, .. } => {
                if let Some(u) = find_unknown(true_body) {
                    return Some(u);
                }
                if let Some(fb) = false_body {
                    if let Some(u) = find_unknown(fb) {
                        return Some(u);
                    }
                }
            }
            Stmt::For { body, .. } | Stmt::While { body, .. } => {
                if let Some(u) = find_unknown(body) {
                    return Some(u);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceLocation;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn classify_assignment_vs_call() {
        let assign = Stmt::ExpressionStatement(Expr::Assignment {
            op: "=".into(),
            left: Box::new(Expr::Identifier("x".into())),
            right: Box::new(Expr::Literal("1".into())),
        });
        assert_eq!(classify_stmt(&assign), StatementKind::Assignment);

        let call = Stmt::ExpressionStatement(Expr::FunctionCall { callee: Box::new(Expr::Identifier("foo".into())), args: vec![] });
        assert_eq!(classify_stmt(&call), StatementKind::FunctionCall);
    }

    #[test]
    fn flatten_splices_nested_blocks() {
        let nested = Stmt::Block(vec![Stmt::Return { value: None, location: loc() }]);
        let flat = flatten_stmts(vec![nested]);
        assert_eq!(flat.len(), 1);
        assert!(matches!(flat[0], Stmt::Return { .. }));
    }

    #[test]
    fn find_unknown_recurses_into_branches() {
        let stmts = vec![Stmt::If {
            condition: Expr::Literal("true".into()),
            true_body: vec![Stmt::Unknown { construct: "InlineAssembly".into(), location: loc() }],
            false_body: None,
            location: loc(),
        }];
        assert!(find_unknown(&stmts).is_some());
    }

    #[test]
    fn find_unknown_absent_in_clean_body() {
        let stmts = vec![Stmt::Return { value: None, location: loc() }];
        assert!(find_unknown(&stmts).is_none());
    }
}
