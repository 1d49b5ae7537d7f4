//! Call Classifier: assigns a [`CallKind`] to a `FunctionCall` expression's
//! callee. `revert`/`require`/`assert` calls never reach here — the
//! ingestor already turns those into `Stmt::Revert` before classification.

use std::collections::HashSet;

use crate::model::{CallKind, Expr};

/// `same_contract_functions` is every function declared in the enclosing
/// contract, entrypoint or not — a bare identifier is only a same-contract
/// (internal) call if it names one of them. Anything else is an external
/// interaction with an unknown/free-standing function.
pub fn classify(callee: &Expr, same_contract_functions: &HashSet<String>) -> CallKind {
    match callee {
        Expr::Identifier(name) if same_contract_functions.contains(name) => CallKind::Internal,
        Expr::Identifier(_) => CallKind::External,
        Expr::MemberAccess { member, .. } => match member.as_str() {
            "delegatecall" => CallKind::Delegatecall,
            "staticcall" => CallKind::Staticcall,
            "call" | "transfer" | "send" => CallKind::LowLevelExternal,
            _ => CallKind::External,
        },
        _ => CallKind::External,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_identifier_is_internal() {
        let callee = Expr::Identifier("_performTransfer".into());
        assert_eq!(classify(&callee, &set(&["_performTransfer"])), CallKind::Internal);
    }

    #[test]
    fn unknown_bare_identifier_is_external() {
        let callee = Expr::Identifier("someFreeFunction".into());
        assert_eq!(classify(&callee, &set(&["_performTransfer"])), CallKind::External);
    }

    #[test]
    fn low_level_call_variants_classify_distinctly() {
        let call = Expr::MemberAccess { base: Box::new(Expr::Identifier("msg.sender".into())), member: "call".into() };
        assert_eq!(classify(&call, &HashSet::new()), CallKind::LowLevelExternal);

        let delegate = Expr::MemberAccess { base: Box::new(Expr::Identifier("target".into())), member: "delegatecall".into() };
        assert_eq!(classify(&delegate, &HashSet::new()), CallKind::Delegatecall);

        let stat = Expr::MemberAccess { base: Box::new(Expr::Identifier("target".into())), member: "staticcall".into() };
        assert_eq!(classify(&stat, &HashSet::new()), CallKind::Staticcall);
    }

    #[test]
    fn interface_method_call_is_external() {
        let callee = Expr::MemberAccess { base: Box::new(Expr::Identifier("token".into())), member: "transferFrom".into() };
        assert_eq!(classify(&callee, &HashSet::new()), CallKind::External);
    }
}
