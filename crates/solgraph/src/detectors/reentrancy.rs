//! Reentrancy Detector: flags a function where an external-kind call is
//! followed, later in the linearized block list, by a write to a state
//! variable. Internal calls never arm this — by the time this runs, their
//! bodies have already been inlined, so any external call they themselves
//! make already appears as its own block with a real external-kind call.

use super::Detector;
use crate::model::{Contract, Finding, FunctionIr, Severity};

pub struct ReentrancyDetector;

impl Detector for ReentrancyDetector {
    fn id(&self) -> &'static str {
        "reentrancy"
    }

    fn run(&self, contract: &Contract, function: &FunctionIr) -> Vec<Finding> {
        let state_vars = contract.state_variable_names();
        let mut findings = Vec::new();
        let mut seen_external_call = false;

        for block in &function.blocks {
            if block.has_external_call_effects {
                seen_external_call = true;
            }

            if seen_external_call {
                let written_state_vars: Vec<&String> = block.writes.iter().filter(|w| state_vars.contains(*w)).collect();
                if !written_state_vars.is_empty() {
                    let names = written_state_vars.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
                    findings.push(Finding {
                        detector_id: self.id().to_string(),
                        contract: contract.name.clone(),
                        function: function.name.clone(),
                        severity: Severity::Error,
                        message: format!("state variable(s) {names} written after an external call in `{}`; possible reentrancy", function.name),
                        location: function.location.clone(),
                    });
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BasicBlock, CallKind, SourceLocation, Terminator, Visibility};
    use std::collections::HashSet;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn contract_with(function: FunctionIr) -> Contract {
        Contract {
            name: "Bank".into(),
            state_variables: vec![crate::model::StateVariable { name: "balances".into(), type_name: "mapping".into(), location: loc() }],
            events: vec![],
            functions: vec![function],
            location: loc(),
        }
    }

    #[test]
    fn flags_write_after_external_call() {
        let mut call_block = BasicBlock::new(0);
        call_block.has_external_call_effects = true;
        call_block.external_call_kinds = vec![CallKind::LowLevelExternal];
        call_block.terminator = Terminator::Goto(1);

        let mut write_block = BasicBlock::new(1);
        write_block.writes = HashSet::from(["balances".to_string()]);
        write_block.terminator = Terminator::Return(None);

        let function = FunctionIr {
            name: "withdraw".into(),
            visibility: Visibility::Public,
            parameters: vec![],
            location: loc(),
            blocks: vec![call_block, write_block],
            call_sites: vec![],
            build_error: None,
        };

        let contract = contract_with(function);
        let findings = ReentrancyDetector.run(&contract, &contract.functions[0]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("balances"));
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn does_not_flag_write_before_external_call() {
        let mut write_block = BasicBlock::new(0);
        write_block.writes = HashSet::from(["balances".to_string()]);
        write_block.terminator = Terminator::Goto(1);

        let mut call_block = BasicBlock::new(1);
        call_block.has_external_call_effects = true;
        call_block.external_call_kinds = vec![CallKind::LowLevelExternal];
        call_block.terminator = Terminator::Return(None);

        let function = FunctionIr {
            name: "withdraw".into(),
            visibility: Visibility::Public,
            parameters: vec![],
            location: loc(),
            blocks: vec![write_block, call_block],
            call_sites: vec![],
            build_error: None,
        };

        let contract = contract_with(function);
        let findings = ReentrancyDetector.run(&contract, &contract.functions[0]);
        assert!(findings.is_empty());
    }
}
