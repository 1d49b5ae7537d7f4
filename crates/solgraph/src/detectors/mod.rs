//! Detector Engine: runs a configurable registry of detectors over every
//! entrypoint of a contract whose IR built cleanly.

pub mod reentrancy;

use crate::config::AnalyzerConfig;
use crate::model::{Contract, Finding};

pub trait Detector {
    fn id(&self) -> &'static str;
    fn run(&self, contract: &Contract, function: &crate::model::FunctionIr) -> Vec<Finding>;
}

pub fn default_registry() -> Vec<Box<dyn Detector>> {
    vec![Box::new(reentrancy::ReentrancyDetector)]
}

pub fn run_detectors(contract: &Contract, config: &AnalyzerConfig) -> Vec<Finding> {
    let registry = default_registry();
    let mut findings = Vec::new();
    for function in &contract.functions {
        if !function.is_entrypoint() || function.build_error.is_some() {
            continue;
        }
        for detector in &registry {
            if config.disabled_detectors.contains(detector.id()) {
                continue;
            }
            findings.extend(detector.run(contract, function));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FunctionIr, SourceLocation, Visibility};

    fn empty_function(name: &str, entrypoint: bool) -> FunctionIr {
        FunctionIr {
            name: name.to_string(),
            visibility: if entrypoint { Visibility::Public } else { Visibility::Internal },
            parameters: vec![],
            location: SourceLocation::new(1, 1),
            blocks: vec![],
            call_sites: vec![],
            build_error: None,
        }
    }

    #[test]
    fn disabled_detector_is_skipped() {
        let contract = Contract {
            name: "C".into(),
            state_variables: vec![],
            events: vec![],
            functions: vec![empty_function("f", true)],
            location: SourceLocation::new(1, 1),
        };
        let config = AnalyzerConfig::default().with_disabled_detector("reentrancy");
        let findings = run_detectors(&contract, &config);
        assert!(findings.is_empty());
    }

    #[test]
    fn internal_functions_are_not_scanned_directly() {
        let contract = Contract {
            name: "C".into(),
            state_variables: vec![],
            events: vec![],
            functions: vec![empty_function("helper", false)],
            location: SourceLocation::new(1, 1),
        };
        let findings = run_detectors(&contract, &AnalyzerConfig::default());
        assert!(findings.is_empty());
    }
}
