//! `analyze_source_unit`: the library's single public entry point, wiring
//! every pipeline stage together over one solc-shaped AST JSON document.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{info, warn};

use crate::cfg;
use crate::classify;
use crate::config::AnalyzerConfig;
use crate::detectors;
use crate::error::AnalysisError;
use crate::ingest::{self, RawContract, RawFunction};
use crate::inline;
use crate::loopcall;
use crate::model::{Contract, Finding, FunctionIr};
use crate::phi;
use crate::ssa::SsaBuilder;
use crate::terminator;

pub struct ContractAnalysis {
    pub contract: Option<Contract>,
    pub findings: Vec<Finding>,
    pub warnings: Vec<String>,
    pub fatal: Option<AnalysisError>,
}

pub fn analyze_source_unit(ast: &Value, source: &str, config: &AnalyzerConfig) -> Result<Vec<ContractAnalysis>, AnalysisError> {
    let raw_contracts = ingest::ingest_source_unit(ast, source)?;
    let mut out = Vec::new();

    for raw in raw_contracts {
        match raw {
            Ok(raw_contract) => out.push(analyze_contract(raw_contract, config)?),
            Err(fatal) => out.push(ContractAnalysis { contract: None, findings: vec![], warnings: vec![], fatal: Some(fatal) }),
        }
    }
    Ok(out)
}

fn analyze_contract(raw: RawContract, config: &AnalyzerConfig) -> Result<ContractAnalysis, AnalysisError> {
    info!(contract = %raw.name, functions = raw.function_decls.len(), "analyzing contract");

    let same_contract_functions: HashSet<String> = raw.function_decls.iter().map(|f| f.name.clone()).collect();
    let state_var_names: HashSet<String> = raw.state_variables.iter().map(|v| v.name.clone()).collect();

    let mut warnings = Vec::new();
    let mut built: HashMap<String, FunctionIr> = HashMap::new();

    for decl in &raw.function_decls {
        let function_ir = build_function(decl, &same_contract_functions, &state_var_names, config);
        if let Some(err) = &function_ir.build_error {
            warnings.push(format!("{}: {}", function_ir.name, err));
        }
        built.insert(decl.name.clone(), function_ir);
    }

    // Internal-call inlining only applies to entrypoints; callees are
    // looked up from the fully-built (pre-inlining) function set.
    let callee_snapshot = built.clone();
    let mut functions: Vec<FunctionIr> = Vec::new();
    for mut function_ir in built.into_values() {
        if function_ir.is_entrypoint() && function_ir.build_error.is_none() {
            let mut call_sites = function_ir.call_sites.clone();
            inline::inline_internal_calls(&mut function_ir.blocks, &mut call_sites, &callee_snapshot)?;
            function_ir.call_sites = call_sites;
            terminator::finalize_terminators(&mut function_ir.blocks);
        }
        functions.push(function_ir);
    }
    functions.sort_by(|a, b| a.name.cmp(&b.name));

    let contract = Contract {
        name: raw.name,
        state_variables: raw.state_variables,
        events: raw.events,
        functions,
        location: raw.location,
    };

    let findings = detectors::run_detectors(&contract, config);
    Ok(ContractAnalysis { contract: Some(contract), findings, warnings, fatal: None })
}

fn build_function(decl: &RawFunction, same_contract_functions: &HashSet<String>, state_vars: &HashSet<String>, config: &AnalyzerConfig) -> FunctionIr {
    let Some(body) = &decl.body else {
        return FunctionIr {
            name: decl.name.clone(),
            visibility: decl.visibility,
            parameters: decl.parameters.clone(),
            location: decl.location.clone(),
            blocks: vec![],
            call_sites: vec![],
            build_error: None,
        };
    };

    let flattened = classify::flatten_stmts(body.clone());
    if let Some(unknown) = classify::find_unknown(&flattened) {
        let construct = match unknown {
            crate::model::Stmt::Unknown { construct, .. } => construct.clone(),
            _ => unreachable!(),
        };
        let err = AnalysisError::UnsupportedConstruct { construct, function: decl.name.clone(), location: Some(decl.location.clone()) };
        warn!(function = %decl.name, "unsupported construct, skipping function body");
        return FunctionIr {
            name: decl.name.clone(),
            visibility: decl.visibility,
            parameters: decl.parameters.clone(),
            location: decl.location.clone(),
            blocks: vec![],
            call_sites: vec![],
            build_error: Some(err),
        };
    }

    let mut blocks = cfg::build_blocks(&flattened);

    if let Some(cap) = config.max_blocks_per_function {
        if blocks.len() > cap {
            let err = AnalysisError::UnsupportedConstruct {
                construct: "function exceeds configured block budget".to_string(),
                function: decl.name.clone(),
                location: Some(decl.location.clone()),
            };
            return FunctionIr {
                name: decl.name.clone(),
                visibility: decl.visibility,
                parameters: decl.parameters.clone(),
                location: decl.location.clone(),
                blocks: vec![],
                call_sites: vec![],
                build_error: Some(err),
            };
        }
    }

    let mut builder = SsaBuilder::new(same_contract_functions);
    let call_sites = match builder.build(&mut blocks) {
        Ok(sites) => sites,
        Err(err) => {
            return FunctionIr {
                name: decl.name.clone(),
                visibility: decl.visibility,
                parameters: decl.parameters.clone(),
                location: decl.location.clone(),
                blocks: vec![],
                call_sites: vec![],
                build_error: Some(err),
            };
        }
    };

    tag_external_call_blocks(&mut blocks, &call_sites);
    loopcall::apply_loop_call_effects(&mut blocks, state_vars);
    phi::insert_phi_functions(&mut blocks);
    terminator::finalize_terminators(&mut blocks);

    FunctionIr {
        name: decl.name.clone(),
        visibility: decl.visibility,
        parameters: decl.parameters.clone(),
        location: decl.location.clone(),
        blocks,
        call_sites,
        build_error: None,
    }
}

fn tag_external_call_blocks(blocks: &mut [crate::model::BasicBlock], call_sites: &[crate::model::CallSite]) {
    for site in call_sites {
        if site.kind.is_external_flavor() && site.block_id < blocks.len() {
            blocks[site.block_id].has_external_call_effects = true;
            if !blocks[site.block_id].external_call_kinds.contains(&site.kind) {
                blocks[site.block_id].external_call_kinds.push(site.kind);
            }
        }
    }
}
