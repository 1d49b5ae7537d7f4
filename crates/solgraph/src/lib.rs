//! Solidity Reentrancy Analyzer
//!
//! Builds an SSA-form control-flow IR from a solc AST JSON document and runs
//! a reentrancy detector over it.
//!
//! ```rust,ignore
//! use solgraph::{analyze_source_unit, AnalyzerConfig};
//!
//! let ast: serde_json::Value = serde_json::from_str(&ast_json)?;
//! let config = AnalyzerConfig::new();
//! let results = analyze_source_unit(&ast, &source, &config)?;
//! for analysis in &results {
//!     for finding in &analysis.findings {
//!         println!("{}: {}", finding.detector_id, finding.message);
//!     }
//! }
//! ```

pub mod access;
pub mod calls;
pub mod cfg;
pub mod classify;
pub mod config;
pub mod detectors;
pub mod error;
pub mod ingest;
pub mod inline;
pub mod loopcall;
pub mod model;
pub mod phi;
pub mod pipeline;
pub mod ssa;
pub mod terminator;

pub use config::AnalyzerConfig;
pub use error::AnalysisError;
pub use model::{
    BasicBlock, CallKind, CallSite, Contract, EventDef, Expr, Finding, FunctionIr, Parameter,
    Severity, SourceLocation, StateVariable, Stmt, Terminator, Visibility,
};
pub use pipeline::{analyze_source_unit, ContractAnalysis};
