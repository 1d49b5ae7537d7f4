//! Closed error taxonomy. Kept as a hand-rolled `enum` + `Display`/`Error`
//! impl rather than a `thiserror` derive, matching the rest of this crate's
//! dependency surface.

use crate::model::SourceLocation;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    InputMissing { what: String },
    InputMalformed { detail: String, location: Option<SourceLocation> },
    UnsupportedConstruct { construct: String, function: String, location: Option<SourceLocation> },
    InternalInvariantViolated { detail: String },
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::InputMissing { what } => write!(f, "input missing: {what}"),
            AnalysisError::InputMalformed { detail, location } => match location {
                Some(loc) => write!(f, "malformed input at {loc}: {detail}"),
                None => write!(f, "malformed input: {detail}"),
            },
            AnalysisError::UnsupportedConstruct { construct, function, location } => match location {
                Some(loc) => write!(f, "unsupported construct `{construct}` in `{function}` at {loc}"),
                None => write!(f, "unsupported construct `{construct}` in `{function}`"),
            },
            AnalysisError::InternalInvariantViolated { detail } => {
                write!(f, "internal invariant violated: {detail}")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
