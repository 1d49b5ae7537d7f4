//! Core data model shared by every pipeline stage: source locations, the
//! per-function expression/statement AST produced by ingestion, the basic
//! block / SSA IR produced downstream, and findings emitted by detectors.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        SourceLocation { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Visibility of a Solidity function. Only `Public`/`External` functions
/// are entrypoints for detector purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

impl Visibility {
    pub fn is_entrypoint(self) -> bool {
        matches!(self, Visibility::Public | Visibility::External)
    }

    pub fn from_str(s: &str) -> Visibility {
        match s {
            "external" => Visibility::External,
            "internal" => Visibility::Internal,
            "private" => Visibility::Private,
            _ => Visibility::Public,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateVariable {
    pub name: String,
    pub type_name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    pub name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

/// A closed expression surface mirroring the node kinds solc's AST JSON
/// can produce within a function body (§6 of the source specification).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(String),
    Literal(String),
    MemberAccess { base: Box<Expr>, member: String },
    IndexAccess { base: Box<Expr>, index: Box<Expr> },
    BinaryOperation { op: String, left: Box<Expr>, right: Box<Expr> },
    UnaryOperation { op: String, operand: Box<Expr>, prefix: bool },
    Assignment { op: String, left: Box<Expr>, right: Box<Expr> },
    FunctionCall { callee: Box<Expr>, args: Vec<Expr> },
}

/// A closed statement surface. `Condition` is not a real solc node kind;
/// the CFG builder synthesizes it to hold the guard expression of an `if`,
/// `for`, or `while` in its own one-statement block.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    ExpressionStatement(Expr),
    VariableDeclaration { name: String, type_name: String, initializer: Option<Expr>, location: SourceLocation },
    If { condition: Expr, true_body: Vec<Stmt>, false_body: Option<Vec<Stmt>>, location: SourceLocation },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Box<Stmt>>,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    While { condition: Expr, body: Vec<Stmt>, location: SourceLocation },
    Return { value: Option<Expr>, location: SourceLocation },
    Emit { event: String, args: Vec<Expr>, location: SourceLocation },
    Revert { message: Option<String>, location: SourceLocation },
    Block(Vec<Stmt>),
    Condition(Expr),
    Unknown { construct: String, location: SourceLocation },
}

impl Stmt {
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::ExpressionStatement(_) | Stmt::Condition(_) | Stmt::Block(_) => SourceLocation::new(0, 0),
            Stmt::VariableDeclaration { location, .. }
            | Stmt::If { location, .. }
            | Stmt::For { location, .. }
            | Stmt::While { location, .. }
            | Stmt::Return { location, .. }
            | Stmt::Emit { location, .. }
            | Stmt::Revert { location, .. }
            | Stmt::Unknown { location, .. } => location.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Assignment,
    FunctionCall,
    EmitStatement,
    IfStatement,
    Return,
    VariableDeclaration,
    ForLoop,
    WhileLoop,
    Revert,
    Block,
    Expression,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Internal,
    External,
    LowLevelExternal,
    Delegatecall,
    Staticcall,
}

impl CallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CallKind::Internal => "internal",
            CallKind::External => "external",
            CallKind::LowLevelExternal => "low_level_external",
            CallKind::Delegatecall => "delegatecall",
            CallKind::Staticcall => "staticcall",
        }
    }

    pub fn is_external_flavor(self) -> bool {
        !matches!(self, CallKind::Internal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Unset,
    Goto(usize),
    If { cond: Expr, then_block: usize, else_block: usize },
    Return(Option<Expr>),
    Revert(Option<String>),
}

#[derive(Debug, Clone)]
pub struct CallSite {
    pub block_id: usize,
    pub kind: CallKind,
    pub callee_name: String,
    pub arg_texts: Vec<String>,
    pub ret_version: u32,
    pub location: SourceLocation,
    pub inlined: bool,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: usize,
    pub statements: Vec<Stmt>,
    pub terminator: Terminator,

    pub reads: HashSet<String>,
    pub writes: HashSet<String>,

    pub ssa_reads: HashMap<String, u32>,
    pub ssa_writes: HashMap<String, u32>,
    pub ssa_statements: Vec<String>,

    pub is_loop_init: bool,
    pub is_loop_header: bool,
    pub is_loop_body: bool,
    pub is_loop_increment: bool,
    pub is_loop_exit: bool,
    /// Set only on loop headers: the inclusive block-id range of the loop's
    /// body (and increment, for `for`), populated during CFG construction.
    pub loop_range: Option<(usize, usize)>,

    pub has_external_call_effects: bool,
    pub external_call_kinds: Vec<CallKind>,
}

impl BasicBlock {
    pub fn new(id: usize) -> Self {
        BasicBlock {
            id,
            statements: Vec::new(),
            terminator: Terminator::Unset,
            reads: HashSet::new(),
            writes: HashSet::new(),
            ssa_reads: HashMap::new(),
            ssa_writes: HashMap::new(),
            ssa_statements: Vec::new(),
            is_loop_init: false,
            is_loop_header: false,
            is_loop_body: false,
            is_loop_increment: false,
            is_loop_exit: false,
            loop_range: None,
            has_external_call_effects: false,
            external_call_kinds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionIr {
    pub name: String,
    pub visibility: Visibility,
    pub parameters: Vec<Parameter>,
    pub location: SourceLocation,
    pub blocks: Vec<BasicBlock>,
    pub call_sites: Vec<CallSite>,
    pub build_error: Option<crate::error::AnalysisError>,
}

impl FunctionIr {
    pub fn is_entrypoint(&self) -> bool {
        self.visibility.is_entrypoint()
    }
}

#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    pub state_variables: Vec<StateVariable>,
    pub events: Vec<EventDef>,
    pub functions: Vec<FunctionIr>,
    pub location: SourceLocation,
}

impl Contract {
    pub fn state_variable_names(&self) -> HashSet<String> {
        self.state_variables.iter().map(|v| v.name.clone()).collect()
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionIr> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub detector_id: String,
    pub contract: String,
    pub function: String,
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}
