//! AST Ingestor: walks the solc-shaped AST JSON, resolves `src` tags against
//! the original source text, and produces the typed [`Expr`]/[`Stmt`] trees
//! and contract metadata the rest of the pipeline operates on.

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::AnalysisError;
use crate::model::{EventDef, Expr, Parameter, SourceLocation, StateVariable, Stmt, Visibility};

/// A contract definition extracted from the AST, prior to CFG/SSA
/// construction. `function_decls` carries `None` bodies for functions
/// without an implementation (interfaces, abstract declarations).
#[derive(Debug)]
pub struct RawContract {
    pub name: String,
    pub state_variables: Vec<StateVariable>,
    pub events: Vec<EventDef>,
    pub function_decls: Vec<RawFunction>,
    pub location: SourceLocation,
}

#[derive(Debug)]
pub struct RawFunction {
    pub name: String,
    pub visibility: Visibility,
    pub parameters: Vec<Parameter>,
    pub body: Option<Vec<Stmt>>,
    pub location: SourceLocation,
}

/// Resolves a solc `"offset:length:fileIndex"` source tag into a
/// `(line, column)` pair by scanning the source text once per query, per
/// the external-interfaces contract: line terminators count toward the
/// line they end.
pub fn locate(source: &str, src_tag: &str) -> SourceLocation {
    let offset: usize = src_tag.split(':').next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let mut line = 1usize;
    let mut line_start = 0usize;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    let column = offset.saturating_sub(line_start) + 1;
    SourceLocation::new(line, column)
}

fn src_tag(node: &Value) -> &str {
    node.get("src").and_then(Value::as_str).unwrap_or("0:0:0")
}

fn node_type(node: &Value) -> &str {
    node.get("nodeType").and_then(Value::as_str).unwrap_or("")
}

/// Ingests a top-level source unit, returning one result per contract
/// definition found. A malformed contract aborts that contract only.
pub fn ingest_source_unit(ast: &Value, source: &str) -> Result<Vec<Result<RawContract, AnalysisError>>, AnalysisError> {
    let nodes = ast
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| AnalysisError::InputMissing { what: "nodes".to_string() })?;

    let mut out = Vec::new();
    for node in nodes {
        if node_type(node) == "ContractDefinition" {
            let contract_name = node.get("name").and_then(Value::as_str).unwrap_or("?");
            debug!(contract = %contract_name, "ingesting contract");
            out.push(ingest_contract(node, source));
        }
    }
    Ok(out)
}

fn ingest_contract(node: &Value, source: &str) -> Result<RawContract, AnalysisError> {
    let name = node
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| AnalysisError::InputMalformed {
            detail: "ContractDefinition missing name".to_string(),
            location: Some(locate(source, src_tag(node))),
        })?
        .to_string();

    let location = locate(source, src_tag(node));
    let members = node.get("nodes").and_then(Value::as_array).ok_or_else(|| AnalysisError::InputMalformed {
        detail: format!("contract {name} missing nodes"),
        location: Some(location.clone()),
    })?;

    let mut state_variables = Vec::new();
    let mut events = Vec::new();
    let mut function_decls = Vec::new();

    for member in members {
        match node_type(member) {
            "VariableDeclaration" if member.get("stateVariable").and_then(Value::as_bool).unwrap_or(false) => {
                let var_name = member.get("name").and_then(Value::as_str).unwrap_or("").to_string();
                let type_name = member
                    .get("typeName")
                    .and_then(|t| t.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                state_variables.push(StateVariable { name: var_name, type_name, location: locate(source, src_tag(member)) });
            }
            "EventDefinition" => {
                let ev_name = member.get("name").and_then(Value::as_str).unwrap_or("").to_string();
                events.push(EventDef { name: ev_name, location: locate(source, src_tag(member)) });
            }
            "FunctionDefinition" => {
                function_decls.push(ingest_function(member, source)?);
            }
            _ => {}
        }
    }

    Ok(RawContract { name, state_variables, events, function_decls, location })
}

fn ingest_function(node: &Value, source: &str) -> Result<RawFunction, AnalysisError> {
    let name = node.get("name").and_then(Value::as_str).unwrap_or("").to_string();
    let location = locate(source, src_tag(node));
    let visibility = Visibility::from_str(node.get("visibility").and_then(Value::as_str).unwrap_or("public"));

    let parameters = node
        .get("parameters")
        .and_then(|p| p.get("parameters"))
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .map(|p| Parameter {
                    name: p.get("name").and_then(Value::as_str).unwrap_or("").to_string(),
                    type_name: p.get("typeName").and_then(|t| t.get("name")).and_then(Value::as_str).unwrap_or("unknown").to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let body = match node.get("body") {
        Some(b) if !b.is_null() => Some(parse_block(b, &name, source)?),
        _ => None,
    };

    Ok(RawFunction { name, visibility, parameters, body, location })
}

fn parse_block(node: &Value, function: &str, source: &str) -> Result<Vec<Stmt>, AnalysisError> {
    let stmts = node.get("statements").and_then(Value::as_array).cloned().unwrap_or_default();
    stmts.iter().map(|s| parse_statement(s, function, source)).collect()
}

fn parse_statement(node: &Value, function: &str, source: &str) -> Result<Stmt, AnalysisError> {
    let loc = locate(source, src_tag(node));
    trace!(kind = node_type(node), "parsing statement");
    match node_type(node) {
        "ExpressionStatement" => {
            let expr = node.get("expression").ok_or_else(|| AnalysisError::InputMalformed {
                detail: "ExpressionStatement missing expression".to_string(),
                location: Some(loc.clone()),
            })?;
            if is_revert_like(expr) {
                return Ok(parse_revert(expr, source));
            }
            Ok(Stmt::ExpressionStatement(parse_expr(expr, source)?))
        }
        "VariableDeclarationStatement" => {
            let decls = node.get("declarations").and_then(Value::as_array).cloned().unwrap_or_default();
            let decl = decls.into_iter().filter(|v| !v.is_null()).next().ok_or_else(|| AnalysisError::InputMalformed {
                detail: "VariableDeclarationStatement missing declarations".to_string(),
                location: Some(loc.clone()),
            })?;
            let name = decl.get("name").and_then(Value::as_str).unwrap_or("").to_string();
            let type_name = decl.get("typeName").and_then(|t| t.get("name")).and_then(Value::as_str).unwrap_or("unknown").to_string();
            let initializer = match node.get("initialValue") {
                Some(v) if !v.is_null() => Some(parse_expr(v, source)?),
                _ => None,
            };
            Ok(Stmt::VariableDeclaration { name, type_name, initializer, location: loc })
        }
        "IfStatement" => {
            let condition = parse_expr(
                node.get("condition").ok_or_else(|| AnalysisError::InputMalformed {
                    detail: "IfStatement missing condition".to_string(),
                    location: Some(loc.clone()),
                })?,
                source,
            )?;
            let true_body = parse_body_like(node.get("trueBody"), function, source)?;
            let false_body = match node.get("falseBody") {
                Some(v) if !v.is_null() => Some(parse_body_like(Some(v), function, source)?),
                _ => None,
            };
            Ok(Stmt::If { condition, true_body, false_body, location: loc })
        }
        "ForStatement" => {
            let init = match node.get("initializationExpression") {
                Some(v) if !v.is_null() => Some(Box::new(parse_statement(v, function, source)?)),
                _ => None,
            };
            let condition = match node.get("condition") {
                Some(v) if !v.is_null() => Some(parse_expr(v, source)?),
                _ => None,
            };
            let increment = match node.get("loopExpression") {
                Some(v) if !v.is_null() => Some(Box::new(parse_statement(v, function, source)?)),
                _ => None,
            };
            let body = parse_body_like(node.get("body"), function, source)?;
            Ok(Stmt::For { init, condition, increment, body, location: loc })
        }
        "WhileStatement" => {
            let condition = parse_expr(
                node.get("condition").ok_or_else(|| AnalysisError::InputMalformed {
                    detail: "WhileStatement missing condition".to_string(),
                    location: Some(loc.clone()),
                })?,
                source,
            )?;
            let body = parse_body_like(node.get("body"), function, source)?;
            Ok(Stmt::While { condition, body, location: loc })
        }
        "Return" | "ReturnStatement" => {
            let value = match node.get("expression") {
                Some(v) if !v.is_null() => Some(parse_expr(v, source)?),
                _ => None,
            };
            Ok(Stmt::Return { value, location: loc })
        }
        "EmitStatement" => {
            let call = node.get("eventCall").ok_or_else(|| AnalysisError::InputMalformed {
                detail: "EmitStatement missing eventCall".to_string(),
                location: Some(loc.clone()),
            })?;
            let event = call.get("expression").and_then(|e| e.get("name")).and_then(Value::as_str).unwrap_or("").to_string();
            let args = call
                .get("arguments")
                .and_then(Value::as_array)
                .map(|a| a.iter().map(|e| parse_expr(e, source)).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Stmt::Emit { event, args, location: loc })
        }
        "Block" => Ok(Stmt::Block(parse_block(node, function, source)?)),
        other => Ok(Stmt::Unknown { construct: other.to_string(), location: loc }),
    }
}

/// `trueBody`/`falseBody`/loop bodies may themselves be a single statement
/// (no braces) or a `Block`; normalize both into a flat statement list.
fn parse_body_like(node: Option<&Value>, function: &str, source: &str) -> Result<Vec<Stmt>, AnalysisError> {
    let node = match node {
        Some(v) if !v.is_null() => v,
        _ => return Ok(Vec::new()),
    };
    if node_type(node) == "Block" {
        parse_block(node, function, source)
    } else {
        Ok(vec![parse_statement(node, function, source)?])
    }
}

fn is_revert_like(expr: &Value) -> bool {
    if node_type(expr) != "FunctionCall" {
        return false;
    }
    let callee_name = expr.get("expression").and_then(|e| e.get("name")).and_then(Value::as_str).unwrap_or("");
    matches!(callee_name, "revert" | "require" | "assert")
}

fn parse_revert(expr: &Value, source: &str) -> Stmt {
    let loc = locate(source, src_tag(expr));
    let message = expr
        .get("arguments")
        .and_then(Value::as_array)
        .and_then(|args| args.iter().find_map(|a| a.get("value").and_then(Value::as_str)))
        .map(|s| s.to_string());
    Stmt::Revert { message, location: loc }
}

fn parse_expr(node: &Value, source: &str) -> Result<Expr, AnalysisError> {
    let loc = || locate(source, src_tag(node));
    match node_type(node) {
        "Identifier" => Ok(Expr::Identifier(node.get("name").and_then(Value::as_str).unwrap_or("").to_string())),
        "Literal" => Ok(Expr::Literal(node.get("value").and_then(Value::as_str).unwrap_or("").to_string())),
        "MemberAccess" => Ok(Expr::MemberAccess {
            base: Box::new(parse_expr(
                node.get("expression").ok_or_else(|| AnalysisError::InputMalformed { detail: "MemberAccess missing expression".into(), location: Some(loc()) })?,
                source,
            )?),
            member: node.get("memberName").and_then(Value::as_str).unwrap_or("").to_string(),
        }),
        "IndexAccess" => Ok(Expr::IndexAccess {
            base: Box::new(parse_expr(
                node.get("baseExpression").ok_or_else(|| AnalysisError::InputMalformed { detail: "IndexAccess missing baseExpression".into(), location: Some(loc()) })?,
                source,
            )?),
            index: Box::new(parse_expr(
                node.get("indexExpression").ok_or_else(|| AnalysisError::InputMalformed { detail: "IndexAccess missing indexExpression".into(), location: Some(loc()) })?,
                source,
            )?),
        }),
        "BinaryOperation" => Ok(Expr::BinaryOperation {
            op: node.get("operator").and_then(Value::as_str).unwrap_or("").to_string(),
            left: Box::new(parse_expr(node.get("leftExpression").unwrap_or(&Value::Null), source)?),
            right: Box::new(parse_expr(node.get("rightExpression").unwrap_or(&Value::Null), source)?),
        }),
        "UnaryOperation" => Ok(Expr::UnaryOperation {
            op: node.get("operator").and_then(Value::as_str).unwrap_or("").to_string(),
            operand: Box::new(parse_expr(node.get("subExpression").unwrap_or(&Value::Null), source)?),
            prefix: node.get("prefix").and_then(Value::as_bool).unwrap_or(true),
        }),
        "Assignment" => Ok(Expr::Assignment {
            op: node.get("operator").and_then(Value::as_str).unwrap_or("=").to_string(),
            left: Box::new(parse_expr(node.get("leftHandSide").unwrap_or(&Value::Null), source)?),
            right: Box::new(parse_expr(node.get("rightHandSide").unwrap_or(&Value::Null), source)?),
        }),
        "FunctionCall" => {
            let callee = parse_expr(node.get("expression").unwrap_or(&Value::Null), source)?;
            let args = node
                .get("arguments")
                .and_then(Value::as_array)
                .map(|a| a.iter().map(|e| parse_expr(e, source)).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Expr::FunctionCall { callee: Box::new(callee), args })
        }
        "" if node.is_null() => Ok(Expr::Literal(String::new())),
        other => Err(AnalysisError::InputMalformed { detail: format!("unsupported expression node `{other}`"), location: Some(loc()) }),
    }
}
