use serde_json::Value;
use tracing::debug;

use crate::context::Context;
use crate::errors::{JsonPathError, Result};
use crate::eval::{self, ExprValue};
use crate::expression;
use crate::functions::Registry;
use crate::jsonpath;
use crate::node::{self, NodeRef};

/// Parses `data` into a tree and runs `path` against it, cloning the
/// matched values out.
pub fn json_path(data: &[u8], path: &str) -> Result<Vec<Value>> {
    let root: Value = serde_json::from_slice(data)
        .map_err(|e| JsonPathError::parse(format!("invalid json: {e}"), 0))?;
    let nodes = select(&root, path)?;
    Ok(nodes.iter().map(NodeRef::unpack).collect())
}

/// Runs `path` against an already parsed tree. The returned handles
/// borrow the tree; use [`paths`] to get their canonical locations.
pub fn select<'a>(root: &'a Value, path: &str) -> Result<Vec<NodeRef<'a>>> {
    select_with(root, path, &Registry::with_builtins())
}

/// Like [`select`], with a caller-supplied function registry.
pub fn select_with<'a>(
    root: &'a Value,
    path: &str,
    registry: &Registry,
) -> Result<Vec<NodeRef<'a>>> {
    let selectors = jsonpath::compile(path, registry)?;
    let root_ref = NodeRef::root(root);
    let nodes = jsonpath::execute(root_ref.clone(), &selectors, &root_ref, registry)?;
    debug!(path, matches = nodes.len(), "executed json path");
    Ok(nodes)
}

/// Exposes the tokenizer for diagnostics: the raw token strings a path
/// splits into, quotes and filter bodies retained.
pub fn parse_json_path(path: &str) -> Result<Vec<String>> {
    jsonpath::tokenize(path)
}

/// Canonical path form for each node: `$` plus `['key']`/`[i]` steps.
pub fn paths(nodes: &[NodeRef<'_>]) -> Vec<String> {
    node::paths(nodes)
}

/// Evaluates an expression that may embed `$`-rooted path literals,
/// e.g. `avg($..price)`, and returns the resulting value.
pub fn eval(root: &Value, expr: &str) -> Result<Value> {
    eval_with(root, expr, &Registry::with_builtins())
}

/// Like [`eval`], with a caller-supplied function registry.
pub fn eval_with(root: &Value, expr: &str, registry: &Registry) -> Result<Value> {
    let program = expression::compile(expr, registry)?;
    let ctx = Context::rooted(NodeRef::root(root));
    let out = eval::run(&program, &ctx, registry)?;
    into_value(out)
}

/// Projects the final expression value into an owned `Value`; node-sets
/// of one node clone that node, larger sets synthesize an array.
fn into_value(v: ExprValue<'_>) -> Result<Value> {
    match v {
        ExprValue::Number(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .ok_or_else(|| JsonPathError::eval(format!("`{n}` is not a json number"))),
        ExprValue::Str(s) => Ok(Value::String(s)),
        ExprValue::Bool(b) => Ok(Value::Bool(b)),
        ExprValue::Null => Ok(Value::Null),
        ExprValue::Nodes(nodes) => match nodes.as_slice() {
            [node] => Ok(node.unpack()),
            _ => Ok(Value::Array(nodes.iter().map(NodeRef::unpack).collect())),
        },
    }
}
