use std::cmp::Ordering;

use serde_json::Value;

use crate::comparison;
use crate::context::Context;
use crate::errors::{JsonPathError, Result};
use crate::expression::{BinOp, Op, PathExpr, Program};
use crate::functions::Registry;
use crate::node::NodeRef;

/// The expression value algebra. `Nodes` carries the result of an
/// embedded path; an empty set is the "matched nothing" marker that
/// operators propagate instead of failing.
#[derive(Debug, Clone)]
pub enum ExprValue<'a> {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Nodes(Vec<NodeRef<'a>>),
}

impl ExprValue<'_> {
    /// Filter truthiness: non-zero numbers, non-empty strings, `true`,
    /// and non-empty node-sets.
    pub fn truthy(&self) -> bool {
        match self {
            ExprValue::Number(n) => *n != 0.0,
            ExprValue::Str(s) => !s.is_empty(),
            ExprValue::Bool(b) => *b,
            ExprValue::Null => false,
            ExprValue::Nodes(nodes) => !nodes.is_empty(),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            ExprValue::Number(_) => "number",
            ExprValue::Str(_) => "string",
            ExprValue::Bool(_) => "bool",
            ExprValue::Null => "null",
            ExprValue::Nodes(_) => "node-set",
        }
    }
}

fn missing<'a>() -> ExprValue<'a> {
    ExprValue::Nodes(Vec::new())
}

/// Runs a compiled program against the context bindings.
pub(crate) fn run<'a>(
    program: &Program,
    ctx: &Context<'a>,
    registry: &Registry,
) -> Result<ExprValue<'a>> {
    let mut stack: Vec<ExprValue<'a>> = Vec::new();
    for op in &program.ops {
        match op {
            Op::Number(n) => stack.push(ExprValue::Number(*n)),
            Op::Str(s) => stack.push(ExprValue::Str(s.clone())),
            Op::Bool(b) => stack.push(ExprValue::Bool(*b)),
            Op::Null => stack.push(ExprValue::Null),
            Op::Path(path) => stack.push(resolve_path(path, ctx, registry)?),
            Op::Neg => {
                let v = pop(&mut stack)?;
                match coerce_scalar(v)? {
                    None => stack.push(missing()),
                    Some(ExprValue::Number(n)) => stack.push(ExprValue::Number(-n)),
                    Some(other) => {
                        return Err(JsonPathError::eval(format!(
                            "cannot negate {}",
                            other.type_name()
                        )))
                    }
                }
            }
            Op::Binary(op) => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(apply_binary(*op, a, b)?);
            }
            Op::Call { name, argc } => {
                let func = registry
                    .get(name)
                    .ok_or_else(|| JsonPathError::UnknownFunction(name.clone()))?;
                let split = stack
                    .len()
                    .checked_sub(*argc)
                    .ok_or_else(|| JsonPathError::eval("expression stack underflow"))?;
                let args = stack.split_off(split);
                stack.push(func.call(&args)?);
            }
        }
    }
    pop(&mut stack)
}

fn pop<'a>(stack: &mut Vec<ExprValue<'a>>) -> Result<ExprValue<'a>> {
    stack
        .pop()
        .ok_or_else(|| JsonPathError::eval("expression stack underflow"))
}

/// Resolves an embedded path literal into a node-set: `@`-relative
/// paths start at the current node, `$` paths at the query root.
fn resolve_path<'a>(
    path: &PathExpr,
    ctx: &Context<'a>,
    registry: &Registry,
) -> Result<ExprValue<'a>> {
    let start = if path.relative {
        ctx.current
            .clone()
            .ok_or_else(|| JsonPathError::eval("`@` is not bound in this expression"))?
    } else {
        ctx.root.clone()
    };
    let nodes = crate::jsonpath::execute(start, &path.selectors, &ctx.root, registry)?;
    Ok(ExprValue::Nodes(nodes))
}

/// Demotes a node-set to its single scalar where an operator requires
/// one. `Ok(None)` marks an empty set (missing data); a set with more
/// than one node, or a lone container node, cannot be a scalar.
fn coerce_scalar(v: ExprValue<'_>) -> Result<Option<ExprValue<'_>>> {
    match v {
        ExprValue::Nodes(nodes) => match nodes.as_slice() {
            [] => Ok(None),
            [node] => scalar_of(node.value()).map(Some),
            _ => Err(JsonPathError::eval(format!(
                "node-set of {} nodes is not a scalar",
                nodes.len()
            ))),
        },
        other => Ok(Some(other)),
    }
}

fn scalar_of<'a>(v: &Value) -> Result<ExprValue<'a>> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .map(ExprValue::Number)
            .ok_or_else(|| JsonPathError::eval(format!("number {n} is out of range"))),
        Value::String(s) => Ok(ExprValue::Str(s.clone())),
        Value::Bool(b) => Ok(ExprValue::Bool(*b)),
        Value::Null => Ok(ExprValue::Null),
        _ => Err(JsonPathError::eval("node is not a scalar")),
    }
}

fn type_mismatch(op: BinOp, a: &ExprValue<'_>, b: &ExprValue<'_>) -> JsonPathError {
    JsonPathError::eval(format!(
        "operator `{}` cannot combine {} and {}",
        op.symbol(),
        a.type_name(),
        b.type_name()
    ))
}

fn apply_binary<'a>(op: BinOp, a: ExprValue<'a>, b: ExprValue<'a>) -> Result<ExprValue<'a>> {
    // logical operators work on truthiness, so node-sets keep their
    // non-empty/empty meaning without scalar coercion
    if matches!(op, BinOp::And | BinOp::Or) {
        let out = match op {
            BinOp::And => a.truthy() && b.truthy(),
            _ => a.truthy() || b.truthy(),
        };
        return Ok(ExprValue::Bool(out));
    }
    let (a, b) = match (coerce_scalar(a)?, coerce_scalar(b)?) {
        (Some(a), Some(b)) => (a, b),
        // missing data propagates and ends up falsy
        _ => return Ok(missing()),
    };
    match op {
        BinOp::Add => match (&a, &b) {
            (ExprValue::Number(x), ExprValue::Number(y)) => Ok(ExprValue::Number(x + y)),
            (ExprValue::Str(x), ExprValue::Str(y)) => Ok(ExprValue::Str(format!("{x}{y}"))),
            _ => Err(type_mismatch(op, &a, &b)),
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
            let (x, y) = match (&a, &b) {
                (ExprValue::Number(x), ExprValue::Number(y)) => (*x, *y),
                _ => return Err(type_mismatch(op, &a, &b)),
            };
            let out = match op {
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                BinOp::Div | BinOp::Rem => {
                    if y == 0.0 {
                        return Err(JsonPathError::eval("division by zero"));
                    }
                    if op == BinOp::Div {
                        x / y
                    } else {
                        x % y
                    }
                }
                _ => unreachable!(),
            };
            Ok(ExprValue::Number(out))
        }
        BinOp::Eq => Ok(ExprValue::Bool(comparison::equals(&a, &b))),
        BinOp::Ne => Ok(ExprValue::Bool(!comparison::equals(&a, &b))),
        BinOp::Lt => Ok(ExprValue::Bool(
            comparison::order(&a, &b)? == Ordering::Less,
        )),
        BinOp::Lte => Ok(ExprValue::Bool(
            comparison::order(&a, &b)? != Ordering::Greater,
        )),
        BinOp::Gt => Ok(ExprValue::Bool(
            comparison::order(&a, &b)? == Ordering::Greater,
        )),
        BinOp::Gte => Ok(ExprValue::Bool(
            comparison::order(&a, &b)? != Ordering::Less,
        )),
        BinOp::And | BinOp::Or => unreachable!(),
    }
}

/// A computed selector value: an array index or an object key.
#[derive(Debug)]
pub(crate) enum RefKey {
    Index(i64),
    Key(String),
}

/// Runs a `(expr)` program and demands a usable reference out of it:
/// an integral finite number or a string.
pub(crate) fn reference<'a>(
    program: &Program,
    ctx: &Context<'a>,
    registry: &Registry,
) -> Result<RefKey> {
    let out = run(program, ctx, registry)?;
    match coerce_scalar(out)? {
        None => Err(JsonPathError::eval("reference expression matched nothing")),
        Some(ExprValue::Number(n)) => {
            if !n.is_finite() || n.fract() != 0.0 {
                return Err(JsonPathError::eval(format!(
                    "`{n}` cannot be used as an index"
                )));
            }
            Ok(RefKey::Index(n as i64))
        }
        Some(ExprValue::Str(s)) => Ok(RefKey::Key(s)),
        Some(other) => Err(JsonPathError::eval(format!(
            "{} cannot be used as a reference",
            other.type_name()
        ))),
    }
}

/// Resolves a computed slice bound; keys make no sense there.
pub(crate) fn integer_bound<'a>(
    program: &Program,
    ctx: &Context<'a>,
    registry: &Registry,
) -> Result<i64> {
    match reference(program, ctx, registry)? {
        RefKey::Index(i) => Ok(i),
        RefKey::Key(_) => Err(JsonPathError::eval("slice bound must be a number")),
    }
}
