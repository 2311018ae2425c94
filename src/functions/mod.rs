use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::errors::{JsonPathError, Result};
use crate::eval::ExprValue;

/// Trait for pluggable functions callable from expressions.
///
/// `arity` is consulted at compile time, so a call with the wrong
/// argument count fails before any node is visited.
pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;
    fn arity(&self) -> RangeInclusive<usize>;
    fn call<'a>(&self, args: &[ExprValue<'a>]) -> Result<ExprValue<'a>>;
}

/// Thread-safe function registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Function>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut map: HashMap<&'static str, Arc<dyn Function>> = HashMap::new();
        map.insert("avg", Arc::new(builtins::Avg));
        map.insert("sum", Arc::new(builtins::Sum));
        map.insert("factorial", Arc::new(builtins::Factorial));
        map.insert("length", Arc::new(builtins::Length));
        map.insert("abs", Arc::new(builtins::Abs));
        map.insert("round", Arc::new(builtins::Round));
        map.insert("sqrt", Arc::new(builtins::Sqrt));
        Self {
            inner: Arc::new(map),
        }
    }

    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let map = Arc::make_mut(&mut self.inner);
        map.insert(f.name(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.get(name).cloned()
    }
}

/// Coerces an argument to a number: a numeric literal, or a node-set
/// holding exactly one numeric node.
fn numeric(arg: &ExprValue<'_>, func: &str) -> Result<f64> {
    match arg {
        ExprValue::Number(n) => Ok(*n),
        ExprValue::Nodes(nodes) if nodes.len() == 1 => nodes[0]
            .value()
            .as_f64()
            .ok_or_else(|| JsonPathError::eval(format!("{func}: node is not numeric"))),
        other => Err(JsonPathError::eval(format!(
            "{func}: expected a number, got {}",
            other.type_name()
        ))),
    }
}

/// Coerces an argument to the numeric members of a set. A lone number
/// counts as a one-element set; a set with no numeric members is an
/// error.
fn numeric_set(arg: &ExprValue<'_>, func: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = match arg {
        ExprValue::Number(n) => vec![*n],
        ExprValue::Nodes(nodes) => nodes.iter().filter_map(|n| n.value().as_f64()).collect(),
        other => {
            return Err(JsonPathError::eval(format!(
                "{func}: expected a node-set, got {}",
                other.type_name()
            )))
        }
    };
    if values.is_empty() {
        return Err(JsonPathError::eval(format!("{func} over an empty set")));
    }
    Ok(values)
}

pub mod builtins {
    use super::*;

    pub struct Avg;
    impl Function for Avg {
        fn name(&self) -> &'static str {
            "avg"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call<'a>(&self, args: &[ExprValue<'a>]) -> Result<ExprValue<'a>> {
            let values = numeric_set(&args[0], "avg")?;
            let sum: f64 = values.iter().sum();
            Ok(ExprValue::Number(sum / values.len() as f64))
        }
    }

    pub struct Sum;
    impl Function for Sum {
        fn name(&self) -> &'static str {
            "sum"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call<'a>(&self, args: &[ExprValue<'a>]) -> Result<ExprValue<'a>> {
            let values = numeric_set(&args[0], "sum")?;
            Ok(ExprValue::Number(values.iter().sum()))
        }
    }

    pub struct Factorial;
    impl Function for Factorial {
        fn name(&self) -> &'static str {
            "factorial"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call<'a>(&self, args: &[ExprValue<'a>]) -> Result<ExprValue<'a>> {
            let n = numeric(&args[0], "factorial")?;
            if !n.is_finite() || n.fract() != 0.0 || n < 0.0 {
                return Err(JsonPathError::eval(format!(
                    "factorial of a non-natural number {n}"
                )));
            }
            let mut acc = 1.0;
            for k in 2..=(n as u64) {
                acc *= k as f64;
            }
            Ok(ExprValue::Number(acc))
        }
    }

    pub struct Length;
    impl Function for Length {
        fn name(&self) -> &'static str {
            "length"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call<'a>(&self, args: &[ExprValue<'a>]) -> Result<ExprValue<'a>> {
            let n = match &args[0] {
                ExprValue::Str(s) => s.chars().count(),
                ExprValue::Nodes(nodes) if nodes.len() == 1 => nodes[0]
                    .len()
                    .ok_or_else(|| JsonPathError::eval("length of a scalar node"))?,
                ExprValue::Nodes(nodes) => nodes.len(),
                other => {
                    return Err(JsonPathError::eval(format!(
                        "length: expected a container or string, got {}",
                        other.type_name()
                    )))
                }
            };
            Ok(ExprValue::Number(n as f64))
        }
    }

    pub struct Abs;
    impl Function for Abs {
        fn name(&self) -> &'static str {
            "abs"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call<'a>(&self, args: &[ExprValue<'a>]) -> Result<ExprValue<'a>> {
            Ok(ExprValue::Number(numeric(&args[0], "abs")?.abs()))
        }
    }

    pub struct Round;
    impl Function for Round {
        fn name(&self) -> &'static str {
            "round"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call<'a>(&self, args: &[ExprValue<'a>]) -> Result<ExprValue<'a>> {
            Ok(ExprValue::Number(numeric(&args[0], "round")?.round()))
        }
    }

    pub struct Sqrt;
    impl Function for Sqrt {
        fn name(&self) -> &'static str {
            "sqrt"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call<'a>(&self, args: &[ExprValue<'a>]) -> Result<ExprValue<'a>> {
            let n = numeric(&args[0], "sqrt")?;
            if n < 0.0 {
                return Err(JsonPathError::eval(format!("sqrt of a negative number {n}")));
            }
            Ok(ExprValue::Number(n.sqrt()))
        }
    }
}
