use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonPathError {
    /// The path tokenizer or the expression compiler rejected the input.
    #[error("parse error at offset {offset}: {msg}")]
    Parse { msg: String, offset: usize },
    /// A function name was not found in the registry.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// The query failed while running: bad arithmetic, bad reference
    /// values, node-set coercion, or aggregation over an empty set.
    #[error("eval error: {0}")]
    Eval(String),
}

impl JsonPathError {
    pub(crate) fn parse(msg: impl Into<String>, offset: usize) -> Self {
        JsonPathError::Parse {
            msg: msg.into(),
            offset,
        }
    }

    pub(crate) fn eval(msg: impl Into<String>) -> Self {
        JsonPathError::Eval(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, JsonPathError>;
