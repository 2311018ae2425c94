//! JSONPath queries and arithmetic expressions over `serde_json` trees.
//!
//! A path compiles into an ordered token sequence, each token is
//! re-parsed in selector position, and the executor expands the result
//! list node by node in a deterministic order (object children sorted
//! by key, array elements by index). An expression front-end composes
//! embedded paths with arithmetic and registry functions:
//!
//! ```
//! use serde_json::json;
//!
//! let doc = json!({"store": {"book": [{"price": 8.5}, {"price": 12.5}]}});
//! let nodes = jsonpath_eval::select(&doc, "$.store.book[*].price").unwrap();
//! assert_eq!(
//!     jsonpath_eval::paths(&nodes),
//!     vec!["$['store']['book'][0]['price']", "$['store']['book'][1]['price']"]
//! );
//! let avg = jsonpath_eval::eval(&doc, "avg($..price)").unwrap();
//! assert_eq!(avg, json!(10.5));
//! ```

mod comparison; // comparison semantics between expression values
mod context; // `$` and `@` bindings for a running expression
pub mod engine; // public operations
pub mod errors; // error type and result alias
mod eval; // postfix program evaluator
mod expression; // expression tokenizer + shunting-yard compiler
pub mod functions; // extensible function registry
mod jsonpath; // path tokenizer, selector re-parse, executor
pub mod node; // borrowed node handles and path rendering
mod parser; // character-level scanner

pub use engine::{eval, eval_with, json_path, parse_json_path, paths, select, select_with};
pub use errors::{JsonPathError, Result};
pub use eval::ExprValue;
pub use functions::{Function, Registry};
pub use node::{NodeRef, Step};
