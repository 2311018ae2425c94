use std::borrow::Cow;
use std::collections::HashSet;

use itertools::Itertools;
use serde_json::Value;

/// One step from a parent container to a child: an object key, an
/// array index, or the bare token of a synthesized child (`.length`).
///
/// `BareKey` renders in dot notation so the step re-tokenizes as an
/// unquoted name; a quoted `['length']` would only ever look up a real
/// member and could not reach the synthesized count again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(String),
    BareKey(String),
    Index(usize),
}

impl Step {
    fn render(&self) -> String {
        match self {
            Step::Key(k) => format!("['{k}']"),
            Step::BareKey(k) => format!(".{k}"),
            Step::Index(i) => format!("[{i}]"),
        }
    }
}

/// A node handle produced by a query: the value itself plus the step
/// chain locating it under the query root.
///
/// Handles borrow the input tree and must not outlive it. Nodes
/// synthesized by the engine (`.length` counts, `eval` results) own
/// their value and have no tree behind them.
#[derive(Debug, Clone)]
pub struct NodeRef<'a> {
    value: Cow<'a, Value>,
    root: Option<&'a Value>,
    steps: Vec<Step>,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn root(value: &'a Value) -> Self {
        Self {
            value: Cow::Borrowed(value),
            root: Some(value),
            steps: Vec::new(),
        }
    }

    pub(crate) fn synthesized(value: Value, steps: Vec<Step>) -> Self {
        Self {
            value: Cow::Owned(value),
            root: None,
            steps,
        }
    }

    fn child(&self, value: &'a Value, step: Step) -> NodeRef<'a> {
        let mut steps = self.steps.clone();
        steps.push(step);
        NodeRef {
            value: Cow::Borrowed(value),
            root: self.root,
            steps,
        }
    }

    pub fn value(&self) -> &Value {
        self.value.as_ref()
    }

    /// Recursively clones the value out of the tree.
    pub fn unpack(&self) -> Value {
        self.value.as_ref().clone()
    }

    /// The node's key or index within its parent; `None` for the root
    /// and for synthesized nodes without a location.
    pub fn key(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Re-walks the tree to the enclosing container. `None` for the
    /// root and for synthesized nodes.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let root = self.root?;
        if self.steps.is_empty() {
            return None;
        }
        let mut node = NodeRef::root(root);
        for step in &self.steps[..self.steps.len() - 1] {
            node = match step {
                Step::Key(k) | Step::BareKey(k) => node.child_by_key(k)?,
                Step::Index(i) => node.child_by_index(*i as i64)?,
            };
        }
        Some(node)
    }

    /// Canonical path form: `$` followed by one `['key']` or `[i]` per
    /// step.
    pub fn path(&self) -> String {
        let steps = self.steps.iter().map(Step::render).join("");
        format!("${steps}")
    }

    pub fn is_object(&self) -> bool {
        self.value().is_object()
    }

    pub fn is_array(&self) -> bool {
        self.value().is_array()
    }

    pub fn is_string(&self) -> bool {
        self.value().is_string()
    }

    pub fn is_numeric(&self) -> bool {
        self.value().is_number()
    }

    pub fn is_bool(&self) -> bool {
        self.value().is_boolean()
    }

    pub fn is_null(&self) -> bool {
        self.value().is_null()
    }

    /// Child count for containers, codepoint count for strings.
    pub fn len(&self) -> Option<usize> {
        match self.value() {
            Value::Object(map) => Some(map.len()),
            Value::Array(items) => Some(items.len()),
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    /// The borrowed tree value behind this handle, with the tree's
    /// lifetime. Synthesized nodes own their value and return `None`.
    fn borrowed(&self) -> Option<&'a Value> {
        match &self.value {
            Cow::Borrowed(v) => Some(*v),
            Cow::Owned(_) => None,
        }
    }

    /// Looks up an object child. Synthesized nodes have no children.
    pub fn child_by_key(&self, key: &str) -> Option<NodeRef<'a>> {
        match self.borrowed()? {
            Value::Object(map) => map
                .get(key)
                .map(|v| self.child(v, Step::Key(key.to_string()))),
            _ => None,
        }
    }

    /// Looks up an array element; negative indices count from the end.
    pub fn child_by_index(&self, index: i64) -> Option<NodeRef<'a>> {
        match self.borrowed()? {
            Value::Array(items) => {
                let n = items.len() as i64;
                let i = if index < 0 { index + n } else { index };
                if i < 0 || i >= n {
                    return None;
                }
                Some(self.child(&items[i as usize], Step::Index(i as usize)))
            }
            _ => None,
        }
    }

    /// Direct children in canonical order: objects by ascending key
    /// (serde_json's default map is sorted), arrays by index.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match self.borrowed() {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| self.child(v, Step::Key(k.clone())))
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| self.child(v, Step::Index(i)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Synthesizes the numeric `length` child of a container or string
    /// node; `None` for scalars without a length.
    pub(crate) fn length_node(&self) -> Option<NodeRef<'a>> {
        let n = self.len()?;
        let mut steps = self.steps.clone();
        steps.push(Step::BareKey("length".to_string()));
        Some(NodeRef::synthesized(Value::from(n as f64), steps))
    }

    /// Identity for deduplication: the address of the borrowed value.
    /// Synthesized nodes have no shared identity.
    pub(crate) fn identity(&self) -> Option<*const Value> {
        self.borrowed().map(|v| v as *const Value)
    }
}

/// Canonical path form for each node, root rendered as `$`.
pub fn paths(nodes: &[NodeRef<'_>]) -> Vec<String> {
    nodes.iter().map(NodeRef::path).collect()
}

/// Keeps the first occurrence of every distinct node.
pub(crate) fn dedup_nodes<'a>(nodes: Vec<NodeRef<'a>>) -> Vec<NodeRef<'a>> {
    let mut seen: HashSet<usize> = HashSet::new();
    nodes
        .into_iter()
        .filter(|node| match node.identity() {
            Some(ptr) => seen.insert(ptr as usize),
            None => true,
        })
        .collect()
}
