use serde_json::Value;
use tracing::debug;

use crate::context::Context;
use crate::errors::{JsonPathError, Result};
use crate::eval::{self, RefKey};
use crate::expression::{self, Program};
use crate::functions::Registry;
use crate::node::{self, NodeRef};
use crate::parser::Parser;

/// Splits a path into raw tokens: `$`, `..`, `*`, bare names, and
/// bracket/paren bodies kept verbatim (quotes included) for the
/// executor to re-parse in context.
pub(crate) fn tokenize(path: &str) -> Result<Vec<String>> {
    let mut p = Parser::new(path);
    p.skip_ws();
    let at = p.pos();
    if !p.consume_char('$') {
        return Err(JsonPathError::parse("path must start with `$`", at));
    }
    let mut tokens = vec!["$".to_string()];
    scan_selectors(&mut p, &mut tokens)?;
    Ok(tokens)
}

/// Tokenizes the selector part of a path, after the `$`/`@` sigil.
/// Used for path literals embedded in expressions.
pub(crate) fn tokenize_tail(rest: &str) -> Result<Vec<String>> {
    let mut p = Parser::new(rest);
    let mut tokens = Vec::new();
    scan_selectors(&mut p, &mut tokens)?;
    Ok(tokens)
}

fn scan_selectors(p: &mut Parser<'_>, tokens: &mut Vec<String>) -> Result<()> {
    // a bare name is only legal right after a dot; `$foo` is not a path
    let mut dotted = false;
    loop {
        let at = p.pos();
        match p.peek_char() {
            Some('.') => {
                p.advance(1);
                if p.consume_char('.') {
                    tokens.push("..".to_string());
                }
                // a dangling trailing dot is tolerated
                dotted = true;
            }
            Some('[') => {
                let inner = p.capture_balanced('[', ']')?;
                if inner.trim().is_empty() {
                    return Err(JsonPathError::parse("empty bracket selector", at));
                }
                tokens.push(inner.to_string());
                dotted = false;
            }
            Some('(') => {
                let inner = p.capture_balanced('(', ')')?;
                tokens.push(format!("({inner})"));
                dotted = false;
            }
            Some('*') => {
                p.advance(1);
                tokens.push("*".to_string());
                dotted = false;
            }
            Some(c) if dotted && (c == '_' || c.is_ascii_alphanumeric()) => {
                tokens.push(p.parse_identifier()?);
                dotted = false;
            }
            Some(c) => {
                return Err(JsonPathError::parse(
                    format!("unexpected character `{c}`"),
                    at,
                ))
            }
            None => return Ok(()),
        }
    }
}

/// A token re-parsed in selector position.
#[derive(Debug, Clone)]
pub(crate) enum Selector {
    Recursive,
    Wildcard,
    Key { name: String, quoted: bool },
    Index(i64),
    Slice {
        start: SliceBound,
        stop: SliceBound,
        step: SliceBound,
    },
    Union(Vec<UnionMember>),
    Filter(Program),
    Script(Program),
}

#[derive(Debug, Clone)]
pub(crate) enum SliceBound {
    Default,
    Literal(i64),
    Computed(Program),
}

#[derive(Debug, Clone)]
pub(crate) enum UnionMember {
    Key(String),
    Index(i64),
    Computed(Program),
}

/// Re-parses one raw token. The tokenizer does not classify, so `0`
/// (index) and `'0'` (key) are only told apart here.
pub(crate) fn parse_selector(token: &str, registry: &Registry) -> Result<Selector> {
    let token = token.trim();
    match token {
        ".." => return Ok(Selector::Recursive),
        "*" => return Ok(Selector::Wildcard),
        _ => {}
    }
    if let Some(inner) = token.strip_prefix("?(").and_then(|t| t.strip_suffix(')')) {
        return Ok(Selector::Filter(expression::compile(inner, registry)?));
    }
    if let Some(inner) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return Ok(Selector::Script(expression::compile(inner, registry)?));
    }
    let union_parts = split_top_level(token, ',');
    if union_parts.len() > 1 {
        let members = union_parts
            .iter()
            .map(|part| parse_union_member(part.trim(), registry))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Selector::Union(members));
    }
    let slice_parts = split_top_level(token, ':');
    if slice_parts.len() > 1 {
        if slice_parts.len() > 3 {
            return Err(JsonPathError::parse(
                format!("too many slice components in `{token}`"),
                0,
            ));
        }
        let start = parse_slice_bound(slice_parts[0].trim(), registry)?;
        let stop = parse_slice_bound(slice_parts[1].trim(), registry)?;
        let step = match slice_parts.get(2) {
            Some(part) => parse_slice_bound(part.trim(), registry)?,
            None => SliceBound::Default,
        };
        if matches!(step, SliceBound::Literal(0)) {
            return Err(JsonPathError::parse("slice step cannot be zero", 0));
        }
        return Ok(Selector::Slice { start, stop, step });
    }
    if token.starts_with('\'') || token.starts_with('"') {
        return Ok(Selector::Key {
            name: unquote(token)?,
            quoted: true,
        });
    }
    if let Ok(i) = token.parse::<i64>() {
        return Ok(Selector::Index(i));
    }
    Ok(Selector::Key {
        name: token.to_string(),
        quoted: false,
    })
}

fn parse_union_member(part: &str, registry: &Registry) -> Result<UnionMember> {
    if part.is_empty() {
        return Err(JsonPathError::parse("empty union member", 0));
    }
    if let Some(inner) = part.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return Ok(UnionMember::Computed(expression::compile(inner, registry)?));
    }
    if part.starts_with('\'') || part.starts_with('"') {
        return Ok(UnionMember::Key(unquote(part)?));
    }
    if let Ok(i) = part.parse::<i64>() {
        return Ok(UnionMember::Index(i));
    }
    Ok(UnionMember::Key(part.to_string()))
}

fn parse_slice_bound(part: &str, registry: &Registry) -> Result<SliceBound> {
    if part.is_empty() {
        return Ok(SliceBound::Default);
    }
    if let Some(inner) = part.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return Ok(SliceBound::Computed(expression::compile(inner, registry)?));
    }
    part.parse::<i64>()
        .map(SliceBound::Literal)
        .map_err(|_| JsonPathError::parse(format!("invalid slice bound `{part}`"), 0))
}

fn unquote(token: &str) -> Result<String> {
    let mut p = Parser::new(token);
    let name = p.parse_quoted_string()?;
    if !p.eof() {
        return Err(JsonPathError::parse(
            format!("unexpected characters after `{name}`"),
            p.pos(),
        ));
    }
    Ok(name)
}

/// Splits on `sep` outside quotes, brackets, and parentheses.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                c if c == sep && depth == 0 => {
                    parts.push(&s[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Tokenizes and re-parses a whole path into selectors.
pub(crate) fn compile(path: &str, registry: &Registry) -> Result<Vec<Selector>> {
    let tokens = tokenize(path)?;
    let selectors = tokens[1..]
        .iter()
        .map(|t| parse_selector(t, registry))
        .collect::<Result<Vec<_>>>()?;
    debug!(path, tokens = tokens.len(), "compiled json path");
    Ok(selectors)
}

/// Expands the current result list selector by selector. The final
/// list keeps first occurrences only, in encounter order.
pub(crate) fn execute<'a>(
    start: NodeRef<'a>,
    selectors: &[Selector],
    root: &NodeRef<'a>,
    registry: &Registry,
) -> Result<Vec<NodeRef<'a>>> {
    let mut current = vec![start];
    for selector in selectors {
        let mut next: Vec<NodeRef<'a>> = Vec::new();
        match selector {
            Selector::Recursive => {
                for node in &current {
                    collect_descendants(node, &mut next);
                }
            }
            Selector::Wildcard => {
                for node in &current {
                    next.extend(node.children());
                }
            }
            Selector::Key { name, quoted } => {
                for node in &current {
                    if let Some(child) = node.child_by_key(name) {
                        next.push(child);
                    } else if !quoted && name == "length" {
                        if let Some(child) = node.length_node() {
                            next.push(child);
                        }
                    }
                }
            }
            Selector::Index(i) => {
                for node in &current {
                    if let Some(child) = node.child_by_index(*i) {
                        next.push(child);
                    }
                }
            }
            Selector::Slice { start, stop, step } => {
                for node in &current {
                    apply_slice(node, start, stop, step, root, registry, &mut next)?;
                }
            }
            Selector::Union(members) => {
                for node in &current {
                    for member in members {
                        match member {
                            UnionMember::Key(name) => {
                                if let Some(child) = node.child_by_key(name) {
                                    next.push(child);
                                }
                            }
                            UnionMember::Index(i) => {
                                if let Some(child) = node.child_by_index(*i) {
                                    next.push(child);
                                }
                            }
                            UnionMember::Computed(program) => {
                                push_reference(node, program, root, registry, &mut next)?;
                            }
                        }
                    }
                }
            }
            Selector::Filter(program) => {
                for node in &current {
                    for child in node.children() {
                        let ctx = Context::with_current(root.clone(), child.clone());
                        if eval::run(program, &ctx, registry)?.truthy() {
                            next.push(child);
                        }
                    }
                }
            }
            Selector::Script(program) => {
                for node in &current {
                    push_reference(node, program, root, registry, &mut next)?;
                }
            }
        }
        current = next;
    }
    Ok(node::dedup_nodes(current))
}

/// Depth-first: the node itself, then every descendant, objects in key
/// order and arrays in index order.
fn collect_descendants<'a>(node: &NodeRef<'a>, out: &mut Vec<NodeRef<'a>>) {
    out.push(node.clone());
    for child in node.children() {
        collect_descendants(&child, out);
    }
}

/// Evaluates a `(expr)` selector against one node and follows the
/// resulting index or key. Missing targets contribute nothing; values
/// unusable as references already failed inside `eval::reference`.
fn push_reference<'a>(
    node: &NodeRef<'a>,
    program: &Program,
    root: &NodeRef<'a>,
    registry: &Registry,
    out: &mut Vec<NodeRef<'a>>,
) -> Result<()> {
    let ctx = Context::with_current(root.clone(), node.clone());
    match eval::reference(program, &ctx, registry)? {
        RefKey::Index(i) => {
            if let Some(child) = node.child_by_index(i) {
                out.push(child);
            }
        }
        RefKey::Key(k) => {
            if let Some(child) = node.child_by_key(&k) {
                out.push(child);
            }
        }
    }
    Ok(())
}

fn apply_slice<'a>(
    node: &NodeRef<'a>,
    start: &SliceBound,
    stop: &SliceBound,
    step: &SliceBound,
    root: &NodeRef<'a>,
    registry: &Registry,
    out: &mut Vec<NodeRef<'a>>,
) -> Result<()> {
    let len = match node.value() {
        Value::Array(items) => items.len(),
        _ => return Ok(()),
    };
    let step = resolve_bound(step, node, root, registry)?.unwrap_or(1);
    if step == 0 {
        return Err(JsonPathError::eval("slice step cannot be zero"));
    }
    if len == 0 {
        return Ok(());
    }
    let n = len as i64;
    // negative bounds wrap modulo the length, positive ones clamp
    let norm = |b: i64| if b < 0 { b.rem_euclid(n) } else { b.min(n) };
    if step > 0 {
        let lo = resolve_bound(start, node, root, registry)?
            .map(norm)
            .unwrap_or(0);
        let hi = resolve_bound(stop, node, root, registry)?
            .map(norm)
            .unwrap_or(n);
        let mut i = lo;
        while i < hi {
            if let Some(child) = node.child_by_index(i) {
                out.push(child);
            }
            i += step;
        }
    } else {
        let lo = resolve_bound(start, node, root, registry)?
            .map(|b| norm(b).min(n - 1))
            .unwrap_or(n - 1);
        let hi = resolve_bound(stop, node, root, registry)?
            .map(norm)
            .unwrap_or(-n - 1);
        let mut i = lo;
        while i > hi && i >= 0 {
            if let Some(child) = node.child_by_index(i) {
                out.push(child);
            }
            i += step;
        }
    }
    Ok(())
}

fn resolve_bound<'a>(
    bound: &SliceBound,
    node: &NodeRef<'a>,
    root: &NodeRef<'a>,
    registry: &Registry,
) -> Result<Option<i64>> {
    match bound {
        SliceBound::Default => Ok(None),
        SliceBound::Literal(v) => Ok(Some(*v)),
        SliceBound::Computed(program) => {
            let ctx = Context::with_current(root.clone(), node.clone());
            eval::integer_bound(program, &ctx, registry).map(Some)
        }
    }
}
