//! Annotation-driven tree rewriting.
//!
//! Handlers are registered by annotation name and yield either source
//! text, re-parsed under the node's original grammar rule, or a
//! replacement node. Replacement subtrees carry a trace chain so
//! diagnostics can point through generated code into the original.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::printer::code;
use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::{Error, Result};
use crate::parse_util::Trace;
use crate::parser::Parser;

pub enum Rewrite {
    /// Re-parse this text under the node's grammar rule.
    Source(String),
    /// Use this node directly.
    Node(NodeId),
}

/// An annotation handler: inspects the annotated node and optionally
/// produces a replacement.
pub type Annotator = fn(&Ast, NodeId) -> Option<Rewrite>;

pub type Annotators = IndexMap<String, Vec<Annotator>>;

/// Apply every registered handler to every annotated node in the file.
/// Returns whether any handler fired; the driver re-runs annotation and
/// crosswiring until a fixed point.
pub fn apply_annotators(
    ast: &mut Ast,
    parser: &Parser,
    annotators: &Annotators,
    file: NodeId,
) -> Result<bool> {
    let mut jobs = Vec::new();
    collect_jobs(ast, annotators, file, &mut jobs);

    let mut modified = false;
    for (node, name, handler) in jobs {
        let Some(rewrite) = handler(ast, node) else { continue };
        let (replacement, text) = match rewrite {
            Rewrite::Source(text) => {
                let rule = ast[node].rule.ok_or_else(|| {
                    Error::Compile(format!(
                        "@{}: annotated node cannot be re-parsed",
                        name
                    ))
                })?;
                let replacement = parser.rule(ast, rule, &text).map_err(|e| {
                    Error::Parse(format!(
                        "<generated>:{}:{}: {}",
                        e.loc.line, e.loc.col, e.msg
                    ))
                })?;
                (replacement, text)
            }
            Rewrite::Node(n) => {
                let text = code(ast, n);
                (n, text)
            }
        };
        stamp_trace(ast, replacement, &name, &text);
        if replacement != node {
            if let Some(parent) = ast[node].parent {
                ast.replace_child(parent, node, replacement);
            }
        }
        modified = true;
    }
    Ok(modified)
}

fn collect_jobs(
    ast: &Ast,
    annotators: &Annotators,
    id: NodeId,
    jobs: &mut Vec<(NodeId, String, Annotator)>,
) {
    let mut done = Vec::new();
    for ann in &ast[id].annotations {
        let NodeKind::Annotation(a) = &ast[*ann].kind else { continue };
        if done.contains(&a.name) {
            continue;
        }
        if let Some(handlers) = annotators.get(&a.name) {
            for handler in handlers {
                jobs.push((id, a.name.clone(), *handler));
            }
            done.push(a.name.clone());
        }
    }
    for child in ast.children(id) {
        collect_jobs(ast, annotators, child, jobs);
    }
}

fn stamp_trace(ast: &mut Ast, id: NodeId, annotator: &str, text: &str) {
    let prev = ast[id].trace.take();
    ast[id].trace = Some(Rc::new(Trace {
        annotator: annotator.to_string(),
        text: text.to_string(),
        prev,
    }));
    for child in ast.children(id) {
        stamp_trace(ast, child, annotator, text);
    }
}

/// Built-in handler: rewrite a callable into a stub forwarding to the
/// named helper, passing the callable's name, parameters and annotation
/// options, casting the helper's result unless the callable is void.
pub fn delegate(ast: &Ast, node: NodeId) -> Option<Rewrite> {
    let NodeKind::Callable(c) = &ast[node].kind else { return None };
    let ann = ast[node].annotations.iter().find_map(|a| match &ast[*a].kind {
        NodeKind::Annotation(ann) if ann.name == "delegate" => Some(ann),
        _ => None,
    })?;
    let helper = code(ast, *ann.arguments.first()?);
    let options: Vec<String> =
        ann.arguments[1..].iter().map(|a| code(ast, *a)).collect();

    let param_names: Vec<String> = c
        .params
        .iter()
        .filter_map(|p| ast.name_of(*p).map(str::to_string))
        .collect();
    let mut args = vec![format!("\"{}\"", c.name)];
    if param_names.len() == 1 {
        args.push(param_names[0].clone());
    } else {
        args.push(format!("[{}]", param_names.join(", ")));
    }
    args.push(format!("[{}]", options.join(", ")));
    let forward = format!("{}({})", helper, args.join(", "));

    let returns_value = match c.ty {
        Some(ty) => {
            let ty_code = code(ast, ty);
            ty_code != "void" && ty_code != "builtin.void"
        }
        None => false,
    };
    let body = if returns_value {
        format!("{{ return ?({}); }}", forward)
    } else {
        format!("{{ {}; }}", forward)
    };

    // Reconstruct the definition without the delegate annotation so the
    // rewrite reaches a fixed point.
    let mut text = String::new();
    for a in &ast[node].annotations {
        if let NodeKind::Annotation(ann) = &ast[*a].kind {
            if ann.name == "delegate" {
                continue;
            }
        }
        text.push_str(&code(ast, *a));
        text.push(' ');
    }
    if let Some(ty) = c.ty {
        text.push_str(&code(ast, ty));
        text.push(' ');
    }
    let params: Vec<String> = c.params.iter().map(|p| code(ast, *p)).collect();
    text.push_str(&format!("{}({}) {}", c.name, params.join(", "), body));
    Some(Rewrite::Source(text))
}
