//! Class-model queries used by the checker, the structural checks and
//! the reflector.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::{Ast, CallableKind, Class, NodeId, NodeKind};
use crate::typeexpr::Bindings;

pub fn as_class(ast: &Ast, id: NodeId) -> Option<&Class> {
    match &ast[id].kind {
        NodeKind::Class(c) => Some(c),
        _ => None,
    }
}

/// The class's own constructor, if declared.
pub fn constructor(ast: &Ast, cls: NodeId) -> Option<NodeId> {
    let c = as_class(ast, cls)?;
    c.definitions.iter().copied().find(|d| {
        matches!(&ast[*d].kind, NodeKind::Callable(c) if c.kind == CallableKind::Constructor)
    })
}

/// The first declared base type reference, if any.
pub fn base_type(ast: &Ast, cls: NodeId) -> Option<NodeId> {
    as_class(ast, cls)?.bases.first().copied()
}

/// Resolved base class definitions, in declaration order.
pub fn base_classes(ast: &Ast, cls: NodeId) -> Vec<NodeId> {
    let Some(c) = as_class(ast, cls) else { return Vec::new() };
    c.bases
        .iter()
        .filter_map(|b| ast[*b].resolved.as_ref().map(|r| r.definition))
        .collect()
}

/// Constructors a subclass constructor is answerable to: each base's own
/// constructor, or, for a base without one, the nearest inherited one.
pub fn base_constructors(ast: &Ast, cls: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    collect_base_constructors(ast, cls, &mut out, &mut seen);
    out
}

fn collect_base_constructors(
    ast: &Ast,
    cls: NodeId,
    out: &mut Vec<NodeId>,
    seen: &mut HashSet<NodeId>,
) {
    for base in base_classes(ast, cls) {
        if !seen.insert(base) {
            continue;
        }
        match constructor(ast, base) {
            Some(con) => out.push(con),
            None => collect_base_constructors(ast, base, out, seen),
        }
    }
}

/// Instantiation bindings accumulated over the whole inheritance chain.
pub fn base_bindings(ast: &Ast, cls: NodeId) -> Bindings {
    let mut bindings = Bindings::new();
    let mut seen = HashSet::new();
    collect_base_bindings(ast, cls, &mut bindings, &mut seen);
    bindings
}

fn collect_base_bindings(
    ast: &Ast,
    cls: NodeId,
    bindings: &mut Bindings,
    seen: &mut HashSet<NodeId>,
) {
    let Some(c) = as_class(ast, cls) else { return };
    for base in &c.bases {
        if let Some(resolved) = &ast[*base].resolved {
            for (k, v) in &resolved.bindings {
                bindings.insert(*k, v.clone());
            }
            if seen.insert(resolved.definition) {
                collect_base_bindings(ast, resolved.definition, bindings, seen);
            }
        }
    }
}

/// Look up a named member on the class or any of its bases.
pub fn get_member(ast: &Ast, cls: NodeId, name: &str) -> Option<NodeId> {
    let mut seen = HashSet::new();
    get_member_inner(ast, cls, name, &mut seen)
}

fn get_member_inner(
    ast: &Ast,
    cls: NodeId,
    name: &str,
    seen: &mut HashSet<NodeId>,
) -> Option<NodeId> {
    if !seen.insert(cls) {
        return None;
    }
    let c = as_class(ast, cls)?;
    for d in &c.definitions {
        if matches!(&ast[*d].kind, NodeKind::Callable(c) if c.kind == CallableKind::Constructor) {
            continue;
        }
        if ast.name_of(*d) == Some(name) {
            return Some(*d);
        }
    }
    for base in base_classes(ast, cls) {
        if let Some(found) = get_member_inner(ast, base, name, seen) {
            return Some(found);
        }
    }
    None
}

/// All fields, inherited first, in declaration order.
pub fn get_fields(ast: &Ast, cls: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut names = HashSet::new();
    let mut seen = HashSet::new();
    collect_fields(ast, cls, &mut out, &mut names, &mut seen);
    out
}

fn collect_fields(
    ast: &Ast,
    cls: NodeId,
    out: &mut Vec<NodeId>,
    names: &mut HashSet<String>,
    seen: &mut HashSet<NodeId>,
) {
    if !seen.insert(cls) {
        return;
    }
    for base in base_classes(ast, cls) {
        collect_fields(ast, base, out, names, seen);
    }
    let Some(c) = as_class(ast, cls) else { return };
    for d in &c.definitions {
        if let NodeKind::Declaration(decl) = &ast[*d].kind {
            if names.insert(decl.name.clone()) {
                out.push(*d);
            }
        }
    }
}

/// Methods with a declared return type, inherited first, overrides last.
pub fn get_methods(ast: &Ast, cls: NodeId) -> IndexMap<String, NodeId> {
    let mut out = IndexMap::new();
    let mut seen = HashSet::new();
    collect_methods(ast, cls, &mut out, &mut seen);
    out
}

fn collect_methods(
    ast: &Ast,
    cls: NodeId,
    out: &mut IndexMap<String, NodeId>,
    seen: &mut HashSet<NodeId>,
) {
    if !seen.insert(cls) {
        return;
    }
    for base in base_classes(ast, cls) {
        collect_methods(ast, base, out, seen);
    }
    let Some(c) = as_class(ast, cls) else { return };
    for d in &c.definitions {
        if let NodeKind::Callable(callable) = &ast[*d].kind {
            if callable.kind == CallableKind::Method && callable.ty.is_some() {
                out.insert(callable.name.clone(), *d);
            }
        }
    }
}

/// Whether a constructor body syntactically contains a `super(...)` call.
pub fn has_super(ast: &Ast, callable: NodeId) -> bool {
    let body = match &ast[callable].kind {
        NodeKind::Callable(c) => c.body,
        _ => None,
    };
    let Some(body) = body else { return false };
    contains_super_call(ast, body)
}

fn contains_super_call(ast: &Ast, id: NodeId) -> bool {
    if let NodeKind::Call(call) = &ast[id].kind {
        if matches!(ast[call.expr].kind, NodeKind::Super) {
            return true;
        }
    }
    ast.children(id).iter().any(|c| contains_super_call(ast, *c))
}

/// A class is abstract when it declares a body-less method.
pub fn is_abstract(ast: &Ast, cls: NodeId) -> bool {
    let Some(c) = as_class(ast, cls) else { return false };
    c.definitions.iter().any(|d| {
        matches!(&ast[*d].kind,
            NodeKind::Callable(c) if c.kind == CallableKind::Method && c.body.is_none())
    })
}
