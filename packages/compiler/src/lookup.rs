//! Name resolution: link every reference to a declaration by walking the
//! lexical chain and imported packages.
//!
//! Irreducible lookups are recorded, never raised; the driver aggregates
//! them at the end of the pass.

use std::collections::HashSet;

use crate::ast::printer::code;
use crate::ast::walk::Pass;
use crate::ast::{Ast, Name, NodeId, NodeKind};
use crate::typeexpr::{texpr, Bindings};

#[derive(Default)]
pub struct UsePass {
    pub unresolved: Vec<(NodeId, String)>,
}

impl UsePass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the lexical chain from `start`: aliases first, then the scope
    /// environment, then imported packages, then the parent.
    fn lookup_from(
        &self,
        ast: &Ast,
        start: NodeId,
        name: &str,
        imported: &mut HashSet<String>,
    ) -> Option<NodeId> {
        let mut current = Some(start);
        while let Some(node) = current {
            for imp in &ast[node].imports {
                if let NodeKind::Import(i) = &ast[*imp].kind {
                    if i.alias.as_deref() == Some(name) {
                        return self.lookup_import(ast, *imp);
                    }
                }
            }
            if let Some(&found) = ast.env(ast[node].env).get(name) {
                return Some(found);
            }
            for imp in &ast[node].imports {
                let key = code(ast, *imp);
                if !imported.insert(key) {
                    continue;
                }
                if let Some(target) = self.lookup_import(ast, *imp) {
                    if matches!(ast[target].kind, NodeKind::Package(_)) {
                        if let Some(found) = self.lookup_from(ast, target, name, imported) {
                            return Some(found);
                        }
                    }
                }
            }
            current = ast[node].parent;
        }
        None
    }

    pub fn lookup(&self, ast: &Ast, start: NodeId, name: &str) -> Option<NodeId> {
        let mut imported = HashSet::new();
        self.lookup_from(ast, start, name, &mut imported)
    }

    /// Imports resolve from the root by consuming the first segment as a
    /// top-level name, then descending environments.
    fn lookup_import(&self, ast: &Ast, imp: NodeId) -> Option<NodeId> {
        let NodeKind::Import(i) = &ast[imp].kind else { return None };
        let head = self.lookup(ast, ast.root, &i.path[0].text)?;
        self.lookup_path(ast, head, &i.path[1..])
    }

    /// Types resolve from the most specific enclosing scope, then descend.
    fn lookup_type(&self, ast: &Ast, ty: NodeId) -> Option<NodeId> {
        let NodeKind::Type(t) = &ast[ty].kind else { return None };
        let node = &ast[ty];
        let start = node
            .clazz
            .or(node.package)
            .or(node.file)
            .unwrap_or(ast.root);
        let head = self.lookup(ast, start, &t.path[0].text)?;
        self.lookup_path(ast, head, &t.path[1..])
    }

    fn lookup_path(&self, ast: &Ast, mut node: NodeId, path: &[Name]) -> Option<NodeId> {
        for segment in path {
            node = *ast.env(ast[node].env).get(&segment.text)?;
        }
        Some(node)
    }

    /// Literal expressions resolve their class against the built-in
    /// package through the silent file-level import.
    fn leaf(&mut self, ast: &mut Ast, id: NodeId, class_name: &str) {
        match self.lookup(ast, id, class_name) {
            Some(found) => ast[id].resolved = Some(texpr(found, &[])),
            None => self.unresolved.push((id, class_name.to_string())),
        }
    }
}

enum Visit {
    Var(String),
    Leaf(&'static str),
    Import(String),
}

impl Pass for UsePass {
    fn enter(&mut self, ast: &mut Ast, id: NodeId) {
        let visit = match &ast[id].kind {
            NodeKind::Var(v) => Visit::Var(v.name.text.clone()),
            NodeKind::Null => Visit::Leaf("Object"),
            NodeKind::Number(text) => {
                Visit::Leaf(if text.contains('.') { "float" } else { "int" })
            }
            NodeKind::Str(_) => Visit::Leaf("String"),
            NodeKind::Bool(_) => Visit::Leaf("bool"),
            NodeKind::ListLit(_) => Visit::Leaf("List"),
            NodeKind::MapLit(_) => Visit::Leaf("Map"),
            NodeKind::Import(i) => {
                Visit::Import(i.path.last().map(|n| n.text.clone()).unwrap_or_default())
            }
            _ => return,
        };
        match visit {
            Visit::Var(name) => {
                let definition = self.lookup(ast, id, &name);
                ast[id].definition = definition;
                if definition.is_none() {
                    self.unresolved.push((id, name));
                }
            }
            Visit::Leaf(class) => self.leaf(ast, id, class),
            Visit::Import(last) => {
                if self.lookup_import(ast, id).is_none() {
                    self.unresolved.push((id, last));
                }
            }
        }
    }

    fn leave(&mut self, ast: &mut Ast, id: NodeId) {
        enum Leave {
            Type { last: String, syntactic: Vec<NodeId> },
            Declaration { ty: NodeId },
        }
        let leave = match &ast[id].kind {
            NodeKind::Type(t) => Leave::Type {
                last: t.path.last().map(|n| n.text.clone()).unwrap_or_default(),
                syntactic: t.parameters.clone(),
            },
            NodeKind::Declaration(d) => Leave::Declaration { ty: d.ty },
            _ => return,
        };
        match leave {
            Leave::Type { last, syntactic } => match self.lookup_type(ast, id) {
                None => {
                    ast[id].resolved = None;
                    self.unresolved.push((id, last));
                }
                Some(decl) => {
                    let mut bindings = Bindings::new();
                    if let NodeKind::Class(c) = &ast[decl].kind {
                        let formals = c.parameters.clone();
                        for (formal, actual) in formals.iter().zip(syntactic.iter()) {
                            if let Some(res) = &ast[*actual].resolved {
                                bindings.insert(*formal, res.clone());
                            }
                        }
                    }
                    let declres = ast[decl].resolved.clone();
                    ast[id].resolved =
                        declres.map(|dr| texpr(dr.definition, &[&bindings, &dr.bindings]));
                }
            },
            Leave::Declaration { ty } => {
                ast[id].resolved = ast[ty].resolved.clone();
            }
        }
    }
}
