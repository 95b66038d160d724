//! Tree annotation: one pass per file that stamps every node with its
//! linkage slots, sibling index, dotted id and environment.
//!
//! Package environments are canonical per dotted name: the first package
//! node with a given name owns a fresh environment, later ones re-open it.

use crate::ast::walk::Pass;
use crate::ast::{Ast, NodeId, NodeKind};
use crate::compiler::BUILTIN;

pub struct Crosswire {
    root: NodeId,
    parent: NodeId,
    file: Option<NodeId>,
    package: Option<NodeId>,
    clazz: Option<NodeId>,
    callable: Option<NodeId>,
}

impl Crosswire {
    pub fn new(ast: &Ast, parent: NodeId) -> Self {
        let p = &ast[parent];
        Crosswire {
            root: ast.root,
            parent,
            file: p.file,
            package: p.package,
            clazz: if matches!(p.kind, NodeKind::Class(_)) { Some(parent) } else { p.clazz },
            callable: if matches!(p.kind, NodeKind::Callable(_)) {
                Some(parent)
            } else {
                p.callable
            },
        }
    }

    fn name_of(&self, ast: &Ast, id: NodeId) -> String {
        // The built-in file contributes no id segment, so built-in
        // definitions print as `builtin.X` rather than by source URL.
        if let NodeKind::File(f) = &ast[id].kind {
            if f.name == BUILTIN {
                return String::new();
            }
        }
        match ast.name_of(id) {
            Some(name) => name.to_string(),
            None => ast[id].index.to_string(),
        }
    }

    fn visit(&mut self, ast: &mut Ast, id: NodeId) {
        let parent = self.parent;
        {
            let node = &mut ast[id];
            node.parent = Some(parent);
            node.file = self.file;
            node.package = self.package;
            node.clazz = self.clazz;
            node.callable = self.callable;
            node.resolved = None;
            node.coercion = None;
            node.definition = None;
            node.count = 0;
            node.imports.clear();
        }
        let index = ast[parent].count;
        ast[parent].count += 1;
        ast[id].index = index;
        ast[id].env = ast[parent].env;
        let name = self.name_of(ast, id);
        let parent_id = ast[parent].id.clone();
        ast[id].id = if parent_id.is_empty() {
            name
        } else if name.is_empty() {
            parent_id
        } else {
            format!("{}.{}", parent_id, name)
        };
        self.parent = id;
    }

    fn dotted_package_name(&self, ast: &Ast, id: NodeId) -> String {
        let mut parts = Vec::new();
        if let Some(name) = ast.name_of(id) {
            parts.push(name.to_string());
        }
        let mut pkg = self.package;
        while let Some(p) = pkg {
            if let Some(name) = ast.name_of(p) {
                parts.push(name.to_string());
            }
            pkg = ast[p].package;
        }
        parts.reverse();
        parts.join(".")
    }
}

enum Visit {
    File,
    Package,
    Class,
    Callable,
    Import,
    Use(String),
    Include(String),
    Other,
}

impl Pass for Crosswire {
    fn enter(&mut self, ast: &mut Ast, id: NodeId) {
        let visit = match &ast[id].kind {
            NodeKind::File(_) => Visit::File,
            NodeKind::Package(_) => Visit::Package,
            NodeKind::Class(_) => Visit::Class,
            NodeKind::Callable(_) => Visit::Callable,
            NodeKind::Import(_) => Visit::Import,
            NodeKind::Use(u) => Visit::Use(u.url.clone()),
            NodeKind::Include(i) => Visit::Include(i.url.clone()),
            _ => Visit::Other,
        };
        match visit {
            Visit::File => {
                self.file = Some(id);
                self.visit(ast, id);
                if let NodeKind::File(f) = &mut ast[id].kind {
                    f.uses.clear();
                    f.includes.clear();
                    f.depth = 0;
                }
            }
            Visit::Package => {
                // Resolve the canonical environment before linkage slots
                // are overwritten, so re-runs keep the same environment.
                let dotted = self.dotted_package_name(ast, id);
                let canonical = ast
                    .env(ast.root_env())
                    .get(&dotted)
                    .map(|&c| ast[c].env);
                self.visit(ast, id);
                self.package = Some(id);
                match canonical {
                    Some(env) => ast[id].env = env,
                    None => {
                        let env = ast.new_env();
                        ast[id].env = env;
                        ast.env_mut(ast.root_env()).insert(dotted, id);
                    }
                }
            }
            Visit::Class => {
                self.visit(ast, id);
                self.clazz = Some(id);
                let env = ast.new_env();
                ast[id].env = env;
            }
            Visit::Callable => {
                self.visit(ast, id);
                self.callable = Some(id);
                let env = ast.new_env();
                ast[id].env = env;
            }
            Visit::Import => {
                self.visit(ast, id);
                if let Some(parent) = ast[id].parent {
                    ast[parent].imports.push(id);
                }
            }
            Visit::Use(url) => {
                self.visit(ast, id);
                if let NodeKind::Use(u) = &mut ast[id].kind {
                    u.target = None;
                }
                if let Some(file) = ast[id].file {
                    if let NodeKind::File(f) = &mut ast[file].kind {
                        f.uses.insert(url, id);
                    }
                }
            }
            Visit::Include(url) => {
                self.visit(ast, id);
                if let Some(file) = ast[id].file {
                    if let NodeKind::File(f) = &mut ast[file].kind {
                        f.includes.insert(url, id);
                    }
                }
            }
            Visit::Other => self.visit(ast, id),
        }
    }

    fn leave(&mut self, ast: &mut Ast, id: NodeId) {
        self.parent = ast[id].parent.unwrap_or(self.root);
        match &ast[id].kind {
            NodeKind::File(_) => self.file = ast[id].file,
            NodeKind::Package(_) => self.package = ast[id].package,
            NodeKind::Class(_) => self.clazz = ast[id].clazz,
            NodeKind::Callable(_) => self.callable = ast[id].callable,
            _ => {}
        }
    }
}
