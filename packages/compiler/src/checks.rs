//! Class-level structural checks, run after type resolution.
//!
//! Field shadowing across the inheritance chain, mandatory explicit
//! super-constructor calls, and `super` outside receiver position.

use crate::ast::query;
use crate::ast::walk::Pass;
use crate::ast::{Ast, CallableKind, DeclKind, NodeId, NodeKind};
use crate::parse_util::lineinfo;

#[derive(Default)]
pub struct Check {
    pub errors: Vec<String>,
}

impl Check {
    pub fn new() -> Self {
        Self::default()
    }

    fn visit_field(&mut self, ast: &Ast, id: NodeId, name: &str) {
        let Some(clazz) = ast[id].clazz else { return };
        let Some(class) = query::as_class(ast, clazz) else { return };
        for base in &class.bases {
            let Some(resolved) = &ast[*base].resolved else { continue };
            if let Some(prev) = query::get_member(ast, resolved.definition, name) {
                self.errors.push(format!(
                    "{}: duplicate field '{}', previous definition: {}",
                    lineinfo(ast, id),
                    name,
                    lineinfo(ast, prev)
                ));
            }
        }
    }

    fn visit_constructor(&mut self, ast: &Ast, id: NodeId) {
        let Some(clazz) = ast[id].clazz else { return };
        let constructors = query::base_constructors(ast, clazz);
        for con in constructors {
            let has_params = matches!(&ast[con].kind,
                NodeKind::Callable(c) if !c.params.is_empty());
            if has_params && !query::has_super(ast, id) {
                self.errors.push(format!(
                    "{}: superclass constructor has arguments, \
                     explicit call to super is required",
                    lineinfo(ast, id)
                ));
            }
        }
    }

    fn visit_super(&mut self, ast: &Ast, id: NodeId) {
        if let Some(parent) = ast[id].parent {
            match &ast[parent].kind {
                NodeKind::Attr(_) => return,
                NodeKind::Call(c) if c.expr == id => return,
                _ => {}
            }
        }
        self.errors.push(format!(
            "{}: super can only be used for constructor or method invocation",
            lineinfo(ast, id)
        ));
    }
}

impl Pass for Check {
    fn enter(&mut self, ast: &mut Ast, id: NodeId) {
        match &ast[id].kind {
            NodeKind::Declaration(d) if d.kind == DeclKind::Field => {
                let name = d.name.clone();
                self.visit_field(ast, id, &name);
            }
            NodeKind::Callable(c) if c.kind == CallableKind::Constructor => {
                self.visit_constructor(ast, id);
            }
            NodeKind::Super => self.visit_super(ast, id),
            _ => {}
        }
    }
}
