//! Symbol definition: populate each scope's environment and record
//! duplicates.

use crate::ast::walk::Pass;
use crate::ast::{Ast, CallableKind, EnvId, NodeId, NodeKind};
use crate::typeexpr::texpr;

/// A duplicate record: the offending node, its name and the first
/// definition it collided with.
pub type Duplicate = (NodeId, String, NodeId);

#[derive(Default)]
pub struct Definer {
    pub duplicates: Vec<Duplicate>,
}

enum Visit {
    Package { name: String },
    Class { name: String, parameters: Vec<NodeId> },
    Callable { name: String, kind: CallableKind, has_type: bool },
    Declaration { name: String },
}

impl Definer {
    pub fn new() -> Self {
        Self::default()
    }

    fn define(
        &mut self,
        ast: &mut Ast,
        env: EnvId,
        node: NodeId,
        name: &str,
        leaf: bool,
        dup: impl Fn(&Ast, NodeId) -> bool,
    ) {
        match ast.env(env).get(name).copied() {
            Some(existing) => {
                if dup(ast, existing) {
                    self.duplicates.push((node, name.to_string(), existing));
                }
            }
            None => {
                ast.env_mut(env).insert(name.to_string(), node);
            }
        }
        if leaf {
            ast[node].resolved = Some(texpr(node, &[]));
        }
    }

    fn parent_env(&self, ast: &Ast, node: NodeId) -> EnvId {
        match ast[node].parent {
            Some(parent) => ast[parent].env,
            None => ast.root_env(),
        }
    }
}

impl Pass for Definer {
    fn enter(&mut self, ast: &mut Ast, id: NodeId) {
        let visit = match &ast[id].kind {
            NodeKind::Package(p) => Visit::Package { name: p.name.clone() },
            NodeKind::Class(c) => {
                Visit::Class { name: c.name.clone(), parameters: c.parameters.clone() }
            }
            NodeKind::Callable(c) => Visit::Callable {
                name: c.name.clone(),
                kind: c.kind,
                has_type: c.ty.is_some(),
            },
            NodeKind::Declaration(d) => Visit::Declaration { name: d.name.clone() },
            _ => return,
        };
        match visit {
            Visit::Package { name } => {
                let env = self.parent_env(ast, id);
                // Re-opening a package is not a duplicate.
                self.define(ast, env, id, &name, true, |_, _| false);
            }
            Visit::Class { name, parameters } => {
                let env = self.parent_env(ast, id);
                self.define(ast, env, id, &name, true, |_, _| true);
                let class_env = ast[id].env;
                for param in parameters {
                    let pname = ast.name_of(param).unwrap_or_default().to_string();
                    self.define(ast, class_env, param, &pname, true, |_, _| true);
                }
            }
            Visit::Callable { name, kind, has_type } => {
                match kind {
                    CallableKind::Function => {
                        let env = self.parent_env(ast, id);
                        // Only a second body, or a non-function, collides;
                        // this is what permits forward declarations.
                        self.define(ast, env, id, &name, true, |ast, existing| {
                            match &ast[existing].kind {
                                NodeKind::Callable(c)
                                    if c.kind == CallableKind::Function =>
                                {
                                    c.body.is_some()
                                }
                                _ => true,
                            }
                        });
                    }
                    CallableKind::Method
                    | CallableKind::Constructor
                    | CallableKind::Macro => {
                        // Constructors are nameless for lookup purposes.
                        if has_type {
                            let env = self.parent_env(ast, id);
                            self.define(ast, env, id, &name, true, |_, _| true);
                        }
                    }
                    CallableKind::MethodMacro => {
                        let env = self.parent_env(ast, id);
                        self.define(ast, env, id, &name, true, |_, _| true);
                    }
                }
                // Methods and method macros see the enclosing class as
                // `self` in their own scope.
                if matches!(
                    kind,
                    CallableKind::Method | CallableKind::Constructor | CallableKind::MethodMacro
                ) {
                    if let Some(class) = ast[id].parent {
                        if matches!(ast[class].kind, NodeKind::Class(_)) {
                            let callable_env = ast[id].env;
                            self.define(ast, callable_env, class, "self", true, |_, _| true);
                        }
                    }
                }
            }
            Visit::Declaration { name } => {
                let env = ast[id].env;
                self.define(ast, env, id, &name, false, |_, _| true);
            }
        }
    }
}
