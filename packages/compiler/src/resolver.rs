//! Expression resolution and type checking.
//!
//! Runs after name lookup: wires the `resolved` slot of every expression,
//! applying cast/literal narrowing and the coercion discipline. Tolerant
//! of upstream nulls so one failure does not cascade.

use crate::ast::printer::code;
use crate::ast::query;
use crate::ast::walk::Pass;
use crate::ast::{Ast, NodeId, NodeKind};
use crate::parse_util::lineinfo;
use crate::typeexpr::{castify, object_texpr, texpr};

#[derive(Default)]
pub struct Resolver {
    pub errors: Vec<String>,
}

fn is_void(code: &str) -> bool {
    code == "void" || code == "builtin.void"
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn leave_super(&mut self, ast: &mut Ast, id: NodeId) {
        let clazz = ast[id].clazz;
        match clazz.and_then(|c| query::base_type(ast, c)) {
            Some(base) => {
                let bres = ast[base].resolved.clone();
                ast[id].resolved = bres.map(|r| texpr(r.definition, &[]));
            }
            None => {
                let name = clazz
                    .and_then(|c| ast.name_of(c))
                    .unwrap_or("<none>")
                    .to_string();
                self.errors
                    .push(format!("{}: {} has no base class", lineinfo(ast, id), name));
            }
        }
    }

    fn leave_return(&mut self, ast: &mut Ast, id: NodeId, expr: Option<NodeId>) {
        let Some(callable) = ast[id].callable else { return };
        let cty = match &ast[callable].kind {
            NodeKind::Callable(c) => c.ty,
            _ => None,
        };
        let cname = ast.name_of(callable).unwrap_or_default().to_string();
        match expr {
            None => {
                // A bare return is always fine in a constructor.
                let Some(cty) = cty else { return };
                if !is_void(&code(ast, cty)) {
                    self.errors.push(format!(
                        "{}: {} is not declared void",
                        lineinfo(ast, id),
                        cname
                    ));
                }
            }
            Some(expr) => {
                let void = match cty {
                    None => true,
                    Some(ty) => is_void(&code(ast, ty)),
                };
                if void {
                    self.errors.push(format!(
                        "{}: {} cannot return a value",
                        lineinfo(ast, id),
                        cname
                    ));
                    return;
                }
                let Some(cty) = cty else { return };
                if let Some(tres) = ast[cty].resolved.clone() {
                    castify(ast, Some(&tres), expr);
                    tres.assign(ast, expr, &mut self.errors);
                }
            }
        }
    }
}

impl Pass for Resolver {
    fn leave(&mut self, ast: &mut Ast, id: NodeId) {
        enum Leave {
            Super,
            Var,
            Attr { expr: NodeId, attr: String },
            Call { expr: NodeId },
            Assign { lhs: NodeId, rhs: NodeId },
            ExprStmt { expr: NodeId },
            Return { expr: Option<NodeId> },
            Declaration { ty: NodeId, value: Option<NodeId> },
            List { first: Option<NodeId> },
            Map { first: Option<(NodeId, NodeId)> },
        }
        let leave = match &ast[id].kind {
            NodeKind::Super => Leave::Super,
            NodeKind::Var(_) => Leave::Var,
            NodeKind::Attr(a) => Leave::Attr { expr: a.expr, attr: a.attr.text.clone() },
            NodeKind::Call(c) => Leave::Call { expr: c.expr },
            NodeKind::Assign { lhs, rhs } => Leave::Assign { lhs: *lhs, rhs: *rhs },
            NodeKind::ExprStmt(e) => Leave::ExprStmt { expr: *e },
            NodeKind::Return(e) => Leave::Return { expr: *e },
            NodeKind::Declaration(d) => Leave::Declaration { ty: d.ty, value: d.value },
            NodeKind::ListLit(elements) => Leave::List { first: elements.first().copied() },
            NodeKind::MapLit(entries) => Leave::Map { first: entries.first().copied() },
            _ => return,
        };
        match leave {
            Leave::Super => self.leave_super(ast, id),
            Leave::Var => {
                if let Some(definition) = ast[id].definition {
                    ast[id].resolved = ast[definition].resolved.clone();
                }
            }
            Leave::Attr { expr, attr } => {
                if let Some(eres) = ast[expr].resolved.clone() {
                    ast[id].resolved = eres.get(ast, id, &attr, &mut self.errors);
                }
            }
            Leave::Call { expr } => {
                if let Some(eres) = ast[expr].resolved.clone() {
                    ast[id].resolved = eres.invoke(ast, id, &mut self.errors);
                }
            }
            Leave::Assign { lhs, rhs } => {
                let lres = ast[lhs].resolved.clone();
                castify(ast, lres.as_ref(), rhs);
                if let Some(lres) = lres {
                    if ast[rhs].resolved.is_some() {
                        lres.assign(ast, rhs, &mut self.errors);
                    }
                }
            }
            Leave::ExprStmt { expr } => {
                // A cast in statement position widens to Object.
                if matches!(ast[expr].kind, NodeKind::Cast(_)) {
                    ast[expr].resolved = object_texpr(ast);
                }
            }
            Leave::Return { expr } => self.leave_return(ast, id, expr),
            Leave::Declaration { ty, value } => {
                let tres = ast[ty].resolved.clone();
                if let Some(value) = value {
                    castify(ast, tres.as_ref(), value);
                    if let Some(tres) = tres {
                        if ast[value].resolved.is_some() {
                            tres.assign(ast, value, &mut self.errors);
                        }
                    }
                }
            }
            Leave::List { first } => {
                let Some(first) = first else { return };
                let Some(fres) = ast[first].resolved.clone() else { return };
                let Some(mut lres) = ast[id].resolved.clone() else { return };
                let param = match &ast[lres.definition].kind {
                    NodeKind::Class(c) => c.parameters.first().copied(),
                    _ => None,
                };
                if let Some(param) = param {
                    lres.bindings.insert(param, fres);
                    ast[id].resolved = Some(lres);
                }
            }
            Leave::Map { first } => {
                let Some((key, value)) = first else { return };
                let Some(mut mres) = ast[id].resolved.clone() else { return };
                let params = match &ast[mres.definition].kind {
                    NodeKind::Class(c) if c.parameters.len() == 2 => {
                        Some((c.parameters[0], c.parameters[1]))
                    }
                    _ => None,
                };
                let Some((kparam, vparam)) = params else { return };
                if let Some(kres) = ast[key].resolved.clone() {
                    mres.bindings.insert(kparam, kres);
                }
                if let Some(vres) = ast[value].resolved.clone() {
                    mres.bindings.insert(vparam, vres);
                }
                ast[id].resolved = Some(mres);
            }
        }
    }
}
