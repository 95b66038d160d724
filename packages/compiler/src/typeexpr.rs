//! Instantiated types and the checking operations over them.
//!
//! A [`TypeExpr`] pairs a definition with a bindings map from type
//! parameter to type expression. Bindings collapse transitively: when the
//! head definition is itself bound, resolution chases through, guarded by
//! a visited set.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::query;
use crate::ast::{Ast, EnvId, NodeId, NodeKind};
use crate::parse_util::lineinfo;

pub type Bindings = IndexMap<NodeId, TypeExpr>;

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub definition: NodeId,
    pub bindings: Bindings,
}

/// Build a type expression, merging binding maps left to right (later
/// maps override earlier ones) and chasing a bound head definition.
pub fn texpr(definition: NodeId, sources: &[&Bindings]) -> TypeExpr {
    let mut bindings = Bindings::new();
    for src in sources {
        for (k, v) in src.iter() {
            bindings.insert(*k, v.clone());
        }
    }
    let mut definition = definition;
    let mut seen = HashSet::new();
    while let Some(expr) = bindings.get(&definition).cloned() {
        if !seen.insert(definition) {
            break;
        }
        for (k, v) in expr.bindings {
            bindings.insert(k, v);
        }
        definition = expr.definition;
    }
    TypeExpr { definition, bindings }
}

/// The built-in `Object` type, the default supertype.
pub fn object_texpr(ast: &Ast) -> Option<TypeExpr> {
    let obj = ast.builtin("Object")?;
    Some(match &ast[obj].resolved {
        Some(res) => res.clone(),
        None => texpr(obj, &[]),
    })
}

impl TypeExpr {
    /// The canonical printed identity: the definition's dotted id, with a
    /// parametric `<...>` tail resolved against the current bindings.
    pub fn id(&self, ast: &Ast) -> String {
        match &ast[self.definition].kind {
            NodeKind::Class(c) if !c.parameters.is_empty() => {
                let params: Vec<String> = c
                    .parameters
                    .iter()
                    .map(|p| self.resolve(*p).id(ast))
                    .collect();
                format!("{}<{}>", ast[self.definition].id, params.join(","))
            }
            _ => ast[self.definition].id.clone(),
        }
    }

    /// Chase a type parameter through the bindings, cycle-safely.
    pub fn resolve(&self, mut param: NodeId) -> TypeExpr {
        let mut bindings = Bindings::new();
        let mut done = HashSet::new();
        while let Some(pexpr) = self.bindings.get(&param) {
            done.insert(param);
            let pexpr = pexpr.clone();
            param = pexpr.definition;
            for (k, v) in pexpr.bindings {
                bindings.insert(k, v);
            }
            if done.contains(&param) {
                break;
            }
        }
        texpr(param, &[&bindings])
    }

    /// Self first, then all transitive bases with composed bindings; a
    /// class without bases (and every type parameter) falls back to the
    /// built-in `Object`.
    pub fn supertypes(&self, ast: &Ast) -> Vec<TypeExpr> {
        let mut seen = HashSet::new();
        self.supertypes_guarded(ast, &mut seen)
    }

    fn supertypes_guarded(&self, ast: &Ast, seen: &mut HashSet<NodeId>) -> Vec<TypeExpr> {
        let mut out = Vec::new();
        match &ast[self.definition].kind {
            NodeKind::Class(c) => {
                out.push(self.clone());
                if !seen.insert(self.definition) {
                    return out;
                }
                if c.bases.is_empty() {
                    if let Some(obj) = object_texpr(ast) {
                        out.push(texpr(obj.definition, &[&obj.bindings, &self.bindings]));
                    }
                } else {
                    for base in &c.bases {
                        let Some(res) = ast[*base].resolved.clone() else { continue };
                        for sup in res.supertypes_guarded(ast, seen) {
                            out.push(texpr(sup.definition, &[&sup.bindings, &self.bindings]));
                        }
                    }
                }
            }
            NodeKind::TypeParam(_) => {
                out.push(self.clone());
                if let Some(obj) = object_texpr(ast) {
                    out.push(obj);
                }
            }
            _ => out.push(self.clone()),
        }
        out
    }

    /// True iff some supertype of `other` has the same printed identity.
    pub fn assignable_from(&self, ast: &Ast, other: &TypeExpr) -> bool {
        let id = self.id(ast);
        other.supertypes(ast).iter().any(|sup| sup.id(ast) == id)
    }

    /// The scope chain for attribute lookup, each environment paired with
    /// the bindings accumulated while descending the base chain.
    fn environments(&self, ast: &Ast) -> Vec<(EnvId, Bindings)> {
        let mut out = Vec::new();
        let mut bindings = Bindings::new();
        let mut seen = HashSet::new();
        environments_of(ast, self.definition, &mut bindings, &mut out, &mut seen);
        out
    }

    /// Attribute access: scan the scope chain, composing bindings.
    pub fn get(
        &self,
        ast: &Ast,
        loc: NodeId,
        name: &str,
        errors: &mut Vec<String>,
    ) -> Option<TypeExpr> {
        for (env, bindings) in self.environments(ast) {
            if let Some(&target) = ast.env(env).get(name) {
                let tgt = ast[target].resolved.as_ref()?;
                return Some(texpr(tgt.definition, &[&self.bindings, &bindings, &tgt.bindings]));
            }
        }
        errors.push(format!(
            "{}: {} has no such attribute: {}",
            lineinfo(ast, loc),
            ast.name_of(self.definition).unwrap_or("<anonymous>"),
            name
        ));
        None
    }

    /// Call dispatch: callables check their formals, classes check their
    /// constructor (or enforce zero arguments) and yield the class type.
    pub fn invoke(
        &self,
        ast: &mut Ast,
        call: NodeId,
        errors: &mut Vec<String>,
    ) -> Option<TypeExpr> {
        enum Callee {
            Callable(Vec<NodeId>, Option<NodeId>),
            Class,
            Other,
        }
        let callee = match &ast[self.definition].kind {
            NodeKind::Callable(c) => Callee::Callable(c.params.clone(), c.ty),
            NodeKind::Class(_) => Callee::Class,
            _ => Callee::Other,
        };
        match callee {
            Callee::Callable(params, ty) => {
                self.check(ast, &params, call, errors, None);
                let tyres = ast[ty?].resolved.clone()?;
                Some(texpr(tyres.definition, &[&tyres.bindings, &self.bindings]))
            }
            Callee::Class => {
                let bindings = query::base_bindings(ast, self.definition);
                match query::constructor(ast, self.definition) {
                    Some(con) => {
                        let params = match &ast[con].kind {
                            NodeKind::Callable(c) => c.params.clone(),
                            _ => Vec::new(),
                        };
                        self.check(ast, &params, call, errors, Some(&bindings));
                    }
                    None => {
                        let nargs = match &ast[call].kind {
                            NodeKind::Call(c) => c.args.len(),
                            _ => 0,
                        };
                        if nargs != 0 {
                            errors.push(format!(
                                "{}: expected 0 args, got {}",
                                lineinfo(ast, call),
                                nargs
                            ));
                        }
                    }
                }
                Some(texpr(self.definition, &[&self.bindings]))
            }
            Callee::Other => {
                errors.push(format!(
                    "{}: not a callable: {}",
                    lineinfo(ast, call),
                    self.id(ast)
                ));
                None
            }
        }
    }

    /// Zip formals against actuals: narrow casts and matching list/map
    /// literals, then require assignability or a user-defined coercion.
    pub fn check(
        &self,
        ast: &mut Ast,
        params: &[NodeId],
        call: NodeId,
        errors: &mut Vec<String>,
        extra: Option<&Bindings>,
    ) {
        let args = match &ast[call].kind {
            NodeKind::Call(c) => c.args.clone(),
            _ => Vec::new(),
        };
        if params.len() != args.len() {
            errors.push(format!(
                "{}: expected {} args, got {}",
                lineinfo(ast, call),
                params.len(),
                args.len()
            ));
            return;
        }
        let empty = Bindings::new();
        let extra = extra.unwrap_or(&empty);
        for (param, arg) in params.iter().zip(args.iter()) {
            let Some(pres) = ast[*param].resolved.clone() else { continue };
            let pexpr = texpr(pres.definition, &[&pres.bindings, &self.bindings, extra]);
            castify(ast, Some(&pexpr), *arg);
            if matches!(ast[*arg].kind, NodeKind::Null) {
                continue;
            }
            let Some(ares) = ast[*arg].resolved.clone() else { continue };
            if !pexpr.assignable_from(ast, &ares) {
                match find_coercion(ast, &pexpr, &ares) {
                    Some(dfn) => ast[*arg].coercion = Some(dfn),
                    None => errors.push(format!(
                        "{}: type mismatch: expected {}, got {}",
                        lineinfo(ast, *arg),
                        pexpr.id(ast),
                        ares.id(ast)
                    )),
                }
            }
        }
    }

    /// Assignment compatibility with the same coercion discipline as
    /// argument checking. `null` is assignable to anything.
    pub fn assign(&self, ast: &mut Ast, expr: NodeId, errors: &mut Vec<String>) {
        if matches!(ast[expr].kind, NodeKind::Null) {
            return;
        }
        let Some(res) = ast[expr].resolved.clone() else { return };
        if self.assignable_from(ast, &res) {
            return;
        }
        match find_coercion(ast, self, &res) {
            Some(dfn) => ast[expr].coercion = Some(dfn),
            None => errors.push(format!(
                "{}: type mismatch: expected {}, got {}",
                lineinfo(ast, expr),
                self.id(ast),
                res.id(ast)
            )),
        }
    }
}

fn environments_of(
    ast: &Ast,
    def: NodeId,
    bindings: &mut Bindings,
    out: &mut Vec<(EnvId, Bindings)>,
    seen: &mut HashSet<NodeId>,
) {
    match &ast[def].kind {
        NodeKind::Package(_) => out.push((ast[def].env, bindings.clone())),
        NodeKind::Class(c) => {
            out.push((ast[def].env, bindings.clone()));
            if !seen.insert(def) {
                return;
            }
            if c.bases.is_empty() {
                if let Some(obj) = ast.builtin("Object") {
                    out.push((ast[obj].env, bindings.clone()));
                }
            } else {
                for base in &c.bases {
                    if let Some(res) = &ast[*base].resolved {
                        for (k, v) in &res.bindings {
                            bindings.insert(*k, v.clone());
                        }
                        environments_of(ast, res.definition, bindings, out, seen);
                    }
                }
            }
        }
        NodeKind::TypeParam(_) => {
            if let Some(obj) = ast.builtin("Object") {
                out.push((ast[obj].env, bindings.clone()));
            }
        }
        _ => {}
    }
}

/// A zero-parameter `__to_<Name>` method on the source type whose return
/// type is assignable to the target.
fn find_coercion(ast: &Ast, target: &TypeExpr, source: &TypeExpr) -> Option<NodeId> {
    let name = format!("__to_{}", ast.name_of(target.definition)?);
    let dfn = query::get_member(ast, source.definition, &name)?;
    let NodeKind::Callable(c) = &ast[dfn].kind else { return None };
    if !c.params.is_empty() {
        return None;
    }
    let tyres = ast[c.ty?].resolved.as_ref()?;
    if target.assignable_from(ast, tyres) {
        Some(dfn)
    } else {
        None
    }
}

/// Narrow a cast to the target type; narrow a list/map literal whose
/// target names the same literal class.
pub fn castify(ast: &mut Ast, target: Option<&TypeExpr>, expr: NodeId) {
    if matches!(ast[expr].kind, NodeKind::Cast(_)) {
        ast[expr].resolved = target.cloned();
    }
    if let Some(t) = target {
        let narrow = matches!(
            (&ast[expr].kind, ast.name_of(t.definition)),
            (NodeKind::ListLit(_), Some("List")) | (NodeKind::MapLit(_), Some("Map"))
        );
        if narrow {
            ast[expr].resolved = Some(t.clone());
        }
    }
}
