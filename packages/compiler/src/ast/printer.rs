//! Renders nodes back to surface syntax.
//!
//! Used for annotation handler input/output, import identity keys, and
//! the textual void-type comparison in return checking.

use super::{Ast, CallableKind, DeclKind, Modifiers, NodeId, NodeKind};

pub fn code(ast: &Ast, id: NodeId) -> String {
    let node = &ast[id];
    match &node.kind {
        NodeKind::Root(r) => join(ast, &r.files, "\n"),
        NodeKind::File(f) => join(ast, &f.definitions, "\n"),
        NodeKind::Package(p) => {
            format!("package {} {{ {} }}", p.name, join(ast, &p.definitions, " "))
        }
        NodeKind::Class(c) => {
            let kw = match c.kind {
                super::ClassKind::Class => "class",
                super::ClassKind::Interface => "interface",
                super::ClassKind::Primitive => "primitive",
            };
            let mut out = format!("{}{} {}", annotations(ast, id), kw, c.name);
            if !c.parameters.is_empty() {
                let params: Vec<String> =
                    c.parameters.iter().map(|p| code(ast, *p)).collect();
                out.push_str(&format!("<{}>", params.join(", ")));
            }
            if !c.bases.is_empty() {
                out.push_str(&format!(" extends {}", join(ast, &c.bases, ", ")));
            }
            out.push_str(&format!(" {{ {} }}", join(ast, &c.definitions, " ")));
            out
        }
        NodeKind::TypeParam(t) => t.name.clone(),
        NodeKind::Callable(c) => {
            let mut out = annotations(ast, id);
            if matches!(c.kind, CallableKind::Macro | CallableKind::MethodMacro) {
                out.push_str("macro ");
            }
            if let Some(ty) = c.ty {
                out.push_str(&code(ast, ty));
                out.push(' ');
            }
            out.push_str(&format!("{}({})", c.name, join(ast, &c.params, ", ")));
            match c.body {
                Some(body) => out.push_str(&format!(" {}", code(ast, body))),
                None => out.push(';'),
            }
            out
        }
        NodeKind::Declaration(d) => {
            let mut out = annotations(ast, id);
            if d.modifiers.contains(Modifiers::STATIC) {
                out.push_str("static ");
            }
            out.push_str(&format!("{} {}", code(ast, d.ty), d.name));
            if let Some(value) = d.value {
                out.push_str(&format!(" = {}", code(ast, value)));
            }
            if !matches!(d.kind, DeclKind::Param) {
                out.push(';');
            }
            out
        }
        NodeKind::Type(t) => {
            let path: Vec<&str> = t.path.iter().map(|n| n.text.as_str()).collect();
            let mut out = path.join(".");
            if !t.parameters.is_empty() {
                out.push_str(&format!("<{}>", join(ast, &t.parameters, ", ")));
            }
            out
        }
        NodeKind::Import(i) => {
            let path: Vec<&str> = i.path.iter().map(|n| n.text.as_str()).collect();
            match &i.alias {
                Some(alias) => format!("import {} as {};", path.join("."), alias),
                None => format!("import {};", path.join(".")),
            }
        }
        NodeKind::Use(u) => format!("use \"{}\";", u.url),
        NodeKind::Include(i) => format!("include \"{}\";", i.url),
        NodeKind::Annotation(a) => {
            if a.arguments.is_empty() {
                format!("@{}", a.name)
            } else {
                format!("@{}({})", a.name, join(ast, &a.arguments, ", "))
            }
        }
        NodeKind::Var(v) => v.name.text.clone(),
        NodeKind::Number(text) => text.clone(),
        NodeKind::Str(text) => text.clone(),
        NodeKind::Bool(value) => value.to_string(),
        NodeKind::Null => "null".to_string(),
        NodeKind::ListLit(elements) => format!("[{}]", join(ast, elements, ", ")),
        NodeKind::MapLit(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", code(ast, *k), code(ast, *v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        NodeKind::Attr(a) => format!("{}.{}", code(ast, a.expr), a.attr.text),
        NodeKind::Call(c) => {
            let new = if matches!(ast[c.expr].kind, NodeKind::Type(_)) { "new " } else { "" };
            format!("{}{}({})", new, code(ast, c.expr), join(ast, &c.args, ", "))
        }
        NodeKind::Super => "super".to_string(),
        NodeKind::Cast(e) => format!("?({})", code(ast, *e)),
        NodeKind::Assign { lhs, rhs } => {
            format!("{} = {};", code(ast, *lhs), code(ast, *rhs))
        }
        NodeKind::ExprStmt(e) => format!("{};", code(ast, *e)),
        NodeKind::If(i) => {
            let mut out = format!(
                "if ({}) {}",
                code(ast, i.predicate),
                code(ast, i.consequence)
            );
            if let Some(alt) = i.alternative {
                out.push_str(&format!(" else {}", code(ast, alt)));
            }
            out
        }
        NodeKind::While(w) => {
            format!("while ({}) {}", code(ast, w.condition), code(ast, w.body))
        }
        NodeKind::Break => "break;".to_string(),
        NodeKind::Continue => "continue;".to_string(),
        NodeKind::Return(e) => match e {
            Some(e) => format!("return {};", code(ast, *e)),
            None => "return;".to_string(),
        },
        NodeKind::Block(stmts) => format!("{{ {} }}", join(ast, stmts, " ")),
    }
}

fn join(ast: &Ast, ids: &[NodeId], sep: &str) -> String {
    let parts: Vec<String> = ids.iter().map(|id| code(ast, *id)).collect();
    parts.join(sep)
}

fn annotations(ast: &Ast, id: NodeId) -> String {
    let mut out = String::new();
    for ann in &ast[id].annotations {
        out.push_str(&code(ast, *ann));
        out.push(' ');
    }
    out
}
