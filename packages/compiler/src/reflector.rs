//! Reflection synthesis.
//!
//! After the normal pipeline completes, traverses the root and generates
//! source text for per-class metadata: `_getClass`/`_getField`/`_setField`
//! accessors grafted onto each concrete class, one metadata class per
//! class (and per parametric instantiation used in an entry file), a
//! method-descriptor class per method, and a singleton registry package.
//! The generated text re-enters the pipeline through the driver.

use indexmap::IndexMap;

use crate::ast::query;
use crate::ast::walk::Pass;
use crate::ast::{Ast, ClassKind, NodeId, NodeKind};
use crate::typeexpr::{texpr, Bindings, TypeExpr};

/// One recorded use of a parametric class: the instantiated type, the
/// class enclosing the use site, and the use site's package path.
type ClassUse = (TypeExpr, Option<NodeId>, Vec<String>);

#[derive(Default)]
pub struct Reflector {
    /// Per class: synthesized `_getClass`, `_getField`, `_setField` texts.
    pub methods: IndexMap<NodeId, (String, String, String)>,
    pub classes: Vec<NodeId>,
    pub class_uses: IndexMap<NodeId, IndexMap<String, ClassUse>>,
    /// Per class: metadata-reference fields to graft, name to singleton
    /// path.
    pub metadata: IndexMap<NodeId, IndexMap<String, String>>,
    pub entry: Option<NodeId>,
    pub code: String,
}

fn package_path(ast: &Ast, pkg: Option<NodeId>) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = pkg;
    while let Some(p) = current {
        if let Some(name) = ast.name_of(p) {
            parts.push(name.to_string());
        }
        current = ast[p].package;
    }
    parts.reverse();
    parts
}

fn package_name(ast: &Ast, node: NodeId) -> Option<String> {
    ast[node].package.and_then(|p| ast.name_of(p)).map(str::to_string)
}

fn file_depth(ast: &Ast, node: NodeId) -> usize {
    match ast[node].file.map(|f| &ast[f].kind) {
        Some(NodeKind::File(f)) => f.depth,
        _ => 0,
    }
}

fn mdname(id: &str) -> String {
    id.chars().map(|c| if ".<,>".contains(c) { '_' } else { c }).collect()
}

fn namever(ast: &Ast, file: NodeId) -> String {
    if let NodeKind::File(f) = &ast[file].kind {
        for d in &f.definitions {
            if let NodeKind::Package(p) = &ast[*d].kind {
                return p.name.clone();
            }
        }
        let stem = f.name.rsplit('/').next().unwrap_or(f.name.as_str());
        let stem = stem.strip_suffix(".q").unwrap_or(stem);
        return stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
    }
    "main".to_string()
}

impl Reflector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully-qualified type string, with `<...>` instantiation tails.
    /// Type parameters reflect as `Object`.
    fn qtype(&self, ast: &Ast, texp: &TypeExpr) -> String {
        if matches!(ast[texp.definition].kind, NodeKind::TypeParam(_)) {
            return "Object".to_string();
        }
        let def = texp.definition;
        let mut parts = package_path(ast, ast[def].package);
        parts.push(ast.name_of(def).unwrap_or_default().to_string());
        let mut result = parts.join(".");
        if let NodeKind::Class(c) = &ast[def].kind {
            if !c.parameters.is_empty() {
                let params: Vec<String> = c
                    .parameters
                    .iter()
                    .map(|p| {
                        let bound = texp
                            .bindings
                            .get(p)
                            .cloned()
                            .unwrap_or_else(|| texpr(*p, &[]));
                        self.qtype(ast, &bound)
                    })
                    .collect();
                result.push_str(&format!("<{}>", params.join(",")));
            }
        }
        result
    }

    fn qparams(&self, ast: &Ast, texp: &TypeExpr) -> String {
        if let NodeKind::Class(c) = &ast[texp.definition].kind {
            if !c.parameters.is_empty() {
                let params: Vec<String> = c
                    .parameters
                    .iter()
                    .map(|p| {
                        let bound = texp
                            .bindings
                            .get(p)
                            .cloned()
                            .unwrap_or_else(|| texpr(*p, &[]));
                        format!("\"{}\"", self.qtype(ast, &bound))
                    })
                    .collect();
                return format!("[{}]", params.join(", "));
            }
        }
        "[]".to_string()
    }

    fn qual(&self, ast: &Ast, cls: NodeId) -> String {
        let mut parts = package_path(ast, ast[cls].package);
        parts.push(ast.name_of(cls).unwrap_or_default().to_string());
        parts.join(".")
    }

    /// Field descriptors under the composed use-site bindings.
    fn fields(&self, ast: &Ast, cls: NodeId, use_bindings: &Bindings) -> Vec<(String, String)> {
        let mut bindings = query::base_bindings(ast, cls);
        for (k, v) in use_bindings {
            bindings.insert(*k, v.clone());
        }
        let mut out = Vec::new();
        for field in query::get_fields(ast, cls) {
            let Some(fres) = &ast[field].resolved else { continue };
            let ftype = self.qtype(ast, &texpr(fres.definition, &[&bindings, &fres.bindings]));
            let name = ast.name_of(field).unwrap_or_default().to_string();
            out.push((ftype, name));
        }
        out
    }

    /// Method descriptor classes for one metadata variant.
    fn meths(
        &self,
        ast: &Ast,
        cls: NodeId,
        cid: &str,
        use_bindings: &Bindings,
    ) -> Vec<(String, String)> {
        if let Some(pkg) = package_name(ast, cls) {
            if pkg == "builtin" || pkg == "reflect" {
                return Vec::new();
            }
        }
        let mut bindings = query::base_bindings(ast, cls);
        for (k, v) in use_bindings {
            bindings.insert(*k, v.clone());
        }
        let mut out = Vec::new();
        for (name, method) in query::get_methods(ast, cls) {
            let NodeKind::Callable(c) = &ast[method].kind else { continue };
            let Some(ty) = c.ty else { continue };
            let Some(tyres) = &ast[ty].resolved else { continue };
            let mtype = self.qtype(ast, &texpr(tyres.definition, &[&bindings, &tyres.bindings]));
            let mut margs = Vec::new();
            for param in &c.params {
                let Some(pres) = &ast[*param].resolved else { continue };
                margs.push(self.qtype(ast, &texpr(pres.definition, &[&bindings, &pres.bindings])));
            }
            let mid = format!("{}_{}_Method", mdname(cid), name);
            let text = self.meth(&mid, cid, &mtype, &name, &margs);
            out.push((mid, text));
        }
        out
    }

    fn meth(&self, mid: &str, cid: &str, mtype: &str, name: &str, params: &[String]) -> String {
        let args: Vec<String> =
            (0..params.len()).map(|i| format!("?(args.get({}))", i)).collect();
        let invoke = if mtype == "builtin.void" {
            format!("            obj.{}({});\n            return null;", name, args.join(", "))
        } else {
            format!("            return obj.{}({});", name, args.join(", "))
        };
        let quoted: Vec<String> = params.iter().map(|p| format!("\"{}\"", p)).collect();
        format!(
            r#"    class {mid} extends reflect.Method {{
        {mid}() {{
            super("{mtype}", "{name}", [{params}]);
        }}
        Object invoke(Object object, List<Object> args) {{
            {cid} obj = ?object;
{invoke}
        }}
        String _getClass() {{ return null; }}
        Object _getField(String name) {{ return null; }}
        void _setField(String name, Object value) {{}}
    }}
"#,
            mid = mid,
            mtype = mtype,
            name = name,
            params = quoted.join(", "),
            cid = cid,
            invoke = invoke,
        )
    }

    /// One metadata class text for a class or instantiation variant.
    fn clazz(
        &self,
        ast: &Ast,
        cls: NodeId,
        id: &str,
        params: &str,
        nparams: usize,
        texp: &TypeExpr,
    ) -> String {
        let name = self.qual(ast, cls);
        let mut mdefs = Vec::new();
        let mut mids = Vec::new();
        for (mid, mdef) in self.meths(ast, cls, id, &texp.bindings) {
            mdefs.push(mdef);
            mids.push(format!("new {}()", mid));
        }
        let interface = matches!(&ast[cls].kind,
            NodeKind::Class(c) if c.kind == ClassKind::Interface);
        let construct = if interface {
            "null".to_string()
        } else {
            let args: Vec<String> =
                (0..nparams).map(|i| format!("?(args.get({}))", i)).collect();
            format!("new {}({})", id, args.join(", "))
        };
        let fields: Vec<String> = self
            .fields(ast, cls, &texp.bindings)
            .iter()
            .map(|(ftype, fname)| format!("new reflect.Field(\"{}\", \"{}\")", ftype, fname))
            .collect();
        format!(
            r#"{mdefs}
    class {md} extends reflect.Class {{

        static reflect.Class singleton = new {md}();

        {md}() {{
            super("{id}");
            self.name = "{name}";
            self.parameters = {params};
            self.fields = [{fields}];
            self.methods = [{methods}];
        }}

        Object construct(List<Object> args) {{
            return {construct};
        }}

        String _getClass() {{ return null; }}
        Object _getField(String name) {{ return null; }}
        void _setField(String name, Object value) {{}}
    }}"#,
            mdefs = mdefs.join("\n"),
            md = mdname(id),
            id = id,
            name = name,
            params = params,
            fields = fields.join(", "),
            methods = mids.join(", "),
            construct = construct,
        )
    }

    fn visit_file(&mut self, ast: &Ast, id: NodeId) {
        if self.entry.is_some() {
            return;
        }
        if let NodeKind::File(f) = &ast[id].kind {
            if f.depth == 0 && f.name != "reflector" {
                self.entry = Some(id);
            }
        }
    }

    /// Record one parametric-instantiation variant per distinct use in an
    /// entry file.
    fn visit_type(&mut self, ast: &Ast, id: NodeId) {
        if file_depth(ast, id) != 0 {
            return;
        }
        let Some(res) = ast[id].resolved.clone() else { return };
        let cls = res.definition;
        match &ast[cls].kind {
            NodeKind::Class(c) => {
                let special = matches!(c.kind, ClassKind::Primitive | ClassKind::Interface)
                    || query::is_abstract(ast, cls);
                if special && c.name != "List" && c.name != "Map" {
                    return;
                }
                if c.parameters.is_empty() {
                    return;
                }
            }
            _ => return,
        }
        let qual = self.qtype(ast, &res);
        let clazz = ast[id].clazz;
        let package = package_path(ast, ast[id].package);
        self.class_uses
            .entry(cls)
            .or_default()
            .entry(qual)
            .or_insert((res, clazz, package));
    }

    fn visit_class(&mut self, ast: &Ast, id: NodeId) {
        let NodeKind::Class(c) = &ast[id].kind else { return };
        let special = matches!(c.kind, ClassKind::Primitive | ClassKind::Interface)
            || query::is_abstract(ast, id);
        if special {
            let builtin_collection = package_name(ast, id).as_deref() == Some("builtin")
                && (c.name == "List" || c.name == "Map");
            if builtin_collection || c.kind == ClassKind::Interface {
                self.classes.push(id);
            }
            return;
        }
        let Some(res) = ast[id].resolved.clone() else { return };

        let getclass =
            format!("String _getClass() {{ return \"{}\"; }}", self.qtype(ast, &res));
        let mut getter = String::from("Object _getField(String name) {\n");
        let mut setter = String::from("void _setField(String name, Object value) {\n");
        for (_, fname) in self.fields(ast, id, &Bindings::new()) {
            getter.push_str(&format!(
                "    if (name == \"{0}\") {{ return self.{0}; }}\n",
                fname
            ));
            setter.push_str(&format!(
                "    if (name == \"{0}\") {{ self.{0} = ?value; }}\n",
                fname
            ));
        }
        getter.push_str("    return null;\n}\n");
        setter.push_str("}\n");
        self.methods.insert(id, (getclass, getter, setter));
        self.classes.push(id);
    }

    fn leave_root(&mut self, ast: &Ast) {
        let Some(entry) = self.entry else { return };
        let mdpkg = format!("{}_md", namever(ast, entry));

        let mut code = String::new();
        let mut mdclasses = Vec::new();

        for cls in self.classes.clone() {
            let qual = self.qual(ast, cls);
            let nparams_cls = match &ast[cls].kind {
                NodeKind::Class(c) => c.parameters.len(),
                _ => 0,
            };
            let clsid = if nparams_cls > 0 {
                format!("{}<{}>", qual, vec!["Object"; nparams_cls].join(","))
            } else {
                qual.clone()
            };
            let nparams = query::constructor(ast, cls)
                .and_then(|con| match &ast[con].kind {
                    NodeKind::Callable(c) => Some(c.params.len()),
                    _ => None,
                })
                .unwrap_or(0);

            if file_depth(ast, cls) != 0 && !self.class_uses.contains_key(&cls) {
                continue;
            }

            let uses: IndexMap<String, ClassUse> = match self.class_uses.get(&cls) {
                Some(uses) => uses.clone(),
                None => {
                    let Some(res) = ast[cls].resolved.clone() else { continue };
                    let mut default = IndexMap::new();
                    default.insert(
                        clsid.clone(),
                        (res, Some(cls), package_path(ast, ast[cls].package)),
                    );
                    default
                }
            };

            for (clsid, (texp, ucls, pkg)) in uses {
                if pkg.is_empty() {
                    continue;
                }
                let qparams = self.qparams(ast, &texp);
                code.push_str(&format!(
                    "package {} {{\n{}\n}}\n\n",
                    mdpkg,
                    self.clazz(ast, cls, &clsid, &qparams, nparams, &texp)
                ));
                let Some(ucls) = ucls else { continue };
                if package_name(ast, ucls).as_deref() == Some("reflect") {
                    continue;
                }
                let mdn = mdname(&clsid);
                let mdcls = format!("{}.Root.{}_md", mdpkg, mdn);
                mdclasses.push(mdn.clone());
                self.metadata.entry(ucls).or_default().insert(mdn, mdcls);
            }
        }

        code.push_str(&format!(
            "package {} {{\n    class Root {{\n\n        \
             String _getClass() {{ return null; }}\n        \
             Object _getField(String name) {{ return null; }}\n        \
             void _setField(String name, Object value) {{}}\n",
            mdpkg
        ));
        for cls in &mdclasses {
            code.push_str(&format!(
                "        static reflect.Class {0}_md = {0}.singleton;\n",
                cls
            ));
        }
        code.push_str("    }\n}\n");
        self.code = code;
    }
}

impl Pass for Reflector {
    fn enter(&mut self, ast: &mut Ast, id: NodeId) {
        match &ast[id].kind {
            NodeKind::File(_) => self.visit_file(ast, id),
            NodeKind::Type(_) => self.visit_type(ast, id),
            NodeKind::Class(_) => self.visit_class(ast, id),
            _ => {}
        }
    }

    fn leave(&mut self, ast: &mut Ast, id: NodeId) {
        if matches!(ast[id].kind, NodeKind::Root(_)) && id == ast.root {
            self.leave_root(ast);
        }
    }
}
