//! Skeleton emitters.
//!
//! One emitter per backend: walks the compiled root, drives the target
//! name model (`define`, `module`, `reference`, `nameof`) for every
//! definition and cross-reference, and fills per-file buffers with
//! skeleton declarations. Native include payloads are emitted verbatim.

use std::collections::HashMap;

use indexmap::IndexMap;

use quill_compiler::ast::{Ast, CallableKind, ClassKind, NodeId, NodeKind};
use quill_compiler::compiler::Backend;
use quill_compiler::target::{DefInfo, DefKind, DefName, Go, Java, Python, Ruby, Target};

pub struct SkeletonBackend {
    target: Target,
}

impl SkeletonBackend {
    pub fn java() -> Self {
        SkeletonBackend { target: Target::new(Box::new(Java)) }
    }

    pub fn python() -> Self {
        SkeletonBackend { target: Target::new(Box::new(Python)) }
    }

    pub fn ruby() -> Self {
        SkeletonBackend { target: Target::new(Box::new(Ruby)) }
    }

    pub fn go() -> Self {
        SkeletonBackend { target: Target::new(Box::new(Go)) }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "java" => Some(Self::java()),
            "python" => Some(Self::python()),
            "ruby" => Some(Self::ruby()),
            "go" => Some(Self::go()),
            _ => None,
        }
    }

    pub fn into_target(self) -> Target {
        self.target
    }

    fn declaration(&self, info: &DefInfo) -> String {
        let key = info.name.key();
        let name = self.target.nameof(&key).unwrap_or(key.as_str());
        match (self.target.name(), info.kind) {
            ("java", DefKind::Class | DefKind::Interface) => {
                format!("public class {} {{}}\n\n", name)
            }
            ("java", _) => format!("// function {}\n", name),
            ("python", DefKind::Class | DefKind::Interface) => {
                format!("class {}:\n    pass\n\n", name)
            }
            ("python", _) => format!("def {}():\n    pass\n\n", name),
            ("ruby", DefKind::Class | DefKind::Interface) => {
                format!("class {}\nend\n\n", name)
            }
            ("ruby", _) => format!("def {}\nend\n\n", name),
            ("go", DefKind::Class | DefKind::Interface) => {
                format!("type {} struct {{}}\n\n", name)
            }
            ("go", _) => format!("func {}() {{}}\n\n", name),
            (_, _) => format!("// {}\n", name),
        }
    }
}

impl Backend for SkeletonBackend {
    fn name(&self) -> &'static str {
        self.target.name()
    }

    fn emit(&mut self, ast: &Ast) -> IndexMap<String, String> {
        let definitions = collect_definitions(ast);
        let by_node: HashMap<NodeId, DefInfo> =
            definitions.iter().map(|(node, info)| (*node, info.clone())).collect();

        for (_, info) in &definitions {
            self.target.define(info);
        }
        for (node, info) in &definitions {
            for reference in collect_references(ast, *node, &by_node) {
                self.target.reference(info, &reference);
            }
        }
        for (_, info) in &definitions {
            let decl = self.declaration(info);
            let module = self.target.module(info);
            module.content.push_str(&decl);
        }

        let rendered: Vec<(String, String)> = self
            .target
            .modules
            .iter()
            .map(|(filename, module)| (filename.clone(), module.render()))
            .collect();
        for (filename, content) in rendered {
            self.target.file(&filename, &content);
        }
        for (url, payload) in &ast.root_node().included {
            let name = url.rsplit('/').next().unwrap_or(url.as_str());
            self.target.file(name, payload);
        }
        self.target.files.clone()
    }
}

/// The unit name a file's definitions are attributed to: the file's
/// first package, or its stem.
fn unit_name(ast: &Ast, file: NodeId) -> String {
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

fn package_path(ast: &Ast, node: NodeId) -> Vec<String> {
    let mut parts = Vec::new();
    let mut pkg = ast[node].package;
    while let Some(p) = pkg {
        if let Some(name) = ast.name_of(p) {
            parts.push(name.to_string());
        }
        pkg = ast[p].package;
    }
    parts.reverse();
    parts
}

fn def_info(ast: &Ast, node: NodeId, unit: &str) -> Option<DefInfo> {
    let kind = match &ast[node].kind {
        NodeKind::Class(c) => match c.kind {
            ClassKind::Interface => DefKind::Interface,
            _ => DefKind::Class,
        },
        NodeKind::Callable(c)
            if matches!(c.kind, CallableKind::Function | CallableKind::Macro) =>
        {
            if is_check(ast, node) {
                DefKind::Check
            } else {
                DefKind::Function
            }
        }
        _ => return None,
    };
    let mut path = package_path(ast, node);
    path.push(ast.name_of(node)?.to_string());
    Some(DefInfo { name: DefName::new(unit, path), kind })
}

/// A function annotated `@check` is a test for naming purposes.
fn is_check(ast: &Ast, node: NodeId) -> bool {
    ast[node].annotations.iter().any(|a| {
        matches!(&ast[*a].kind, NodeKind::Annotation(ann) if ann.name == "check")
    })
}

/// Classes, interfaces and functions from the entry files, in document
/// order.
fn collect_definitions(ast: &Ast) -> Vec<(NodeId, DefInfo)> {
    let mut out = Vec::new();
    for file in &ast.root_node().files {
        let depth = match &ast[*file].kind {
            NodeKind::File(f) => f.depth,
            _ => continue,
        };
        if depth != 0 {
            continue;
        }
        let unit = unit_name(ast, *file);
        collect_from(ast, *file, &unit, &mut out);
    }
    out
}

fn collect_from(ast: &Ast, node: NodeId, unit: &str, out: &mut Vec<(NodeId, DefInfo)>) {
    let children: Vec<NodeId> = match &ast[node].kind {
        NodeKind::File(f) => f.definitions.clone(),
        NodeKind::Package(p) => p.definitions.clone(),
        _ => return,
    };
    for child in children {
        if let Some(info) = def_info(ast, child, unit) {
            out.push((child, info));
        }
        if matches!(ast[child].kind, NodeKind::Package(_)) {
            collect_from(ast, child, unit, out);
        }
    }
}

/// Cross-references out of one definition: resolved type references to
/// known definitions, plus call targets (unknown ones become foreign
/// functions).
fn collect_references(
    ast: &Ast,
    node: NodeId,
    known: &HashMap<NodeId, DefInfo>,
) -> Vec<DefInfo> {
    let mut out = Vec::new();
    collect_references_from(ast, node, node, known, &mut out);
    out
}

fn collect_references_from(
    ast: &Ast,
    origin: NodeId,
    node: NodeId,
    known: &HashMap<NodeId, DefInfo>,
    out: &mut Vec<DefInfo>,
) {
    match &ast[node].kind {
        NodeKind::Type(_) => {
            if let Some(resolved) = &ast[node].resolved {
                if resolved.definition != origin {
                    if let Some(info) = known.get(&resolved.definition) {
                        out.push(info.clone());
                    }
                }
            }
        }
        NodeKind::Call(call) => {
            if let NodeKind::Var(_) = &ast[call.expr].kind {
                if let Some(target) = ast[call.expr].definition {
                    let foreign = matches!(&ast[target].kind,
                        NodeKind::Callable(c)
                            if matches!(c.kind, CallableKind::Function | CallableKind::Macro));
                    if foreign && target != origin {
                        match known.get(&target) {
                            Some(info) => out.push(info.clone()),
                            None => {
                                let mut path = package_path(ast, target);
                                if let Some(name) = ast.name_of(target) {
                                    path.push(name.to_string());
                                }
                                out.push(DefInfo {
                                    name: DefName::new("", path),
                                    kind: DefKind::Function,
                                });
                            }
                        }
                    }
                }
            }
        }
        _ => {}
    }
    for child in ast.children(node) {
        collect_references_from(ast, origin, child, known, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_compiler::{Compiler, MemoryReader};

    fn compile_app() -> Compiler {
        let mut reader = MemoryReader::new();
        reader.insert(
            "app.q",
            "package app {
                 class Point { int x; Point(int x) { self.x = x; } }
                 void run() { }
             }",
        );
        Compiler::with_reader(Box::new(reader))
    }

    #[test]
    fn java_skeleton_places_classes_and_functions() {
        let mut compiler = compile_app();
        compiler.emitter(Box::new(SkeletonBackend::java()), "out");
        compiler.url_parse("app.q", 0).expect("source should parse");
        let outputs = compiler.compile().expect("source should compile");
        let files = &outputs[0].files;
        assert!(
            files.contains_key("src/main/java/app/Point.java"),
            "got: {:?}",
            files.keys().collect::<Vec<_>>()
        );
        assert!(files.contains_key("src/main/java/app/Functions.java"));
    }

    #[test]
    fn python_skeleton_records_imports() {
        let mut compiler = compile_app();
        compiler.emitter(Box::new(SkeletonBackend::python()), "out");
        compiler.url_parse("app.q", 0).expect("source should parse");
        let outputs = compiler.compile().expect("source should compile");
        assert!(outputs[0].files.contains_key("app/Point.py"));
    }

    #[test]
    fn unknown_backends_are_rejected() {
        assert!(SkeletonBackend::by_name("cobol").is_none());
    }
}
