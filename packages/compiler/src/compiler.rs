//! The compiler driver: parse, crosswire, rewrite, define, resolve,
//! check, reflect, emit.
//!
//! Owns the root, the annotation handler registry and the registered
//! backends, and tracks compilation dependencies through `use`
//! directives.

use std::collections::HashSet;
use std::io;

use indexmap::IndexMap;

use crate::annotate::{apply_annotators, delegate, Annotator, Annotators};
use crate::ast::walk::traverse;
use crate::ast::{Ast, Import, Name, Node, NodeId, NodeKind, Rule, UseDecl};
use crate::checks::Check;
use crate::crosswire::Crosswire;
use crate::definer::Definer;
use crate::error::{Error, Result};
use crate::lookup::UsePass;
use crate::parse_util::{lineinfo, Location};
use crate::parser::Parser;
use crate::reflector::Reflector;
use crate::resolver::Resolver;

/// Canonical URL of the built-in package, resolved to an embedded copy.
pub const BUILTIN: &str = "quill:builtin.q";
pub const BUILTIN_SOURCE: &str = include_str!("builtin.q");

/// URL reading collaborator.
pub trait SourceReader {
    fn read(&self, url: &str) -> io::Result<String>;
}

/// Reads plain filesystem paths.
pub struct FileReader;

impl SourceReader for FileReader {
    fn read(&self, url: &str) -> io::Result<String> {
        std::fs::read_to_string(url)
    }
}

/// In-memory sources, for embedding and tests.
#[derive(Default)]
pub struct MemoryReader {
    sources: IndexMap<String, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(url.into(), text.into());
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, url: &str) -> io::Result<String> {
        self.sources
            .get(url)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, url.to_string()))
    }
}

/// A code emitter: visits the compiled root and produces per-filename
/// content.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn emit(&mut self, ast: &Ast) -> IndexMap<String, String>;
}

#[derive(Debug)]
pub struct Emitted {
    pub backend: &'static str,
    pub target: String,
    pub files: IndexMap<String, String>,
}

pub struct Compiler {
    pub ast: Ast,
    pub dependencies: Vec<String>,
    parser: Parser,
    annotators: Annotators,
    emitters: Vec<(Box<dyn Backend>, String)>,
    parsed: HashSet<String>,
    reader: Box<dyn SourceReader>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_reader(Box::new(FileReader))
    }

    pub fn with_reader(reader: Box<dyn SourceReader>) -> Self {
        let mut compiler = Compiler {
            ast: Ast::new(),
            dependencies: Vec::new(),
            parser: Parser::new(),
            annotators: IndexMap::new(),
            emitters: Vec::new(),
            parsed: HashSet::new(),
            reader,
        };
        compiler.annotator("delegate", delegate);
        compiler
    }

    /// Register an annotation handler.
    pub fn annotator(&mut self, name: &str, handler: Annotator) {
        self.annotators.entry(name.to_string()).or_default().push(handler);
    }

    /// Register a backend with its output location.
    pub fn emitter(&mut self, backend: Box<dyn Backend>, target: &str) {
        self.emitters.push((backend, target.to_string()));
    }

    /// Parse a source text: prepend the silent built-in import (and, for
    /// the first user file, the silent built-in use), then crosswire and
    /// apply annotators until a fixed point.
    pub fn parse(&mut self, name: &str, text: &str) -> Result<NodeId> {
        let file = self.parser.parse(&mut self.ast, name, text).map_err(|e| {
            Error::Parse(format!("{}:{}:{}: {}", name, e.loc.line, e.loc.col, e.msg))
        })?;

        let import = self.ast.alloc(Node::new(
            NodeKind::Import(Import {
                path: vec![Name::new("builtin", Location::default())],
                alias: None,
                silent: true,
            }),
            Location::default(),
        ));
        if let NodeKind::File(f) = &mut self.ast[file].kind {
            f.definitions.insert(0, import);
        }
        let first = self.ast.root_node().files.is_empty();
        if first && !name.ends_with("builtin.q") {
            let use_decl = self.ast.alloc(Node::new(
                NodeKind::Use(UseDecl { url: BUILTIN.to_string(), silent: true, target: None }),
                Location::default(),
            ));
            if let NodeKind::File(f) = &mut self.ast[file].kind {
                f.definitions.insert(0, use_decl);
            }
        }

        let root = self.ast.root;
        let mark = self.ast[root].count;
        loop {
            self.ast[root].count = mark;
            let mut crosswire = Crosswire::new(&self.ast, root);
            traverse(&mut self.ast, file, &mut crosswire);
            let modified =
                apply_annotators(&mut self.ast, &self.parser, &self.annotators, file)?;
            if !modified {
                break;
            }
        }
        self.ast.root_node_mut().files.push(file);
        Ok(file)
    }

    /// Fetch, parse and recurse into `use`s and includes.
    pub fn url_parse(&mut self, url: &str, depth: usize) -> Result<NodeId> {
        let text = self
            .read(url)
            .map_err(|e| Error::Io { url: url.to_string(), source: e })?;
        self.parsed.insert(url.to_string());
        let file = self.parse(url, &text)?;
        if let NodeKind::File(f) = &mut self.ast[file].kind {
            f.depth = depth;
        }

        let uses: Vec<(String, NodeId)> = match &self.ast[file].kind {
            NodeKind::File(f) => f.uses.iter().map(|(u, n)| (u.clone(), *n)).collect(),
            _ => Vec::new(),
        };
        for (use_url, use_node) in uses {
            let qurl = self.join(url, &use_url);
            self.perform_use(&qurl, use_node, depth)?;
        }

        let includes: Vec<(String, NodeId)> = match &self.ast[file].kind {
            NodeKind::File(f) => f.includes.iter().map(|(u, n)| (u.clone(), *n)).collect(),
            _ => Vec::new(),
        };
        for (include_url, include_node) in includes {
            let qurl = self.join(url, &include_url);
            if qurl.ends_with(".q") {
                self.perform_quill_include(&qurl, include_node, depth)?;
            } else {
                self.perform_native_include(&qurl, include_node, depth)?;
            }
        }
        Ok(file)
    }

    fn perform_use(&mut self, qurl: &str, use_node: NodeId, depth: usize) -> Result<()> {
        if !self.parsed.insert(qurl.to_string()) {
            return Ok(());
        }
        self.dependencies.push(qurl.to_string());
        match self.url_parse(qurl, depth + 1) {
            Ok(target) => {
                if let NodeKind::Use(u) = &mut self.ast[use_node].kind {
                    u.target = Some(target);
                }
                Ok(())
            }
            Err(Error::Io { url, .. }) => Err(Error::Compile(format!(
                "{}: error reading file: {}",
                lineinfo(&self.ast, use_node),
                url
            ))),
            Err(e) => Err(e),
        }
    }

    fn perform_quill_include(
        &mut self,
        qurl: &str,
        include_node: NodeId,
        depth: usize,
    ) -> Result<()> {
        if !self.parsed.insert(qurl.to_string()) {
            return Ok(());
        }
        match self.url_parse(qurl, depth) {
            Ok(_) => Ok(()),
            Err(Error::Io { url, .. }) => Err(Error::Compile(format!(
                "{}: error reading file: {}",
                lineinfo(&self.ast, include_node),
                url
            ))),
            Err(e) => Err(e),
        }
    }

    fn perform_native_include(
        &mut self,
        qurl: &str,
        include_node: NodeId,
        depth: usize,
    ) -> Result<()> {
        // Native payloads are only collected for the entry compilation
        // unit.
        if depth != 0 {
            return Ok(());
        }
        let key = match &self.ast[include_node].kind {
            NodeKind::Include(i) => i.url.clone(),
            _ => return Ok(()),
        };
        if self.ast.root_node().included.contains_key(&key) {
            return Ok(());
        }
        match self.read(qurl) {
            Ok(text) => {
                self.ast.root_node_mut().included.insert(key, text);
                Ok(())
            }
            Err(_) => Err(Error::Compile(format!(
                "{}: error reading file: {}",
                lineinfo(&self.ast, include_node),
                key
            ))),
        }
    }

    fn join(&self, base: &str, rel: &str) -> String {
        if rel == BUILTIN {
            return BUILTIN.to_string();
        }
        match base.rfind('/') {
            Some(i) => format!("{}/{}", &base[..i], rel),
            None => rel.to_string(),
        }
    }

    fn read(&self, url: &str) -> io::Result<String> {
        if url == BUILTIN {
            return Ok(BUILTIN_SOURCE.to_string());
        }
        self.reader.read(url)
    }

    /// Define, resolve and check one subtree, raising aggregated errors
    /// at each pass boundary.
    pub fn icompile(&mut self, node: NodeId) -> Result<()> {
        let mut definer = Definer::new();
        traverse(&mut self.ast, node, &mut definer);
        if !definer.duplicates.is_empty() {
            let messages = definer
                .duplicates
                .iter()
                .map(|(node, name, first)| {
                    format!(
                        "{}: duplicate definition of {} (first definition {})",
                        lineinfo(&self.ast, *node),
                        name,
                        lineinfo(&self.ast, *first)
                    )
                })
                .collect();
            return Err(Error::compile(messages));
        }

        let mut use_pass = UsePass::new();
        traverse(&mut self.ast, node, &mut use_pass);
        if !use_pass.unresolved.is_empty() {
            let messages = use_pass
                .unresolved
                .iter()
                .map(|(node, name)| {
                    format!(
                        "{}: unresolved variable: {}",
                        lineinfo(&self.ast, *node),
                        name
                    )
                })
                .collect();
            return Err(Error::compile(messages));
        }

        let mut resolver = Resolver::new();
        traverse(&mut self.ast, node, &mut resolver);
        if !resolver.errors.is_empty() {
            return Err(Error::compile(resolver.errors));
        }

        let mut check = Check::new();
        traverse(&mut self.ast, node, &mut check);
        if !check.errors.is_empty() {
            return Err(Error::compile(check.errors));
        }
        Ok(())
    }

    /// Run the reflector over the compiled root, re-inject its generated
    /// source, and graft the synthesized members onto their classes.
    fn reflect(&mut self) -> Result<()> {
        let mut reflector = Reflector::new();
        let root = self.ast.root;
        traverse(&mut self.ast, root, &mut reflector);
        if reflector.entry.is_none() {
            return Ok(());
        }
        let file = self.parse("reflector", &reflector.code)?;
        self.icompile(file)?;

        for (cls, (getclass, getter, setter)) in reflector.methods {
            for text in [getclass, getter, setter] {
                self.inject_member(cls, Rule::Method, &text)?;
            }
        }
        for (ucls, deps) in reflector.metadata {
            for (dep, target) in deps {
                let text = format!("static reflect.Class {}_ref = {};", dep, target);
                self.inject_member(ucls, Rule::Field, &text)?;
            }
        }
        Ok(())
    }

    fn inject_member(&mut self, cls: NodeId, rule: Rule, text: &str) -> Result<()> {
        let member = self.parser.rule(&mut self.ast, rule, text).map_err(|e| {
            Error::Parse(format!("<reflected>:{}:{}: {}", e.loc.line, e.loc.col, e.msg))
        })?;
        if let NodeKind::Class(c) = &mut self.ast[cls].kind {
            c.definitions.push(member);
        }
        let mut crosswire = Crosswire::new(&self.ast, cls);
        traverse(&mut self.ast, member, &mut crosswire);
        self.icompile(member)
    }

    /// Compile the whole root, reflect, then run each registered backend.
    pub fn compile(&mut self) -> Result<Vec<Emitted>> {
        let root = self.ast.root;
        self.icompile(root)?;
        self.reflect()?;
        let mut outputs = Vec::new();
        for (backend, target) in &mut self.emitters {
            let files = backend.emit(&self.ast);
            outputs.push(Emitted { backend: backend.name(), target: target.clone(), files });
        }
        Ok(outputs)
    }
}
