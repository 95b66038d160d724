//! Per-target name and module layout.
//!
//! Each backend assigns target identifiers, namespace paths, filenames
//! and import edges for every definition and cross-reference, escaping
//! the target language's keywords. The tables are built during emission
//! and read-only afterwards.

pub mod go;
pub mod java;
pub mod python;
pub mod ruby;

use std::collections::HashMap;

use indexmap::IndexMap;

pub use go::Go;
pub use java::Java;
pub use python::Python;
pub use ruby::Ruby;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Class,
    Interface,
    Function,
    Check,
}

/// A definition's source identity: the owning compilation unit and the
/// dotted namespace path ending in the definition's own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefName {
    pub package: String,
    pub path: Vec<String>,
}

impl DefName {
    pub fn new(package: impl Into<String>, path: Vec<String>) -> Self {
        DefName { package: package.into(), path }
    }

    pub fn key(&self) -> String {
        self.path.join(".")
    }
}

#[derive(Debug, Clone)]
pub struct DefInfo {
    pub name: DefName,
    pub kind: DefKind,
}

/// One source namespace segment. Synthetic segments are grouping names
/// invented by a policy (`Functions`, `Tests`); they are reserved as-is
/// and never keyword-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seg {
    Name(String),
    Synthetic(&'static str),
}

impl Seg {
    pub fn text(&self) -> &str {
        match self {
            Seg::Name(s) => s,
            Seg::Synthetic(s) => s,
        }
    }
}

pub fn segs(path: &[String]) -> Vec<Seg> {
    path.iter().map(|s| Seg::Name(s.clone())).collect()
}

/// Name of a definition in the target: its identifier and the source
/// namespace it was placed in.
#[derive(Debug, Clone)]
pub struct TargetDefinition {
    pub target_name: String,
    pub namespace: Vec<Seg>,
}

/// Name of an importable namespace/package in the target.
#[derive(Debug, Default)]
pub struct TargetNamespace {
    pub target_name: Vec<String>,
    /// Source key to the string used to name it from this namespace.
    pub names: IndexMap<String, String>,
    /// Reserved target identifiers back to their source names.
    pub target_names: IndexMap<String, String>,
}

/// An in-construction output file: import lines then body.
#[derive(Debug, Default)]
pub struct ModuleFile {
    pub filename: String,
    pub imports: Vec<String>,
    pub content: String,
}

impl ModuleFile {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut seen = Vec::new();
        for import in &self.imports {
            if !seen.contains(&import) {
                out.push_str(import);
                out.push('\n');
                seen.push(import);
            }
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.content);
        out
    }
}

/// Backend-specific naming policy.
pub trait TargetPolicy {
    fn name(&self) -> &'static str;
    fn keywords(&self) -> &'static HashMap<&'static str, String>;
    /// Source namespace path a definition is placed under.
    fn namespace_path(&self, dfn: &DefInfo) -> Vec<Seg>;
    /// Identifier candidate for a definition, before keyword escaping.
    fn definition_ident(&self, dfn: &DefInfo) -> String;
    /// Identifier candidate for one namespace segment.
    fn namespace_segment(&self, segment: &str) -> String {
        segment.to_string()
    }
    fn filename(&self, dfn: &DefInfo, tgt: &TargetDefinition, ns_target: &[String]) -> String;
    /// The string a referrer uses to name the referent; records any
    /// import line in the referrer's module.
    fn reference(
        &self,
        module: &mut ModuleFile,
        ref_info: &DefInfo,
        tgtref: &TargetDefinition,
        ns_target: &[String],
    ) -> String;
}

/// The naming tables for one backend.
pub struct Target {
    policy: Box<dyn TargetPolicy>,
    pub definitions: IndexMap<String, TargetDefinition>,
    pub namespaces: IndexMap<Vec<Seg>, TargetNamespace>,
    pub modules: IndexMap<String, ModuleFile>,
    pub files: IndexMap<String, String>,
}

impl Target {
    pub fn new(policy: Box<dyn TargetPolicy>) -> Self {
        Target {
            policy,
            definitions: IndexMap::new(),
            namespaces: IndexMap::new(),
            modules: IndexMap::new(),
            files: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.policy.name()
    }

    fn escape(&self, name: &str) -> String {
        match self.policy.keywords().get(name) {
            Some(escaped) => escaped.clone(),
            None => name.to_string(),
        }
    }

    /// Reserve an identifier inside a namespace, optionally escaping
    /// keywords, de-duplicating deterministically.
    fn define_name(&mut self, ns: &[Seg], defname: &str, escape: bool) -> String {
        let mut target = if escape { self.escape(defname) } else { defname.to_string() };
        // The virtual root namespace is untracked; its names are not
        // checked for duplicates.
        if ns.is_empty() {
            return target;
        }
        let Some(namespace) = self.namespaces.get_mut(ns) else { return target };
        while namespace.target_names.contains_key(&target) {
            target.push('_');
        }
        namespace.names.insert(defname.to_string(), target.clone());
        namespace.target_names.insert(target.clone(), defname.to_string());
        target
    }

    fn define_namespace(&mut self, path: &[Seg]) -> Vec<Seg> {
        if path.is_empty() || self.namespaces.contains_key(path) {
            return path.to_vec();
        }
        let parent = self.define_namespace(&path[..path.len() - 1]);
        let parent_target = self
            .namespaces
            .get(&parent)
            .map(|ns| ns.target_name.clone())
            .unwrap_or_default();
        let segment = match &path[path.len() - 1] {
            Seg::Name(name) => {
                let candidate = self.policy.namespace_segment(name);
                self.define_name(&parent, &candidate, true)
            }
            Seg::Synthetic(name) => self.define_name(&parent, name, false),
        };
        let mut target_name = parent_target;
        target_name.push(segment);
        self.namespaces
            .insert(path.to_vec(), TargetNamespace { target_name, ..Default::default() });
        path.to_vec()
    }

    /// Install a definition: choose its namespace and target identifier.
    pub fn define(&mut self, dfn: &DefInfo) -> TargetDefinition {
        let key = dfn.name.key();
        if let Some(existing) = self.definitions.get(&key) {
            return existing.clone();
        }
        let ns_path = self.policy.namespace_path(dfn);
        let namespace = self.define_namespace(&ns_path);
        let ident = self.policy.definition_ident(dfn);
        let target_name = self.define_name(&namespace, &ident, true);
        let tgt = TargetDefinition { target_name, namespace: namespace.clone() };
        if let Some(ns) = self.namespaces.get_mut(&namespace) {
            ns.names.insert(key.clone(), tgt.target_name.clone());
        }
        self.definitions.insert(key, tgt.clone());
        tgt
    }

    fn filename_of(&self, dfn: &DefInfo, tgt: &TargetDefinition) -> String {
        let ns_target = self
            .namespaces
            .get(&tgt.namespace)
            .map(|ns| ns.target_name.clone())
            .unwrap_or_default();
        self.policy.filename(dfn, tgt, &ns_target)
    }

    /// The in-construction file buffer for a definition's module.
    pub fn module(&mut self, dfn: &DefInfo) -> &mut ModuleFile {
        let tgt = self.define(dfn);
        let filename = self.filename_of(dfn, &tgt);
        self.modules
            .entry(filename.clone())
            .or_insert_with(|| ModuleFile { filename, ..Default::default() })
    }

    /// Append finished content under a filename.
    pub fn file(&mut self, filename: &str, contents: &str) {
        self.files.entry(filename.to_string()).or_default().push_str(contents);
    }

    /// Record, in the referrer's namespace, the string used to name the
    /// referent; unknown targets are materialized as synthetic void
    /// functions first.
    pub fn reference(&mut self, dfn: &DefInfo, ref_info: &DefInfo) {
        let ref_key = ref_info.name.key();
        if !self.definitions.contains_key(&ref_key) {
            let ffi = DefInfo { name: ref_info.name.clone(), kind: DefKind::Function };
            self.define(&ffi);
        }
        let tgtdfn = self.define(dfn);
        let Some(tgtref) = self.definitions.get(&ref_key).cloned() else { return };
        let already = self
            .namespaces
            .get(&tgtdfn.namespace)
            .is_some_and(|ns| ns.names.contains_key(&ref_key));
        if already {
            return;
        }
        let ref_ns_target = self
            .namespaces
            .get(&tgtref.namespace)
            .map(|ns| ns.target_name.clone())
            .unwrap_or_default();
        let filename = self.filename_of(dfn, &tgtdfn);
        let module = self
            .modules
            .entry(filename.clone())
            .or_insert_with(|| ModuleFile { filename, ..Default::default() });
        let naming = self.policy.reference(module, ref_info, &tgtref, &ref_ns_target);
        if let Some(ns) = self.namespaces.get_mut(&tgtdfn.namespace) {
            ns.names.insert(ref_key, naming);
        }
    }

    /// The target identifier for a defined name.
    pub fn nameof(&self, key: &str) -> Option<&str> {
        self.definitions.get(key).map(|tgt| tgt.target_name.as_str())
    }

    /// The string a referrer's namespace uses for a reference.
    pub fn nameof_ref(&self, dfn_key: &str, ref_key: &str) -> Option<&str> {
        let tgtdfn = self.definitions.get(dfn_key)?;
        self.namespaces
            .get(&tgtdfn.namespace)?
            .names
            .get(ref_key)
            .map(String::as_str)
    }
}

/// Build a keyword-escape table: each keyword maps to itself with a
/// trailing underscore.
pub fn unkeywords(words: &'static str) -> HashMap<&'static str, String> {
    words.split_whitespace().map(|word| (word, format!("{}_", word))).collect()
}

pub fn upcase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
