//! Ruby-style naming: constants upcased, sources under `lib/` and checks
//! under `test/`, references through `require_relative` plus the
//! fully-qualified constant path.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::{
    segs, unkeywords, upcase, DefInfo, DefKind, ModuleFile, Seg, TargetDefinition, TargetPolicy,
};

static KEYWORDS: Lazy<HashMap<&'static str, String>> = Lazy::new(|| {
    unkeywords(
        "BEGIN END __ENCODING__ __END__ __FILE__ __LINE__ alias and begin
         break case class def defined?  do else elsif end ensure false
         for if in module next nil not or redo rescue retry return
         self super then true undef unless until when while yield",
    )
});

pub struct Ruby;

impl TargetPolicy for Ruby {
    fn name(&self) -> &'static str {
        "ruby"
    }

    fn keywords(&self) -> &'static HashMap<&'static str, String> {
        &KEYWORDS
    }

    fn namespace_path(&self, dfn: &DefInfo) -> Vec<Seg> {
        let path = &dfn.name.path;
        match dfn.kind {
            DefKind::Check if path.len() >= 2 => {
                let mut ns = segs(&path[..path.len() - 2]);
                ns.push(Seg::Name(format!("tc_{}", path[path.len() - 2])));
                ns
            }
            DefKind::Check => vec![Seg::Name(format!("tc_{}", dfn.name.package))],
            _ => segs(&path[..path.len() - 1]),
        }
    }

    fn definition_ident(&self, dfn: &DefInfo) -> String {
        upcase(&dfn.name.path.last().cloned().unwrap_or_default())
    }

    fn namespace_segment(&self, segment: &str) -> String {
        upcase(segment)
    }

    fn filename(&self, dfn: &DefInfo, _tgt: &TargetDefinition, ns_target: &[String]) -> String {
        let root = if dfn.kind == DefKind::Check { "test" } else { "lib" };
        let mut parts = vec![root.to_string(), dfn.name.package.clone()];
        parts.extend(ns_target.iter().cloned());
        format!("{}.rb", parts.join("/"))
    }

    fn reference(
        &self,
        module: &mut ModuleFile,
        ref_info: &DefInfo,
        tgtref: &TargetDefinition,
        ns_target: &[String],
    ) -> String {
        let ref_file = self.filename(ref_info, tgtref, ns_target);
        let mut rel = ref_file.as_str();
        rel = rel.strip_prefix("lib/").unwrap_or(rel);
        rel = rel.strip_suffix(".rb").unwrap_or(rel);
        module.imports.push(format!("require_relative '{}'", rel));
        let mut parts = ns_target.to_vec();
        parts.push(tgtref.target_name.clone());
        parts.join("::")
    }
}
