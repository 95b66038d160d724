//! Python-style naming: nested modules preserved, one module per
//! definition, checks in a sibling `test_<module>` module, references
//! through `import X as Y` aliases.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::{segs, unkeywords, DefInfo, DefKind, ModuleFile, Seg, TargetDefinition, TargetPolicy};

static KEYWORDS: Lazy<HashMap<&'static str, String>> =
    Lazy::new(|| unkeywords("self map list None True False"));

pub struct Python;

impl TargetPolicy for Python {
    fn name(&self) -> &'static str {
        "python"
    }

    fn keywords(&self) -> &'static HashMap<&'static str, String> {
        &KEYWORDS
    }

    fn namespace_path(&self, dfn: &DefInfo) -> Vec<Seg> {
        let path = &dfn.name.path;
        match dfn.kind {
            DefKind::Check if path.len() >= 2 => {
                let mut ns = segs(&path[..path.len() - 1]);
                ns.push(Seg::Name(format!("test_{}", path[path.len() - 2])));
                ns
            }
            DefKind::Check => vec![Seg::Name(format!("test_{}", dfn.name.package))],
            _ => segs(path),
        }
    }

    fn definition_ident(&self, dfn: &DefInfo) -> String {
        dfn.name.path.last().cloned().unwrap_or_default()
    }

    fn filename(&self, _dfn: &DefInfo, _tgt: &TargetDefinition, ns_target: &[String]) -> String {
        format!("{}.py", ns_target.join("/"))
    }

    fn reference(
        &self,
        module: &mut ModuleFile,
        _ref_info: &DefInfo,
        tgtref: &TargetDefinition,
        ns_target: &[String],
    ) -> String {
        let ref_module = ns_target.join(".");
        let ref_module_name = ns_target.join("_");
        module
            .imports
            .push(format!("import {} as {}", ref_module, ref_module_name));
        format!("{}.{}", ref_module_name, tgtref.target_name)
    }
}
