//! Go-style naming: the top-level namespace maps to a go package and
//! nested namespaces are flattened into identifier names, which works
//! around package cycle issues.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::{unkeywords, upcase, DefInfo, DefKind, ModuleFile, Seg, TargetDefinition, TargetPolicy};

static KEYWORDS: Lazy<HashMap<&'static str, String>> = Lazy::new(|| {
    unkeywords(
        "break        default      func         interface    select
         case         defer        go           map          struct
         chan         else         goto         package      switch
         const        fallthrough  if           range        type
         continue     for          import       return       var",
    )
});

pub struct Go;

impl TargetPolicy for Go {
    fn name(&self) -> &'static str {
        "go"
    }

    fn keywords(&self) -> &'static HashMap<&'static str, String> {
        &KEYWORDS
    }

    fn namespace_path(&self, dfn: &DefInfo) -> Vec<Seg> {
        vec![Seg::Name(dfn.name.path[0].clone())]
    }

    fn definition_ident(&self, dfn: &DefInfo) -> String {
        let path = &dfn.name.path;
        if path.len() == 1 {
            upcase(&path[0])
        } else {
            upcase(&path[1..].join("_"))
        }
    }

    fn filename(&self, dfn: &DefInfo, tgt: &TargetDefinition, ns_target: &[String]) -> String {
        let mut parts = vec![dfn.name.package.clone()];
        parts.extend(ns_target.iter().cloned());
        let stem = tgt.target_name.to_lowercase();
        if dfn.kind == DefKind::Check {
            parts.push(format!("{}_test", stem));
        } else {
            parts.push(stem);
        }
        format!("{}.go", parts.join("/"))
    }

    fn reference(
        &self,
        _module: &mut ModuleFile,
        _ref_info: &DefInfo,
        tgtref: &TargetDefinition,
        ns_target: &[String],
    ) -> String {
        let mut parts = ns_target.to_vec();
        parts.push(tgtref.target_name.clone());
        parts.join(".")
    }
}
