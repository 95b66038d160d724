//! Java-style naming: one file per class under `src/main/java`, checks
//! under `src/test/java`, free functions grouped into a synthetic
//! `Functions` namespace, references always fully qualified.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::{segs, unkeywords, DefInfo, DefKind, ModuleFile, Seg, TargetDefinition, TargetPolicy};

static KEYWORDS: Lazy<HashMap<&'static str, String>> = Lazy::new(|| {
    unkeywords(
        "abstract    continue        for             new             switch
         assert      default         goto            package         synchronized
         boolean     do              if              private         this
         break       double          implements      protected       throw
         byte        else            import          public          throws
         case        enum            instanceof      return          transient
         catch       extends         int             short           try
         char        final           interface       static          void
         class       finally         long            strictfp        volatile
         const       float           native          super           while

         null        true            false

         Functions   Tests",
    )
});

pub struct Java;

impl TargetPolicy for Java {
    fn name(&self) -> &'static str {
        "java"
    }

    fn keywords(&self) -> &'static HashMap<&'static str, String> {
        &KEYWORDS
    }

    fn namespace_path(&self, dfn: &DefInfo) -> Vec<Seg> {
        let path = &dfn.name.path;
        match dfn.kind {
            DefKind::Class | DefKind::Interface => segs(path),
            DefKind::Function => {
                let mut ns = segs(&path[..path.len() - 1]);
                ns.push(Seg::Synthetic("Functions"));
                ns
            }
            DefKind::Check => {
                let mut ns = segs(&path[..path.len() - 1]);
                ns.push(Seg::Synthetic("Tests"));
                ns
            }
        }
    }

    fn definition_ident(&self, dfn: &DefInfo) -> String {
        dfn.name.path.last().cloned().unwrap_or_default()
    }

    fn filename(&self, dfn: &DefInfo, _tgt: &TargetDefinition, ns_target: &[String]) -> String {
        let root = if dfn.kind == DefKind::Check { "src/test/java" } else { "src/main/java" };
        format!("{}/{}.java", root, ns_target.join("/"))
    }

    fn reference(
        &self,
        _module: &mut ModuleFile,
        _ref_info: &DefInfo,
        tgtref: &TargetDefinition,
        ns_target: &[String],
    ) -> String {
        // Java fully qualifies all references, imports are unnecessary.
        let mut parts = ns_target.to_vec();
        parts.push(tgtref.target_name.clone());
        parts.join(".")
    }
}
