//! Compilation entry point for the CLI: wire sources and backends into
//! the driver, then flush emitted file buffers to disk.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rayon::prelude::*;

use quill_compiler::{Compiler, Emitted};

use crate::emit::SkeletonBackend;

#[derive(Default)]
pub struct CompileOptions {
    /// Print the transitive dependency list as JSON after compiling.
    pub deps_json: bool,
}

/// Compile the given source URLs and emit each requested backend into
/// its output directory.
pub fn perform_compilation(
    sources: &[String],
    backends: &[(String, String)],
    options: &CompileOptions,
) -> Result<()> {
    if sources.is_empty() {
        bail!("no source files given");
    }
    let mut compiler = Compiler::new();
    for (name, out_dir) in backends {
        let backend = SkeletonBackend::by_name(name)
            .with_context(|| format!("unknown backend: {}", name))?;
        compiler.emitter(Box::new(backend), out_dir);
    }
    for source in sources {
        compiler.url_parse(source, 0)?;
    }
    let outputs = compiler.compile()?;

    if options.deps_json {
        println!("{}", serde_json::to_string_pretty(&compiler.dependencies)?);
    }
    write_outputs(&outputs)
}

/// Write every emitted buffer under its backend's output directory.
/// The naming tables are frozen by now, so writes can fan out.
fn write_outputs(outputs: &[Emitted]) -> Result<()> {
    for emitted in outputs {
        let files: Vec<(&String, &String)> = emitted.files.iter().collect();
        let results: Vec<Result<()>> = files
            .par_iter()
            .map(|(name, content)| {
                let path = Path::new(&emitted.target).join(name);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                fs::write(&path, content)
                    .with_context(|| format!("writing {}", path.display()))?;
                Ok(())
            })
            .collect();
        for result in results {
            result?;
        }
    }
    Ok(())
}
