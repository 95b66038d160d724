/**
 * Quill Compiler CLI - quillc
 *
 * Main entry point for Quill compilation
 */
use std::process;

use clap::{Arg, ArgAction, Command};

use quill_compiler_cli::perform_compile::{perform_compilation, CompileOptions};

const BACKENDS: [&str; 4] = ["java", "python", "ruby", "go"];

fn main() {
    let mut command = Command::new("quillc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Quill Compiler (Rust implementation)")
        .arg(
            Arg::new("sources")
                .value_name("SOURCE")
                .num_args(1..)
                .required(true)
                .help("Source files or URLs to compile"),
        )
        .arg(
            Arg::new("deps-json")
                .long("deps-json")
                .action(ArgAction::SetTrue)
                .help("Print the transitive dependency list as JSON"),
        );
    for backend in BACKENDS {
        command = command.arg(
            Arg::new(backend)
                .long(backend)
                .value_name("DIR")
                .help("Emit this backend into the given directory"),
        );
    }
    let matches = command.get_matches();

    let mut sources = Vec::new();
    for pattern in matches.get_many::<String>("sources").into_iter().flatten() {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            match glob::glob(pattern) {
                Ok(paths) => {
                    for path in paths.flatten() {
                        sources.push(path.to_string_lossy().to_string());
                    }
                }
                Err(e) => {
                    eprintln!("Error: bad pattern '{}': {}", pattern, e);
                    process::exit(1);
                }
            }
        } else {
            sources.push(pattern.clone());
        }
    }

    let mut backends = Vec::new();
    for backend in BACKENDS {
        if let Some(dir) = matches.get_one::<String>(backend) {
            backends.push((backend.to_string(), dir.clone()));
        }
    }

    let options = CompileOptions { deps_json: matches.get_flag("deps-json") };
    if let Err(e) = perform_compilation(&sources, &backends, &options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
