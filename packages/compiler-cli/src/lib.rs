#![deny(clippy::all)]

//! Quill compiler CLI: the `quillc` entry point, the filesystem reader
//! and the skeleton backends driving the target name model.

pub use quill_compiler as compiler;

pub mod emit;
pub mod perform_compile;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
