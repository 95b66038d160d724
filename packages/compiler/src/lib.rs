#![deny(clippy::all)]

//! Quill compiler middle-end.
//!
//! Accepts parsed program trees, resolves them into a fully-annotated,
//! cross-linked program, and prepares per-target name and module layouts
//! for the code generators.

pub mod annotate;
pub mod ast;
pub mod checks;
pub mod compiler;
pub mod crosswire;
pub mod definer;
pub mod error;
pub mod lookup;
pub mod parse_util;
pub mod parser;
pub mod reflector;
pub mod resolver;
pub mod target;
pub mod typeexpr;

pub use compiler::{
    Backend, Compiler, Emitted, FileReader, MemoryReader, SourceReader, BUILTIN,
};
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
