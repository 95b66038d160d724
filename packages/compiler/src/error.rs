//! Compiler error taxonomy.
//!
//! Passes collect plain message lists and never fail fast; the driver
//! aggregates them into a single `Error::Compile` at pass boundaries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Surface-syntax failure, already formatted as `path:line:column: message`.
    #[error("{0}")]
    Parse(String),

    /// Aggregated semantic errors from one pass, newline-joined.
    #[error("{0}")]
    Compile(String),

    /// A source URL could not be read.
    #[error("{url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn compile(messages: Vec<String>) -> Self {
        Error::Compile(messages.join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
