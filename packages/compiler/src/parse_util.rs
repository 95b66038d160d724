//! Source locations, parse errors and diagnostic rendering.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ast::{Ast, NodeId};

/// A position in a source text. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub fn new(line: usize, col: usize) -> Self {
        Location { line, col }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location { line: 1, col: 1 }
    }
}

/// Surface-syntax failure reported by the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseError {
    pub msg: String,
    pub loc: Location,
}

impl ParseError {
    pub fn new(msg: impl Into<String>, loc: Location) -> Self {
        ParseError { msg: msg.into(), loc }
    }
}

/// Provenance of a subtree produced by an annotation handler.
///
/// Replacement subtrees carry a chain of these so diagnostics can point
/// into both the generated fragment and the original code.
#[derive(Debug)]
pub struct Trace {
    pub annotator: String,
    pub text: String,
    pub prev: Option<Rc<Trace>>,
}

/// Render the diagnostic prefix for a node: the owning file name with one
/// leading frame per trace link, terminated by `:line:column`.
pub fn lineinfo(ast: &Ast, id: NodeId) -> String {
    let mut stack = vec![ast.file_name(id).to_string()];
    let mut trace = ast[id].trace.clone();
    while let Some(t) = trace {
        stack.push(format!("{}:", t.annotator));
        stack.push(t.text.clone());
        stack.push("<generated>".to_string());
        trace = t.prev.clone();
    }
    let span = ast[id].span;
    if let Some(last) = stack.last_mut() {
        *last = format!("{}:{}:{}", last, span.line, span.col);
    }
    stack.join("\n")
}
