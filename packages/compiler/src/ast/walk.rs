//! Deterministic pre/post-order traversal.
//!
//! Passes are driven in document order; child lists are snapshotted
//! before descent so a pass may freely mutate node slots.

use super::{Ast, NodeId};

pub trait Pass {
    fn enter(&mut self, _ast: &mut Ast, _id: NodeId) {}
    fn leave(&mut self, _ast: &mut Ast, _id: NodeId) {}
}

pub fn traverse(ast: &mut Ast, id: NodeId, pass: &mut dyn Pass) {
    pass.enter(ast, id);
    let children = ast.children(id);
    for child in children {
        traverse(ast, child, pass);
    }
    pass.leave(ast, id);
}
