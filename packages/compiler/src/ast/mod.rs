//! Abstract syntax tree of the Quill surface language.
//!
//! The whole program lives in one arena owned by [`Ast`]: children own
//! their subtrees through [`NodeId`] handles, cross-references (parent,
//! containers, resolved definitions) are handles as well and never
//! participate in traversal order. Environments live in a side table so
//! that re-opened packages, and child nodes by default, can share one
//! scope map.

pub mod printer;
pub mod query;
pub mod walk;

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::parse_util::{Location, Trace};
use crate::typeexpr::TypeExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(u32);

/// One scope: simple name to definition, in insertion order.
pub type Env = IndexMap<String, NodeId>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const STATIC = 1 << 0;
    }
}

/// A name as written, with its position.
#[derive(Debug, Clone)]
pub struct Name {
    pub text: String,
    pub span: Location,
}

impl Name {
    pub fn new(text: impl Into<String>, span: Location) -> Self {
        Name { text: text.into(), span }
    }
}

/// Grammar rule a node was produced by; annotation rewriting re-parses
/// handler output under the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    File,
    Function,
    Method,
    Field,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Primitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    Method,
    Constructor,
    Macro,
    MethodMacro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Field,
    Param,
    Local,
}

#[derive(Debug, Default)]
pub struct RootNode {
    pub files: Vec<NodeId>,
    /// Native include payloads keyed by URL, emitted verbatim by backends.
    pub included: IndexMap<String, String>,
}

#[derive(Debug)]
pub struct File {
    pub name: String,
    pub definitions: Vec<NodeId>,
    pub uses: IndexMap<String, NodeId>,
    pub includes: IndexMap<String, NodeId>,
    pub depth: usize,
}

#[derive(Debug)]
pub struct Package {
    pub name: String,
    pub definitions: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Class {
    pub kind: ClassKind,
    pub name: String,
    pub parameters: Vec<NodeId>,
    pub bases: Vec<NodeId>,
    pub definitions: Vec<NodeId>,
}

#[derive(Debug)]
pub struct TypeParam {
    pub name: String,
}

#[derive(Debug)]
pub struct Callable {
    pub kind: CallableKind,
    pub name: String,
    /// Declared return type; `None` marks a constructor.
    pub ty: Option<NodeId>,
    pub params: Vec<NodeId>,
    pub body: Option<NodeId>,
}

#[derive(Debug)]
pub struct Declaration {
    pub kind: DeclKind,
    pub modifiers: Modifiers,
    pub ty: NodeId,
    pub name: String,
    pub value: Option<NodeId>,
}

/// A syntactic type reference: dotted path plus instantiation parameters.
#[derive(Debug)]
pub struct TypeRef {
    pub path: Vec<Name>,
    pub parameters: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Import {
    pub path: Vec<Name>,
    pub alias: Option<String>,
    pub silent: bool,
}

#[derive(Debug)]
pub struct UseDecl {
    pub url: String,
    pub silent: bool,
    pub target: Option<NodeId>,
}

#[derive(Debug)]
pub struct Include {
    pub url: String,
}

#[derive(Debug)]
pub struct Annotation {
    pub name: String,
    pub arguments: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Var {
    pub name: Name,
}

#[derive(Debug)]
pub struct Attr {
    pub expr: NodeId,
    pub attr: Name,
}

#[derive(Debug)]
pub struct Call {
    pub expr: NodeId,
    pub args: Vec<NodeId>,
}

#[derive(Debug)]
pub struct If {
    pub predicate: NodeId,
    pub consequence: NodeId,
    pub alternative: Option<NodeId>,
}

#[derive(Debug)]
pub struct While {
    pub condition: NodeId,
    pub body: NodeId,
}

#[derive(Debug)]
pub enum NodeKind {
    Root(RootNode),
    File(File),
    Package(Package),
    Class(Class),
    TypeParam(TypeParam),
    Callable(Callable),
    Declaration(Declaration),
    Type(TypeRef),
    Import(Import),
    Use(UseDecl),
    Include(Include),
    Annotation(Annotation),
    // Expressions
    Var(Var),
    Number(String),
    Str(String),
    Bool(bool),
    Null,
    ListLit(Vec<NodeId>),
    MapLit(Vec<(NodeId, NodeId)>),
    Attr(Attr),
    Call(Call),
    Super,
    Cast(NodeId),
    // Statements
    Assign { lhs: NodeId, rhs: NodeId },
    ExprStmt(NodeId),
    If(If),
    While(While),
    Break,
    Continue,
    Return(Option<NodeId>),
    Block(Vec<NodeId>),
}

/// One tree node: the kind payload plus the linkage and resolution slots
/// stamped by the annotator and later passes.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Location,
    pub rule: Option<Rule>,
    pub annotations: Vec<NodeId>,

    // Linkage, stamped by the crosswire pass.
    pub parent: Option<NodeId>,
    pub file: Option<NodeId>,
    pub package: Option<NodeId>,
    pub clazz: Option<NodeId>,
    pub callable: Option<NodeId>,
    pub index: usize,
    pub count: usize,
    pub id: String,
    pub env: EnvId,
    pub imports: Vec<NodeId>,

    // Resolution slots.
    pub resolved: Option<TypeExpr>,
    pub definition: Option<NodeId>,
    pub coercion: Option<NodeId>,
    pub trace: Option<Rc<Trace>>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Location) -> Self {
        Node {
            kind,
            span,
            rule: None,
            annotations: Vec::new(),
            parent: None,
            file: None,
            package: None,
            clazz: None,
            callable: None,
            index: 0,
            count: 0,
            id: String::new(),
            env: EnvId(0),
            imports: Vec::new(),
            resolved: None,
            definition: None,
            coercion: None,
            trace: None,
        }
    }
}

pub type Children = SmallVec<[NodeId; 8]>;

pub struct Ast {
    nodes: Vec<Node>,
    envs: Vec<Env>,
    pub root: NodeId,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub fn new() -> Self {
        let mut ast = Ast { nodes: Vec::new(), envs: vec![Env::new()], root: NodeId(0) };
        let root = ast.alloc(Node::new(NodeKind::Root(RootNode::default()), Location::default()));
        ast.root = root;
        ast
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn new_env(&mut self) -> EnvId {
        let id = EnvId(self.envs.len() as u32);
        self.envs.push(Env::new());
        id
    }

    pub fn root_env(&self) -> EnvId {
        EnvId(0)
    }

    pub fn env(&self, id: EnvId) -> &Env {
        &self.envs[id.0 as usize]
    }

    pub fn env_mut(&mut self, id: EnvId) -> &mut Env {
        &mut self.envs[id.0 as usize]
    }

    pub fn root_node(&self) -> &RootNode {
        match &self[self.root].kind {
            NodeKind::Root(r) => r,
            _ => panic!("root node has non-root kind"),
        }
    }

    pub fn root_node_mut(&mut self) -> &mut RootNode {
        let root = self.root;
        match &mut self[root].kind {
            NodeKind::Root(r) => r,
            _ => panic!("root node has non-root kind"),
        }
    }

    /// Resolve a name in the built-in package.
    pub fn builtin(&self, name: &str) -> Option<NodeId> {
        let pkg = *self.env(self.root_env()).get("builtin")?;
        self.env(self[pkg].env).get(name).copied()
    }

    /// The declared name of a node, if it has one; anonymous nodes are
    /// identified by their sibling index instead.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        match &self[id].kind {
            NodeKind::File(f) => Some(&f.name),
            NodeKind::Package(p) => Some(&p.name),
            NodeKind::Class(c) => Some(&c.name),
            NodeKind::TypeParam(t) => Some(&t.name),
            NodeKind::Callable(c) => Some(&c.name),
            NodeKind::Declaration(d) => Some(&d.name),
            _ => None,
        }
    }

    /// Name of the file containing this node, for diagnostics.
    pub fn file_name(&self, id: NodeId) -> &str {
        let file = if matches!(self[id].kind, NodeKind::File(_)) { Some(id) } else { self[id].file };
        match file.map(|f| &self[f].kind) {
            Some(NodeKind::File(f)) => &f.name,
            _ => "<none>",
        }
    }

    /// Children in document order. The returned list is a snapshot; passes
    /// may mutate node slots while iterating it.
    pub fn children(&self, id: NodeId) -> Children {
        let mut out = Children::new();
        let node = &self[id];
        out.extend(node.annotations.iter().copied());
        match &node.kind {
            NodeKind::Root(r) => out.extend(r.files.iter().copied()),
            NodeKind::File(f) => out.extend(f.definitions.iter().copied()),
            NodeKind::Package(p) => out.extend(p.definitions.iter().copied()),
            NodeKind::Class(c) => {
                out.extend(c.parameters.iter().copied());
                out.extend(c.bases.iter().copied());
                out.extend(c.definitions.iter().copied());
            }
            NodeKind::Callable(c) => {
                if let Some(ty) = c.ty {
                    out.push(ty);
                }
                out.extend(c.params.iter().copied());
                if let Some(body) = c.body {
                    out.push(body);
                }
            }
            NodeKind::Declaration(d) => {
                out.push(d.ty);
                if let Some(value) = d.value {
                    out.push(value);
                }
            }
            NodeKind::Type(t) => out.extend(t.parameters.iter().copied()),
            NodeKind::Annotation(a) => out.extend(a.arguments.iter().copied()),
            NodeKind::ListLit(elements) => out.extend(elements.iter().copied()),
            NodeKind::MapLit(entries) => {
                for (k, v) in entries {
                    out.push(*k);
                    out.push(*v);
                }
            }
            NodeKind::Attr(a) => out.push(a.expr),
            NodeKind::Call(c) => {
                out.push(c.expr);
                out.extend(c.args.iter().copied());
            }
            NodeKind::Cast(e) => out.push(*e),
            NodeKind::Assign { lhs, rhs } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            NodeKind::ExprStmt(e) => out.push(*e),
            NodeKind::If(i) => {
                out.push(i.predicate);
                out.push(i.consequence);
                if let Some(alt) = i.alternative {
                    out.push(alt);
                }
            }
            NodeKind::While(w) => {
                out.push(w.condition);
                out.push(w.body);
            }
            NodeKind::Return(e) => {
                if let Some(e) = e {
                    out.push(*e);
                }
            }
            NodeKind::Block(stmts) => out.extend(stmts.iter().copied()),
            NodeKind::TypeParam(_)
            | NodeKind::Import(_)
            | NodeKind::Use(_)
            | NodeKind::Include(_)
            | NodeKind::Var(_)
            | NodeKind::Number(_)
            | NodeKind::Str(_)
            | NodeKind::Bool(_)
            | NodeKind::Null
            | NodeKind::Super
            | NodeKind::Break
            | NodeKind::Continue => {}
        }
        out
    }

    /// Swap `old` for `new` in whichever child slot of `parent` holds it.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let swap = |v: &mut Vec<NodeId>| {
            for slot in v.iter_mut() {
                if *slot == old {
                    *slot = new;
                }
            }
        };
        match &mut self[parent].kind {
            NodeKind::Root(r) => swap(&mut r.files),
            NodeKind::File(f) => swap(&mut f.definitions),
            NodeKind::Package(p) => swap(&mut p.definitions),
            NodeKind::Class(c) => {
                swap(&mut c.parameters);
                swap(&mut c.bases);
                swap(&mut c.definitions);
            }
            NodeKind::Callable(c) => {
                if c.ty == Some(old) {
                    c.ty = Some(new);
                }
                swap(&mut c.params);
                if c.body == Some(old) {
                    c.body = Some(new);
                }
            }
            NodeKind::Declaration(d) => {
                if d.ty == old {
                    d.ty = new;
                }
                if d.value == Some(old) {
                    d.value = Some(new);
                }
            }
            NodeKind::Block(stmts) => swap(stmts),
            _ => {}
        }
        self[new].parent = Some(parent);
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for Ast {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}
