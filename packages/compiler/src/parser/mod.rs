//! The Quill surface grammar.
//!
//! Hand-written lexer and recursive-descent parser. Besides whole-file
//! parsing, fragments can be re-parsed under a named grammar rule, which
//! is how annotation handlers and the reflector inject generated code.

pub mod lexer;
pub mod tokens;

use crate::ast::{
    Annotation, Ast, Attr, Call, Callable, CallableKind, Class, ClassKind, Declaration, DeclKind,
    File, If, Import, Include, Modifiers, Name, Node, NodeId, NodeKind, Package, Rule, TypeParam,
    TypeRef, UseDecl, Var, While,
};
use crate::parse_util::{Location, ParseError};

use lexer::Lexer;
use tokens::{Token, TokenKind};

#[derive(Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Parser
    }

    /// Parse a whole source file.
    pub fn parse(&self, ast: &mut Ast, name: &str, text: &str) -> Result<NodeId, ParseError> {
        let tokens = Lexer::new(text).tokenize()?;
        let mut cursor = Cursor { ast, tokens, pos: 0 };
        let file = cursor.file(name)?;
        cursor.expect(TokenKind::Eof, "end of file")?;
        Ok(file)
    }

    /// Re-parse a fragment under a named grammar rule.
    pub fn rule(&self, ast: &mut Ast, rule: Rule, text: &str) -> Result<NodeId, ParseError> {
        let tokens = Lexer::new(text).tokenize()?;
        let mut cursor = Cursor { ast, tokens, pos: 0 };
        let node = match rule {
            Rule::File => cursor.file("<fragment>")?,
            Rule::Function => {
                let anns = cursor.annotations()?;
                cursor.function(anns)?
            }
            Rule::Method | Rule::Field => cursor.member()?,
            Rule::Body => cursor.block()?,
        };
        cursor.expect(TokenKind::Eof, "end of fragment")?;
        Ok(node)
    }
}

struct Cursor<'a> {
    ast: &'a mut Ast,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn loc(&self) -> Location {
        self.peek().loc
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                format!("expected {}, got '{}'", what, self.peek().text),
                self.loc(),
            ))
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn node(&mut self, kind: NodeKind, loc: Location) -> NodeId {
        self.ast.alloc(Node::new(kind, loc))
    }

    // ---- Files and definitions -------------------------------------------

    fn file(&mut self, name: &str) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        let mut definitions = Vec::new();
        while !self.at(TokenKind::Eof) {
            definitions.push(self.top_definition()?);
        }
        let file = self.node(
            NodeKind::File(File {
                name: name.to_string(),
                definitions,
                uses: Default::default(),
                includes: Default::default(),
                depth: 0,
            }),
            loc,
        );
        self.ast[file].rule = Some(Rule::File);
        Ok(file)
    }

    fn top_definition(&mut self) -> Result<NodeId, ParseError> {
        match self.kind() {
            TokenKind::Use => self.use_decl(),
            TokenKind::Include => self.include_decl(),
            TokenKind::Import => self.import_decl(),
            _ => {
                let anns = self.annotations()?;
                match self.kind() {
                    TokenKind::Package => self.package(anns),
                    TokenKind::Class | TokenKind::Interface | TokenKind::Primitive => {
                        self.class_like(anns)
                    }
                    TokenKind::Macro => self.macro_def(anns, CallableKind::Macro),
                    _ => self.function(anns),
                }
            }
        }
    }

    fn use_decl(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::Use, "'use'")?;
        let url = self.string_value("a source URL")?;
        self.expect(TokenKind::Semi, "';'")?;
        Ok(self.node(NodeKind::Use(UseDecl { url, silent: false, target: None }), loc))
    }

    fn include_decl(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::Include, "'include'")?;
        let url = self.string_value("an include URL")?;
        self.expect(TokenKind::Semi, "';'")?;
        Ok(self.node(NodeKind::Include(Include { url }), loc))
    }

    fn import_decl(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::Import, "'import'")?;
        let path = self.dotted_path()?;
        let alias = if self.eat(TokenKind::As) {
            Some(self.expect(TokenKind::Ident, "an alias name")?.text)
        } else {
            None
        };
        self.expect(TokenKind::Semi, "';'")?;
        Ok(self.node(NodeKind::Import(Import { path, alias, silent: false }), loc))
    }

    fn string_value(&mut self, what: &str) -> Result<String, ParseError> {
        let token = self.expect(TokenKind::Str, what)?;
        Ok(token.text.trim_matches('"').to_string())
    }

    fn dotted_path(&mut self) -> Result<Vec<Name>, ParseError> {
        let mut path = Vec::new();
        loop {
            let token = self.expect(TokenKind::Ident, "a name")?;
            path.push(Name::new(token.text, token.loc));
            if !self.eat(TokenKind::Dot) {
                return Ok(path);
            }
        }
    }

    fn package(&mut self, anns: Vec<NodeId>) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::Package, "'package'")?;
        let name = self.expect(TokenKind::Ident, "a package name")?.text;
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut definitions = Vec::new();
        while !self.at(TokenKind::RBrace) {
            definitions.push(self.top_definition()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let pkg = self.node(NodeKind::Package(Package { name, definitions }), loc);
        self.ast[pkg].annotations = anns;
        Ok(pkg)
    }

    fn class_like(&mut self, anns: Vec<NodeId>) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        let kind = match self.advance().kind {
            TokenKind::Interface => ClassKind::Interface,
            TokenKind::Primitive => ClassKind::Primitive,
            _ => ClassKind::Class,
        };
        let name = self.expect(TokenKind::Ident, "a class name")?.text;
        let mut parameters = Vec::new();
        if self.eat(TokenKind::Lt) {
            loop {
                let token = self.expect(TokenKind::Ident, "a type parameter")?;
                let param =
                    self.node(NodeKind::TypeParam(TypeParam { name: token.text }), token.loc);
                parameters.push(param);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt, "'>'")?;
        }
        let mut bases = Vec::new();
        if self.eat(TokenKind::Extends) {
            loop {
                bases.push(self.type_ref()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut definitions = Vec::new();
        while !self.at(TokenKind::RBrace) {
            definitions.push(self.member()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let class = self.node(
            NodeKind::Class(Class { kind, name, parameters, bases, definitions }),
            loc,
        );
        self.ast[class].annotations = anns;
        Ok(class)
    }

    fn member(&mut self) -> Result<NodeId, ParseError> {
        let anns = self.annotations()?;
        if self.at(TokenKind::Macro) {
            return self.macro_def(anns, CallableKind::MethodMacro);
        }
        let loc = self.loc();
        let mut modifiers = Modifiers::empty();
        if self.eat(TokenKind::Static) {
            modifiers |= Modifiers::STATIC;
        }
        let ty = self.type_ref()?;
        if self.at(TokenKind::LParen) {
            // A bare name followed by an argument list is a constructor.
            let name = match &self.ast[ty].kind {
                NodeKind::Type(t) if t.path.len() == 1 && t.parameters.is_empty() => {
                    t.path[0].text.clone()
                }
                _ => {
                    return Err(ParseError::new("expected a member name", self.loc()));
                }
            };
            let params = self.params()?;
            let body = if self.eat(TokenKind::Semi) { None } else { Some(self.block()?) };
            let con = self.node(
                NodeKind::Callable(Callable {
                    kind: CallableKind::Constructor,
                    name,
                    ty: None,
                    params,
                    body,
                }),
                loc,
            );
            self.ast[con].annotations = anns;
            self.ast[con].rule = Some(Rule::Method);
            return Ok(con);
        }
        let name = self.expect(TokenKind::Ident, "a member name")?.text;
        if self.at(TokenKind::LParen) {
            let params = self.params()?;
            let body = if self.eat(TokenKind::Semi) { None } else { Some(self.block()?) };
            let method = self.node(
                NodeKind::Callable(Callable {
                    kind: CallableKind::Method,
                    name,
                    ty: Some(ty),
                    params,
                    body,
                }),
                loc,
            );
            self.ast[method].annotations = anns;
            self.ast[method].rule = Some(Rule::Method);
            return Ok(method);
        }
        let value = if self.eat(TokenKind::Assign) { Some(self.expression()?) } else { None };
        self.expect(TokenKind::Semi, "';'")?;
        let field = self.node(
            NodeKind::Declaration(Declaration {
                kind: DeclKind::Field,
                modifiers,
                ty,
                name,
                value,
            }),
            loc,
        );
        self.ast[field].annotations = anns;
        self.ast[field].rule = Some(Rule::Field);
        Ok(field)
    }

    fn macro_def(
        &mut self,
        anns: Vec<NodeId>,
        kind: CallableKind,
    ) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::Macro, "'macro'")?;
        let ty = self.type_ref()?;
        let name = self.expect(TokenKind::Ident, "a macro name")?.text;
        let params = self.params()?;
        self.expect(TokenKind::Semi, "';'")?;
        let rule = if kind == CallableKind::Macro { Rule::Function } else { Rule::Method };
        let mac = self.node(
            NodeKind::Callable(Callable { kind, name, ty: Some(ty), params, body: None }),
            loc,
        );
        self.ast[mac].annotations = anns;
        self.ast[mac].rule = Some(rule);
        Ok(mac)
    }

    fn function(&mut self, anns: Vec<NodeId>) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        let ty = self.type_ref()?;
        let name = self.expect(TokenKind::Ident, "a function name")?.text;
        let params = self.params()?;
        let body = if self.eat(TokenKind::Semi) { None } else { Some(self.block()?) };
        let func = self.node(
            NodeKind::Callable(Callable {
                kind: CallableKind::Function,
                name,
                ty: Some(ty),
                params,
                body,
            }),
            loc,
        );
        self.ast[func].annotations = anns;
        self.ast[func].rule = Some(Rule::Function);
        Ok(func)
    }

    fn params(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let loc = self.loc();
                let ty = self.type_ref()?;
                let name = self.expect(TokenKind::Ident, "a parameter name")?.text;
                params.push(self.node(
                    NodeKind::Declaration(Declaration {
                        kind: DeclKind::Param,
                        modifiers: Modifiers::empty(),
                        ty,
                        name,
                        value: None,
                    }),
                    loc,
                ));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(params)
    }

    fn type_ref(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        let path = self.dotted_path()?;
        let mut parameters = Vec::new();
        if self.eat(TokenKind::Lt) {
            loop {
                parameters.push(self.type_ref()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt, "'>'")?;
        }
        Ok(self.node(NodeKind::Type(TypeRef { path, parameters }), loc))
    }

    fn annotations(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut anns = Vec::new();
        while self.at(TokenKind::At) {
            let loc = self.loc();
            self.advance();
            let name = self.expect(TokenKind::Ident, "an annotation name")?.text;
            let mut arguments = Vec::new();
            if self.eat(TokenKind::LParen) {
                if !self.at(TokenKind::RParen) {
                    loop {
                        arguments.push(self.expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')'")?;
            }
            anns.push(self.node(NodeKind::Annotation(Annotation { name, arguments }), loc));
        }
        Ok(anns)
    }

    // ---- Statements ------------------------------------------------------

    fn block(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) {
            statements.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let block = self.node(NodeKind::Block(statements), loc);
        self.ast[block].rule = Some(Rule::Body);
        Ok(block)
    }

    fn statement(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        match self.kind() {
            TokenKind::LBrace => self.block(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => {
                self.advance();
                self.expect(TokenKind::LParen, "'('")?;
                let condition = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                let body = self.block()?;
                Ok(self.node(NodeKind::While(While { condition, body }), loc))
            }
            TokenKind::Return => {
                self.advance();
                let expr =
                    if self.at(TokenKind::Semi) { None } else { Some(self.expression()?) };
                self.expect(TokenKind::Semi, "';'")?;
                Ok(self.node(NodeKind::Return(expr), loc))
            }
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semi, "';'")?;
                Ok(self.node(NodeKind::Break, loc))
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(TokenKind::Semi, "';'")?;
                Ok(self.node(NodeKind::Continue, loc))
            }
            _ => self.decl_or_expr_stmt(),
        }
    }

    fn if_stmt(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let predicate = self.expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let consequence = self.block()?;
        let alternative = if self.eat(TokenKind::Else) {
            if self.at(TokenKind::If) {
                Some(self.if_stmt()?)
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(self.node(NodeKind::If(If { predicate, consequence, alternative }), loc))
    }

    fn decl_or_expr_stmt(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        // A type reference followed by a name is a local declaration;
        // anything else rolls back to an expression statement.
        let snapshot = self.pos;
        if let Ok(ty) = self.type_ref() {
            if self.at(TokenKind::Ident) {
                let name = self.advance().text;
                let value =
                    if self.eat(TokenKind::Assign) { Some(self.expression()?) } else { None };
                self.expect(TokenKind::Semi, "';'")?;
                return Ok(self.node(
                    NodeKind::Declaration(Declaration {
                        kind: DeclKind::Local,
                        modifiers: Modifiers::empty(),
                        ty,
                        name,
                        value,
                    }),
                    loc,
                ));
            }
        }
        self.pos = snapshot;
        let expr = self.expression()?;
        if self.eat(TokenKind::Assign) {
            let rhs = self.expression()?;
            self.expect(TokenKind::Semi, "';'")?;
            return Ok(self.node(NodeKind::Assign { lhs: expr, rhs }, loc));
        }
        self.expect(TokenKind::Semi, "';'")?;
        Ok(self.node(NodeKind::ExprStmt(expr), loc))
    }

    // ---- Expressions -----------------------------------------------------

    fn expression(&mut self) -> Result<NodeId, ParseError> {
        // Equality desugars onto the __eq__/__ne__ method macros.
        let mut lhs = self.unary()?;
        loop {
            let method = match self.kind() {
                TokenKind::EqEq => "__eq__",
                TokenKind::BangEq => "__ne__",
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.unary()?;
            let attr = self.node(
                NodeKind::Attr(Attr { expr: lhs, attr: Name::new(method, loc) }),
                loc,
            );
            lhs = self.node(NodeKind::Call(Call { expr: attr, args: vec![rhs] }), loc);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<NodeId, ParseError> {
        if self.at(TokenKind::Question) {
            let loc = self.loc();
            self.advance();
            let expr = self.unary()?;
            return Ok(self.node(NodeKind::Cast(expr), loc));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.primary()?;
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    let loc = self.loc();
                    self.advance();
                    let token = self.expect(TokenKind::Ident, "an attribute name")?;
                    expr = self.node(
                        NodeKind::Attr(Attr {
                            expr,
                            attr: Name::new(token.text, token.loc),
                        }),
                        loc,
                    );
                }
                TokenKind::LParen => {
                    let loc = self.loc();
                    let args = self.call_args()?;
                    expr = self.node(NodeKind::Call(Call { expr, args }), loc);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn call_args(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }

    fn primary(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        match self.kind() {
            TokenKind::Number => {
                let text = self.advance().text;
                Ok(self.node(NodeKind::Number(text), loc))
            }
            TokenKind::Str => {
                let text = self.advance().text;
                Ok(self.node(NodeKind::Str(text), loc))
            }
            TokenKind::True => {
                self.advance();
                Ok(self.node(NodeKind::Bool(true), loc))
            }
            TokenKind::False => {
                self.advance();
                Ok(self.node(NodeKind::Bool(false), loc))
            }
            TokenKind::Null => {
                self.advance();
                Ok(self.node(NodeKind::Null, loc))
            }
            TokenKind::Super => {
                self.advance();
                Ok(self.node(NodeKind::Super, loc))
            }
            TokenKind::Ident => {
                let token = self.advance();
                Ok(self.node(
                    NodeKind::Var(Var { name: Name::new(token.text, token.loc) }),
                    loc,
                ))
            }
            TokenKind::New => {
                self.advance();
                let ty = self.type_ref()?;
                let args = self.call_args()?;
                Ok(self.node(NodeKind::Call(Call { expr: ty, args }), loc))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.at(TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(self.node(NodeKind::ListLit(elements), loc))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                if !self.at(TokenKind::RBrace) {
                    loop {
                        let key = self.expression()?;
                        self.expect(TokenKind::Colon, "':'")?;
                        let value = self.expression()?;
                        entries.push((key, value));
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                Ok(self.node(NodeKind::MapLit(entries), loc))
            }
            _ => Err(ParseError::new(
                format!("unexpected token '{}'", self.peek().text),
                loc,
            )),
        }
    }
}
