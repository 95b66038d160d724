//! Token definitions for the Quill lexer.

use crate::parse_util::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Comma,
    Dot,
    Semi,
    Colon,
    Assign,
    Question,
    At,
    EqEq,
    BangEq,
    // Keywords
    Package,
    Class,
    Interface,
    Primitive,
    Macro,
    Extends,
    New,
    Super,
    Return,
    If,
    Else,
    While,
    Break,
    Continue,
    True,
    False,
    Null,
    Import,
    Use,
    Include,
    As,
    Static,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub loc: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, loc: Location) -> Self {
        Token { kind, text: text.into(), loc }
    }
}

pub fn keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "package" => TokenKind::Package,
        "class" => TokenKind::Class,
        "interface" => TokenKind::Interface,
        "primitive" => TokenKind::Primitive,
        "macro" => TokenKind::Macro,
        "extends" => TokenKind::Extends,
        "new" => TokenKind::New,
        "super" => TokenKind::Super,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "import" => TokenKind::Import,
        "use" => TokenKind::Use,
        "include" => TokenKind::Include,
        "as" => TokenKind::As,
        "static" => TokenKind::Static,
        _ => return None,
    })
}
