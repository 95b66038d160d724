//! Character-level scanner for Quill source text.

use crate::parse_util::{Location, ParseError};

use super::tokens::{keyword, Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        Lexer { chars: text.chars().collect(), pos: 0, line: 1, col: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let loc = self.loc();
            let Some(ch) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", loc));
                return Ok(tokens);
            };
            let token = match ch {
                c if c.is_ascii_alphabetic() || c == '_' => self.ident(loc),
                c if c.is_ascii_digit() => self.number(loc),
                '"' => self.string(loc)?,
                '=' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        Token::new(TokenKind::EqEq, "==", loc)
                    } else {
                        Token::new(TokenKind::Assign, "=", loc)
                    }
                }
                '!' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        Token::new(TokenKind::BangEq, "!=", loc)
                    } else {
                        return Err(ParseError::new("unexpected character: !", loc));
                    }
                }
                _ => {
                    self.bump();
                    let kind = match ch {
                        '{' => TokenKind::LBrace,
                        '}' => TokenKind::RBrace,
                        '(' => TokenKind::LParen,
                        ')' => TokenKind::RParen,
                        '[' => TokenKind::LBracket,
                        ']' => TokenKind::RBracket,
                        '<' => TokenKind::Lt,
                        '>' => TokenKind::Gt,
                        ',' => TokenKind::Comma,
                        '.' => TokenKind::Dot,
                        ';' => TokenKind::Semi,
                        ':' => TokenKind::Colon,
                        '?' => TokenKind::Question,
                        '@' => TokenKind::At,
                        _ => {
                            return Err(ParseError::new(
                                format!("unexpected character: {}", ch),
                                loc,
                            ))
                        }
                    };
                    Token::new(kind, ch.to_string(), loc)
                }
            };
            tokens.push(token);
        }
    }

    fn loc(&self) -> Location {
        Location::new(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.loc();
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                            None => {
                                return Err(ParseError::new("unterminated comment", start))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn ident(&mut self, loc: Location) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match keyword(&text) {
            Some(kind) => Token::new(kind, text, loc),
            None => Token::new(TokenKind::Ident, text, loc),
        }
    }

    fn number(&mut self, loc: Location) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        Token::new(TokenKind::Number, text, loc)
    }

    fn string(&mut self, loc: Location) -> Result<Token, ParseError> {
        let mut text = String::from('"');
        self.bump();
        loop {
            match self.peek() {
                Some('"') => {
                    text.push('"');
                    self.bump();
                    return Ok(Token::new(TokenKind::Str, text, loc));
                }
                Some('\\') => {
                    text.push('\\');
                    self.bump();
                    match self.bump() {
                        Some(c) => text.push(c),
                        None => return Err(ParseError::new("unterminated string", loc)),
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
                None => return Err(ParseError::new("unterminated string", loc)),
            }
        }
    }
}
