//! Static reader for PHP files of the form `<?php return [ ... ];`.
//!
//! Literal scalars and nested arrays become real nodes. Anything that would
//! need evaluation (`env('X', 'y')`, class constants, concatenation) is kept
//! as an [`Node::Expr`] holding its token text, so two files agree on it only
//! when they spell it the same way.

use super::{Key, Node, ParseError};
use crate::normalize::{heredoc_end, is_label_byte, quoted_end, strip_comments};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Str(String),
    Int(i64),
    Float(f64),
    Ident,
    Var,
    Punct,
    /// Interpolated string or heredoc, only usable as expression text
    Raw,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(name)
    }
}

/// Parse the value returned by a PHP file.
pub fn parse_php_array(raw: &str) -> Result<Node, ParseError> {
    let code = strip_comments(raw);
    let tokens = tokenize(&code)?;
    Parser { tokens, pos: 0 }.parse_file()
}

fn tokenize(code: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = code.as_bytes();
    let start = code.len() - code.trim_start().len();
    let rest = &bytes[start..];
    if rest.len() < 5 || !rest[..5].eq_ignore_ascii_case(b"<?php") {
        return Err(ParseError::NoOpenTag);
    }

    let mut tokens = Vec::new();
    let mut i = start + 5;

    while i < bytes.len() {
        let c = bytes[i];
        let rest = &bytes[i..];

        if c.is_ascii_whitespace() {
            i += 1;
        } else if rest.starts_with(b"?>") {
            break;
        } else if c == b'\'' || c == b'"' {
            let end = quoted_end(bytes, i);
            let text = slice(bytes, i, end);
            let kind = if c == b'\'' {
                TokenKind::Str(unescape_single(&text))
            } else {
                match unescape_double(&text) {
                    Some(s) => TokenKind::Str(s),
                    None => TokenKind::Raw,
                }
            };
            tokens.push(Token { kind, text });
            i = end;
        } else if rest.starts_with(b"<<<") {
            let end = heredoc_end(bytes, i)
                .ok_or_else(|| ParseError::UnexpectedToken("<<<".to_string()))?;
            tokens.push(Token { kind: TokenKind::Raw, text: slice(bytes, i, end) });
            i = end;
        } else if c.is_ascii_digit() || (c == b'.' && rest.get(1).is_some_and(u8::is_ascii_digit)) {
            let (kind, end) = lex_number(bytes, i);
            tokens.push(Token { kind, text: slice(bytes, i, end) });
            i = end;
        } else if c == b'$' && rest.get(1).is_some_and(|&b| is_label_byte(b, true)) {
            let end = label_end(bytes, i + 1);
            tokens.push(Token { kind: TokenKind::Var, text: slice(bytes, i, end) });
            i = end;
        } else if is_label_byte(c, true) || c == b'\\' {
            let mut end = i;
            while end < bytes.len() && (is_label_byte(bytes[end], false) || bytes[end] == b'\\') {
                end += 1;
            }
            tokens.push(Token { kind: TokenKind::Ident, text: slice(bytes, i, end) });
            i = end;
        } else {
            let len = ["...", "=>", "::", "->", "??"]
                .iter()
                .find(|p| rest.starts_with(p.as_bytes()))
                .map_or(1, |p| p.len());
            tokens.push(Token { kind: TokenKind::Punct, text: slice(bytes, i, i + len) });
            i += len;
        }
    }

    Ok(tokens)
}

fn slice(bytes: &[u8], start: usize, end: usize) -> String {
    String::from_utf8_lossy(&bytes[start..end.min(bytes.len())]).into_owned()
}

fn label_end(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_label_byte(bytes[i], false) {
        i += 1;
    }
    i
}

fn lex_number(bytes: &[u8], start: usize) -> (TokenKind, usize) {
    let mut i = start;
    let radix_prefix = |b: u8| match b {
        b'x' | b'X' => Some(16),
        b'b' | b'B' => Some(2),
        b'o' | b'O' => Some(8),
        _ => None,
    };

    if bytes[i] == b'0' {
        if let Some(radix) = bytes.get(i + 1).and_then(|&b| radix_prefix(b)) {
            i += 2;
            let digits_start = i;
            while i < bytes.len() && (bytes[i].is_ascii_hexdigit() || bytes[i] == b'_') {
                i += 1;
            }
            let digits: String = slice(bytes, digits_start, i).replace('_', "");
            return (int_or_float(&digits, radix), i);
        }
    }

    let mut is_float = false;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1).map_or(true, |b| !b.is_ascii_alphabetic()) {
        is_float = true;
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let text = slice(bytes, start, i).replace('_', "");
    if is_float {
        return (TokenKind::Float(text.parse().unwrap_or(f64::NAN)), i);
    }
    // Legacy octal: leading zero
    if text.len() > 1 && text.starts_with('0') {
        return (int_or_float(&text[1..], 8), i);
    }
    (int_or_float(&text, 10), i)
}

/// PHP overflows integer literals into floats
fn int_or_float(digits: &str, radix: u32) -> TokenKind {
    match i64::from_str_radix(digits, radix) {
        Ok(n) => TokenKind::Int(n),
        Err(_) => {
            let value = digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0f64, |acc, d| acc * radix as f64 + d as f64);
            TokenKind::Float(value)
        }
    }
}

/// Text between the quotes; an unterminated literal runs to the end
fn literal_body(text: &str) -> &str {
    let quote = text.chars().next().unwrap_or('\'');
    let body = text.get(1..).unwrap_or("");
    body.strip_suffix(quote).unwrap_or(body)
}

fn unescape_single(text: &str) -> String {
    let inner = literal_body(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next @ ('\\' | '\'')) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode a double-quoted literal; `None` when it interpolates variables.
fn unescape_double(text: &str) -> Option<String> {
    let inner = literal_body(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('v') => out.push('\x0B'),
                Some('e') => out.push('\x1B'),
                Some('f') => out.push('\x0C'),
                Some(e @ ('\\' | '$' | '"')) => out.push(e),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '$' if chars.peek().is_some_and(|&n| n == '_' || n.is_alphabetic()) => return None,
            '{' if chars.peek() == Some(&'$') => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Skip `declare`, `namespace` and `use` statements up to the `return`.
    fn parse_file(mut self) -> Result<Node, ParseError> {
        loop {
            let token = self.peek().ok_or(ParseError::NoReturn)?;

            if token.is_ident("return") {
                self.pos += 1;
                let node = self.parse_value()?;
                return match self.advance() {
                    None => Ok(node),
                    Some(t) if t.is_punct(";") => Ok(node),
                    Some(t) => Err(ParseError::UnexpectedToken(t.text)),
                };
            }

            if token.is_ident("declare") || token.is_ident("namespace") || token.is_ident("use") {
                self.skip_statement()?;
                continue;
            }

            return Err(ParseError::Unsupported(token.text.clone()));
        }
    }

    fn skip_statement(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            match token.text.as_str() {
                "(" | "[" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                "{" => return Err(ParseError::Unsupported("block statement".to_string())),
                ";" if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(ParseError::UnexpectedEof)
    }

    fn at_terminator(&self) -> bool {
        match self.peek() {
            None => true,
            Some(t) => {
                t.kind == TokenKind::Punct && matches!(t.text.as_str(), "," | "]" | ")" | ";" | "=>")
            }
        }
    }

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;

        if let Some(close) = self.array_open() {
            let node = self.parse_array(close)?;
            if self.at_terminator() {
                return Ok(node);
            }
            self.pos = start;
            return self.capture_expr();
        }

        if let Some(node) = self.literal() {
            if self.at_terminator() {
                return Ok(node);
            }
            self.pos = start;
        }

        self.capture_expr()
    }

    /// Consume `[` or `array(` and return the matching closer
    fn array_open(&mut self) -> Option<&'static str> {
        let token = self.peek()?;
        if token.is_punct("[") {
            self.pos += 1;
            return Some("]");
        }
        if token.is_ident("array") && self.peek_at(1).is_some_and(|t| t.is_punct("(")) {
            self.pos += 2;
            return Some(")");
        }
        None
    }

    fn parse_array(&mut self, close: &str) -> Result<Node, ParseError> {
        let mut map = BTreeMap::new();
        let mut next_index: i64 = 0;

        loop {
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof),
                Some(t) if t.is_punct(close) => {
                    self.pos += 1;
                    return Ok(Node::Map(map));
                }
                _ => {}
            }

            let first = self.parse_value()?;
            let (key, value) = if self.peek().is_some_and(|t| t.is_punct("=>")) {
                self.pos += 1;
                let value = self.parse_value()?;
                (key_from_node(first)?, value)
            } else {
                (Key::Int(next_index), first)
            };

            if let Key::Int(n) = key {
                next_index = next_index.max(n.saturating_add(1));
            }
            map.insert(key, value);

            match self.peek() {
                Some(t) if t.is_punct(",") => self.pos += 1,
                Some(t) if t.is_punct(close) => {}
                Some(t) => return Err(ParseError::UnexpectedToken(t.text.clone())),
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }

    /// A scalar literal, possibly signed
    fn literal(&mut self) -> Option<Node> {
        let token = self.peek()?.clone();
        let node = match &token.kind {
            TokenKind::Str(s) => Node::Str(s.clone()),
            TokenKind::Int(n) => Node::Int(*n),
            TokenKind::Float(f) => Node::Float(*f),
            TokenKind::Ident if token.is_ident("true") => Node::Bool(true),
            TokenKind::Ident if token.is_ident("false") => Node::Bool(false),
            TokenKind::Ident if token.is_ident("null") => Node::Null,
            TokenKind::Punct if token.text == "-" || token.text == "+" => {
                let negate = token.text == "-";
                let node = match self.peek_at(1).map(|t| &t.kind) {
                    Some(TokenKind::Int(n)) if negate => Node::Int(n.wrapping_neg()),
                    Some(TokenKind::Int(n)) => Node::Int(*n),
                    Some(TokenKind::Float(f)) if negate => Node::Float(-f),
                    Some(TokenKind::Float(f)) => Node::Float(*f),
                    _ => return None,
                };
                self.pos += 2;
                return Some(node);
            }
            _ => return None,
        };
        self.pos += 1;
        Some(node)
    }

    /// Everything up to the next terminator at bracket depth zero
    fn capture_expr(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        let mut depth = 0usize;

        while let Some(token) = self.peek() {
            if depth == 0 && self.at_terminator() {
                break;
            }
            if token.kind == TokenKind::Punct {
                match token.text.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            break;
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }

        if self.pos == start {
            return match self.peek() {
                Some(t) => Err(ParseError::UnexpectedToken(t.text.clone())),
                None => Err(ParseError::UnexpectedEof),
            };
        }

        let text = self.tokens[start..self.pos]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Node::Expr(text))
    }
}

fn key_from_node(node: Node) -> Result<Key, ParseError> {
    match node {
        Node::Int(n) => Ok(Key::Int(n)),
        Node::Str(s) => Ok(Key::from_string(&s)),
        Node::Bool(b) => Ok(Key::Int(b as i64)),
        Node::Null => Ok(Key::Str(String::new())),
        Node::Float(f) if f.is_finite() => Ok(Key::Int(f.trunc() as i64)),
        Node::Expr(text) => Ok(Key::Expr(text)),
        Node::Float(f) => Err(ParseError::IllegalKey(f.to_string())),
        Node::Map(_) => Err(ParseError::IllegalKey("array".to_string())),
    }
}
