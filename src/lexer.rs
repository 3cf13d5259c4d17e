use std::rc::Rc;

use logos::Logos;

use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int,
    Float,
}

/// Extends an integer literal into a float when it is followed by `.` and at least one digit.
fn number(lex: &mut logos::Lexer<RawToken>) -> Numeric {
    let rest = lex.remainder().as_bytes();

    if rest.len() >= 2 && rest[0] == b'.' && rest[1].is_ascii_digit() {
        let fraction = rest[1..].iter().take_while(|b| b.is_ascii_digit()).count();
        lex.bump(1 + fraction);
        return Numeric::Float;
    }

    Numeric::Int
}

fn hex_byte(digits: &[u8]) -> Option<u8> {
    if digits.len() != 2 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }

    let digits = std::str::from_utf8(digits).ok()?;
    u8::from_str_radix(digits, 16).ok()
}

/// Scans a string body after the opening quote. An unterminated string runs to the end of input.
/// A body whose `\xHH` escapes do not decode to UTF-8 makes the token illegal.
fn string_literal(lex: &mut logos::Lexer<RawToken>) -> Option<String> {
    let rest = lex.remainder().as_bytes();
    let mut result = Vec::new();
    let mut i = 0;

    while i < rest.len() {
        match rest[i] {
            b'"' => {
                i += 1;
                break;
            }
            b'\\' => {
                match rest.get(i + 1) {
                    Some(b'"') => result.push(b'"'),
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'\\') => result.push(b'\\'),
                    Some(b'x') => {
                        let end = (i + 4).min(rest.len());
                        match hex_byte(&rest[i + 2..end]) {
                            Some(byte) => {
                                result.push(byte);
                                i += 4;
                                continue;
                            }
                            None => {
                                lex.bump(i + 2);
                                return None;
                            }
                        }
                    }
                    _ => {}
                }
                i += 2;
            }
            byte => {
                result.push(byte);
                i += 1;
            }
        }
    }

    lex.bump(i.min(rest.len()));
    String::from_utf8(result).ok()
}

#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[regex(r"#[^\r\n]*", |lex| lex.slice()[1..].to_owned())]
    #[regex(r"//[^\r\n]*", |lex| lex.slice()[2..].to_owned())]
    Comment(String),

    #[token(":=")]
    Bind,

    #[token("=")]
    Assign,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("!")]
    Bang,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("<")]
    Less,

    #[token("<=")]
    LessEqual,

    #[token(">")]
    Greater,

    #[token(">=")]
    GreaterEqual,

    #[token("==")]
    EqualEqual,

    #[token("!=")]
    BangEqual,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(".")]
    Dot,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token("fn")]
    Function,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("return")]
    Return,

    #[token("while")]
    While,

    #[token("switch")]
    Switch,

    #[token("case")]
    Case,

    #[token("default")]
    Default,

    #[token("import")]
    Import,

    #[regex("[0-9]+", number)]
    Number(Numeric),

    #[token("\"", string_literal)]
    String(String),

    #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,
}

impl RawToken {
    fn kind(&self) -> TokenKind {
        match self {
            RawToken::Comment(_) => TokenKind::Comment,
            RawToken::Bind => TokenKind::Bind,
            RawToken::Assign => TokenKind::Assign,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Bang => TokenKind::Bang,
            RawToken::And => TokenKind::And,
            RawToken::Or => TokenKind::Or,
            RawToken::Less => TokenKind::Less,
            RawToken::LessEqual => TokenKind::LessEqual,
            RawToken::Greater => TokenKind::Greater,
            RawToken::GreaterEqual => TokenKind::GreaterEqual,
            RawToken::EqualEqual => TokenKind::EqualEqual,
            RawToken::BangEqual => TokenKind::BangEqual,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Dot => TokenKind::Dot,
            RawToken::LeftParen => TokenKind::LeftParen,
            RawToken::RightParen => TokenKind::RightParen,
            RawToken::LeftBrace => TokenKind::LeftBrace,
            RawToken::RightBrace => TokenKind::RightBrace,
            RawToken::LeftBracket => TokenKind::LeftBracket,
            RawToken::RightBracket => TokenKind::RightBracket,
            RawToken::Function => TokenKind::Function,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,
            RawToken::Null => TokenKind::Null,
            RawToken::If => TokenKind::If,
            RawToken::Else => TokenKind::Else,
            RawToken::Return => TokenKind::Return,
            RawToken::While => TokenKind::While,
            RawToken::Switch => TokenKind::Switch,
            RawToken::Case => TokenKind::Case,
            RawToken::Default => TokenKind::Default,
            RawToken::Import => TokenKind::Import,
            RawToken::Number(Numeric::Int) => TokenKind::Int,
            RawToken::Number(Numeric::Float) => TokenKind::Float,
            RawToken::String(_) => TokenKind::String,
            RawToken::Identifier => TokenKind::Identifier,
        }
    }
}

/// Line boundaries of a source text, used to turn byte offsets into
/// `line, column, line text` triples for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap {
    source: String,
    lines: Vec<(usize, usize)>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut lines = Vec::new();
        let mut begin = 0;

        for (index, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                lines.push((begin, index));
                begin = index + 1;
            }
        }
        lines.push((begin, source.len()));

        SourceMap {
            source: source.to_owned(),
            lines,
        }
    }

    /// Returns the 1-based line and column of `offset` along with the text of that line.
    /// Offsets past the end of input resolve to the last line.
    pub fn locate(&self, offset: usize) -> (usize, usize, &str) {
        let index = self
            .lines
            .iter()
            .position(|&(begin, end)| offset >= begin && offset <= end)
            .unwrap_or(self.lines.len() - 1);
        let (begin, end) = self.lines[index];
        let text = self.source.get(begin..end).unwrap_or("").trim_end_matches('\r');

        (index + 1, offset.saturating_sub(begin) + 1, text)
    }
}

/// Pull-based scanner: every call to [`Lexer::next_token`] yields exactly one token,
/// and `Eof` is repeated once the input is exhausted.
pub struct Lexer<'a> {
    source: &'a str,
    raw: logos::Lexer<'a, RawToken>,
    map: Rc<SourceMap>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            raw: RawToken::lexer(source),
            map: Rc::new(SourceMap::new(source)),
        }
    }

    pub fn next_token(&mut self) -> Token {
        let raw = match self.raw.next() {
            Some(raw) => raw,
            None => {
                let end = self.source.len();
                return Token::new(TokenKind::Eof, String::new(), Span(end, end));
            }
        };

        let range = self.raw.span();
        let span = Span(range.start, range.end);

        match raw {
            Ok(RawToken::Comment(text)) => Token::new(TokenKind::Comment, text, span),
            Ok(RawToken::String(text)) => Token::new(TokenKind::String, text, span),
            Ok(raw) => Token::new(raw.kind(), self.raw.slice().to_owned(), span),
            Err(()) => Token::new(TokenKind::Illegal, self.raw.slice().to_owned(), span),
        }
    }

    /// Rewinds to the start of input.
    pub fn reset(&mut self) {
        self.raw = RawToken::lexer(self.source);
    }

    pub fn source_map(&self) -> Rc<SourceMap> {
        Rc::clone(&self.map)
    }

    /// Collects every token up to and including `Eof`.
    pub fn lex(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let done = token.is(TokenKind::Eof);
            tokens.push(token);

            if done {
                return tokens;
            }
        }
    }
}
