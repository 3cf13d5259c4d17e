use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Illegal,
  Eof,
  Comment,

  Identifier,
  Int,
  Float,
  String,

  Bind,
  Assign,
  Plus,
  Minus,
  Star,
  Slash,
  Percent,

  Bang,
  And,
  Or,

  Less,
  LessEqual,
  Greater,
  GreaterEqual,
  EqualEqual,
  BangEqual,

  Comma,
  Semicolon,
  Colon,
  Dot,

  LeftParen,
  RightParen,
  LeftBrace,
  RightBrace,
  LeftBracket,
  RightBracket,

  Function,
  True,
  False,
  Null,
  If,
  Else,
  Return,
  While,
  Switch,
  Case,
  Default,
  Import,
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TokenKind::Illegal => "ILLEGAL",
      TokenKind::Eof => "EOF",
      TokenKind::Comment => "COMMENT",
      TokenKind::Identifier => "IDENT",
      TokenKind::Int => "INT",
      TokenKind::Float => "FLOAT",
      TokenKind::String => "STRING",
      TokenKind::Bind => ":=",
      TokenKind::Assign => "=",
      TokenKind::Plus => "+",
      TokenKind::Minus => "-",
      TokenKind::Star => "*",
      TokenKind::Slash => "/",
      TokenKind::Percent => "%",
      TokenKind::Bang => "!",
      TokenKind::And => "&&",
      TokenKind::Or => "||",
      TokenKind::Less => "<",
      TokenKind::LessEqual => "<=",
      TokenKind::Greater => ">",
      TokenKind::GreaterEqual => ">=",
      TokenKind::EqualEqual => "==",
      TokenKind::BangEqual => "!=",
      TokenKind::Comma => ",",
      TokenKind::Semicolon => ";",
      TokenKind::Colon => ":",
      TokenKind::Dot => ".",
      TokenKind::LeftParen => "(",
      TokenKind::RightParen => ")",
      TokenKind::LeftBrace => "{",
      TokenKind::RightBrace => "}",
      TokenKind::LeftBracket => "[",
      TokenKind::RightBracket => "]",
      TokenKind::Function => "fn",
      TokenKind::True => "true",
      TokenKind::False => "false",
      TokenKind::Null => "null",
      TokenKind::If => "if",
      TokenKind::Else => "else",
      TokenKind::Return => "return",
      TokenKind::While => "while",
      TokenKind::Switch => "switch",
      TokenKind::Case => "case",
      TokenKind::Default => "default",
      TokenKind::Import => "import",
    };

    f.write_str(name)
  }
}

/// Byte range `[start, end)` of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span(pub usize, pub usize);

impl Span {
  pub fn offset(&self) -> usize {
    self.0
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub kind: TokenKind,
  pub slice: String,
  pub span: Span,
}

impl Token {
  pub fn new(kind: TokenKind, slice: String, span: Span) -> Token {
    Token {
      kind,
      slice,
      span,
    }
  }

  pub fn is(&self, kind: TokenKind) -> bool {
    self.kind == kind
  }
}
