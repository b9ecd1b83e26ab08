//! Token types for the rule lexer.

use super::Span;

/// Keywords recognised in sync rule queries.
///
/// Only words that affect the shape of a bucket query are keywords; type
/// names and function names lex as identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // Query clauses
    Select,
    From,
    Where,
    Order,
    By,
    Group,
    Having,
    Limit,
    Offset,
    Distinct,
    All,
    As,
    For,
    Update,
    Share,

    // Joins and set operations, rejected by the parser
    Join,
    Inner,
    Left,
    Right,
    Full,
    Cross,
    On,
    Union,

    // Operators
    And,
    Or,
    Not,
    In,
    Between,
    Like,
    Is,

    // Literals
    Null,
    True,
    False,

    // Ordering
    Asc,
    Desc,
    Nulls,
    First,
    Last,

    Cast,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::Select),
            "FROM" => Some(Self::From),
            "WHERE" => Some(Self::Where),
            "ORDER" => Some(Self::Order),
            "BY" => Some(Self::By),
            "GROUP" => Some(Self::Group),
            "HAVING" => Some(Self::Having),
            "LIMIT" => Some(Self::Limit),
            "OFFSET" => Some(Self::Offset),
            "DISTINCT" => Some(Self::Distinct),
            "ALL" => Some(Self::All),
            "AS" => Some(Self::As),
            "FOR" => Some(Self::For),
            "UPDATE" => Some(Self::Update),
            "SHARE" => Some(Self::Share),
            "JOIN" => Some(Self::Join),
            "INNER" => Some(Self::Inner),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "FULL" => Some(Self::Full),
            "CROSS" => Some(Self::Cross),
            "ON" => Some(Self::On),
            "UNION" => Some(Self::Union),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            "IN" => Some(Self::In),
            "BETWEEN" => Some(Self::Between),
            "LIKE" => Some(Self::Like),
            "IS" => Some(Self::Is),
            "NULL" => Some(Self::Null),
            "TRUE" => Some(Self::True),
            "FALSE" => Some(Self::False),
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            "NULLS" => Some(Self::Nulls),
            "FIRST" => Some(Self::First),
            "LAST" => Some(Self::Last),
            "CAST" => Some(Self::Cast),
            _ => None,
        }
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Order => "ORDER",
            Self::By => "BY",
            Self::Group => "GROUP",
            Self::Having => "HAVING",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
            Self::As => "AS",
            Self::For => "FOR",
            Self::Update => "UPDATE",
            Self::Share => "SHARE",
            Self::Join => "JOIN",
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Cross => "CROSS",
            Self::On => "ON",
            Self::Union => "UNION",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Like => "LIKE",
            Self::Is => "IS",
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Nulls => "NULLS",
            Self::First => "FIRST",
            Self::Last => "LAST",
            Self::Cast => "CAST",
        }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Float literal (e.g., 3.14)
    Float(f64),
    /// String literal (e.g., 'hello')
    String(String),
    /// Blob literal (e.g., X'1234')
    Blob(Vec<u8>),

    // Identifiers and keywords
    /// Identifier (e.g., `user_id`, `"Quoted Name"`)
    Identifier(String),
    /// SQL keyword
    Keyword(Keyword),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,
    /// ~
    BitNot,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

impl TokenKind {
    /// Short human-readable description, used in parse errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Integer(i) => format!("integer {i}"),
            Self::Float(f) => format!("number {f}"),
            Self::String(s) => format!("string '{s}'"),
            Self::Blob(_) => String::from("blob literal"),
            Self::Identifier(name) => format!("identifier {name}"),
            Self::Keyword(kw) => kw.as_str().to_string(),
            Self::Plus => String::from("'+'"),
            Self::Minus => String::from("'-'"),
            Self::Star => String::from("'*'"),
            Self::Slash => String::from("'/'"),
            Self::Percent => String::from("'%'"),
            Self::Eq => String::from("'='"),
            Self::NotEq => String::from("'!='"),
            Self::Lt => String::from("'<'"),
            Self::LtEq => String::from("'<='"),
            Self::Gt => String::from("'>'"),
            Self::GtEq => String::from("'>='"),
            Self::Concat => String::from("'||'"),
            Self::BitNot => String::from("'~'"),
            Self::LeftParen => String::from("'('"),
            Self::RightParen => String::from("')'"),
            Self::Comma => String::from("','"),
            Self::Semicolon => String::from("';'"),
            Self::Dot => String::from("'.'"),
            Self::Eof => String::from("end of input"),
            Self::Error(message) => message.clone(),
        }
    }
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}
