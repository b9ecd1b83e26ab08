//! Rule SQL lexer.
//!
//! A hand-written lexer producing tokens with byte spans, so that every
//! diagnostic can point back into the rule text.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
