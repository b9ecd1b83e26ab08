//! Tokenizer for sync rule SQL.

use super::{Keyword, Span, Token, TokenKind};

/// A lexer that tokenizes rule SQL.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace, `-- line` comments and `/* block */` comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            // Skip whitespace
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            // Skip single-line comments (-- ...)
            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            // Skip multi-line comments (/* ... */)
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        // Unterminated comments run to the end of input
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    const fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    const fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    fn error(&self, message: impl Into<String>) -> Token {
        self.make_token(TokenKind::Error(message.into()))
    }

    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        // Check if it's a keyword
        let text = &self.input[self.start..self.pos];
        Keyword::from_str(text).map_or_else(
            || self.make_token(TokenKind::Identifier(text.to_string())),
            |keyword| self.make_token(TokenKind::Keyword(keyword)),
        )
    }

    /// Scans a quoted identifier. Quoted identifiers are never keywords,
    /// so `"limit"` can name a column.
    fn scan_quoted_identifier(&mut self, quote: char) -> Token {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    // Check for escaped quote (doubled)
                    if self.peek() == Some(quote) {
                        value.push(quote);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
                None => return self.error("Unterminated quoted identifier"),
            }
        }

        self.make_token(TokenKind::Identifier(value))
    }

    fn scan_number(&mut self) -> Token {
        let mut is_float = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Check for decimal point
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Check for exponent
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            is_float = true;
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.input[self.start..self.pos];

        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return self.make_token(TokenKind::Integer(i));
            }
            // Integer literals outside the 64-bit range are reals, as in SQLite.
        }
        match text.parse::<f64>() {
            Ok(f) => self.make_token(TokenKind::Float(f)),
            Err(e) => self.error(format!("Invalid number {text}: {e}")),
        }
    }

    fn scan_string(&mut self) -> Token {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                Some('\'') => {
                    // Handle escaped quotes
                    if self.peek() == Some('\'') {
                        value.push('\'');
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
                None => return self.error("Unterminated string literal"),
            }
        }

        self.make_token(TokenKind::String(value))
    }

    /// Scans a blob literal (X'...' or x'...').
    fn scan_blob(&mut self) -> Token {
        self.advance(); // X
        self.advance(); // '

        let mut bytes = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.advance() {
                Some('\'') => break,
                Some(c) if c.is_ascii_hexdigit() => {
                    let nibble = c.to_digit(16).map_or(0, |d| d as u8);
                    // Two hex digits per byte, high nibble first
                    match pending.take() {
                        Some(high) => bytes.push((high << 4) | nibble),
                        None => pending = Some(nibble),
                    }
                }
                Some(_) => return self.error("Invalid character in blob literal"),
                None => return self.error("Unterminated blob literal"),
            }
        }

        if pending.is_some() {
            return self.error("Odd number of hex digits in blob literal");
        }

        self.make_token(TokenKind::Blob(bytes))
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let Some(c) = self.peek() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            // String literals
            '\'' => return self.scan_string(),
            // Quoted identifiers
            '"' | '`' => return self.scan_quoted_identifier(c),
            // Blob literals
            'X' | 'x' if self.peek_next() == Some('\'') => return self.scan_blob(),
            // Numbers
            c if c.is_ascii_digit() => return self.scan_number(),
            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => return self.scan_identifier(),
            _ => {}
        }

        self.advance();
        let kind = match c {
            // Single-character tokens
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '~' => TokenKind::BitNot,
            // Potentially multi-character tokens
            '=' => {
                // `==` is accepted as `=`
                if self.peek() == Some('=') {
                    self.advance();
                }
                TokenKind::Eq
            }
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    TokenKind::LtEq
                }
                Some('>') => {
                    self.advance();
                    TokenKind::NotEq
                }
                _ => TokenKind::Lt,
            },
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::NotEq
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenKind::Concat
            }
            _ => TokenKind::Error(format!("Unexpected character: {c}")),
        };
        self.make_token(kind)
    }

    /// Tokenizes the entire input, including the trailing EOF token.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(String::from(name))
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(token_kinds("   \n\t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            token_kinds("SELECT -- comment\n/* block */ 1"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Integer(1),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_parameter_query_tokens() {
        assert_eq!(
            token_kinds("SELECT token_parameters.user_id AS user_id"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                ident("token_parameters"),
                TokenKind::Dot,
                ident("user_id"),
                TokenKind::Keyword(Keyword::As),
                ident("user_id"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers_are_not_keywords() {
        assert_eq!(
            token_kinds("\"limit\" `Order Id` \"a\"\"b\""),
            vec![ident("limit"), ident("Order Id"), ident("a\"b"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            token_kinds("42 3.5 1e3 99999999999999999999"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Float(3.5),
                TokenKind::Float(1000.0),
                TokenKind::Float(1e20),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            token_kinds("'it''s' ''"),
            vec![
                TokenKind::String(String::from("it's")),
                TokenKind::String(String::new()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            &token_kinds("'abc")[0],
            TokenKind::Error(message) if message == "Unterminated string literal"
        ));
    }

    #[test]
    fn test_blob() {
        assert_eq!(
            token_kinds("X'0aFF' x''"),
            vec![
                TokenKind::Blob(vec![0x0a, 0xff]),
                TokenKind::Blob(vec![]),
                TokenKind::Eof,
            ]
        );
        assert!(matches!(&token_kinds("X'abc'")[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            token_kinds("= == != <> < <= > >= || + - * / % ~"),
            vec![
                TokenKind::Eq,
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Concat,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::BitNot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert!(matches!(
            &token_kinds("a ! b")[1],
            TokenKind::Error(message) if message == "Unexpected character: !"
        ));
    }

    #[test]
    fn test_span_tracking() {
        let tokens = Lexer::new("SELECT  bucket.id").tokenize();
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].span, Span::new(8, 14));
        assert_eq!(tokens[2].span, Span::new(14, 15));
        assert_eq!(tokens[3].span, Span::new(15, 17));
    }
}
