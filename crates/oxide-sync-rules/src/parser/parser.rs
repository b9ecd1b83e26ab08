//! Recursive descent parser for sync rule queries.

use super::error::ParseError;
use super::pratt::{infix_binding_power, token_to_binary_op, token_to_unary_op};
use crate::ast::{
    BinaryOp, CastType, Expr, ExprKind, FunctionCall, InTarget, Literal, LockStrength,
    LockingClause, OrderBy, OrderDirection, SelectColumn, SelectStatement, TableRef, UnaryOp,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Rule SQL parser.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::default()),
        }
    }

    /// Parses a complete input consisting of one SELECT statement and an
    /// optional trailing semicolon.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single valid SELECT.
    pub fn parse_select(&mut self) -> Result<SelectStatement, ParseError> {
        if !self.check_keyword(Keyword::Select) {
            return Err(ParseError::unexpected(
                "SELECT",
                self.current.kind.clone(),
                self.current.span,
            ));
        }
        let statement = self.parse_select_statement()?;

        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        if !self.current.is_eof() {
            return Err(ParseError::unexpected(
                "end of statement",
                self.current.kind.clone(),
                self.current.span,
            ));
        }
        Ok(statement)
    }

    fn parse_select_statement(&mut self) -> Result<SelectStatement, ParseError> {
        let start = self.current.span;
        self.expect_keyword(Keyword::Select)?;

        // DISTINCT or ALL
        let distinct = if self.check_keyword(Keyword::Distinct) {
            let span = self.current.span;
            self.advance();
            Some(span)
        } else {
            if self.check_keyword(Keyword::All) {
                self.advance();
            }
            None
        };

        // SELECT columns
        let columns = self.parse_select_columns()?;

        // Parameter queries have no FROM clause.
        let from = if self.check_keyword(Keyword::From) {
            self.advance();
            Some(self.parse_table_ref()?)
        } else {
            None
        };

        // WHERE clause
        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        // The clauses below are not supported by sync rules. They are
        // parsed so they can be reported with their location.

        // GROUP BY clause
        let group_by = if self.check_keyword(Keyword::Group) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            vec![]
        };

        // HAVING clause
        let having = if self.check_keyword(Keyword::Having) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        // ORDER BY clause
        let order_by = if self.check_keyword(Keyword::Order) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            vec![]
        };

        // LIMIT clause
        let limit = if self.check_keyword(Keyword::Limit) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        // OFFSET clause
        let offset = if self.check_keyword(Keyword::Offset) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        // FOR UPDATE / FOR SHARE
        let locking = if self.check_keyword(Keyword::For) {
            Some(self.parse_locking_clause()?)
        } else {
            None
        };

        Ok(SelectStatement {
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
            locking,
            span: start.merge(self.previous.span),
        })
    }

    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = vec![];

        loop {
            let expr = self.parse_expression(0)?;

            // Check for alias (AS name or just name)
            let alias = if self.check_keyword(Keyword::As) {
                self.advance();
                Some(self.expect_identifier()?)
            } else if matches!(&self.current.kind, TokenKind::Identifier(_)) {
                Some(self.expect_identifier()?)
            } else {
                None
            };

            columns.push(SelectColumn { expr, alias });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(columns)
    }

    /// Parses the single table of a FROM clause.
    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let start = self.current.span;
        // Optionally schema-qualified table name
        let first = self.expect_identifier()?;
        let (schema, name) = if self.check(&TokenKind::Dot) {
            self.advance();
            (Some(first), self.expect_identifier()?)
        } else {
            (None, first)
        };

        let alias = if self.check_keyword(Keyword::As) {
            self.advance();
            Some(self.expect_identifier()?)
        } else if matches!(&self.current.kind, TokenKind::Identifier(_)) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        let span = start.merge(self.previous.span);

        // Joins and comma-separated tables
        if self.check(&TokenKind::Comma) || self.is_join_keyword() {
            return Err(ParseError::new(
                "Sync rule queries can only select from a single table",
                self.current.span,
            ));
        }

        Ok(TableRef {
            schema,
            name,
            alias,
            span,
        })
    }

    fn is_join_keyword(&self) -> bool {
        matches!(
            &self.current.kind,
            TokenKind::Keyword(
                Keyword::Join
                    | Keyword::Inner
                    | Keyword::Left
                    | Keyword::Right
                    | Keyword::Full
                    | Keyword::Cross
            )
        )
    }

    fn parse_order_by_list(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        let mut items = vec![];
        loop {
            let expr = self.parse_expression(0)?;
            let direction = if self.check_keyword(Keyword::Desc) {
                self.advance();
                OrderDirection::Desc
            } else {
                if self.check_keyword(Keyword::Asc) {
                    self.advance();
                }
                OrderDirection::Asc
            };
            // NULLS FIRST / NULLS LAST
            if self.check_keyword(Keyword::Nulls) {
                self.advance();
                if self.check_keyword(Keyword::First) || self.check_keyword(Keyword::Last) {
                    self.advance();
                } else {
                    return Err(ParseError::unexpected(
                        "FIRST or LAST",
                        self.current.kind.clone(),
                        self.current.span,
                    ));
                }
            }

            items.push(OrderBy { expr, direction });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(items)
    }

    fn parse_locking_clause(&mut self) -> Result<LockingClause, ParseError> {
        let start = self.current.span;
        self.expect_keyword(Keyword::For)?;
        let strength = match &self.current.kind {
            TokenKind::Keyword(Keyword::Update) => LockStrength::Update,
            TokenKind::Keyword(Keyword::Share) => LockStrength::Share,
            other => {
                return Err(ParseError::unexpected(
                    "UPDATE or SHARE",
                    other.clone(),
                    self.current.span,
                ));
            }
        };
        self.advance();
        Ok(LockingClause {
            strength,
            span: start.merge(self.previous.span),
        })
    }

    /// Parses an expression using Pratt parsing.
    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        // Parse prefix (primary expression or unary operator)
        let mut lhs = self.parse_prefix()?;

        // Parse infix operators
        loop {
            // Check if current token is an infix operator
            let Some((l_bp, r_bp)) = infix_binding_power(&self.current.kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }

            // Handle special infix operators
            lhs = match &self.current.kind {
                // IS [NOT] NULL, or IS [NOT] <expr>
                TokenKind::Keyword(Keyword::Is) => {
                    self.advance();
                    let negated = if self.check_keyword(Keyword::Not) {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    if self.check_keyword(Keyword::Null) {
                        self.advance();
                        let span = lhs.span.merge(self.previous.span);
                        Expr::new(
                            ExprKind::IsNull {
                                expr: Box::new(lhs),
                                negated,
                            },
                            span,
                        )
                    } else {
                        let rhs = self.parse_expression(r_bp)?;
                        let op = if negated { BinaryOp::IsNot } else { BinaryOp::Is };
                        lhs.binary(op, rhs)
                    }
                }
                TokenKind::Keyword(Keyword::Not) => {
                    self.advance();
                    self.parse_negated_infix(lhs, r_bp)?
                }
                TokenKind::Keyword(Keyword::In) => {
                    self.advance();
                    self.parse_in(lhs, false, r_bp)?
                }
                TokenKind::Keyword(Keyword::Between) => {
                    self.advance();
                    self.parse_between(lhs, false, r_bp)?
                }
                // Standard binary operator
                kind => {
                    let Some(op) = token_to_binary_op(kind) else {
                        break;
                    };
                    self.advance();
                    let rhs = self.parse_expression(r_bp)?;
                    lhs.binary(op, rhs)
                }
            };
        }

        Ok(lhs)
    }

    /// Parses the remainder of `lhs NOT IN ...`, `lhs NOT BETWEEN ...` or
    /// `lhs NOT LIKE ...`; the `NOT` has been consumed.
    fn parse_negated_infix(&mut self, lhs: Expr, r_bp: u8) -> Result<Expr, ParseError> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::In) => {
                self.advance();
                self.parse_in(lhs, true, r_bp)
            }
            TokenKind::Keyword(Keyword::Between) => {
                self.advance();
                self.parse_between(lhs, true, r_bp)
            }
            TokenKind::Keyword(Keyword::Like) => {
                self.advance();
                let rhs = self.parse_expression(r_bp)?;
                // NOT LIKE is NOT (lhs LIKE rhs)
                let like = lhs.binary(BinaryOp::Like, rhs);
                let span = like.span;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(like),
                    },
                    span,
                ))
            }
            other => Err(ParseError::unexpected(
                "IN, BETWEEN or LIKE after NOT",
                other.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_in(&mut self, lhs: Expr, negated: bool, r_bp: u8) -> Result<Expr, ParseError> {
        // IN (a, b, ...), possibly empty
        let target = if self.check(&TokenKind::LeftParen) {
            self.advance();
            let list = if self.check(&TokenKind::RightParen) {
                vec![]
            } else {
                self.parse_expression_list()?
            };
            self.expect(&TokenKind::RightParen)?;
            InTarget::List(list)
        } else {
            // IN <expr>, an expression holding a JSON array
            InTarget::Array(Box::new(self.parse_expression(r_bp)?))
        };

        let span = lhs.span.merge(self.previous.span);
        Ok(Expr::new(
            ExprKind::In {
                expr: Box::new(lhs),
                target,
                negated,
            },
            span,
        ))
    }

    fn parse_between(&mut self, lhs: Expr, negated: bool, r_bp: u8) -> Result<Expr, ParseError> {
        // Bounds bind tighter than AND, so the AND here is the separator
        let low = self.parse_expression(r_bp)?;
        self.expect_keyword(Keyword::And)?;
        let high = self.parse_expression(r_bp)?;
        let span = lhs.span.merge(high.span);
        Ok(Expr::new(
            ExprKind::Between {
                expr: Box::new(lhs),
                low: Box::new(low),
                high: Box::new(high),
                negated,
            },
            span,
        ))
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        // Check for unary operators
        if let Some((op, bp)) = token_to_unary_op(&self.current.kind) {
            let start = self.current.span;
            self.advance();
            let operand = self.parse_expression(bp)?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current.clone();

        // Literals
        let literal = match token.kind {
            TokenKind::Integer(n) => Some(Literal::Integer(n)),
            TokenKind::Float(f) => Some(Literal::Float(f)),
            TokenKind::String(s) => Some(Literal::String(s)),
            TokenKind::Blob(b) => Some(Literal::Blob(b)),
            TokenKind::Keyword(Keyword::True) => Some(Literal::Boolean(true)),
            TokenKind::Keyword(Keyword::False) => Some(Literal::Boolean(false)),
            TokenKind::Keyword(Keyword::Null) => Some(Literal::Null),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(Expr::new(ExprKind::Literal(literal), token.span));
        }

        match &self.current.kind {
            // Wildcard
            TokenKind::Star => {
                self.advance();
                Ok(Expr::new(ExprKind::Wildcard { table: None }, token.span))
            }

            // Parenthesized expression
            TokenKind::LeftParen => {
                self.advance();
                let mut expr = self.parse_expression(0)?;
                self.expect(&TokenKind::RightParen)?;
                expr.span = token.span.merge(self.previous.span);
                Ok(expr)
            }

            // CAST expression
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast_expression(),

            // Identifier (column reference or function call)
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();

                // Check for function call
                if self.check(&TokenKind::LeftParen) {
                    return self.parse_function_call(name, token.span);
                }

                // Check for qualified name (table.column or table.*)
                if self.check(&TokenKind::Dot) {
                    self.advance();
                    if self.check(&TokenKind::Star) {
                        self.advance();
                        return Ok(Expr::new(
                            ExprKind::Wildcard { table: Some(name) },
                            token.span.merge(self.previous.span),
                        ));
                    }
                    let column = self.expect_identifier()?;
                    return Ok(Expr::new(
                        ExprKind::Column {
                            table: Some(name),
                            name: column,
                        },
                        token.span.merge(self.previous.span),
                    ));
                }

                Ok(Expr::new(ExprKind::Column { table: None, name }, token.span))
            }

            other => Err(ParseError::unexpected(
                "expression",
                other.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_function_call(&mut self, name: String, start: Span) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let args = if self.check(&TokenKind::RightParen) {
            vec![]
        } else {
            self.parse_expression_list()?
        };

        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::new(
            ExprKind::Function(FunctionCall { name, args }),
            start.merge(self.previous.span),
        ))
    }

    /// Parses `CAST(expr AS type)`. The type is one or more words with an
    /// optional `(n)` or `(n, m)` suffix, resolved by affinity.
    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span;
        self.expect_keyword(Keyword::Cast)?;
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;
        self.expect_keyword(Keyword::As)?;

        // Type name words, e.g. DOUBLE PRECISION
        let mut type_name = self.expect_identifier()?;
        while let TokenKind::Identifier(word) = &self.current.kind {
            type_name.push(' ');
            type_name.push_str(word);
            self.advance();
        }
        // Size arguments are ignored
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            loop {
                match &self.current.kind {
                    TokenKind::Integer(_) | TokenKind::Comma => self.advance(),
                    _ => break,
                }
            }
            self.expect(&TokenKind::RightParen)?;
        }
        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::new(
            ExprKind::Cast {
                expr: Box::new(expr),
                cast_as: CastType::from_type_name(&type_name),
            },
            start.merge(self.previous.span),
        ))
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![];
        loop {
            exprs.push(self.parse_expression(0)?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(exprs)
    }

    // --- Helper methods ---

    fn advance(&mut self) {
        self.previous = core::mem::replace(&mut self.current, self.lexer.next_token());
    }

    /// Checks if the current token has the same kind as `kind`, ignoring payloads.
    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current.kind) == core::mem::discriminant(kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                kind.describe(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                keyword.as_str(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::unexpected(
                "identifier",
                other.clone(),
                self.current.span,
            )),
        }
    }
}
