use std::collections::BTreeMap;
use std::iter::Peekable;

use crate::error::{Error, Result};
use crate::sql::parser::ast::{ColumnRef, Expression, FromItem, Operation, SelectItem};
use crate::sql::parser::lexer::{Keyword, Lexer, Token};

pub mod ast;
mod lexer;

/// SQL Parser - Converts tokens into Abstract Syntax Tree (AST)
///
/// Covers exactly the dialect the query compiler and row codec emit: SELECT
/// with star/qualified-star fields, one LEFT JOIN with an ON equality, WHERE
/// expression trees, ORDER BY, plus INSERT/UPDATE/DELETE with positional
/// placeholders.
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
    /// Count of `?` markers seen so far, in text order
    placeholders: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given SQL input
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input).peekable(),
            placeholders: 0,
        }
    }

    /// Parses the input SQL statement into an AST
    pub fn parse(&mut self) -> Result<ast::Statement> {
        let stmt = self.parse_statement()?;
        // The trailing semicolon is optional; nothing may follow it
        self.next_if_token(Token::Semicolon);
        if let Some(token) = self.peek()? {
            return Err(Error::Parse(format!("[Parser] Unexpected token {}", token)));
        }
        Ok(stmt)
    }

    /// Parses a statement based on the first token
    fn parse_statement(&mut self) -> Result<ast::Statement> {
        match self.peek()? {
            Some(Token::Keyword(Keyword::Select)) => self.parse_select(),
            Some(Token::Keyword(Keyword::Insert)) => self.parse_insert(),
            Some(Token::Keyword(Keyword::Update)) => self.parse_update(),
            Some(Token::Keyword(Keyword::Delete)) => self.parse_delete(),
            Some(t) => Err(Error::Parse(format!("[Parser] Unexpected token {}", t))),
            None => Err(Error::Parse("[Parser] Unexpected end of input".to_string())),
        }
    }

    /// Parses SELECT statement
    fn parse_select(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Select))?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_select_item()?);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }

        self.next_expect(Token::Keyword(Keyword::From))?;
        let from = self.parse_from_item()?;
        let filter = self.parse_where_clause()?;
        let order_by = self.parse_order_by()?;

        Ok(ast::Statement::Select {
            columns,
            from,
            filter,
            order_by,
        })
    }

    /// Parses one SELECT field list entry: `*`, `table.*`, or a column
    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self.next_if_token(Token::Asterisk).is_some() {
            return Ok(SelectItem::All);
        }
        let name = self.next_ident()?;
        if self.next_if_token(Token::Period).is_some() {
            if self.next_if_token(Token::Asterisk).is_some() {
                return Ok(SelectItem::TableAll(name));
            }
            let column = self.next_ident()?;
            return Ok(SelectItem::Column(ColumnRef {
                table: Some(name),
                column,
            }));
        }
        Ok(SelectItem::Column(ColumnRef {
            table: None,
            column: name,
        }))
    }

    /// Parses the FROM clause: a table, optionally left-joined with another
    fn parse_from_item(&mut self) -> Result<FromItem> {
        let left = self.next_ident()?;
        if self.next_if_token(Token::Keyword(Keyword::Left)).is_none() {
            return Ok(FromItem::Table { name: left });
        }

        self.next_expect(Token::Keyword(Keyword::Join))?;
        let right = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::On))?;
        let on_left = self.parse_column_ref()?;
        self.next_expect(Token::Equal)?;
        let on_right = self.parse_column_ref()?;

        Ok(FromItem::Join {
            left,
            right,
            on: (on_left, on_right),
        })
    }

    /// Parses INSERT statement
    fn parse_insert(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Insert))?;
        self.next_expect(Token::Keyword(Keyword::Into))?;
        let table_name = self.next_ident()?;

        self.next_expect(Token::OpenParen)?;
        let mut columns = Vec::new();
        if self.next_if_token(Token::CloseParen).is_none() {
            loop {
                columns.push(self.next_ident()?);
                match self.next()? {
                    Token::CloseParen => break,
                    Token::Comma => {}
                    token => {
                        return Err(Error::Parse(format!("[Parser] Unexpected token {}", token)));
                    }
                }
            }
        }

        self.next_expect(Token::Keyword(Keyword::Values))?;
        let mut values = Vec::new();
        loop {
            self.next_expect(Token::OpenParen)?;
            let mut exprs = Vec::new();
            if self.next_if_token(Token::CloseParen).is_none() {
                loop {
                    exprs.push(self.parse_expression()?);
                    match self.next()? {
                        Token::CloseParen => break,
                        Token::Comma => {}
                        token => {
                            return Err(Error::Parse(format!(
                                "[Parser] Unexpected token {}",
                                token
                            )));
                        }
                    }
                }
            }
            values.push(exprs);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }

        Ok(ast::Statement::Insert {
            table_name,
            columns,
            values,
        })
    }

    /// Parses UPDATE statement
    fn parse_update(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Update))?;
        let table_name = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Set))?;

        let mut columns = BTreeMap::new();
        loop {
            let col = self.next_ident()?;
            self.next_expect(Token::Equal)?;
            let value = self.parse_operand()?;
            if columns.contains_key(&col) {
                return Err(Error::Parse(format!(
                    "[Parser] Duplicate column {} for update",
                    col
                )));
            }
            columns.insert(col, value);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }

        Ok(ast::Statement::Update {
            table_name,
            columns,
            filter: self.parse_where_clause()?,
        })
    }

    /// Parses DELETE statement
    fn parse_delete(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Delete))?;
        self.next_expect(Token::Keyword(Keyword::From))?;
        let table_name = self.next_ident()?;

        Ok(ast::Statement::Delete {
            table_name,
            filter: self.parse_where_clause()?,
        })
    }

    /// Parses the optional WHERE clause
    fn parse_where_clause(&mut self) -> Result<Option<Expression>> {
        if self.next_if_token(Token::Keyword(Keyword::Where)).is_none() {
            return Ok(None);
        }
        Ok(Some(self.parse_expression()?))
    }

    /// Parses the optional ORDER BY clause
    fn parse_order_by(&mut self) -> Result<Vec<(String, ast::OrderDirection)>> {
        let mut order_by = Vec::new();
        if self.next_if_token(Token::Keyword(Keyword::Order)).is_none() {
            return Ok(order_by);
        }
        self.next_expect(Token::Keyword(Keyword::By))?;

        loop {
            let column = self.parse_column_ref()?.column;
            let direction = if self.next_if_token(Token::Keyword(Keyword::Desc)).is_some() {
                ast::OrderDirection::Desc
            } else {
                self.next_if_token(Token::Keyword(Keyword::Asc));
                ast::OrderDirection::Asc
            };
            order_by.push((column, direction));
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        Ok(order_by)
    }

    /// Parses an expression; precedence: OR < AND < NOT < comparison
    fn parse_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_and_expression()?;
        while self.next_if_token(Token::Keyword(Keyword::Or)).is_some() {
            let right = self.parse_and_expression()?;
            left = Operation::Or(Box::new(left), Box::new(right)).into();
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_not_expression()?;
        while self.next_if_token(Token::Keyword(Keyword::And)).is_some() {
            let right = self.parse_not_expression()?;
            left = Operation::And(Box::new(left), Box::new(right)).into();
        }
        Ok(left)
    }

    fn parse_not_expression(&mut self) -> Result<Expression> {
        if self.next_if_token(Token::Keyword(Keyword::Not)).is_some() {
            let inner = self.parse_not_expression()?;
            return Ok(Operation::Not(Box::new(inner)).into());
        }
        self.parse_comparison()
    }

    /// Parses an operand optionally followed by one comparison operator
    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_operand()?;

        let operation = match self.peek()? {
            Some(Token::Equal) => Operation::Equal,
            Some(Token::NotEqual) => Operation::NotEqual,
            Some(Token::LessThan) => Operation::LessThan,
            Some(Token::LessThanOrEqual) => Operation::LessThanOrEqual,
            Some(Token::GreaterThan) => Operation::GreaterThan,
            Some(Token::GreaterThanOrEqual) => Operation::GreaterThanOrEqual,
            Some(Token::Keyword(Keyword::Like)) => Operation::Like,
            Some(Token::Keyword(Keyword::Is)) => {
                self.next()?;
                let negated = self.next_if_token(Token::Keyword(Keyword::Not)).is_some();
                self.next_expect(Token::Keyword(Keyword::Null))?;
                let op = if negated {
                    Operation::IsNotNull(Box::new(left))
                } else {
                    Operation::IsNull(Box::new(left))
                };
                return Ok(op.into());
            }
            _ => return Ok(left),
        };

        self.next()?;
        let right = self.parse_operand()?;
        Ok(operation(Box::new(left), Box::new(right)).into())
    }

    /// Parses an operand: literal, placeholder, column reference, function
    /// call, or a parenthesized expression
    fn parse_operand(&mut self) -> Result<Expression> {
        Ok(match self.next()? {
            Token::OpenParen => {
                let expr = self.parse_expression()?;
                self.next_expect(Token::CloseParen)?;
                expr
            }
            Token::Question => {
                let index = self.placeholders;
                self.placeholders += 1;
                Expression::Placeholder(index)
            }
            Token::Number(n) => {
                if n.chars().all(|c| c.is_ascii_digit()) {
                    ast::Consts::Integer(n.parse()?).into()
                } else {
                    ast::Consts::Float(n.parse()?).into()
                }
            }
            Token::String(s) => ast::Consts::String(s).into(),
            Token::Keyword(Keyword::True) => ast::Consts::Boolean(true).into(),
            Token::Keyword(Keyword::False) => ast::Consts::Boolean(false).into(),
            Token::Keyword(Keyword::Null) => ast::Consts::Null.into(),
            Token::Keyword(keyword @ (Keyword::Lower | Keyword::Upper)) => {
                let function = match keyword {
                    Keyword::Lower => ast::Function::Lower,
                    _ => ast::Function::Upper,
                };
                self.next_expect(Token::OpenParen)?;
                let inner = self.parse_operand()?;
                self.next_expect(Token::CloseParen)?;
                Expression::Function(function, Box::new(inner))
            }
            Token::Ident(name) => {
                if self.next_if_token(Token::Period).is_some() {
                    let column = self.next_ident()?;
                    Expression::Column(ColumnRef {
                        table: Some(name),
                        column,
                    })
                } else {
                    Expression::Column(ColumnRef {
                        table: None,
                        column: name,
                    })
                }
            }
            t => {
                return Err(Error::Parse(format!(
                    "[Parser] Unexpected expression token {}",
                    t
                )));
            }
        })
    }

    /// Parses a column reference, optionally qualified
    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let name = self.next_ident()?;
        if self.next_if_token(Token::Period).is_some() {
            let column = self.next_ident()?;
            return Ok(ColumnRef {
                table: Some(name),
                column,
            });
        }
        Ok(ColumnRef {
            table: None,
            column: name,
        })
    }

    /// Peeks at the next token
    fn peek(&mut self) -> Result<Option<Token>> {
        self.lexer.peek().cloned().transpose()
    }

    /// Consumes and returns the next token
    fn next(&mut self) -> Result<Token> {
        self.lexer
            .next()
            .unwrap_or_else(|| Err(Error::Parse("[Parser] Unexpected end of input".to_string())))
    }

    /// Expects and consumes an identifier
    fn next_ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(ident) => Ok(ident),
            token => Err(Error::Parse(format!(
                "[Parser] Expected ident, got token {}",
                token
            ))),
        }
    }

    /// Expects a specific token, returns error if different
    fn next_expect(&mut self, expect: Token) -> Result<()> {
        let token = self.next()?;
        if token != expect {
            return Err(Error::Parse(format!(
                "[Parser] Expected token {}, got {}",
                expect, token
            )));
        }
        Ok(())
    }

    /// Consumes next token if it matches the given token
    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        match self.peek() {
            Ok(Some(t)) if t == token => self.next().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Parser;
    use super::ast::{
        self, ColumnRef, Consts, Expression, FromItem, Operation, SelectItem,
    };
    use crate::error::Result;

    #[test]
    fn test_parser_select_join() -> Result<()> {
        let stmt = Parser::new("SELECT a.*,b.* FROM a LEFT JOIN b ON a.uid = b.parent").parse()?;

        assert_eq!(
            stmt,
            ast::Statement::Select {
                columns: vec![
                    SelectItem::TableAll("a".to_string()),
                    SelectItem::TableAll("b".to_string()),
                ],
                from: FromItem::Join {
                    left: "a".to_string(),
                    right: "b".to_string(),
                    on: (
                        ColumnRef {
                            table: Some("a".to_string()),
                            column: "uid".to_string()
                        },
                        ColumnRef {
                            table: Some("b".to_string()),
                            column: "parent".to_string()
                        },
                    ),
                },
                filter: None,
                order_by: vec![],
            }
        );
        Ok(())
    }

    #[test]
    fn test_parser_select_where_tree() -> Result<()> {
        let stmt =
            Parser::new("SELECT t.* FROM t WHERE (t.a = ? AND NOT (t.b LIKE ?)) ORDER BY a ASC, b DESC")
                .parse()?;

        let ast::Statement::Select {
            filter: Some(filter),
            order_by,
            ..
        } = stmt
        else {
            panic!("expected a select with a filter");
        };

        assert_eq!(
            filter,
            Operation::And(
                Box::new(
                    Operation::Equal(
                        Box::new(Expression::Column(ColumnRef {
                            table: Some("t".to_string()),
                            column: "a".to_string()
                        })),
                        Box::new(Expression::Placeholder(0)),
                    )
                    .into()
                ),
                Box::new(
                    Operation::Not(Box::new(
                        Operation::Like(
                            Box::new(Expression::Column(ColumnRef {
                                table: Some("t".to_string()),
                                column: "b".to_string()
                            })),
                            Box::new(Expression::Placeholder(1)),
                        )
                        .into()
                    ))
                    .into()
                ),
            )
            .into()
        );
        assert_eq!(
            order_by,
            vec![
                ("a".to_string(), ast::OrderDirection::Asc),
                ("b".to_string(), ast::OrderDirection::Desc),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parser_is_null() -> Result<()> {
        let stmt = Parser::new("SELECT t.* FROM t WHERE t.a IS NULL AND t.b IS NOT NULL").parse()?;

        let ast::Statement::Select {
            filter: Some(filter),
            ..
        } = stmt
        else {
            panic!("expected a select with a filter");
        };

        let column = |name: &str| {
            Box::new(Expression::Column(ColumnRef {
                table: Some("t".to_string()),
                column: name.to_string(),
            }))
        };
        assert_eq!(
            filter,
            Operation::And(
                Box::new(Operation::IsNull(column("a")).into()),
                Box::new(Operation::IsNotNull(column("b")).into()),
            )
            .into()
        );
        Ok(())
    }

    #[test]
    fn test_parser_function_wrapped_column() -> Result<()> {
        let stmt = Parser::new("SELECT t.* FROM t WHERE LOWER(UPPER(t.a)) LIKE ?").parse()?;

        let ast::Statement::Select {
            filter: Some(filter),
            ..
        } = stmt
        else {
            panic!("expected a select with a filter");
        };

        assert_eq!(
            filter,
            Operation::Like(
                Box::new(Expression::Function(
                    ast::Function::Lower,
                    Box::new(Expression::Function(
                        ast::Function::Upper,
                        Box::new(Expression::Column(ColumnRef {
                            table: Some("t".to_string()),
                            column: "a".to_string()
                        })),
                    )),
                )),
                Box::new(Expression::Placeholder(0)),
            )
            .into()
        );
        Ok(())
    }

    #[test]
    fn test_parser_insert() -> Result<()> {
        let stmt = Parser::new("INSERT INTO tbl (a, b) VALUES (?, 'x')").parse()?;
        assert_eq!(
            stmt,
            ast::Statement::Insert {
                table_name: "tbl".to_string(),
                columns: vec!["a".to_string(), "b".to_string()],
                values: vec![vec![
                    Expression::Placeholder(0),
                    Consts::String("x".to_string()).into(),
                ]],
            }
        );
        Ok(())
    }

    #[test]
    fn test_parser_update_and_delete() -> Result<()> {
        let stmt = Parser::new("UPDATE tbl SET a=?, b=? WHERE uid=?").parse()?;
        let ast::Statement::Update {
            table_name,
            columns,
            filter,
        } = stmt
        else {
            panic!("expected an update");
        };
        assert_eq!(table_name, "tbl");
        assert_eq!(columns.len(), 2);
        assert_eq!(columns["a"], Expression::Placeholder(0));
        assert_eq!(columns["b"], Expression::Placeholder(1));
        assert_eq!(
            filter,
            Some(
                Operation::Equal(
                    Box::new(Expression::Column(ColumnRef {
                        table: None,
                        column: "uid".to_string()
                    })),
                    Box::new(Expression::Placeholder(2)),
                )
                .into()
            )
        );

        let stmt = Parser::new("DELETE FROM tbl WHERE uid=?").parse()?;
        assert!(matches!(stmt, ast::Statement::Delete { .. }));
        Ok(())
    }

    #[test]
    fn test_parser_rejects_trailing_tokens() {
        assert!(Parser::new("SELECT t.* FROM t; garbage").parse().is_err());
    }
}
