//! SQL Lexer - Tokenizes SQL input text into a stream of tokens

use std::{fmt::Display, iter::Peekable, str::Chars};

use crate::error::{Error, Result};

/// Represents a single lexical token in the SQL input
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// SQL reserved keyword
    Keyword(Keyword),
    /// Identifier such as table name or column name
    Ident(String),
    /// String literal
    String(String),
    /// Numeric literal (integer or floating-point)
    Number(String),
    /// Operators and punctuation
    OpenParen,
    CloseParen,
    Comma,
    Semicolon,
    Asterisk,
    Period,
    /// Positional parameter marker
    Question,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Token::Keyword(keyword) => keyword.to_str(),
            Token::Ident(ident) => ident,
            Token::String(v) => v,
            Token::Number(n) => n,
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Asterisk => "*",
            Token::Period => ".",
            Token::Question => "?",
            Token::Equal => "=",
            Token::NotEqual => "!=",
            Token::LessThan => "<",
            Token::LessThanOrEqual => "<=",
            Token::GreaterThan => ">",
            Token::GreaterThanOrEqual => ">=",
        })
    }
}

/// SQL reserved keywords
#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    Select,
    From,
    Where,
    Order,
    By,
    Asc,
    Desc,
    Left,
    Join,
    On,
    And,
    Or,
    Not,
    Is,
    Null,
    Like,
    Lower,
    Upper,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    True,
    False,
}

impl Keyword {
    /// Attempts to parse a string as a keyword (case-insensitive)
    pub fn from_str(ident: &str) -> Option<Keyword> {
        Some(match ident.to_uppercase().as_ref() {
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "ORDER" => Keyword::Order,
            "BY" => Keyword::By,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "LEFT" => Keyword::Left,
            "JOIN" => Keyword::Join,
            "ON" => Keyword::On,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "IS" => Keyword::Is,
            "NULL" => Keyword::Null,
            "LIKE" => Keyword::Like,
            "LOWER" => Keyword::Lower,
            "UPPER" => Keyword::Upper,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "UPDATE" => Keyword::Update,
            "SET" => Keyword::Set,
            "DELETE" => Keyword::Delete,
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            _ => return None,
        })
    }

    /// Returns the uppercase string representation of the keyword
    pub fn to_str(&self) -> &str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Left => "LEFT",
            Keyword::Join => "JOIN",
            Keyword::On => "ON",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::Is => "IS",
            Keyword::Null => "NULL",
            Keyword::Like => "LIKE",
            Keyword::Lower => "LOWER",
            Keyword::Upper => "UPPER",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// SQL lexical analyzer (lexer/tokenizer)
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scan() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => self
                .iter
                .peek()
                .map(|c| Err(Error::Parse(format!("[Lexer] Unexpected character {}", c)))),
            Err(err) => Some(Err(err)),
        }
    }
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given SQL text
    pub fn new(sql_text: &'a str) -> Self {
        Self {
            iter: sql_text.chars().peekable(),
        }
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&c| predicate(*c))?;
        self.iter.next()
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<String> {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        Some(value).filter(|v| !v.is_empty())
    }

    /// Removes whitespace from the input stream
    fn erase_whitespace(&mut self) {
        self.next_while(|c| c.is_whitespace());
    }

    /// Scans and returns the next token
    fn scan(&mut self) -> Result<Option<Token>> {
        self.erase_whitespace();
        match self.iter.peek() {
            Some('\'') => self.scan_string(),
            Some(c) if c.is_ascii_digit() => Ok(self.scan_number()),
            Some(c) if c.is_alphabetic() => Ok(self.scan_ident()),
            Some(_) => self.scan_symbol(),
            None => Ok(None),
        }
    }

    /// Scans a string literal (enclosed in single quotes)
    fn scan_string(&mut self) -> Result<Option<Token>> {
        self.iter.next();
        let mut val = String::new();

        loop {
            match self.iter.next() {
                Some('\'') => break,
                Some(c) => val.push(c),
                None => return Err(Error::Parse("[Lexer] Unexpected end of string".to_string())),
            }
        }
        Ok(Some(Token::String(val)))
    }

    /// Scans a numeric literal (integer or floating-point)
    fn scan_number(&mut self) -> Option<Token> {
        let mut val = self.next_while(|c| c.is_ascii_digit())?;
        if let Some(sep) = self.next_if(|c| c == '.') {
            val.push(sep);
            while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
                val.push(c);
            }
        }
        Some(Token::Number(val))
    }

    /// Scans an identifier or keyword
    fn scan_ident(&mut self) -> Option<Token> {
        let mut val = self.next_if(|c| c.is_alphabetic())?.to_string();
        while let Some(c) = self.next_if(|c| c.is_alphanumeric() || c == '_') {
            val.push(c);
        }
        // Returns Keyword if matched, otherwise returns as a regular Ident
        Some(Keyword::from_str(&val).map_or(Token::Ident(val.to_lowercase()), Token::Keyword))
    }

    /// Scans a one- or two-character symbol token
    fn scan_symbol(&mut self) -> Result<Option<Token>> {
        let token = match self.iter.peek() {
            Some('*') => Token::Asterisk,
            Some('(') => Token::OpenParen,
            Some(')') => Token::CloseParen,
            Some(',') => Token::Comma,
            Some(';') => Token::Semicolon,
            Some('.') => Token::Period,
            Some('?') => Token::Question,
            Some('=') => Token::Equal,
            Some('!') => {
                self.iter.next();
                return match self.iter.peek() {
                    Some('=') => {
                        self.iter.next();
                        Ok(Some(Token::NotEqual))
                    }
                    _ => Err(Error::Parse("[Lexer] Expected = after !".to_string())),
                };
            }
            Some('<') => {
                self.iter.next();
                return Ok(Some(match self.next_if(|c| c == '=') {
                    Some(_) => Token::LessThanOrEqual,
                    None => Token::LessThan,
                }));
            }
            Some('>') => {
                self.iter.next();
                return Ok(Some(match self.next_if(|c| c == '=') {
                    Some(_) => Token::GreaterThanOrEqual,
                    None => Token::GreaterThan,
                }));
            }
            _ => return Ok(None),
        };
        self.iter.next();
        Ok(Some(token))
    }
}
