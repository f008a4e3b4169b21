use crate::error::{Error, Result};
use crate::sql::types::Value;

/// Mutable accumulator for one SELECT compilation
///
/// Five ordered fragment lists plus a parallel parameter list. Invariant:
/// each `?` marker and its parameter are appended in the same step, so the
/// placeholder count in the assembled text equals the parameter count.
#[derive(Debug, Default)]
pub struct SqlAssembly {
    pub tables: Vec<String>,
    pub fields: Vec<String>,
    pub where_fragments: Vec<String>,
    pub enable_fields: Vec<String>,
    pub orderings: Vec<String>,
    pub parameters: Vec<Value>,
}

impl SqlAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles the accumulated fragments into one SELECT statement:
    /// `SELECT <fields> FROM <tables> [WHERE <where> [AND <enable-fields>]]
    /// [ORDER BY <orderings>]`
    ///
    /// With no where fragments, the WHERE clause is built from the
    /// enable-field fragments alone.
    pub fn into_select(self) -> SqlStatement {
        let mut text = format!(
            "SELECT {} FROM {}",
            self.fields.join(","),
            self.tables.join(" ")
        );

        if !self.where_fragments.is_empty() {
            text.push_str(" WHERE ");
            text.push_str(&self.where_fragments.concat());
            if !self.enable_fields.is_empty() {
                text.push_str(" AND ");
                text.push_str(&self.enable_fields.join(" AND "));
            }
        } else if !self.enable_fields.is_empty() {
            text.push_str(" WHERE ");
            text.push_str(&self.enable_fields.join(" AND "));
        }

        if !self.orderings.is_empty() {
            text.push_str(" ORDER BY ");
            text.push_str(&self.orderings.join(", "));
        }

        SqlStatement {
            text,
            parameters: self.parameters,
        }
    }
}

/// A compiled statement with positional `?` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub text: String,
    pub parameters: Vec<Value>,
}

impl SqlStatement {
    /// Binds parameters to placeholders, left to right
    ///
    /// Verifies that the placeholder count equals the parameter count, then
    /// splices the literal keyword `NULL` for null parameters (so `IS ?`
    /// becomes `IS NULL`, never a bound null) and keeps the remaining
    /// parameters for positional binding by the driver.
    ///
    /// The compiler never emits string literals into the statement text, so
    /// every `?` in the text is a placeholder.
    pub fn bind(self) -> Result<BoundStatement> {
        let placeholders = self.text.matches('?').count();
        if placeholders != self.parameters.len() {
            return Err(Error::ParameterCountMismatch {
                placeholders,
                parameters: self.parameters.len(),
            });
        }

        let mut text = String::with_capacity(self.text.len());
        let mut bound = Vec::with_capacity(self.parameters.len());
        let mut params = self.parameters.into_iter();
        for c in self.text.chars() {
            if c == '?' {
                match params.next() {
                    Some(Value::Null) => text.push_str("NULL"),
                    Some(value) => {
                        text.push('?');
                        bound.push(value);
                    }
                    None => unreachable!("placeholder count was checked above"),
                }
            } else {
                text.push(c);
            }
        }

        Ok(BoundStatement {
            text,
            parameters: bound,
        })
    }
}

/// A statement ready for execution: null parameters are spliced as the
/// `NULL` keyword, all remaining placeholders bind positionally
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub text: String,
    pub parameters: Vec<Value>,
}
