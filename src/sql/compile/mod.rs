//! Query compilation
//!
//! Lowers a query object into a flat SQL assembly:
//! - `source`: FROM/field fragments, enable-field and storage-page filters
//! - `constraint`: WHERE fragments with the shared parameter list
//! - `operand`: dynamic operands to column expressions
//! - `operator`: abstract operators to SQL tokens
//! - `ordering`: ORDER BY fragments

use crate::error::Result;
use crate::qom::Query;
use crate::sql::assembly::{SqlAssembly, SqlStatement};
use crate::sql::schema::SchemaRegistry;

mod constraint;
mod operand;
mod operator;
mod ordering;
mod source;

pub use operator::resolve_operator;

/// Compiles query objects into parameterized SELECT statements
pub struct Compiler<'a> {
    schema: &'a SchemaRegistry,
}

impl<'a> Compiler<'a> {
    pub fn new(schema: &'a SchemaRegistry) -> Self {
        Self { schema }
    }

    /// Lowers the query into one SELECT statement
    ///
    /// Fragment and parameter emission order is fixed: source first, then
    /// the constraint tree (the only placeholder producer), then orderings.
    pub fn compile(&self, query: &Query) -> Result<SqlStatement> {
        let mut sql = SqlAssembly::new();

        source::compile_source(query, self.schema, &mut sql)?;
        constraint::compile_constraint(
            query.constraint(),
            &mut sql,
            query.bound_variable_values(),
        )?;
        ordering::compile_orderings(query.orderings(), &mut sql);

        Ok(sql.into_select())
    }
}
