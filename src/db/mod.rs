//! Database handle abstraction
//!
//! The storage backend executes every statement through this seam. A handle
//! is externally owned, already open, and used for the lifetime of the
//! backend; connection pooling, transactions, retries, and timeouts are the
//! handle's business, not this crate's.

use crate::error::{Error, Result};
use crate::sql::assembly::BoundStatement;
use crate::sql::types::Row;

pub mod memory;

pub use memory::MemoryHandle;

/// A synchronous database handle
///
/// Driver failures are reported as `Error::Sql` carrying the driver's error
/// text verbatim. A failed statement yields no rows, never a partial set.
pub trait DatabaseHandle {
    /// Executes one bound statement
    fn execute(&mut self, statement: &BoundStatement) -> Result<ResultSet>;

    /// The identifier generated by the most recent INSERT
    fn last_insert_id(&self) -> i64;
}

/// Execution result set
#[derive(Debug, PartialEq)]
pub enum ResultSet {
    /// Rows produced by a SELECT
    Query { rows: Vec<Row> },
    /// Row count affected by an INSERT/UPDATE/DELETE
    Modified { count: usize },
}

impl ResultSet {
    /// Unwraps the rows of a query result
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            Self::Query { rows } => Ok(rows),
            Self::Modified { .. } => Err(Error::Internal(
                "expected a query result set, got a modification count".to_string(),
            )),
        }
    }
}
