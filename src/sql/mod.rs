//! SQL processing module
//!
//! This module provides:
//! - `types`: scalar values and rows
//! - `schema`: per-table registry for enable-field filters
//! - `assembly`: the SQL assembly buffer and parameter binding
//! - `compile`: lowering of query objects into SQL fragments
//! - `codec`: row-to-statement codec for INSERT/UPDATE/DELETE
//! - `parser`: lexer and parser for the emitted dialect (used by the
//!   embedded reference handle)

pub mod assembly;
pub mod codec;
pub mod compile;
pub mod parser;
pub mod schema;
pub mod types;
