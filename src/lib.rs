//! qomdb - A query-object-model (QOM) to SQL storage backend
//!
//! This crate provides:
//! - An abstract query object model (selectors, joins, constraint trees,
//!   comparisons against bound variables, orderings)
//! - A compiler lowering query objects into parameterized SQL text
//! - A storage backend executing statements through a pluggable database
//!   handle, with row overlays and page-cache invalidation
//! - An embedded reference handle (dialect parser + in-memory key-value
//!   engine) for end-to-end use without an external server

pub mod backend;
pub mod db;
pub mod error;
pub mod qom;
pub mod sql;
pub mod storage;
