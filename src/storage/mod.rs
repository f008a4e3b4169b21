//! Storage module
//!
//! Byte-level key-value storage backing the embedded reference handle:
//! - `engine`: the abstract storage engine interface
//! - `memory`: an in-memory BTreeMap-backed engine

pub mod engine;
pub mod memory;
