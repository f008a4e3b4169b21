//! Query object model (QOM)
//!
//! The structured, language-agnostic representation of a query prior to SQL
//! compilation. Each polymorphic family is a closed sum type:
//! - `source`: selectors and the single supported left join
//! - `constraint`: boolean constraint trees and comparisons
//! - `operand`: dynamic operands (property values, case-folding wrappers)
//! - `ordering`: orderings with an ascending/descending direction

use std::collections::BTreeMap;

use crate::sql::types::Value;

pub mod constraint;
pub mod operand;
pub mod ordering;
pub mod source;

pub use constraint::{Constraint, Operator, StaticOperand};
pub use operand::DynamicOperand;
pub use ordering::{OrderDirection, Ordering};
pub use source::{JoinCondition, Source};

/// An immutable query request
///
/// Constructed by the caller, consumed once per `get_rows` invocation, never
/// mutated by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    source: Source,
    constraint: Option<Constraint>,
    orderings: Vec<Ordering>,
    bound_variable_values: BTreeMap<String, Value>,
    settings: QuerySettings,
}

impl Query {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            constraint: None,
            orderings: Vec::new(),
            bound_variable_values: BTreeMap::new(),
            settings: QuerySettings::default(),
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_orderings(mut self, orderings: Vec<Ordering>) -> Self {
        self.orderings = orderings;
        self
    }

    pub fn with_bound_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bound_variable_values.insert(name.into(), value);
        self
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub fn orderings(&self) -> &[Ordering] {
        &self.orderings
    }

    pub fn bound_variable_values(&self) -> &BTreeMap<String, Value> {
        &self.bound_variable_values
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }
}

/// Backend-specific query settings
///
/// `storage_page_id` is a trusted internal integer, inlined into the SQL text
/// rather than bound as a parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySettings {
    enable_fields: bool,
    storage_page_id: Option<i64>,
}

impl QuerySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enable_fields(mut self, enabled: bool) -> Self {
        self.enable_fields = enabled;
        self
    }

    pub fn with_storage_page_id(mut self, page_id: i64) -> Self {
        self.storage_page_id = Some(page_id);
        self
    }

    pub fn enable_fields_enabled(&self) -> bool {
        self.enable_fields
    }

    pub fn storage_page_id(&self) -> Option<i64> {
        self.storage_page_id
    }
}
