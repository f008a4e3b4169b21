use crate::qom::operand::DynamicOperand;
use crate::sql::types::Value;

/// A node in a boolean constraint tree
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
    Not(Box<Constraint>),
    /// A comparison between a dynamic operand and a static operand
    Comparison {
        operand1: DynamicOperand,
        operator: Operator,
        operand2: StaticOperand,
    },
    /// A relation predicate, opaque to the compiler beyond dispatch
    Related(RelatedPredicate),
}

impl Constraint {
    pub fn and(left: Constraint, right: Constraint) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Constraint, right: Constraint) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Constraint) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn comparison(
        operand1: DynamicOperand,
        operator: Operator,
        operand2: StaticOperand,
    ) -> Self {
        Self::Comparison {
            operand1,
            operator,
            operand2,
        }
    }
}

/// The second operand of a comparison
///
/// Only bound variables compile; a literal second operand is rejected with
/// an unsupported-operand-type error.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticOperand {
    /// A named placeholder resolved through the query's bound-value map
    BindVariable(String),
    /// A literal value
    Literal(Value),
}

impl StaticOperand {
    pub fn bind_variable(name: impl Into<String>) -> Self {
        Self::BindVariable(name.into())
    }
}

/// Comparison operators
///
/// `EqualToNull` and `NotEqualToNull` are backend-synthesized: the constraint
/// compiler rewrites `EqualTo`/`NotEqualTo` to them when the bound comparison
/// value resolves to null at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    Like,
    EqualToNull,
    NotEqualToNull,
}

/// An opaque relation predicate
///
/// Relation resolution is not part of the SQL compiler; the constraint
/// compiler dispatches on this variant and reports it as unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedPredicate {
    pub selector_name: String,
    pub property_name: String,
}
