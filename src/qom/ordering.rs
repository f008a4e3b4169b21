use crate::qom::operand::DynamicOperand;

/// Sort direction (ascending or descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

/// An ordering over a dynamic operand
///
/// Only property-value operands take effect; orderings on wrapped operands
/// are skipped by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub operand: DynamicOperand,
    pub direction: OrderDirection,
}

impl Ordering {
    pub fn ascending(operand: DynamicOperand) -> Self {
        Self {
            operand,
            direction: OrderDirection::Ascending,
        }
    }

    pub fn descending(operand: DynamicOperand) -> Self {
        Self {
            operand,
            direction: OrderDirection::Descending,
        }
    }
}
