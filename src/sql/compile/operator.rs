use crate::qom::Operator;

/// Returns the SQL token for the given abstract operator
///
/// Total over the closed operator enum; unknown operator values are
/// unrepresentable.
pub fn resolve_operator(operator: Operator) -> &'static str {
    match operator {
        Operator::EqualToNull => "IS",
        Operator::NotEqualToNull => "IS NOT",
        Operator::EqualTo => "=",
        Operator::NotEqualTo => "!=",
        Operator::LessThan => "<",
        Operator::LessThanOrEqualTo => "<=",
        Operator::GreaterThan => ">",
        Operator::GreaterThanOrEqualTo => ">=",
        Operator::Like => "LIKE",
    }
}
