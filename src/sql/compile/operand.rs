use crate::qom::{DynamicOperand, Operator};
use crate::sql::assembly::SqlAssembly;
use crate::sql::compile::operator::resolve_operator;

/// Lowers a dynamic operand into one WHERE fragment:
/// `<column-expression> <operator> ?`
///
/// The matching parameter was appended by the constraint compiler in the
/// same step that dispatched here.
pub fn compile_dynamic_operand(
    operand: &DynamicOperand,
    operator: Operator,
    sql: &mut SqlAssembly,
) {
    let fragment = format!(
        "{} {} ?",
        column_expression(operand),
        resolve_operator(operator)
    );
    sql.where_fragments.push(fragment);
}

/// Builds the column expression for an operand, nesting function wrappers:
/// `sel.prop`, `LOWER(sel.prop)`, `LOWER(UPPER(sel.prop))`, ...
///
/// Every opened wrapper is closed. The selector prefix is omitted when the
/// selector name is empty.
pub fn column_expression(operand: &DynamicOperand) -> String {
    match operand {
        DynamicOperand::PropertyValue {
            selector_name,
            property_name,
        } => {
            if selector_name.is_empty() {
                property_name.clone()
            } else {
                format!("{}.{}", selector_name, property_name)
            }
        }
        DynamicOperand::LowerCase(inner) => format!("LOWER({})", column_expression(inner)),
        DynamicOperand::UpperCase(inner) => format!("UPPER({})", column_expression(inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_expression_plain_and_unqualified() {
        assert_eq!(
            column_expression(&DynamicOperand::property("t", "title")),
            "t.title"
        );
        assert_eq!(
            column_expression(&DynamicOperand::property("", "title")),
            "title"
        );
    }

    #[test]
    fn test_column_expression_nested_wrappers_close() {
        let operand = DynamicOperand::lower_case(DynamicOperand::upper_case(
            DynamicOperand::property("t", "title"),
        ));
        assert_eq!(column_expression(&operand), "LOWER(UPPER(t.title))");
    }

    #[test]
    fn test_compile_dynamic_operand_fragment() {
        let mut sql = SqlAssembly::new();
        compile_dynamic_operand(
            &DynamicOperand::property("t", "a"),
            Operator::GreaterThanOrEqualTo,
            &mut sql,
        );
        assert_eq!(sql.where_fragments, vec!["t.a >= ?".to_string()]);
    }
}
