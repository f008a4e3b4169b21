use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::qom::{Constraint, Operator, StaticOperand};
use crate::sql::assembly::SqlAssembly;
use crate::sql::compile::operand::compile_dynamic_operand;
use crate::sql::types::Value;

/// Lowers a constraint tree into flat WHERE fragments
///
/// Parameter ordering is implicit in emission order: each comparison appends
/// its parameter and its `?` fragment in one step, so the left-to-right
/// placeholder/parameter alignment holds for any tree shape.
pub fn compile_constraint(
    constraint: Option<&Constraint>,
    sql: &mut SqlAssembly,
    bound_variable_values: &BTreeMap<String, Value>,
) -> Result<()> {
    let Some(constraint) = constraint else {
        return Ok(());
    };

    match constraint {
        Constraint::And(left, right) => {
            sql.where_fragments.push("(".to_string());
            compile_constraint(Some(left), sql, bound_variable_values)?;
            sql.where_fragments.push(" AND ".to_string());
            compile_constraint(Some(right), sql, bound_variable_values)?;
            sql.where_fragments.push(")".to_string());
        }
        Constraint::Or(left, right) => {
            sql.where_fragments.push("(".to_string());
            compile_constraint(Some(left), sql, bound_variable_values)?;
            sql.where_fragments.push(" OR ".to_string());
            compile_constraint(Some(right), sql, bound_variable_values)?;
            sql.where_fragments.push(")".to_string());
        }
        Constraint::Not(inner) => {
            sql.where_fragments.push("NOT (".to_string());
            compile_constraint(Some(inner), sql, bound_variable_values)?;
            sql.where_fragments.push(")".to_string());
        }
        Constraint::Comparison {
            operand1,
            operator,
            operand2,
        } => compile_comparison(operand1, *operator, operand2, sql, bound_variable_values)?,
        Constraint::Related(predicate) => {
            return Err(Error::Internal(format!(
                "related constraint on {}.{} cannot be resolved by the sql compiler",
                predicate.selector_name, predicate.property_name
            )));
        }
    }

    Ok(())
}

/// Lowers one comparison
///
/// The second operand must be a bound variable. A null bound value rewrites
/// equality/inequality to the null operators; any other operator combined
/// with null is rejected rather than silently dropped.
fn compile_comparison(
    operand1: &crate::qom::DynamicOperand,
    operator: Operator,
    operand2: &StaticOperand,
    sql: &mut SqlAssembly,
    bound_variable_values: &BTreeMap<String, Value>,
) -> Result<()> {
    let name = match operand2 {
        StaticOperand::BindVariable(name) => name,
        StaticOperand::Literal(value) => {
            return Err(Error::UnsupportedOperandType(format!(
                "comparison against literal {} is not supported, bind a variable instead",
                value
            )));
        }
    };

    let value = bound_variable_values.get(name).ok_or_else(|| {
        Error::InvalidArgument(format!("no value bound for variable {}", name))
    })?;

    let operator = if value.is_null() {
        match operator {
            Operator::EqualTo => Operator::EqualToNull,
            Operator::NotEqualTo => Operator::NotEqualToNull,
            other => {
                return Err(Error::UnsupportedOperator(format!(
                    "operator {:?} cannot be combined with a null bound value",
                    other
                )));
            }
        }
    } else {
        operator
    };

    // Parameter and placeholder are appended as one step.
    sql.parameters.push(value.clone());
    compile_dynamic_operand(operand1, operator, sql);

    Ok(())
}
