use crate::qom::{DynamicOperand, OrderDirection, Ordering};
use crate::sql::assembly::SqlAssembly;

/// Lowers an ordering list into ORDER BY fragments
///
/// Orderings whose operand is not a property value produce no fragment and
/// do not affect the order of the remaining entries.
pub fn compile_orderings(orderings: &[Ordering], sql: &mut SqlAssembly) {
    for ordering in orderings {
        if let DynamicOperand::PropertyValue { property_name, .. } = &ordering.operand {
            let direction = match ordering.direction {
                OrderDirection::Ascending => "ASC",
                OrderDirection::Descending => "DESC",
            };
            sql.orderings.push(format!("{} {}", property_name, direction));
        }
    }
}
