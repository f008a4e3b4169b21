use crate::error::{Error, Result};
use crate::qom::{JoinCondition, Query, Source};
use crate::sql::assembly::SqlAssembly;
use crate::sql::schema::SchemaRegistry;
use crate::sql::types::PID_COLUMN;

/// Lowers the query source into FROM-clause and field fragments
pub fn compile_source(
    query: &Query,
    schema: &SchemaRegistry,
    sql: &mut SqlAssembly,
) -> Result<()> {
    match query.source() {
        Source::Selector { name } => {
            sql.fields.push(format!("{}.*", name));
            sql.tables.push(name.clone());
            if query.settings().enable_fields_enabled() {
                add_enable_fields(name, schema, sql);
            }
            // Trusted internal integer, inlined rather than parameterized.
            if let Some(page_id) = query.settings().storage_page_id() {
                sql.enable_fields
                    .push(format!("{}.{}={}", name, PID_COLUMN, page_id));
            }
            Ok(())
        }
        Source::Join {
            left,
            right,
            condition,
        } => compile_join(left, right, condition, schema, sql),
    }
}

/// Lowers a two-way left join
///
/// Only selector-to-selector joins are supported; nested joins are rejected.
/// Enable-field filters apply to both sides unconditionally.
fn compile_join(
    left: &Source,
    right: &Source,
    condition: &JoinCondition,
    schema: &SchemaRegistry,
    sql: &mut SqlAssembly,
) -> Result<()> {
    let (Source::Selector { name: left_name }, Source::Selector { name: right_name }) =
        (left, right)
    else {
        return Err(Error::InvalidArgument(
            "only selector-to-selector joins are supported".to_string(),
        ));
    };

    sql.fields.push(format!("{}.*", left_name));
    sql.fields.push(format!("{}.*", right_name));

    sql.tables
        .push(format!("{} LEFT JOIN {}", left_name, right_name));

    let JoinCondition::Equi {
        selector1,
        property1,
        selector2,
        property2,
    } = condition;
    sql.tables.push(format!(
        "ON {}.{} = {}.{}",
        selector1, property1, selector2, property2
    ));

    add_enable_fields(left_name, schema, sql);
    add_enable_fields(right_name, schema, sql);

    Ok(())
}

fn add_enable_fields(selector_name: &str, schema: &SchemaRegistry, sql: &mut SqlAssembly) {
    sql.enable_fields
        .extend(schema.enable_fields(selector_name));
}
