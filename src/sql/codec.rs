use crate::error::{Error, Result};
use crate::sql::assembly::SqlStatement;
use crate::sql::types::{PID_COLUMN, Row, UID_COLUMN, Value};

/// Builds an INSERT for the row, one placeholder per column
///
/// Any caller-supplied `uid` is stripped; the identifier is server-generated.
pub fn insert_statement(table: &str, row: &Row) -> SqlStatement {
    let mut fields = Vec::new();
    let mut placeholders = Vec::new();
    let mut parameters = Vec::new();
    for (column, value) in row {
        if column == UID_COLUMN {
            continue;
        }
        fields.push(column.as_str());
        placeholders.push("?");
        parameters.push(value.clone());
    }

    SqlStatement {
        text: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            fields.join(", "),
            placeholders.join(", ")
        ),
        parameters,
    }
}

/// Builds an UPDATE addressing the row by its `uid`
///
/// All SET columns come first in column iteration order; the uid parameter
/// is appended last, matching the trailing `WHERE uid=?` placeholder.
pub fn update_statement(table: &str, row: &Row) -> Result<SqlStatement> {
    let uid = row
        .get(UID_COLUMN)
        .ok_or_else(|| {
            Error::InvalidArgument("the given row must contain a value for \"uid\"".to_string())
        })?
        .as_integer()
        .ok_or_else(|| {
            Error::InvalidArgument("the \"uid\" column must hold an integer".to_string())
        })?;

    let mut fields = Vec::new();
    let mut parameters = Vec::new();
    for (column, value) in row {
        if column == UID_COLUMN {
            continue;
        }
        fields.push(format!("{}=?", column));
        parameters.push(value.clone());
    }
    parameters.push(Value::Integer(uid));

    Ok(SqlStatement {
        text: format!(
            "UPDATE {} SET {} WHERE {}=?",
            table,
            fields.join(", "),
            UID_COLUMN
        ),
        parameters,
    })
}

/// Builds a DELETE addressing one row by its `uid`
pub fn delete_statement(table: &str, uid: i64) -> SqlStatement {
    SqlStatement {
        text: format!("DELETE FROM {} WHERE {}=?", table, UID_COLUMN),
        parameters: vec![Value::Integer(uid)],
    }
}

/// Builds the page-id lookup used by cache invalidation
pub fn page_lookup_statement(table: &str, uid: i64) -> SqlStatement {
    SqlStatement {
        text: format!(
            "SELECT {} FROM {} WHERE {}=?",
            PID_COLUMN, table, UID_COLUMN
        ),
        parameters: vec![Value::Integer(uid)],
    }
}
