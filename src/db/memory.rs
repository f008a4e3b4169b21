use serde::{Deserialize, Serialize};

use crate::{
    db::{DatabaseHandle, ResultSet},
    error::{Error, Result},
    sql::{
        assembly::BoundStatement,
        parser::{
            Parser,
            ast::{
                ColumnRef, Consts, Expression, FromItem, Function, Operation, OrderDirection,
                SelectItem, Statement,
            },
        },
        types::{Row, UID_COLUMN, Value},
    },
    storage::{engine::Engine as StorageEngine, memory::MemoryEngine},
};

/// Embedded reference database handle
///
/// Parses and executes the SQL dialect this crate emits against a byte-level
/// storage engine. Identifiers are auto-incremented per table; rows are
/// bincode-encoded under `(table, uid)` keys.
pub struct MemoryHandle<E: StorageEngine = MemoryEngine> {
    engine: E,
    last_insert_id: i64,
}

impl MemoryHandle<MemoryEngine> {
    pub fn new() -> Self {
        Self::with_engine(MemoryEngine::new())
    }
}

impl Default for MemoryHandle<MemoryEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: StorageEngine> MemoryHandle<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            last_insert_id: 0,
        }
    }

    fn run(&mut self, statement: &BoundStatement) -> Result<ResultSet> {
        match Parser::new(&statement.text).parse()? {
            Statement::Select {
                columns,
                from,
                filter,
                order_by,
            } => self.execute_select(columns, from, filter, order_by, &statement.parameters),
            Statement::Insert {
                table_name,
                columns,
                values,
            } => self.execute_insert(&table_name, &columns, &values, &statement.parameters),
            Statement::Update {
                table_name,
                columns,
                filter,
            } => self.execute_update(&table_name, &columns, filter.as_ref(), &statement.parameters),
            Statement::Delete { table_name, filter } => {
                self.execute_delete(&table_name, filter.as_ref(), &statement.parameters)
            }
        }
    }

    fn execute_select(
        &mut self,
        columns: Vec<SelectItem>,
        from: FromItem,
        filter: Option<Expression>,
        order_by: Vec<(String, OrderDirection)>,
        parameters: &[Value],
    ) -> Result<ResultSet> {
        let candidates = match from {
            FromItem::Table { name } => {
                let rows = self.scan_rows(&name)?;
                rows.into_iter()
                    .map(|row| Candidate {
                        parts: vec![(name.clone(), Some(row))],
                    })
                    .collect::<Vec<_>>()
            }
            FromItem::Join { left, right, on } => {
                let left_rows = self.scan_rows(&left)?;
                let right_rows = self.scan_rows(&right)?;
                join_candidates(&left, left_rows, &right, right_rows, &on)
            }
        };

        let mut rows = Vec::new();
        for candidate in candidates {
            if let Some(filter) = &filter {
                if !eval_truthy(filter, &candidate, parameters)? {
                    continue;
                }
            }
            rows.push(candidate.project(&columns));
        }

        sort_rows(&mut rows, &order_by);
        Ok(ResultSet::Query { rows })
    }

    fn execute_insert(
        &mut self,
        table: &str,
        columns: &[String],
        values: &[Vec<Expression>],
        parameters: &[Value],
    ) -> Result<ResultSet> {
        let empty = Candidate { parts: Vec::new() };
        let mut count = 0;
        for exprs in values {
            if exprs.len() != columns.len() {
                return Err(Error::Internal(
                    "columns and values num mismatch".to_string(),
                ));
            }

            let mut row = Row::new();
            for (column, expr) in columns.iter().zip(exprs) {
                row.insert(column.clone(), eval(expr, &empty, parameters)?);
            }

            // The identifier is server-generated; any uid in the column
            // list is overwritten.
            let uid = self.next_id(table)?;
            row.insert(UID_COLUMN.to_string(), Value::Integer(uid));
            self.store_row(table, uid, &row)?;
            self.last_insert_id = uid;
            count += 1;
        }
        Ok(ResultSet::Modified { count })
    }

    fn execute_update(
        &mut self,
        table: &str,
        columns: &std::collections::BTreeMap<String, Expression>,
        filter: Option<&Expression>,
        parameters: &[Value],
    ) -> Result<ResultSet> {
        let mut count = 0;
        for row in self.scan_rows(table)? {
            let candidate = Candidate {
                parts: vec![(table.to_string(), Some(row.clone()))],
            };
            if let Some(filter) = filter {
                if !eval_truthy(filter, &candidate, parameters)? {
                    continue;
                }
            }

            let mut updated = row;
            for (column, expr) in columns {
                updated.insert(column.clone(), eval(expr, &candidate, parameters)?);
            }
            let uid = row_uid(&updated)?;
            self.store_row(table, uid, &updated)?;
            count += 1;
        }
        Ok(ResultSet::Modified { count })
    }

    fn execute_delete(
        &mut self,
        table: &str,
        filter: Option<&Expression>,
        parameters: &[Value],
    ) -> Result<ResultSet> {
        let mut doomed = Vec::new();
        for row in self.scan_rows(table)? {
            let candidate = Candidate {
                parts: vec![(table.to_string(), Some(row.clone()))],
            };
            if let Some(filter) = filter {
                if !eval_truthy(filter, &candidate, parameters)? {
                    continue;
                }
            }
            doomed.push(row_uid(&row)?);
        }

        for uid in &doomed {
            self.engine
                .delete(bincode::serialize(&Key::Row(table.to_string(), *uid))?)?;
        }
        Ok(ResultSet::Modified {
            count: doomed.len(),
        })
    }

    /// Allocates the next auto-increment identifier for a table
    fn next_id(&mut self, table: &str) -> Result<i64> {
        let key = bincode::serialize(&Key::NextId(table.to_string()))?;
        let next = match self.engine.get(key.clone())? {
            Some(value) => bincode::deserialize::<i64>(&value)?,
            None => 1,
        };
        self.engine.set(key, bincode::serialize(&(next + 1))?)?;
        Ok(next)
    }

    fn store_row(&mut self, table: &str, uid: i64, row: &Row) -> Result<()> {
        let key = bincode::serialize(&Key::Row(table.to_string(), uid))?;
        self.engine.set(key, bincode::serialize(row)?)
    }

    fn scan_rows(&mut self, table: &str) -> Result<Vec<Row>> {
        let prefix = bincode::serialize(&KeyPrefix::Row(table.to_string()))?;
        let results = self
            .engine
            .scan_prefix(prefix)
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        for (_, value) in results {
            rows.push(bincode::deserialize(&value)?);
        }
        Ok(rows)
    }
}

impl<E: StorageEngine> DatabaseHandle for MemoryHandle<E> {
    fn execute(&mut self, statement: &BoundStatement) -> Result<ResultSet> {
        tracing::trace!(sql = %statement.text, "memory handle executing");
        // The handle is the driver here: every failure surfaces as a driver
        // error with its text preserved.
        self.run(statement).map_err(|err| match err {
            Error::Sql(_) => err,
            other => Error::Sql(other.to_string()),
        })
    }

    fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }
}

/// Key types for row storage
///
/// In bincode, enums are serialized as [variant_index][variant_data...],
/// so `KeyPrefix::Row(table)` is a strict prefix of `Key::Row(table, uid)`.
#[derive(Debug, Serialize, Deserialize)]
enum Key {
    Row(String, i64),
    NextId(String),
}

/// Key prefix types for prefix scanning
#[derive(Debug, Serialize, Deserialize)]
enum KeyPrefix {
    Row(String),
}

/// One candidate result row: the source row of each FROM part, in order.
/// A `None` part is the unmatched right side of a left join.
struct Candidate {
    parts: Vec<(String, Option<Row>)>,
}

impl Candidate {
    /// Resolves a column reference; absent columns read as null
    fn lookup(&self, table: Option<&str>, column: &str) -> Value {
        for (name, row) in &self.parts {
            if let Some(table) = table {
                if name != table {
                    continue;
                }
            }
            if let Some(value) = row.as_ref().and_then(|r| r.get(column)) {
                return value.clone();
            }
            if table.is_some() {
                break;
            }
        }
        Value::Null
    }

    /// Builds the output row for a field list; later parts overwrite
    /// earlier ones on column collisions
    fn project(&self, columns: &[SelectItem]) -> Row {
        let mut out = Row::new();
        for item in columns {
            match item {
                SelectItem::All => {
                    for (_, row) in &self.parts {
                        if let Some(row) = row {
                            out.extend(row.clone());
                        }
                    }
                }
                SelectItem::TableAll(table) => {
                    for (name, row) in &self.parts {
                        if name == table {
                            if let Some(row) = row {
                                out.extend(row.clone());
                            }
                        }
                    }
                }
                SelectItem::Column(column_ref) => {
                    out.insert(
                        column_ref.column.clone(),
                        self.lookup(column_ref.table.as_deref(), &column_ref.column),
                    );
                }
            }
        }
        out
    }
}

/// Nested-loop left join: every left row appears once per match, or once
/// with an absent right part when nothing matches
fn join_candidates(
    left: &str,
    left_rows: Vec<Row>,
    right: &str,
    right_rows: Vec<Row>,
    on: &(ColumnRef, ColumnRef),
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for left_row in left_rows {
        let mut matched = false;
        for right_row in &right_rows {
            let candidate = Candidate {
                parts: vec![
                    (left.to_string(), Some(left_row.clone())),
                    (right.to_string(), Some(right_row.clone())),
                ],
            };
            let a = candidate.lookup(on.0.table.as_deref(), &on.0.column);
            let b = candidate.lookup(on.1.table.as_deref(), &on.1.column);
            if values_equal(&a, &b) {
                matched = true;
                candidates.push(candidate);
            }
        }
        if !matched {
            candidates.push(Candidate {
                parts: vec![
                    (left.to_string(), Some(left_row)),
                    (right.to_string(), None),
                ],
            });
        }
    }
    candidates
}

/// Multi-column sort over the projected rows; absent columns sort as null
fn sort_rows(rows: &mut [Row], order_by: &[(String, OrderDirection)]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for (column, direction) in order_by {
            let x = a.get(column).cloned().unwrap_or(Value::Null);
            let y = b.get(column).cloned().unwrap_or(Value::Null);
            match x.partial_cmp(&y) {
                Some(std::cmp::Ordering::Equal) => {}
                Some(o) => {
                    return if *direction == OrderDirection::Asc {
                        o
                    } else {
                        o.reverse()
                    };
                }
                None => {}
            }
        }
        std::cmp::Ordering::Equal
    });
}

/// Evaluates a filter expression to a boolean
fn eval_truthy(expr: &Expression, candidate: &Candidate, parameters: &[Value]) -> Result<bool> {
    match eval(expr, candidate, parameters)? {
        Value::Boolean(b) => Ok(b),
        other => Err(Error::Internal(format!(
            "filter expression evaluated to non-boolean {}",
            other
        ))),
    }
}

/// Evaluates an expression against one candidate row
fn eval(expr: &Expression, candidate: &Candidate, parameters: &[Value]) -> Result<Value> {
    Ok(match expr {
        Expression::Column(column_ref) => {
            candidate.lookup(column_ref.table.as_deref(), &column_ref.column)
        }
        Expression::Consts(c) => match c {
            Consts::Null => Value::Null,
            Consts::Boolean(b) => Value::Boolean(*b),
            Consts::Integer(i) => Value::Integer(*i),
            Consts::Float(f) => Value::Float(*f),
            Consts::String(s) => Value::String(s.clone()),
        },
        Expression::Placeholder(index) => parameters
            .get(*index)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("no parameter bound at index {}", index)))?,
        Expression::Function(function, inner) => {
            match (function, eval(inner, candidate, parameters)?) {
                (_, Value::Null) => Value::Null,
                (Function::Lower, Value::String(s)) => Value::String(s.to_lowercase()),
                (Function::Upper, Value::String(s)) => Value::String(s.to_uppercase()),
                (_, other) => {
                    return Err(Error::Internal(format!(
                        "case function applied to non-string {}",
                        other
                    )));
                }
            }
        }
        Expression::Operation(operation) => eval_operation(operation, candidate, parameters)?,
    })
}

fn eval_operation(
    operation: &Operation,
    candidate: &Candidate,
    parameters: &[Value],
) -> Result<Value> {
    use std::cmp::Ordering;

    // Comparisons against null are false, matching SQL's unknown-as-false
    // filter semantics; explicit null tests use IS [NOT] NULL.
    let compare = |l: &Expression, r: &Expression, test: fn(Ordering) -> bool| -> Result<Value> {
        let a = eval(l, candidate, parameters)?;
        let b = eval(r, candidate, parameters)?;
        if a.is_null() || b.is_null() {
            return Ok(Value::Boolean(false));
        }
        Ok(Value::Boolean(a.partial_cmp(&b).is_some_and(test)))
    };

    Ok(match operation {
        Operation::Equal(l, r) => compare(l, r, |o| o == Ordering::Equal)?,
        Operation::NotEqual(l, r) => compare(l, r, |o| o != Ordering::Equal)?,
        Operation::LessThan(l, r) => compare(l, r, |o| o == Ordering::Less)?,
        Operation::LessThanOrEqual(l, r) => compare(l, r, |o| o != Ordering::Greater)?,
        Operation::GreaterThan(l, r) => compare(l, r, |o| o == Ordering::Greater)?,
        Operation::GreaterThanOrEqual(l, r) => compare(l, r, |o| o != Ordering::Less)?,
        Operation::Like(l, r) => {
            let value = eval(l, candidate, parameters)?;
            let pattern = eval(r, candidate, parameters)?;
            match (value, pattern) {
                (Value::Null, _) | (_, Value::Null) => Value::Boolean(false),
                (Value::String(value), Value::String(pattern)) => {
                    Value::Boolean(like_match(&value, &pattern))
                }
                (value, pattern) => {
                    return Err(Error::Internal(format!(
                        "LIKE requires string operands, got {} and {}",
                        value, pattern
                    )));
                }
            }
        }
        Operation::IsNull(inner) => {
            Value::Boolean(eval(inner, candidate, parameters)?.is_null())
        }
        Operation::IsNotNull(inner) => {
            Value::Boolean(!eval(inner, candidate, parameters)?.is_null())
        }
        Operation::And(l, r) => Value::Boolean(
            eval_truthy(l, candidate, parameters)? && eval_truthy(r, candidate, parameters)?,
        ),
        Operation::Or(l, r) => Value::Boolean(
            eval_truthy(l, candidate, parameters)? || eval_truthy(r, candidate, parameters)?,
        ),
        Operation::Not(inner) => Value::Boolean(!eval_truthy(inner, candidate, parameters)?),
    })
}

fn values_equal(a: &Value, b: &Value) -> bool {
    !a.is_null() && !b.is_null() && a.partial_cmp(b) == Some(std::cmp::Ordering::Equal)
}

/// SQL LIKE matching: `%` matches any run, `_` matches one character
fn like_match(value: &str, pattern: &str) -> bool {
    fn matches(value: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => {
                (0..=value.len()).any(|skip| matches(&value[skip..], rest))
            }
            Some(('_', rest)) => value
                .split_first()
                .is_some_and(|(_, tail)| matches(tail, rest)),
            Some((c, rest)) => value
                .split_first()
                .is_some_and(|(v, tail)| v == c && matches(tail, rest)),
        }
    }
    matches(
        &value.chars().collect::<Vec<_>>(),
        &pattern.chars().collect::<Vec<_>>(),
    )
}

fn row_uid(row: &Row) -> Result<i64> {
    row.get(UID_COLUMN)
        .and_then(Value::as_integer)
        .ok_or_else(|| Error::Internal("stored row is missing its uid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(text: &str, parameters: Vec<Value>) -> BoundStatement {
        BoundStatement {
            text: text.to_string(),
            parameters,
        }
    }

    fn insert(handle: &mut MemoryHandle, table: &str, pairs: &[(&str, Value)]) -> i64 {
        let columns = pairs.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ");
        let markers = pairs.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let statement = bound(
            &format!("INSERT INTO {} ({}) VALUES ({})", table, columns, markers),
            pairs.iter().map(|(_, v)| v.clone()).collect(),
        );
        handle.execute(&statement).unwrap();
        handle.last_insert_id()
    }

    #[test]
    fn test_insert_assigns_incrementing_uids() {
        let mut handle = MemoryHandle::new();
        let first = insert(&mut handle, "t", &[("a", Value::Integer(1))]);
        let second = insert(&mut handle, "t", &[("a", Value::Integer(2))]);
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        // Counters are per table
        let other = insert(&mut handle, "u", &[("a", Value::Integer(3))]);
        assert_eq!(other, 1);
    }

    #[test]
    fn test_select_with_filter_and_order() -> Result<()> {
        let mut handle = MemoryHandle::new();
        insert(&mut handle, "t", &[("a", Value::Integer(3)), ("b", Value::from("x"))]);
        insert(&mut handle, "t", &[("a", Value::Integer(1)), ("b", Value::from("y"))]);
        insert(&mut handle, "t", &[("a", Value::Integer(2)), ("b", Value::from("x"))]);

        let result = handle.execute(&bound(
            "SELECT t.* FROM t WHERE t.b = ? ORDER BY a DESC",
            vec![Value::from("x")],
        ))?;

        let rows = result.into_rows()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["a"], Value::Integer(3));
        assert_eq!(rows[1]["a"], Value::Integer(2));
        Ok(())
    }

    #[test]
    fn test_update_and_delete_by_uid() -> Result<()> {
        let mut handle = MemoryHandle::new();
        let uid = insert(&mut handle, "t", &[("a", Value::Integer(1))]);

        let result = handle.execute(&bound(
            "UPDATE t SET a=? WHERE uid=?",
            vec![Value::Integer(9), Value::Integer(uid)],
        ))?;
        assert_eq!(result, ResultSet::Modified { count: 1 });

        let rows = handle
            .execute(&bound("SELECT t.* FROM t", vec![]))?
            .into_rows()?;
        assert_eq!(rows[0]["a"], Value::Integer(9));

        let result = handle.execute(&bound(
            "DELETE FROM t WHERE uid=?",
            vec![Value::Integer(uid)],
        ))?;
        assert_eq!(result, ResultSet::Modified { count: 1 });

        let rows = handle
            .execute(&bound("SELECT t.* FROM t", vec![]))?
            .into_rows()?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_left_join_keeps_unmatched_left_rows() -> Result<()> {
        let mut handle = MemoryHandle::new();
        let parent1 = insert(&mut handle, "a", &[("name", Value::from("p1"))]);
        let parent2 = insert(&mut handle, "a", &[("name", Value::from("p2"))]);
        insert(
            &mut handle,
            "b",
            &[("parent", Value::Integer(parent1)), ("title", Value::from("c1"))],
        );
        let _ = parent2;

        let rows = handle
            .execute(&bound(
                "SELECT a.*,b.* FROM a LEFT JOIN b ON a.uid = b.parent ORDER BY name ASC",
                vec![],
            ))?
            .into_rows()?;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], Value::from("c1"));
        // Unmatched left row carries no right-side columns
        assert_eq!(rows[1]["name"], Value::from("p2"));
        assert!(!rows[1].contains_key("title"));
        Ok(())
    }

    #[test]
    fn test_is_null_and_like_filters() -> Result<()> {
        let mut handle = MemoryHandle::new();
        insert(&mut handle, "t", &[("a", Value::Null), ("b", Value::from("apple"))]);
        insert(&mut handle, "t", &[("a", Value::Integer(1)), ("b", Value::from("banana"))]);

        let rows = handle
            .execute(&bound("SELECT t.* FROM t WHERE t.a IS NULL", vec![]))?
            .into_rows()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["b"], Value::from("apple"));

        let rows = handle
            .execute(&bound(
                "SELECT t.* FROM t WHERE t.b LIKE ?",
                vec![Value::from("ba%na")],
            ))?
            .into_rows()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["b"], Value::from("banana"));
        Ok(())
    }

    #[test]
    fn test_column_projection() -> Result<()> {
        let mut handle = MemoryHandle::new();
        let uid = insert(
            &mut handle,
            "t",
            &[("pid", Value::Integer(10)), ("title", Value::from("x"))],
        );

        let rows = handle
            .execute(&bound(
                "SELECT pid FROM t WHERE uid=?",
                vec![Value::Integer(uid)],
            ))?
            .into_rows()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0]["pid"], Value::Integer(10));
        Ok(())
    }

    #[test]
    fn test_driver_errors_carry_sql_error_text() {
        let mut handle = MemoryHandle::new();
        let result = handle.execute(&bound("SELECT FROM WHERE", vec![]));
        assert!(matches!(result, Err(Error::Sql(_))));
    }

    #[test]
    fn test_like_match_wildcards() {
        assert!(like_match("banana", "ba%na"));
        assert!(like_match("banana", "b_n_n_"));
        assert!(like_match("banana", "%"));
        assert!(!like_match("banana", "ba%x"));
        assert!(!like_match("banana", "_anana_"));
    }
}
