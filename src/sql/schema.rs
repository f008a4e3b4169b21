use std::collections::HashMap;

/// Per-table configuration consulted by the source compiler
///
/// A table must be registered here with declared enable columns for the
/// enable-fields filter to apply to it; unregistered tables produce no
/// enable-field fragments.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, table: TableSchema) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn get(&self, table_name: &str) -> Option<&TableSchema> {
        self.tables.get(table_name)
    }

    /// Builds the enable-field filter fragments for a selector, qualified
    /// with the selector name. Empty if the table is not registered or
    /// declares no enable columns.
    pub fn enable_fields(&self, selector_name: &str) -> Vec<String> {
        let mut fragments = Vec::new();
        if let Some(table) = self.tables.get(selector_name) {
            if let Some(deleted) = &table.enable_columns.deleted {
                fragments.push(format!("{}.{}=0", selector_name, deleted));
            }
            if let Some(disabled) = &table.enable_columns.disabled {
                fragments.push(format!("{}.{}=0", selector_name, disabled));
            }
        }
        fragments
    }
}

/// Schema entry for one logical table
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub enable_columns: EnableColumns,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enable_columns: EnableColumns::default(),
        }
    }

    pub fn with_deleted_column(mut self, column: impl Into<String>) -> Self {
        self.enable_columns.deleted = Some(column.into());
        self
    }

    pub fn with_disabled_column(mut self, column: impl Into<String>) -> Self {
        self.enable_columns.disabled = Some(column.into());
        self
    }
}

/// Implicit visibility filter columns declared for a table
///
/// `deleted` marks soft-deleted rows, `disabled` marks hidden rows; both
/// filters compile to `<selector>.<column>=0`.
#[derive(Debug, Clone, Default)]
pub struct EnableColumns {
    pub deleted: Option<String>,
    pub disabled: Option<String>,
}
