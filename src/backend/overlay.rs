use crate::sql::types::Row;

/// Language and workspace context for row overlaying
///
/// Passed explicitly with every fetch; the overlay never consults ambient
/// request state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlayContext {
    pub language_uid: i64,
    pub workspace_uid: i64,
}

/// Post-processes fetched rows for the current language and workspace
///
/// Returning `None` excludes the row from the result set, e.g. a record
/// with no translation for the requested language or a record deleted in
/// the current workspace.
pub trait RowOverlay {
    fn overlay(&self, table_name: &str, row: Row, context: &OverlayContext) -> Option<Row>;
}
