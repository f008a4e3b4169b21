use std::collections::BTreeSet;

use crate::db::DatabaseHandle;
use crate::error::Result;
use crate::sql::codec;
use crate::sql::types::{PID_COLUMN, Value};

/// A cache that can drop entries by tag
pub trait FlushableCache {
    fn flush_by_tag(&mut self, tag: &str);
}

/// Opt-in page cache invalidation
///
/// Mutating a record invalidates the rendered output of the page owning it.
/// Two caches are flushed with the same `pageId_<n>` tag: the page cache
/// itself and the page-section cache. `cascade_page_ids` lists additional
/// pages configured to be flushed alongside every record mutation.
pub struct PageCacheConfig {
    pub page_cache: Box<dyn FlushableCache>,
    pub page_section_cache: Box<dyn FlushableCache>,
    pub cascade_page_ids: Vec<i64>,
}

impl PageCacheConfig {
    /// Flushes the caches for the page owning the given record
    ///
    /// Must run while the record still exists: the owning page id is looked
    /// up through the handle, so on removal the caller flushes first and
    /// deletes after.
    pub(crate) fn clear_for_record<H: DatabaseHandle>(
        &mut self,
        handle: &mut H,
        table: &str,
        uid: i64,
    ) -> Result<()> {
        let rows = handle
            .execute(&codec::page_lookup_statement(table, uid).bind()?)?
            .into_rows()?;

        let mut page_ids = BTreeSet::new();
        if let Some(page_id) = rows
            .first()
            .and_then(|row| row.get(PID_COLUMN))
            .and_then(Value::as_integer)
        {
            page_ids.insert(page_id);
        }
        page_ids.extend(self.cascade_page_ids.iter().copied());

        for page_id in page_ids {
            let tag = format!("pageId_{}", page_id);
            tracing::debug!(table, uid, %tag, "flushing page caches");
            self.page_cache.flush_by_tag(&tag);
            self.page_section_cache.flush_by_tag(&tag);
        }
        Ok(())
    }
}
