use std::ops::{Bound, RangeBounds};

use crate::error::Result;

/// Abstract storage engine interface (byte-level operations)
///
/// Different from the SQL-facing database handle, which operates on rows.
pub trait Engine {
    type EngineIterator<'a>: EngineIterator
    where
        Self: 'a;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;
    fn get(&mut self, key: Vec<u8>) -> Result<Option<Vec<u8>>>;
    fn delete(&mut self, key: Vec<u8>) -> Result<()>;
    fn scan(&mut self, range: impl RangeBounds<Vec<u8>>) -> Self::EngineIterator<'_>;

    /// Prefix scan using lexicographic ordering
    ///
    /// Converts prefix scan to range scan by incrementing the last byte.
    /// For example, prefix "apple" becomes range ["apple", "applf").
    fn scan_prefix(&mut self, prefix: Vec<u8>) -> Self::EngineIterator<'_> {
        let start = Bound::Included(prefix.clone());
        let mut bound_prefix = prefix;
        if let Some(last) = bound_prefix.iter_mut().last() {
            *last += 1;
        };
        let end = Bound::Excluded(bound_prefix);
        self.scan((start, end))
    }
}

/// Storage engine iterator trait (supports reverse traversal)
pub trait EngineIterator: DoubleEndedIterator<Item = Result<(Vec<u8>, Vec<u8>)>> {}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::{error::Result, storage::memory::MemoryEngine};

    fn test_point_opt(mut eng: impl Engine) -> Result<()> {
        assert_eq!(eng.get(b"not exist".to_vec())?, None);

        eng.set(b"aa".to_vec(), vec![1, 2, 3, 4])?;
        assert_eq!(eng.get(b"aa".to_vec())?, Some(vec![1, 2, 3, 4]));

        eng.set(b"aa".to_vec(), vec![5, 6, 7, 8])?;
        assert_eq!(eng.get(b"aa".to_vec())?, Some(vec![5, 6, 7, 8]));

        eng.delete(b"aa".to_vec())?;
        assert_eq!(eng.get(b"aa".to_vec())?, None);

        Ok(())
    }

    fn test_scan_prefix(mut eng: impl Engine) -> Result<()> {
        eng.set(b"ccnaes".to_vec(), b"value1".to_vec())?;
        eng.set(b"camhue".to_vec(), b"value2".to_vec())?;
        eng.set(b"deeae".to_vec(), b"value3".to_vec())?;
        eng.set(b"canehe".to_vec(), b"value5".to_vec())?;

        let mut iter = eng.scan_prefix(b"ca".to_vec());
        let (key1, _) = iter.next().transpose()?.unwrap();
        assert_eq!(key1, b"camhue".to_vec());
        let (key2, _) = iter.next().transpose()?.unwrap();
        assert_eq!(key2, b"canehe".to_vec());
        assert!(iter.next().is_none());

        Ok(())
    }

    #[test]
    fn test_memory() -> Result<()> {
        test_point_opt(MemoryEngine::new())?;
        test_scan_prefix(MemoryEngine::new())?;
        Ok(())
    }
}
