//! sled-backed transcript store.

use std::path::Path;

use sled::Db;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identity::ContentIdentity;
use crate::types::TranscriptRecord;

/// Document store mapping a content identity to its transcript record,
/// serialized as JSON.
///
/// Insert-only: records are created once at first transcription and never
/// updated or deleted. Uniqueness on the identity key is enforced with a
/// compare-and-swap, so two racing inserts cannot both land — the loser gets
/// [`Error::DuplicateIdentity`].
pub struct TranscriptStore {
    db: Db,
}

impl TranscriptStore {
    /// Open or create the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Look up the transcript for a content identity.
    pub fn find(&self, identity: &ContentIdentity) -> Result<Option<TranscriptRecord>> {
        match self.db.get(identity.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Insert a new record, failing with [`Error::DuplicateIdentity`] if a
    /// record for the same identity already exists.
    pub fn insert(&self, record: &TranscriptRecord) -> Result<()> {
        let value = serde_json::to_vec(record)?;
        self.db
            .compare_and_swap(
                record.identity.as_str().as_bytes(),
                None as Option<&[u8]>,
                Some(value),
            )?
            .map_err(|_| Error::DuplicateIdentity(record.identity.as_str().to_string()))?;
        self.db.flush()?;

        debug!(identity = %record.identity, lines = record.lines.len(), "record inserted");
        Ok(())
    }

    /// Number of stored transcripts.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimedLine;

    fn record(id: &str, title: &str) -> TranscriptRecord {
        TranscriptRecord {
            identity: ContentIdentity::new(id),
            title: title.into(),
            lines: vec![
                TimedLine {
                    start_secs: 0,
                    text: "Hello ".into(),
                },
                TimedLine {
                    start_secs: 5,
                    text: "world.".into(),
                },
            ],
        }
    }

    #[test]
    fn test_insert_then_find_preserves_line_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = TranscriptStore::open(tmp.path().join("db")).unwrap();

        store.insert(&record("abc123", "T")).unwrap();

        let found = store.find(&ContentIdentity::new("abc123")).unwrap().unwrap();
        assert_eq!(found.title, "T");
        assert_eq!(found.lines[0].start_secs, 0);
        assert_eq!(found.lines[0].text, "Hello ");
        assert_eq!(found.lines[1].start_secs, 5);
        assert_eq!(found.lines[1].text, "world.");
    }

    #[test]
    fn test_find_missing_identity() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = TranscriptStore::open(tmp.path().join("db")).unwrap();
        assert!(store.find(&ContentIdentity::new("nope")).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = TranscriptStore::open(tmp.path().join("db")).unwrap();

        store.insert(&record("abc123", "first")).unwrap();
        let err = store.insert(&record("abc123", "second")).unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentity(id) if id == "abc123"));

        // Loser's write must not have replaced the original
        let found = store.find(&ContentIdentity::new("abc123")).unwrap().unwrap();
        assert_eq!(found.title, "first");
    }

    #[test]
    fn test_len_counts_records() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = TranscriptStore::open(tmp.path().join("db")).unwrap();
        assert!(store.is_empty());

        store.insert(&record("a", "A")).unwrap();
        store.insert(&record("b", "B")).unwrap();
        assert_eq!(store.len(), 2);
    }
}
