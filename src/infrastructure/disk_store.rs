//! Parquet-backed persisted tier for the result cache.
//!
//! Each entry is one Parquet file holding the JSON payload as a single
//! compressed string column, plus a `.meta.json` sidecar carrying the
//! write timestamp and original key. The store enforces a byte ceiling:
//! a write that would push the directory over it fails, and the caller
//! decides whether to evict and retry.

use crate::domain::{KvStore, StoredEntry};
use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest sanitized key prefix kept in a filename.
const FILENAME_STEM_MAX: usize = 80;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct EntryMetadata {
    key: String,
    written_at: i64,
}

#[derive(Clone)]
pub struct DiskStore {
    base_path: PathBuf,
    max_size_bytes: u64,
}

impl DiskStore {
    pub fn new(base_path: &str, max_size_bytes: u64) -> Self {
        let path = PathBuf::from(base_path);
        if let Err(e) = fs::create_dir_all(&path) {
            warn!("Failed to create cache directory {}: {}", base_path, e);
        }
        Self { base_path: path, max_size_bytes }
    }

    /// Filesystem-safe stem for a cache key. Signatures carry `:` and `=`
    /// which some filesystems reject; a hash suffix keeps distinct keys
    /// distinct after sanitization and truncation.
    fn file_stem(key: &str) -> String {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .take(FILENAME_STEM_MAX)
            .collect();
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        format!("{}-{:016x}", sanitized, hasher.finish())
    }

    fn parquet_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.parquet", Self::file_stem(key)))
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.meta.json", Self::file_stem(key)))
    }

    fn total_size(&self) -> u64 {
        let Ok(entries) = fs::read_dir(&self.base_path) else {
            return 0;
        };
        entries
            .flatten()
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    /// All sidecars in the store, parsed. Unreadable sidecars are skipped.
    fn read_all_metadata(&self) -> Vec<EntryMetadata> {
        let Ok(entries) = fs::read_dir(&self.base_path) else {
            return Vec::new();
        };
        entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.to_string_lossy().ends_with(".meta.json"))
            .filter_map(|p| {
                let file = File::open(&p).ok()?;
                serde_json::from_reader(std::io::BufReader::new(file)).ok()
            })
            .collect()
    }
}

impl KvStore for DiskStore {
    fn get(&self, key: &str) -> Result<Option<StoredEntry>> {
        let parquet_path = self.parquet_path(key);
        if !parquet_path.exists() {
            return Ok(None);
        }

        let file = File::open(&parquet_path)
            .with_context(|| format!("Failed to open Parquet file: {:?}", parquet_path))?;
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        if let Some(batch) = reader.next() {
            let batch = batch?;
            let value = batch
                .column_by_name("data")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .map(|a| a.value(0).to_string());
            let written_at = batch
                .column_by_name("written_at")
                .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
                .map(|a| a.value(0));

            if let (Some(value), Some(written_at)) = (value, written_at) {
                debug!(key, "read persisted cache entry");
                return Ok(Some(StoredEntry { value, written_at }));
            }
        }

        Ok(None)
    }

    fn set(&self, key: &str, value: &str, written_at: i64) -> Result<()> {
        let parquet_path = self.parquet_path(key);

        // An overwrite replaces the existing file, so its size does not
        // count against the ceiling.
        let replaced = fs::metadata(&parquet_path).map(|m| m.len()).unwrap_or(0);
        if self.total_size().saturating_sub(replaced) + value.len() as u64 > self.max_size_bytes {
            anyhow::bail!(
                "persisted cache over size ceiling ({} bytes)",
                self.max_size_bytes
            );
        }

        let schema = Arc::new(Schema::new(vec![
            Field::new("data", DataType::Utf8, false),
            Field::new("written_at", DataType::Int64, false),
        ]));
        let data_array: ArrayRef = Arc::new(StringArray::from(vec![value]));
        let written_array: ArrayRef = Arc::new(Int64Array::from(vec![written_at]));
        let batch = RecordBatch::try_new(schema.clone(), vec![data_array, written_array])?;

        let file = File::create(&parquet_path)
            .with_context(|| format!("Failed to create Parquet file: {:?}", parquet_path))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        let meta = EntryMetadata { key: key.to_string(), written_at };
        let meta_file = File::create(self.metadata_path(key))?;
        serde_json::to_writer_pretty(meta_file, &meta)?;

        debug!(key, "wrote persisted cache entry");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        for path in [self.parquet_path(key), self.metadata_path(key)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn evict_oldest(&self, fraction: f64) -> Result<usize> {
        let mut metadata = self.read_all_metadata();
        if metadata.is_empty() {
            return Ok(0);
        }
        metadata.sort_by_key(|m| m.written_at);

        let count = ((metadata.len() as f64 * fraction).ceil() as usize).max(1);
        let mut evicted = 0;
        for meta in metadata.iter().take(count) {
            self.delete(&meta.key)?;
            evicted += 1;
        }

        debug!(evicted, "evicted oldest persisted cache entries");
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_str().unwrap(), 10_000_000);

        store.set("products:cat=15:q=-", r#"{"products":[]}"#, 1_700_000_000).unwrap();
        let entry = store.get("products:cat=15:q=-").unwrap().unwrap();
        assert_eq!(entry.value, r#"{"products":[]}"#);
        assert_eq!(entry.written_at, 1_700_000_000);
    }

    #[test]
    fn test_missing_key_is_a_plain_none() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_str().unwrap(), 10_000_000);
        assert!(store.get("absent").unwrap().is_none());
    }

    #[test]
    fn test_long_keys_stay_distinct() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_str().unwrap(), 10_000_000);

        let a = format!("products:q={}:page=1", "x".repeat(200));
        let b = format!("products:q={}:page=2", "x".repeat(200));
        store.set(&a, "first", 1).unwrap();
        store.set(&b, "second", 2).unwrap();
        assert_eq!(store.get(&a).unwrap().unwrap().value, "first");
        assert_eq!(store.get(&b).unwrap().unwrap().value, "second");
    }

    #[test]
    fn test_size_ceiling_rejects_writes() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_str().unwrap(), 64);
        let err = store.set("key", &"x".repeat(100), 1).unwrap_err();
        assert!(err.to_string().contains("size ceiling"));
    }

    #[test]
    fn test_overwrite_at_ceiling_does_not_count_replaced_entry() {
        let dir = tempdir().unwrap();
        let roomy = DiskStore::new(dir.path().to_str().unwrap(), 10_000_000);
        roomy.set("key", "payload", 1).unwrap();

        // Clamp the ceiling to exactly the current usage: replacing the
        // entry must still fit, a new key must not.
        let used = roomy.total_size();
        let tight = DiskStore::new(dir.path().to_str().unwrap(), used);
        tight.set("key", "payload", 2).unwrap();
        assert_eq!(tight.get("key").unwrap().unwrap().written_at, 2);

        let err = tight.set("another", "payload", 3).unwrap_err();
        assert!(err.to_string().contains("size ceiling"));
    }

    #[test]
    fn test_evict_oldest_removes_earliest_writes() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_str().unwrap(), 10_000_000);

        store.set("old", "a", 100).unwrap();
        store.set("mid", "b", 200).unwrap();
        store.set("new", "c", 300).unwrap();

        let evicted = store.evict_oldest(0.2).unwrap();
        assert_eq!(evicted, 1);
        assert!(store.get("old").unwrap().is_none());
        assert!(store.get("mid").unwrap().is_some());
        assert!(store.get("new").unwrap().is_some());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_str().unwrap(), 10_000_000);
        store.set("key", "v", 1).unwrap();
        store.delete("key").unwrap();
        store.delete("key").unwrap();
        assert!(store.get("key").unwrap().is_none());
    }
}
