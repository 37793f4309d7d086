use crate::config::LedgerPaths;
use crate::core::ReviewRecord;
use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::path::Path;

use tokio::fs;

/// Reads a ledger in full. A missing, empty or corrupt file is an empty ledger.
pub async fn read_ledger<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("could not read {}: {e}; treating as empty", path.display());
            }
            return Vec::new();
        }
    };

    if content.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("{} is not a valid ledger: {e}; treating as empty", path.display());
            Vec::new()
        }
    }
}

/// Rewrites the whole ledger, pretty-printed with a four-space indent.
pub async fn write_ledger<T: Serialize>(path: &Path, entries: &[T]) -> Result<()> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    entries.serialize(&mut ser)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, buf).await?;
    Ok(())
}

/// Re-reads the ledger and writes `old ++ new`. Existing entries are kept as
/// raw JSON, so an entry that no longer fits the record type is not dropped.
pub async fn append_ledger<T: Serialize>(path: &Path, new: Vec<T>) -> Result<usize> {
    let mut entries: Vec<Value> = read_ledger(path).await;
    for item in new {
        entries.push(serde_json::to_value(item)?);
    }
    write_ledger(path, &entries).await?;
    Ok(entries.len())
}

pub struct LedgerStore {
    paths: LedgerPaths,
}

impl LedgerStore {
    pub fn new(paths: LedgerPaths) -> Self {
        Self { paths }
    }

    /// Numeric ids are read back as their decimal text; other entries are ignored.
    pub async fn processed_ids(&self) -> Vec<String> {
        let entries: Vec<Value> = read_ledger(&self.paths.processed).await;
        entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(id) => Some(id),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Entries that do not fit [`ReviewRecord`] are skipped here but stay on disk.
    pub async fn reviews(&self) -> Vec<ReviewRecord> {
        let entries: Vec<Value> = read_ledger(&self.paths.reviews).await;
        entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("{} entry {i} is not a review record: {e}", self.paths.reviews.display());
                    None
                }
            })
            .collect()
    }

    /// Each ledger is merged independently; there is no transaction spanning both files.
    pub async fn commit(&self, new_reviews: Vec<ReviewRecord>, processed: Vec<String>) -> Result<()> {
        let reviews_total = append_ledger(&self.paths.reviews, new_reviews).await?;
        tracing::debug!("{} now holds {reviews_total} reviews", self.paths.reviews.display());

        let processed_total = append_ledger(&self.paths.processed, processed).await?;
        tracing::debug!(
            "{} now holds {processed_total} ids",
            self.paths.processed.display()
        );
        Ok(())
    }
}
