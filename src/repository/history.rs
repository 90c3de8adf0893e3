use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use serde_json::Value;
use tracing::instrument;

use super::error::RepositoryError;
use crate::model::SwapRecord;
use crate::repository::RepoResult;

/// Append-only swap history, one pretty-printed JSON array per wallet.
///
/// Key order inside entries is kept on rewrite (`serde_json/preserve_order`).
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{dir}/{checksummed wallet}.json`
    pub fn path_for(&self, wallet: Address) -> PathBuf {
        self.dir.join(format!("{}.json", wallet.to_checksum(None)))
    }

    /// Reads the wallet's history as typed records.
    ///
    /// A missing file or one that is not valid JSON reads as empty. Entries that
    /// do not match the record shape are skipped here but stay on disk.
    #[instrument(skip(self), err)]
    pub async fn load(&self, wallet: Address) -> RepoResult<Vec<SwapRecord>> {
        let path = self.path_for(wallet);
        let entries = read_entries(&path).await?;

        let records = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping history entry {index} in {}: {e}", path.display());
                    None
                }
            })
            .collect();

        Ok(records)
    }

    /// Appends one record and rewrites the wallet's history file.
    ///
    /// Existing entries are carried over as raw JSON, so records written by other
    /// tools or older versions are never dropped or reshaped.
    #[instrument(skip(self, record), fields(tx_hash = %record.tx_hash), err)]
    pub async fn append(&self, wallet: Address, record: &SwapRecord) -> RepoResult<usize> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(wallet);
        let mut entries = read_entries(&path).await?;

        let entry = serde_json::to_value(record)
            .map_err(|e| RepositoryError::StorageError(format!("Failed to encode record: {e}")))?;
        entries.push(entry);

        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| RepositoryError::StorageError(format!("Failed to encode history: {e}")))?;
        tokio::fs::write(&path, json).await?;

        tracing::debug!("History {} now holds {} records", path.display(), entries.len());
        Ok(entries.len())
    }
}

/// Raw history entries. Only a JSON syntax error resets the history; valid JSON
/// that is not an array is refused so it never gets overwritten.
async fn read_entries(path: &Path) -> RepoResult<Vec<Value>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str(&content) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(_) => Err(RepositoryError::StorageError(format!(
            "History file {} does not hold a JSON array",
            path.display()
        ))),
        Err(e) => {
            tracing::warn!(
                "Ignoring unreadable history file {}: {e}",
                path.display()
            );
            Ok(Vec::new())
        }
    }
}
