use log::{info, warn};
use serde_json::Value;
use std::fmt;

use super::normalizer::NormalizedRecord;
use crate::store::RecordStore;

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Progress notification after each committed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the batch that just committed
    pub batch: usize,
    pub total_batches: usize,
    pub committed_records: usize,
    pub total_records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReport {
    pub batches: usize,
    pub records: usize,
}

/// A batch failed; earlier batches stay committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitError {
    /// The store's message, unchanged
    pub message: String,
    /// 1-based index of the failing batch
    pub batch_index: usize,
    pub committed_batches: usize,
    pub committed_records: usize,
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommitError {}

/// Insert `records` into `collection` in sequential batches of `batch_size`.
///
/// Stops at the first failing batch. Nothing already committed is rolled back,
/// so a failure can leave a partial import behind.
pub async fn commit_records<S, F>(
    store: &S,
    collection: &str,
    records: &[NormalizedRecord],
    batch_size: usize,
    mut on_batch: F,
) -> Result<CommitReport, CommitError>
where
    S: RecordStore + ?Sized,
    F: FnMut(BatchProgress),
{
    let batch_size = batch_size.max(1);
    let total_batches = records.len().div_ceil(batch_size);
    let mut committed_records = 0;

    info!(
        "Committing {} record(s) to '{}' in {} batch(es) of up to {}",
        records.len(),
        collection,
        total_batches,
        batch_size
    );

    for (idx, chunk) in records.chunks(batch_size).enumerate() {
        let batch = idx + 1;
        let failure = |message: String| CommitError {
            message,
            batch_index: batch,
            committed_batches: idx,
            committed_records,
        };

        let rows = chunk
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(|e| failure(format!("Could not serialize batch {}: {}", batch, e)))?;

        if let Err(e) = store.insert_rows(collection, &rows).await {
            warn!(
                "Batch {}/{} failed after {} committed record(s): {}",
                batch, total_batches, committed_records, e
            );
            return Err(failure(e.message));
        }

        committed_records += chunk.len();
        info!("Batch {}/{} committed ({} rows)", batch, total_batches, chunk.len());
        on_batch(BatchProgress {
            batch,
            total_batches,
            committed_records,
            total_records: records.len(),
        });
    }

    Ok(CommitReport {
        batches: total_batches,
        records: committed_records,
    })
}
