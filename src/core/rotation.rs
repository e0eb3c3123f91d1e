//! Key rotation coordinator.
//!
//! Re-encrypts every stored ciphertext under the keyring's active key,
//! reading through a cursor-paginated storage collaborator so arbitrary
//! record counts never load fully into memory. One logical pass per
//! invocation; a failure on any record aborts the run with the error rather
//! than silently skipping. Re-running is safe as long as the previous-keys
//! list still covers whatever the stored blobs were written under.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::constants::ROTATION_BATCH_SIZE;
use crate::core::crypto::Keyring;
use crate::error::{Result, RotationError};

/// One stored ciphertext row.
#[derive(Debug, Clone)]
pub struct CipherRecord {
    /// Stable, ascending ordering key within the table.
    pub id: u64,
    pub blob: String,
}

/// A bounded page of records.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub records: Vec<CipherRecord>,
    /// Cursor for the next page, `None` when the table is exhausted.
    pub next_cursor: Option<u64>,
}

/// Storage collaborator supplying ciphertexts for rotation.
///
/// Implementations must return records in ascending id order and treat the
/// cursor as exclusive (`id > cursor`).
pub trait CiphertextStore {
    /// Logical tables holding encrypted values.
    fn tables(&self) -> Vec<String>;

    /// Fetch up to `limit` records after `cursor`.
    fn fetch_batch(
        &mut self,
        table: &str,
        cursor: Option<u64>,
        limit: usize,
    ) -> Result<RecordBatch>;

    /// Persist a re-encrypted blob.
    fn store(&mut self, table: &str, id: u64, blob: &str) -> Result<()>;
}

/// Tuning for a rotation run.
#[derive(Debug, Clone)]
pub struct RotationOptions {
    /// Records per page; trades throughput against storage lock duration.
    pub batch_size: usize,
    /// Perform every transform but discard writes.
    pub dry_run: bool,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            batch_size: ROTATION_BATCH_SIZE,
            dry_run: false,
        }
    }
}

/// Per-table record counts from a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RotationReport {
    pub tables: BTreeMap<String, usize>,
    pub total: usize,
    pub dry_run: bool,
}

/// Drives a full re-encryption pass over a [`CiphertextStore`].
///
/// Decryption uses the whole keyring (previous keys included); re-encryption
/// uses the active key only. Cancellation is cooperative: the caller simply
/// stops invoking `run`, and records processed so far remain valid.
#[derive(Debug)]
pub struct KeyRotation<'a> {
    keyring: &'a Keyring,
    options: RotationOptions,
}

impl<'a> KeyRotation<'a> {
    pub fn new(keyring: &'a Keyring, options: RotationOptions) -> Self {
        Self { keyring, options }
    }

    /// Rotate every record in every table.
    ///
    /// # Errors
    ///
    /// Returns `RotationError::Record` naming the table and id where a
    /// decrypt or re-encrypt failed; storage errors propagate as-is. Either
    /// way the run aborts without touching later records.
    pub fn run(&self, store: &mut dyn CiphertextStore) -> Result<RotationReport> {
        let mut report = RotationReport {
            tables: BTreeMap::new(),
            total: 0,
            dry_run: self.options.dry_run,
        };

        for table in store.tables() {
            let processed = self.rotate_table(store, &table)?;
            info!(
                table = %table,
                records = processed,
                dry_run = self.options.dry_run,
                "table rotation complete"
            );
            report.total += processed;
            report.tables.insert(table, processed);
        }

        Ok(report)
    }

    fn rotate_table(&self, store: &mut dyn CiphertextStore, table: &str) -> Result<usize> {
        let mut processed = 0;
        let mut cursor = None;

        loop {
            let batch = store.fetch_batch(table, cursor, self.options.batch_size)?;

            for record in &batch.records {
                let rotated = self
                    .rotate_record(record)
                    .map_err(|e| RotationError::Record {
                        table: table.to_string(),
                        id: record.id,
                        source: Box::new(e),
                    })?;

                if !self.options.dry_run {
                    store.store(table, record.id, &rotated)?;
                }
                processed += 1;
            }

            debug!(table = %table, processed, "rotated batch");

            match batch.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(processed)
    }

    fn rotate_record(&self, record: &CipherRecord) -> Result<String> {
        let plaintext = self.keyring.decrypt(&record.blob)?;
        self.keyring.encrypt(&plaintext)
    }
}
