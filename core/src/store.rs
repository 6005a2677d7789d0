//! Append-only JSON-array file store for accepted submissions.
//!
//! The store file is a single JSON array of submission objects. Appending
//! splices the new record in place — overwrite the trailing `]`, write the
//! record, write a new `]` — instead of reading and rewriting the whole
//! array, so the cost of an append does not grow with the file.
//!
//! The tradeoff is that the write is not atomic: a crash or I/O error in
//! the middle of the positioned write can leave the file syntactically
//! invalid. There is no temp file, no rename, and no fsync barrier. That is
//! acceptable for a low-volume contact-form backup; it is not acceptable
//! for a high-integrity ledger. Do not upgrade this silently — readers of
//! the file rely on the append never rewriting earlier records.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::submission::Submission;

/// The two-byte empty-array literal the store file is bootstrapped with.
pub const EMPTY_ARRAY: &[u8; 2] = b"[]";

/// Errors surfaced by [`AppendStore::append`]. Never fatal to the process
/// and never retried by the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store file does not end in a well-formed array (trailing bytes {probe:?})")]
    Corrupt { probe: Vec<u8> },
}

/// Owns the store file path and the process-wide append lock.
///
/// All mutation of the file goes through [`append`](Self::append); the lock
/// is held for the whole stat/open/read/write sequence, so at most one
/// append executes at a time and the array order is lock-acquisition order.
pub struct AppendStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AppendStore {
    /// Open the store at `path`, creating it with the empty-array literal
    /// when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if !path.exists() {
            std::fs::write(&path, EMPTY_ARRAY)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Store file path accessor.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one submission to the array file.
    ///
    /// Reads the last two bytes of the file as a probe and splices the
    /// compact-encoded record in based on what it finds:
    ///
    /// - `[]` — empty array: write `REC]` over the trailing `]`.
    /// - `}]` — at least one object: write `,REC]` over the trailing `]`.
    /// - anything else — the file is corrupt or not ours; report
    ///   [`StoreError::Corrupt`] and write nothing.
    ///
    /// Any stat/open/read/write failure is surfaced to the caller as the
    /// append's error; the store never retries and never aborts the process.
    pub async fn append(&self, submission: &Submission) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        let len = std::fs::metadata(&self.path)?.len();
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;

        if len < 2 {
            let mut probe = Vec::new();
            file.read_to_end(&mut probe)?;
            return Err(StoreError::Corrupt { probe });
        }

        let mut probe = [0u8; 2];
        file.seek(SeekFrom::Start(len - 2))?;
        file.read_exact(&mut probe)?;

        let record = serde_json::to_vec(submission)?;

        let mut splice = Vec::with_capacity(record.len() + 2);
        match probe {
            [b'[', b']'] => splice.extend_from_slice(&record),
            [b'}', b']'] => {
                splice.push(b',');
                splice.extend_from_slice(&record);
            }
            _ => {
                return Err(StoreError::Corrupt {
                    probe: probe.to_vec(),
                });
            }
        }
        splice.push(b']');

        // Single positioned write over the trailing `]`. A failure here can
        // leave the array unterminated — the documented non-atomicity.
        file.seek(SeekFrom::Start(len - 1))?;
        file.write_all(&splice)?;

        tracing::info!(
            fullname = %submission.fullname,
            email = %submission.email,
            "recorded submission in the store"
        );
        Ok(())
    }
}
