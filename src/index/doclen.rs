use parking_lot::Mutex;

use crate::core::error::{Error, ErrorKind};
use crate::core::types::MAX_DOC_LEN;

/// Dense, append-only doc-id -> length table shared across ingest workers.
/// Grows monotonically as new doc-ids are assigned; never mutated once a
/// doc-id has been set, so segment seals can read a stable slice.
pub struct DocLenStore {
    lengths: Mutex<Vec<u16>>,
    max_doc_id: u32,
}

impl DocLenStore {
    /// `max_doc_id` bounds how far `set` will ever grow the dense table;
    /// doc-ids past it are clamped rather than honored (see `set`).
    pub fn new(max_doc_id: u32) -> Self {
        DocLenStore {
            lengths: Mutex::new(Vec::new()),
            max_doc_id,
        }
    }

    /// Records the token count for `doc_id`, saturating the length at
    /// `u16::MAX`. A `doc_id` past the configured max is clamped to that
    /// max (and logged) instead of growing the table without bound.
    pub fn set(&self, doc_id: u32, raw_len: u32) {
        let clamped_id = if doc_id > self.max_doc_id {
            let err = Error::new(
                ErrorKind::DocIdOutOfRange,
                format!("doc_id {} exceeds configured max {}; clamping to max", doc_id, self.max_doc_id),
            );
            log::warn!("{}", err);
            self.max_doc_id
        } else {
            doc_id
        };
        let len = raw_len.min(MAX_DOC_LEN) as u16;
        let mut lengths = self.lengths.lock();
        let idx = clamped_id as usize;
        if idx >= lengths.len() {
            lengths.resize(idx + 1, 0);
        }
        lengths[idx] = len;
    }

    /// Snapshot of lengths for doc-ids in `[start, end]` inclusive, paired
    /// with their doc-id, in ascending order. Used by the segment writer.
    pub fn range(&self, start: u32, end: u32) -> Vec<(u32, u16)> {
        let lengths = self.lengths.lock();
        (start..=end)
            .filter(|&id| (id as usize) < lengths.len())
            .map(|id| (id, lengths[id as usize]))
            .collect()
    }

    /// Total number of doc-ids with a recorded length.
    pub fn len(&self) -> usize {
        self.lengths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.lock().is_empty()
    }
}
