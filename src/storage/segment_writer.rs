use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::core::error::Result;
use crate::index::accumulator::ShardPostings;
use crate::storage::layout::StorageLayout;

const WRITE_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// One term's fully finalized state, ready to be written: canonical bytes,
/// doc-id-sorted postings, and the byte-encoded postings block (so the
/// writer can compute every term's `posting_offset` before it writes the
/// term directory that precedes the postings section).
struct FinalTerm {
    term: Box<[u8]>,
    doc_freq: u32,
    postings_bytes: Vec<u8>,
}

/// Seals the current accumulator snapshot (`shards`) plus the doc-length
/// slice for the doc-ids it covers into one immutable segment file at
/// `path`, per the fixed binary layout: term directory, postings section,
/// doc-length table. Written to a `.tmp` sibling and renamed into place so
/// a crash mid-write never leaves a half-written file at `path` for the
/// merger to read.
pub fn write_segment(
    shards: Vec<ShardPostings>,
    doc_lens: &[(u32, u16)],
    num_docs_in_segment: u32,
    path: &Path,
) -> Result<()> {
    let mut terms = finalize_terms(shards);
    // Sort by canonical UTF-8 term string; tie-break by a secondary stable
    // key (the term bytes themselves already disambiguate ties except for
    // true duplicates, which cannot occur since each fingerprint appears in
    // exactly one shard's map).
    terms.sort_by(|a, b| a.term.cmp(&b.term));

    let mut offset: i64 = 0;
    let offsets: Vec<i64> = terms
        .iter()
        .map(|t| {
            let this_offset = offset;
            offset += t.postings_bytes.len() as i64;
            this_offset
        })
        .collect();

    let temp_path = StorageLayout::temp_path_for(path);
    let file = File::create(&temp_path)?;
    let mut w = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

    w.write_all(&num_docs_in_segment.to_le_bytes())?;
    w.write_all(&(terms.len() as u32).to_le_bytes())?;

    for (term, &posting_offset) in terms.iter().zip(&offsets) {
        w.write_all(&(term.term.len() as u16).to_le_bytes())?;
        w.write_all(&term.term)?;
        w.write_all(&term.doc_freq.to_le_bytes())?;
        w.write_all(&posting_offset.to_le_bytes())?;
    }

    for term in &terms {
        w.write_all(&term.postings_bytes)?;
    }

    w.write_all(&(doc_lens.len() as u32).to_le_bytes())?;
    for &(doc_id, length) in doc_lens {
        w.write_all(&doc_id.to_le_bytes())?;
        w.write_all(&length.to_le_bytes())?;
    }

    w.flush()?;
    w.get_ref().sync_all()?;
    drop(w);

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Finalizes every shard's terms (sort postings by doc-id, collapse
/// duplicates, byte-encode). Shards are independent, so this runs across
/// the rayon global pool rather than serially.
fn finalize_terms(shards: Vec<ShardPostings>) -> Vec<FinalTerm> {
    shards
        .into_par_iter()
        .flat_map_iter(|shard| {
            shard.into_iter().map(|(_fingerprint, entry)| {
                let mut postings = entry.postings;
                postings.sort_by_key(|&(doc_id, _)| doc_id);
                debug_assert!(
                    postings.windows(2).all(|w| w[0].0 != w[1].0),
                    "duplicate doc-id within one segment for the same term"
                );
                collapse_duplicate_doc_ids(&mut postings);

                let mut postings_bytes = Vec::with_capacity(4 + postings.len() * 6);
                postings_bytes.extend_from_slice(&(postings.len() as u32).to_le_bytes());
                for (doc_id, freq) in &postings {
                    postings_bytes.extend_from_slice(&doc_id.to_le_bytes());
                    postings_bytes.extend_from_slice(&freq.to_le_bytes());
                }

                FinalTerm {
                    term: entry.term,
                    doc_freq: postings.len() as u32,
                    postings_bytes,
                }
            })
        })
        .collect()
}

/// Collapses adjacent equal doc-ids (already sorted) by summing their
/// frequencies. A no-op in the expected case where doc-ids are unique.
pub(crate) fn collapse_duplicate_doc_ids(postings: &mut Vec<(u32, u16)>) {
    if postings.len() < 2 {
        return;
    }
    let mut write = 0;
    for read in 1..postings.len() {
        if postings[read].0 == postings[write].0 {
            postings[write].1 = postings[write].1.saturating_add(postings[read].1);
        } else {
            write += 1;
            postings[write] = postings[read];
        }
    }
    postings.truncate(write + 1);
}
