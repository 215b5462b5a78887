use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::mmap::reader::MmapIndex;
use crate::mmap::writer::MmapIndexWriter;
use crate::storage::segment_reader::SegmentReader;
use crate::storage::segment_writer::collapse_duplicate_doc_ids;

/// Combines K segment files into one sealed mmap index with memory bounded
/// by the term directories (small) plus one term's postings at a time --
/// never the full posting set of more than one term across segments.
pub struct StreamingMerger;

impl StreamingMerger {
    /// `segment_paths` must already be in segment-creation order; doc-id
    /// ranges across them are assumed disjoint (each doc-id assigned to
    /// exactly one segment by the external, monotonically increasing
    /// assigner). Deletes the segment files on success.
    pub fn merge(segment_paths: &[PathBuf], output_path: &Path, postings_temp: PathBuf) -> Result<MmapIndex> {
        let mut readers: Vec<SegmentReader> = segment_paths
            .iter()
            .map(|p| SegmentReader::open(p))
            .collect::<Result<_>>()?;

        let mut all_terms: BTreeSet<Vec<u8>> = BTreeSet::new();
        for reader in &readers {
            for entry in reader.term_directory() {
                all_terms.insert(entry.term.to_vec());
            }
        }

        let mut writer = MmapIndexWriter::create(postings_temp)?;

        for term in &all_terms {
            let mut merged: Vec<(u32, u16)> = Vec::new();
            for reader in readers.iter_mut() {
                // Each reader's own term order is a subsequence of the
                // global sorted union, so its next unconsumed term is
                // either exactly `term` or still ahead of it.
                while let Some(entry) = reader.peek_next_term() {
                    if entry.term.as_ref() == term.as_slice() {
                        merged.extend(reader.read_next_term_postings()?);
                        break;
                    } else if entry.term.as_ref().lt(term.as_slice()) {
                        // Cannot happen given the union above; kept as a
                        // bulk discard so a reader can never desync.
                        reader.skip_next_term()?;
                    } else {
                        break;
                    }
                }
            }

            debug_assert!(has_disjoint_doc_ids(&merged), "duplicate doc-id across segments for one term");
            merged.sort_by_key(|&(doc_id, _)| doc_id);
            collapse_duplicate_doc_ids(&mut merged);
            writer.add_term(term, &merged)?;
        }

        let mut doc_lens: HashMap<u32, u16> = HashMap::new();
        for reader in readers.iter_mut() {
            for (doc_id, length) in reader.read_doc_lens()? {
                doc_lens.insert(doc_id, length);
            }
        }
        let num_docs = doc_lens.keys().copied().max().map(|m| m + 1).unwrap_or(0);
        let mut dense_doc_lens = vec![0u16; num_docs as usize];
        for (doc_id, length) in doc_lens {
            dense_doc_lens[doc_id as usize] = length;
        }

        writer.finish(&dense_doc_lens, output_path)?;

        for path in segment_paths {
            std::fs::remove_file(path).ok();
        }

        MmapIndex::open(output_path)
    }
}

fn has_disjoint_doc_ids(postings: &[(u32, u16)]) -> bool {
    let mut ids: Vec<u32> = postings.iter().map(|&(d, _)| d).collect();
    let before = ids.len();
    ids.sort_unstable();
    ids.dedup();
    ids.len() == before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::accumulator::{ShardPostings, ShardTerm};
    use crate::storage::segment_writer::write_segment;
    use std::collections::HashMap as StdHashMap;

    fn shard_with(term: &[u8], fingerprint: u64, postings: Vec<(u32, u16)>) -> ShardPostings {
        let mut map: ShardPostings = StdHashMap::default();
        map.insert(fingerprint, ShardTerm { term: term.into(), postings });
        map
    }

    #[test]
    fn merges_three_segments_into_sorted_posting_list() {
        let dir = tempfile::tempdir().unwrap();

        let seg0 = dir.path().join("seg_00000.bin");
        write_segment(vec![shard_with(b"a", 1, vec![(0, 1), (1, 2)])], &[(0, 1), (1, 1)], 2, &seg0).unwrap();

        let seg1 = dir.path().join("seg_00001.bin");
        write_segment(vec![shard_with(b"a", 1, vec![(2, 3)])], &[(2, 1)], 1, &seg1).unwrap();

        let seg2 = dir.path().join("seg_00002.bin");
        write_segment(vec![shard_with(b"b", 2, vec![(3, 1)])], &[(3, 1)], 1, &seg2).unwrap();

        let output = dir.path().join("index.bin");
        let postings_temp = dir.path().join("merge_postings.tmp");
        let index = StreamingMerger::merge(&[seg0, seg1, seg2], &output, postings_temp).unwrap();

        assert_eq!(index.num_docs(), 4);
        assert_eq!(index.postings_for(b"a").unwrap(), vec![(0, 1), (1, 2), (2, 3)]);
        assert_eq!(index.postings_for(b"b").unwrap(), vec![(3, 1)]);
        assert!(!dir.path().join("seg_00000.bin").exists());
    }
}
