use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::core::error::Result;

/// One entry from a segment's term directory: canonical string, how many
/// docs carry it, and where its postings begin, relative to the start of
/// the postings section.
#[derive(Debug, Clone)]
pub struct TermDirEntry {
    pub term: Box<[u8]>,
    pub doc_freq: u32,
    pub posting_offset: i64,
}

/// Sequential reader over one segment file. The term directory is small
/// (one entry per unique term) and loaded fully into memory at open time;
/// postings are read strictly in directory order via `cursor`, since that
/// is the order they were written in. A term the caller doesn't need yet
/// is skipped with a single bulk discard of its `count * 6` posting bytes,
/// never by reading postings one at a time.
pub struct SegmentReader {
    file: BufReader<File>,
    num_docs: u32,
    term_directory: Vec<TermDirEntry>,
    cursor: usize,
}

impl SegmentReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = BufReader::new(File::open(path)?);

        let num_docs = read_u32(&mut file)?;
        let num_terms = read_u32(&mut file)?;

        let mut term_directory = Vec::with_capacity(num_terms as usize);
        for _ in 0..num_terms {
            let term_len = read_u16(&mut file)? as usize;
            let mut term = vec![0u8; term_len];
            file.read_exact(&mut term)?;
            let doc_freq = read_u32(&mut file)?;
            let posting_offset = read_i64(&mut file)?;
            term_directory.push(TermDirEntry {
                term: term.into_boxed_slice(),
                doc_freq,
                posting_offset,
            });
        }

        Ok(SegmentReader {
            file,
            num_docs,
            term_directory,
            cursor: 0,
        })
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn term_directory(&self) -> &[TermDirEntry] {
        &self.term_directory
    }

    /// The directory entry the reader is positioned at, not yet consumed.
    pub fn peek_next_term(&self) -> Option<&TermDirEntry> {
        self.term_directory.get(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.term_directory.len()
    }

    /// Reads and returns the postings for the entry at `cursor`, advancing
    /// past it. Caller must have confirmed via `peek_next_term` that this
    /// is the term it wants.
    pub fn read_next_term_postings(&mut self) -> Result<Vec<(u32, u16)>> {
        let count = read_u32(&mut self.file)?;
        let mut postings = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let doc_id = read_u32(&mut self.file)?;
            let freq = read_u16(&mut self.file)?;
            postings.push((doc_id, freq));
        }
        self.cursor += 1;
        Ok(postings)
    }

    /// Bulk-discards the postings of the entry at `cursor` without
    /// materializing them, advancing past it.
    pub fn skip_next_term(&mut self) -> Result<()> {
        let count = read_u32(&mut self.file)?;
        io::copy(&mut (&mut self.file).take(count as u64 * 6), &mut io::sink())?;
        self.cursor += 1;
        Ok(())
    }

    /// Reads the trailing doc-length table. Any terms not yet consumed are
    /// bulk-discarded first so the reader lands at the right offset.
    pub fn read_doc_lens(&mut self) -> Result<Vec<(u32, u16)>> {
        while !self.is_exhausted() {
            self.skip_next_term()?;
        }
        let count = read_u32(&mut self.file)?;
        let mut lens = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let doc_id = read_u32(&mut self.file)?;
            let length = read_u16(&mut self.file)?;
            lens.push((doc_id, length));
        }
        Ok(lens)
    }
}

fn read_u16(r: &mut impl Read) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i64(r: &mut impl Read) -> Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::accumulator::ShardTerm;
    use crate::storage::segment_writer::write_segment;
    use std::collections::HashMap;

    #[test]
    fn skip_next_term_advances_without_reading_postings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg_00000.bin");

        let mut apple: crate::index::accumulator::ShardPostings = HashMap::default();
        apple.insert(1, ShardTerm { term: (*b"apple").into(), postings: vec![(0, 1)] });
        let mut zebra: crate::index::accumulator::ShardPostings = HashMap::default();
        zebra.insert(2, ShardTerm { term: (*b"zebra").into(), postings: vec![(0, 1)] });

        write_segment(vec![apple, zebra], &[(0, 2)], 1, &path).unwrap();

        let mut reader = SegmentReader::open(&path).unwrap();
        assert_eq!(reader.peek_next_term().unwrap().term.as_ref(), b"apple");
        reader.skip_next_term().unwrap();
        assert_eq!(reader.peek_next_term().unwrap().term.as_ref(), b"zebra");
        let postings = reader.read_next_term_postings().unwrap();
        assert_eq!(postings, vec![(0, 1)]);
        assert!(reader.is_exhausted());
        assert_eq!(reader.read_doc_lens().unwrap(), vec![(0, 2)]);
    }
}
