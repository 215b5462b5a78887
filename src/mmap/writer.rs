use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::mmap::format::{idf, Header, HEADER_SIZE};
use crate::storage::layout::StorageLayout;

struct PendingTerm {
    term: Box<[u8]>,
    doc_freq: u32,
    posting_offset: u64,
}

/// Two-phase streaming writer for the sealed mmap index format. Postings
/// are appended to a side temp file as each term is finalized, while term
/// metadata (tiny: ~20 bytes/term) stays in memory. `finish` then writes
/// the header and term dictionary, streams the temp postings file into the
/// final file, appends the doc-length table, and atomically renames into
/// place so a reader never observes a partial file.
pub struct MmapIndexWriter {
    postings_temp_path: PathBuf,
    postings_temp: BufWriter<File>,
    postings_cursor: u64,
    terms: Vec<PendingTerm>,
}

impl MmapIndexWriter {
    pub fn create(postings_temp_path: PathBuf) -> Result<Self> {
        let postings_temp = BufWriter::new(File::create(&postings_temp_path)?);
        Ok(MmapIndexWriter {
            postings_temp_path,
            postings_temp,
            postings_cursor: 0,
            terms: Vec::new(),
        })
    }

    /// Appends one term's fully-merged, doc-id-sorted postings.
    pub fn add_term(&mut self, term: &[u8], postings: &[(u32, u16)]) -> Result<()> {
        let offset = self.postings_cursor;
        self.postings_temp
            .write_all(&(postings.len() as u32).to_le_bytes())?;
        for &(doc_id, freq) in postings {
            self.postings_temp.write_all(&doc_id.to_le_bytes())?;
            self.postings_temp.write_all(&freq.to_le_bytes())?;
        }
        self.postings_cursor += 4 + postings.len() as u64 * 6;

        self.terms.push(PendingTerm {
            term: term.into(),
            doc_freq: postings.len() as u32,
            posting_offset: offset,
        });
        Ok(())
    }

    /// Writes the final sealed file at `final_path` via write-to-temp then
    /// rename, and removes the postings side file.
    pub fn finish(mut self, doc_lens: &[u16], final_path: &Path) -> Result<()> {
        self.postings_temp.flush()?;
        drop(self.postings_temp);

        let num_docs = doc_lens.len() as u32;
        let num_terms = self.terms.len() as u32;
        let avg_doc_len = if num_docs == 0 {
            0.0
        } else {
            doc_lens.iter().map(|&l| l as u64).sum::<u64>() as f64 / num_docs as f64
        };

        let term_dict_size: u64 = self
            .terms
            .iter()
            .map(|t| 2 + t.term.len() as u64 + 8 + 4 + 4)
            .sum();
        let term_dict_offset = HEADER_SIZE as u64;
        let postings_offset = term_dict_offset + term_dict_size;
        let postings_size = self.postings_cursor;
        let doclens_offset = postings_offset + postings_size;
        let doclens_size = doc_lens.len() as u64 * 2;

        let header = Header {
            num_docs,
            num_terms,
            avg_doc_len,
            term_dict_offset,
            postings_offset,
            doclens_offset,
            doc_meta_offset: 0,
            term_dict_size,
            postings_size,
            doclens_size,
            doc_meta_size: 0,
        };

        let final_temp_path = StorageLayout::temp_path_for(final_path);
        {
            let mut out = BufWriter::new(File::create(&final_temp_path)?);

            let mut header_bytes = [0u8; HEADER_SIZE];
            header.write_to(&mut header_bytes);
            out.write_all(&header_bytes)?;

            for term in &self.terms {
                out.write_all(&(term.term.len() as u16).to_le_bytes())?;
                out.write_all(&term.term)?;
                out.write_all(&term.posting_offset.to_le_bytes())?;
                out.write_all(&term.doc_freq.to_le_bytes())?;
                out.write_all(&idf(num_docs, term.doc_freq).to_le_bytes())?;
            }

            let mut postings_in = BufReader::new(File::open(&self.postings_temp_path)?);
            std::io::copy(&mut postings_in, &mut out)?;

            for &length in doc_lens {
                out.write_all(&length.to_le_bytes())?;
            }

            out.flush()?;
            out.get_ref().sync_all()?;
        }

        fs::rename(&final_temp_path, final_path)?;
        fs::remove_file(&self.postings_temp_path).ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmap::reader::MmapIndex;

    #[test]
    fn writes_readable_single_term_index() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("index.bin");
        let postings_temp = dir.path().join("postings.tmp");

        let mut writer = MmapIndexWriter::create(postings_temp).unwrap();
        writer.add_term(b"fox", &[(0, 1)]).unwrap();
        writer.finish(&[4], &final_path).unwrap();

        let index = MmapIndex::open(&final_path).unwrap();
        assert_eq!(index.num_docs(), 1);
        assert_eq!(index.doc_len(0), 4);
        let postings = index.postings_for(b"fox").unwrap();
        assert_eq!(postings, vec![(0, 1)]);
    }
}
