use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::core::error::{Error, ErrorKind, Result};
use crate::mmap::format::{Header, HEADER_SIZE};

struct TermEntry {
    posting_offset: u64,
    doc_freq: u32,
    idf: f32,
}

/// Read-only, memory-mapped view of a sealed index file. The term
/// dictionary is scanned once at open time into an in-memory hash map (one
/// small entry per unique term); the doc-length table is copied into an
/// owned vector (2 bytes/doc). Posting lists are read directly out of the
/// mapped region on demand — no copy beyond the returned `Vec`.
pub struct MmapIndex {
    mmap: Mmap,
    header: Header,
    terms: HashMap<Box<[u8]>, TermEntry, ahash::RandomState>,
    doc_lens: Vec<u16>,
}

impl MmapIndex {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        if (mmap.len() as u64) < HEADER_SIZE as u64 {
            return Err(Error::truncated("index file shorter than the header"));
        }
        let header = Header::read_from(&mmap[..HEADER_SIZE])?;

        let expected_len = header.doclens_offset + header.doclens_size;
        if (mmap.len() as u64) < expected_len {
            return Err(Error::truncated("index file shorter than header claims"));
        }

        let terms = read_term_dictionary(&mmap, &header)?;
        let doc_lens = read_doc_lens(&mmap, &header);

        Ok(MmapIndex {
            mmap,
            header,
            terms,
            doc_lens,
        })
    }

    pub fn num_docs(&self) -> u32 {
        self.header.num_docs
    }

    pub fn num_terms(&self) -> u32 {
        self.header.num_terms
    }

    pub fn avg_doc_len(&self) -> f64 {
        self.header.avg_doc_len
    }

    pub fn doc_len(&self, doc_id: u32) -> u16 {
        self.doc_lens.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn idf(&self, term: &[u8]) -> Option<f32> {
        self.terms.get(term).map(|t| t.idf)
    }

    /// Reads one term's posting list directly from the mapped region.
    pub fn postings_for(&self, term: &[u8]) -> Option<Vec<(u32, u16)>> {
        let entry = self.terms.get(term)?;
        let start = (self.header.postings_offset + entry.posting_offset) as usize;
        let count = u32::from_le_bytes(self.mmap[start..start + 4].try_into().unwrap());
        let mut postings = Vec::with_capacity(count as usize);
        let mut pos = start + 4;
        for _ in 0..count {
            let doc_id = u32::from_le_bytes(self.mmap[pos..pos + 4].try_into().unwrap());
            let freq = u16::from_le_bytes(self.mmap[pos + 4..pos + 6].try_into().unwrap());
            postings.push((doc_id, freq));
            pos += 6;
        }
        Some(postings)
    }
}

fn read_term_dictionary(
    mmap: &Mmap,
    header: &Header,
) -> Result<HashMap<Box<[u8]>, TermEntry, ahash::RandomState>> {
    let mut terms = HashMap::with_capacity_and_hasher(header.num_terms as usize, ahash::RandomState::new());
    let mut pos = header.term_dict_offset as usize;
    let end = (header.term_dict_offset + header.term_dict_size) as usize;

    for _ in 0..header.num_terms {
        if pos + 2 > end {
            return Err(Error::new(ErrorKind::Truncated, "term dictionary entry truncated"));
        }
        let term_len = u16::from_le_bytes(mmap[pos..pos + 2].try_into().unwrap()) as usize;
        pos += 2;
        let term = &mmap[pos..pos + term_len];
        pos += term_len;
        let posting_offset = u64::from_le_bytes(mmap[pos..pos + 8].try_into().unwrap());
        pos += 8;
        let doc_freq = u32::from_le_bytes(mmap[pos..pos + 4].try_into().unwrap());
        pos += 4;
        let idf = f32::from_le_bytes(mmap[pos..pos + 4].try_into().unwrap());
        pos += 4;

        terms.insert(
            term.to_vec().into_boxed_slice(),
            TermEntry {
                posting_offset,
                doc_freq,
                idf,
            },
        );
    }

    Ok(terms)
}

fn read_doc_lens(mmap: &Mmap, header: &Header) -> Vec<u16> {
    let mut lens = Vec::with_capacity(header.num_docs as usize);
    let mut pos = header.doclens_offset as usize;
    for _ in 0..header.num_docs {
        lens.push(u16::from_le_bytes(mmap[pos..pos + 2].try_into().unwrap()));
        pos += 2;
    }
    lens
}
