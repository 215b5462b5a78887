use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::analysis::tokenizer::DocTermFreqs;
use crate::core::error::Result;
use crate::core::types::Fingerprint;

/// One document's tokenized form: its raw length (for the doc-len table)
/// and the unique fingerprint/canonical-bytes/frequency triples the
/// tokenizer produced. Carrying the canonical bytes (not just the
/// fingerprint) lets `Ingest::add_pretokenized` feed a shard's accumulator
/// directly, without ever re-running `Tokenizer::tokenize` or needing to
/// read the original text back.
pub struct PreTokenizedDoc {
    pub doc_id: u32,
    pub doc_len: u16,
    pub terms: Vec<(Fingerprint, Box<[u8]>, u16)>,
}

/// Writes the side cache that lets a later ingest run skip tokenization:
/// a header followed by one length-prefixed record per document, matching
/// the record-writing structure segments use for their postings section.
pub struct PreTokenizedWriter {
    writer: BufWriter<File>,
    num_docs: u32,
    total_tokens: u64,
}

impl PreTokenizedWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(4 * 1024 * 1024, file);
        // Placeholder header, patched in on `finish`.
        writer.write_all(&[0u8; 12])?;
        Ok(PreTokenizedWriter {
            writer,
            num_docs: 0,
            total_tokens: 0,
        })
    }

    pub fn add_doc(&mut self, doc_id: u32, doc_len: u16, freqs: &DocTermFreqs) -> Result<()> {
        let num_unique = freqs.len() as u16;
        self.writer.write_all(&doc_id.to_le_bytes())?;
        self.writer.write_all(&num_unique.to_le_bytes())?;
        self.writer.write_all(&doc_len.to_le_bytes())?;
        for (fingerprint, term, freq) in freqs.iter() {
            self.writer.write_all(&fingerprint.to_le_bytes())?;
            self.writer.write_all(&(term.len() as u16).to_le_bytes())?;
            self.writer.write_all(term)?;
            self.writer.write_all(&(freq.min(u16::MAX as u32) as u16).to_le_bytes())?;
        }
        self.num_docs += 1;
        self.total_tokens += doc_len as u64;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        write_header(&file, self.num_docs, self.total_tokens)?;
        file.sync_all()?;
        Ok(())
    }
}

fn write_header(file: &File, num_docs: u32, total_tokens: u64) -> io::Result<()> {
    use std::io::{Seek, SeekFrom};
    let mut file = file.try_clone()?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&num_docs.to_le_bytes())?;
    file.write_all(&total_tokens.to_le_bytes())?;
    Ok(())
}

/// Streams records back out, one document at a time, without materializing
/// the whole cache in memory.
pub struct PreTokenizedReader {
    reader: BufReader<File>,
    num_docs: u32,
    total_tokens: u64,
    read_so_far: u32,
}

impl PreTokenizedReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let num_docs = read_u32(&mut reader)?;
        let total_tokens = read_u64(&mut reader)?;
        Ok(PreTokenizedReader {
            reader,
            num_docs,
            total_tokens,
            read_so_far: 0,
        })
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn next_doc(&mut self) -> Result<Option<PreTokenizedDoc>> {
        if self.read_so_far >= self.num_docs {
            return Ok(None);
        }
        let doc_id = read_u32(&mut self.reader)?;
        let num_unique = read_u16(&mut self.reader)? as usize;
        let doc_len = read_u16(&mut self.reader)?;
        let mut terms = Vec::with_capacity(num_unique);
        for _ in 0..num_unique {
            let fingerprint = read_u64(&mut self.reader)?;
            let term_len = read_u16(&mut self.reader)? as usize;
            let mut term = vec![0u8; term_len];
            self.reader.read_exact(&mut term)?;
            let freq = read_u16(&mut self.reader)?;
            terms.push((fingerprint, term.into_boxed_slice(), freq));
        }
        self.read_so_far += 1;
        Ok(Some(PreTokenizedDoc { doc_id, doc_len, terms }))
    }
}

fn read_u16(r: &mut impl Read) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
