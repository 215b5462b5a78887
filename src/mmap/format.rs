/// Fixed-size binary header at the start of every sealed index file.
pub const MAGIC: [u8; 8] = *b"MMAPIDX1";
pub const FORMAT_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 128;

/// In-memory view of the 128-byte header. Field offsets here are the
/// contract; `read_from`/`write_to` must keep them in lockstep with the
/// on-disk layout documented alongside them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub num_docs: u32,
    pub num_terms: u32,
    pub avg_doc_len: f64,
    pub term_dict_offset: u64,
    pub postings_offset: u64,
    pub doclens_offset: u64,
    pub doc_meta_offset: u64,
    pub term_dict_size: u64,
    pub postings_size: u64,
    pub doclens_size: u64,
    pub doc_meta_size: u64,
}

// offset  size  field
//  0       8    magic "MMAPIDX1"
//  8       4    version (=1)
// 12       4    num_docs
// 16       4    num_terms
// 20       8    avg_doc_len (f64)
// 28       8    term_dict_offset  (=128)
// 36       8    postings_offset
// 44       8    doclens_offset
// 52       8    doc_meta_offset   (reserved, 0)
// 60       8    term_dict_size
// 68       8    postings_size
// 76       8    doclens_size
// 84       8    doc_meta_size
// 92-127        reserved (zeros)
impl Header {
    pub fn write_to(&self, buf: &mut [u8; HEADER_SIZE]) {
        buf.fill(0);
        buf[0..8].copy_from_slice(&MAGIC);
        buf[8..12].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf[12..16].copy_from_slice(&self.num_docs.to_le_bytes());
        buf[16..20].copy_from_slice(&self.num_terms.to_le_bytes());
        buf[20..28].copy_from_slice(&self.avg_doc_len.to_le_bytes());
        buf[28..36].copy_from_slice(&self.term_dict_offset.to_le_bytes());
        buf[36..44].copy_from_slice(&self.postings_offset.to_le_bytes());
        buf[44..52].copy_from_slice(&self.doclens_offset.to_le_bytes());
        buf[52..60].copy_from_slice(&self.doc_meta_offset.to_le_bytes());
        buf[60..68].copy_from_slice(&self.term_dict_size.to_le_bytes());
        buf[68..76].copy_from_slice(&self.postings_size.to_le_bytes());
        buf[76..84].copy_from_slice(&self.doclens_size.to_le_bytes());
        buf[84..92].copy_from_slice(&self.doc_meta_size.to_le_bytes());
    }

    pub fn read_from(buf: &[u8]) -> crate::core::error::Result<Self> {
        use crate::core::error::Error;

        if buf.len() < HEADER_SIZE {
            return Err(Error::truncated("index file shorter than the 128-byte header"));
        }
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&buf[0..8]);
        if magic != MAGIC {
            return Err(Error::invalid_magic(magic));
        }
        let version = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(Error::version_mismatch(version));
        }

        Ok(Header {
            num_docs: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            num_terms: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
            avg_doc_len: f64::from_le_bytes(buf[20..28].try_into().unwrap()),
            term_dict_offset: u64::from_le_bytes(buf[28..36].try_into().unwrap()),
            postings_offset: u64::from_le_bytes(buf[36..44].try_into().unwrap()),
            doclens_offset: u64::from_le_bytes(buf[44..52].try_into().unwrap()),
            doc_meta_offset: u64::from_le_bytes(buf[52..60].try_into().unwrap()),
            term_dict_size: u64::from_le_bytes(buf[60..68].try_into().unwrap()),
            postings_size: u64::from_le_bytes(buf[68..76].try_into().unwrap()),
            doclens_size: u64::from_le_bytes(buf[76..84].try_into().unwrap()),
            doc_meta_size: u64::from_le_bytes(buf[84..92].try_into().unwrap()),
        })
    }
}

/// `idf = ln((N - df + 0.5) / (df + 0.5) + 1)`.
pub fn idf(num_docs: u32, doc_freq: u32) -> f32 {
    let n = num_docs as f64;
    let df = doc_freq as f64;
    (((n - df + 0.5) / (df + 0.5)) + 1.0).ln() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrips_through_bytes() {
        let header = Header {
            num_docs: 10,
            num_terms: 5,
            avg_doc_len: 12.5,
            term_dict_offset: HEADER_SIZE as u64,
            postings_offset: 1000,
            doclens_offset: 2000,
            doc_meta_offset: 0,
            term_dict_size: 800,
            postings_size: 900,
            doclens_size: 20,
            doc_meta_size: 0,
        };
        let mut buf = [0u8; HEADER_SIZE];
        header.write_to(&mut buf);
        let parsed = Header::read_from(&buf).unwrap();
        assert_eq!(header, parsed);
    }

    #[test]
    fn rejects_bad_magic() {
        let buf = [0u8; HEADER_SIZE];
        assert!(Header::read_from(&buf).is_err());
    }

    #[test]
    fn idf_matches_single_doc_formula() {
        // S1: idf_fox = ln((1-1+0.5)/(1+0.5)+1) = ln(4/3)
        let value = idf(1, 1);
        assert!((value - (4.0f32 / 3.0).ln()).abs() < 1e-6);
    }
}
