/// Dense, externally-assigned document identifier. Never reused within one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

/// 64-bit FNV-1a fingerprint of a lowercased token. The key used for all
/// in-memory accumulation; collisions between distinct surface tokens are an
/// accepted approximation (see `analysis::tokenizer`).
pub type Fingerprint = u64;

/// Maximum doc length recorded in the dense doc-len table; longer documents
/// saturate at this value.
pub const MAX_DOC_LEN: u32 = u16::MAX as u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_roundtrips_through_u32() {
        let id: DocId = 42u32.into();
        assert_eq!(id.value(), 42);
    }
}
