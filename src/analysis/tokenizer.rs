use crate::core::types::Fingerprint;

const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
const FNV_PRIME: u64 = 1_099_511_628_211;

const MIN_TOKEN_LEN: usize = 2;
const MAX_TOKEN_LEN: usize = 32;

/// `is_alphanum[b]`: true iff byte b is ASCII `[A-Za-z0-9]`.
const fn build_is_alphanum() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0u16;
    while b < 256 {
        let c = b as u8;
        table[b as usize] = c.is_ascii_alphanumeric();
        b += 1;
    }
    table
}

/// `to_lower[b]`: lowercased byte if alphanumeric, else 0 (delimiter sentinel).
const fn build_to_lower() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut b = 0u16;
    while b < 256 {
        let c = b as u8;
        if c.is_ascii_alphanumeric() {
            table[b as usize] = c.to_ascii_lowercase();
        }
        b += 1;
    }
    table
}

static IS_ALPHANUM: [bool; 256] = build_is_alphanum();
static TO_LOWER: [u8; 256] = build_to_lower();

/// Per-document container accumulating unique term fingerprints, their
/// within-document frequency, and the term's surface bytes as first observed
/// in this document (carried downstream so the sealed segment can store a
/// canonical string per fingerprint). Reused across documents by the caller
/// to keep the tokenizer allocation-free in steady state.
#[derive(Debug, Default, Clone)]
pub struct DocTermFreqs {
    freqs: std::collections::HashMap<Fingerprint, (Box<[u8]>, u32), ahash::RandomState>,
}

impl DocTermFreqs {
    pub fn new() -> Self {
        DocTermFreqs::default()
    }

    pub fn clear(&mut self) {
        self.freqs.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fingerprint, &[u8], u32)> + '_ {
        self.freqs.iter().map(|(&h, (term, f))| (h, term.as_ref(), *f))
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    fn bump(&mut self, fingerprint: Fingerprint, token: &[u8]) {
        self.freqs
            .entry(fingerprint)
            .and_modify(|(_, f)| *f += 1)
            .or_insert_with(|| (token.into(), 1));
    }
}

/// Byte-level, UTF-8-agnostic word splitter and 64-bit FNV-1a fingerprinter.
/// Zero heap allocation in steady state: scans the input once, updates a
/// rolling FNV-1a hash per candidate token, and only ever writes into the
/// caller-supplied `DocTermFreqs`.
///
/// Bytes above 127 are treated as delimiters (no Unicode case-folding); a
/// token is emitted iff its length is in `[2, 32]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Tokenizer
    }

    /// Tokenizes `text`, populating `out` with unique fingerprint -> frequency
    /// pairs for this document, and returns the total token count (raw
    /// occurrences, not unique terms) saturated at 65535.
    pub fn tokenize(&self, text: &[u8], out: &mut DocTermFreqs) -> u32 {
        out.clear();
        let mut total: u32 = 0;
        let mut i = 0usize;
        let len = text.len();

        while i < len {
            // Skip delimiter bytes.
            while i < len && !IS_ALPHANUM[text[i] as usize] {
                i += 1;
            }
            if i >= len {
                break;
            }

            let mut lowered = [0u8; MAX_TOKEN_LEN];
            let mut hash = FNV_OFFSET_BASIS;
            let mut token_len = 0usize;
            while i < len && IS_ALPHANUM[text[i] as usize] {
                let lower = TO_LOWER[text[i] as usize];
                hash = (hash ^ lower as u64).wrapping_mul(FNV_PRIME);
                if token_len < MAX_TOKEN_LEN {
                    lowered[token_len] = lower;
                }
                token_len += 1;
                i += 1;
            }

            if (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&token_len) {
                out.bump(hash, &lowered[..token_len]);
                total = total.saturating_add(1);
            }
        }

        total.min(crate::core::types::MAX_DOC_LEN)
    }

    /// Fingerprints a single query token the same way document tokens are
    /// fingerprinted, so accumulator lookups line up. Returns `None` if the
    /// token falls outside the `[2, 32]` length bound (it was never indexed).
    pub fn fingerprint_token(&self, token: &[u8]) -> Option<Fingerprint> {
        if !(MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&token.len()) {
            return None;
        }
        let mut hash = FNV_OFFSET_BASIS;
        for &b in token {
            if !IS_ALPHANUM[b as usize] {
                return None;
            }
            hash = (hash ^ TO_LOWER[b as usize] as u64).wrapping_mul(FNV_PRIME);
        }
        Some(hash)
    }
}
