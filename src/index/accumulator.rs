use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::types::{DocId, Fingerprint};

/// One term's state while a shard is still open: the canonical surface
/// bytes as first observed (first-writer-wins across the whole run, since a
/// fingerprint only ever routes to one shard) plus its posting list, built
/// up in whatever order workers flush them -- not yet sorted by doc-id.
pub struct ShardTerm {
    pub term: Box<[u8]>,
    pub postings: Vec<(u32, u16)>,
}

pub type ShardPostings = HashMap<Fingerprint, ShardTerm, ahash::RandomState>;

/// N independent partitions of the term space, each behind its own mutex.
/// A term lives in exactly one shard, selected by the low bits of its
/// fingerprint, so two workers touching different terms in different shards
/// never contend.
pub struct ShardAccumulator {
    shards: Vec<Mutex<ShardPostings>>,
    mask: u64,
}

impl ShardAccumulator {
    /// `num_shards` must be a power of two.
    pub fn new(num_shards: usize) -> Self {
        assert!(num_shards.is_power_of_two(), "num_shards must be a power of two");
        let mut shards = Vec::with_capacity(num_shards);
        for _ in 0..num_shards {
            shards.push(Mutex::new(HashMap::default()));
        }
        ShardAccumulator {
            shards,
            mask: (num_shards - 1) as u64,
        }
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    #[inline]
    pub fn shard_of(&self, fingerprint: Fingerprint) -> usize {
        (fingerprint & self.mask) as usize
    }

    /// Merges `triples` (already routed to this shard) into the shard's map.
    /// Called with the shard already resolved by the caller (`LocalBuffer`)
    /// so the mutex is acquired exactly once per flush.
    pub fn flush_shard(&self, shard: usize, triples: &[(Fingerprint, Box<[u8]>, DocId, u16)]) {
        if triples.is_empty() {
            return;
        }
        let mut map = self.shards[shard].lock();
        for (hash, term, doc_id, freq) in triples {
            let entry = map.entry(*hash).or_insert_with(|| ShardTerm {
                term: term.clone(),
                postings: Vec::new(),
            });
            entry.postings.push((doc_id.value(), *freq));
        }
    }

    /// Takes ownership of every shard's postings, leaving empty maps behind.
    /// Used when sealing the accumulator to a segment file.
    pub fn take_all(&self) -> Vec<ShardPostings> {
        self.shards
            .iter()
            .map(|shard| std::mem::take(&mut *shard.lock()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.lock().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_low_bits_of_fingerprint() {
        let acc = ShardAccumulator::new(4);
        assert_eq!(acc.shard_of(0b1000), 0);
        assert_eq!(acc.shard_of(0b1001), 1);
        assert_eq!(acc.shard_of(0b1011), 3);
    }

    #[test]
    fn flush_then_take_preserves_triples() {
        let acc = ShardAccumulator::new(2);
        let hash: Fingerprint = 10; // even -> shard 0
        let term: Box<[u8]> = (*b"fox").into();
        acc.flush_shard(
            0,
            &[
                (hash, term.clone(), DocId::new(1), 3),
                (hash, term.clone(), DocId::new(2), 1),
            ],
        );
        let shards = acc.take_all();
        let entry = shards[0].get(&hash).unwrap();
        assert_eq!(&*entry.term, b"fox");
        assert_eq!(entry.postings, vec![(1u32, 3u16), (2u32, 1u16)]);
        assert!(acc.is_empty());
    }

    #[test]
    fn first_writer_wins_for_canonical_term() {
        let acc = ShardAccumulator::new(1);
        let hash: Fingerprint = 1;
        acc.flush_shard(0, &[(hash, (*b"Cat").into(), DocId::new(0), 1)]);
        acc.flush_shard(0, &[(hash, (*b"CAT").into(), DocId::new(1), 1)]);
        let shards = acc.take_all();
        assert_eq!(&*shards[0].get(&hash).unwrap().term, b"Cat");
    }
}
