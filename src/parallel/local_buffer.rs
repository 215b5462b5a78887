use crate::analysis::tokenizer::DocTermFreqs;
use crate::core::types::{DocId, Fingerprint};
use crate::index::accumulator::ShardAccumulator;

type Triple = (Fingerprint, Box<[u8]>, DocId, u16);

/// Per-worker staging area: one growable vector per shard, so a worker can
/// batch up several documents' worth of triples before taking any shard's
/// mutex. Workers append to their own buffer without synchronization.
pub struct LocalBuffer {
    buffers: Vec<Vec<Triple>>,
}

impl LocalBuffer {
    pub fn new(num_shards: usize) -> Self {
        LocalBuffer {
            buffers: (0..num_shards).map(|_| Vec::new()).collect(),
        }
    }

    /// Routes every term of one tokenized document into its shard's buffer.
    pub fn push_doc(&mut self, accumulator: &ShardAccumulator, doc_id: DocId, freqs: &DocTermFreqs) {
        for (hash, term, freq) in freqs.iter() {
            let shard = accumulator.shard_of(hash);
            self.buffers[shard].push((hash, term.into(), doc_id, freq.min(u16::MAX as u32) as u16));
        }
    }

    /// Same routing as `push_doc`, but for fingerprint/term/frequency
    /// triples that arrived pre-tokenized (from a `PreTokenizedReader`)
    /// rather than from `DocTermFreqs`.
    pub fn push_pretokenized(
        &mut self,
        accumulator: &ShardAccumulator,
        doc_id: DocId,
        terms: &[(Fingerprint, Box<[u8]>, u16)],
    ) {
        for (hash, term, freq) in terms {
            let shard = accumulator.shard_of(*hash);
            self.buffers[shard].push((*hash, term.clone(), doc_id, *freq));
        }
    }

    /// Total triples currently staged, across all shards.
    pub fn len(&self) -> usize {
        self.buffers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes every shard's staged triples into the accumulator, one shard
    /// mutex acquisition per non-empty shard, then clears local state.
    pub fn flush(&mut self, accumulator: &ShardAccumulator) {
        for (shard, buf) in self.buffers.iter_mut().enumerate() {
            accumulator.flush_shard(shard, buf);
            buf.clear();
        }
    }
}
