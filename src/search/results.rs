use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::types::DocId;

/// One scored hit: a document and its summed BM25 contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

impl Eq for ScoredDoc {}

// Ordered so a min-heap (BinaryHeap's default max-heap, inverted here) keeps
// the worst-of-the-top-k at its peek: lowest score first, and among equal
// scores the highest doc-id first (so the lowest doc-id is evicted last,
// matching the doc-id-ascending tie-break at the top).
impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Bounded top-k collector. Holds at most `k` candidates at any time;
/// documents with score <= 0 are never collected.
pub struct TopKCollector {
    heap: BinaryHeap<ScoredDoc>,
    k: usize,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
        }
    }

    pub fn collect(&mut self, doc: ScoredDoc) {
        if doc.score <= 0.0 || self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(doc);
        } else if let Some(worst) = self.heap.peek() {
            if doc.cmp(worst) == Ordering::Less {
                self.heap.pop();
                self.heap.push(doc);
            }
        }
    }

    /// Final results, sorted score-descending with doc-id-ascending ties.
    pub fn into_sorted_vec(self) -> Vec<ScoredDoc> {
        let mut results: Vec<_> = self.heap.into_iter().collect();
        results.sort();
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_score_descending_then_doc_id_ascending() {
        let mut collector = TopKCollector::new(10);
        collector.collect(ScoredDoc { doc_id: DocId::new(2), score: 1.0 });
        collector.collect(ScoredDoc { doc_id: DocId::new(1), score: 1.0 });
        collector.collect(ScoredDoc { doc_id: DocId::new(0), score: 2.0 });
        let results = collector.into_sorted_vec();
        assert_eq!(results[0].doc_id, DocId::new(0));
        assert_eq!(results[1].doc_id, DocId::new(1));
        assert_eq!(results[2].doc_id, DocId::new(2));
    }

    #[test]
    fn discards_non_positive_scores() {
        let mut collector = TopKCollector::new(10);
        collector.collect(ScoredDoc { doc_id: DocId::new(0), score: 0.0 });
        collector.collect(ScoredDoc { doc_id: DocId::new(1), score: -1.0 });
        assert!(collector.into_sorted_vec().is_empty());
    }

    #[test]
    fn keeps_only_top_k() {
        let mut collector = TopKCollector::new(1);
        collector.collect(ScoredDoc { doc_id: DocId::new(0), score: 1.0 });
        collector.collect(ScoredDoc { doc_id: DocId::new(1), score: 5.0 });
        let results = collector.into_sorted_vec();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, DocId::new(1));
    }
}
