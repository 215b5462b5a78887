use std::collections::HashMap;

use crate::analysis::tokenizer::{DocTermFreqs, Tokenizer};
use crate::core::types::DocId;
use crate::mmap::reader::MmapIndex;
use crate::scoring::scorer::BM25Scorer;
use crate::search::results::{ScoredDoc, TopKCollector};

/// Evaluates free-text queries against a sealed, memory-mapped index.
/// Query text is tokenized the same way document text is, each unique
/// term's posting list is pulled from the index, and per-document BM25
/// contributions are summed across terms before top-k selection.
pub struct QueryEvaluator<'a> {
    index: &'a MmapIndex,
    tokenizer: Tokenizer,
    scorer: BM25Scorer,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(index: &'a MmapIndex) -> Self {
        QueryEvaluator {
            index,
            tokenizer: Tokenizer::new(),
            scorer: BM25Scorer::default(),
        }
    }

    /// Runs a query and returns up to `limit` hits, score-descending with
    /// doc-id-ascending ties. An empty or entirely out-of-vocabulary query
    /// yields an empty result, never an error.
    pub fn search(&self, query_text: &[u8], limit: usize) -> Vec<ScoredDoc> {
        let mut query_terms = DocTermFreqs::new();
        self.tokenizer.tokenize(query_text, &mut query_terms);
        if query_terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let avg_doc_len = self.index.avg_doc_len();
        let mut scores: HashMap<DocId, f32, ahash::RandomState> = HashMap::default();

        for (_fingerprint, term, _query_freq) in query_terms.iter() {
            let Some(idf) = self.index.idf(term) else {
                continue;
            };
            let Some(postings) = self.index.postings_for(term) else {
                continue;
            };
            for (doc_id, freq) in postings {
                let doc_len = self.index.doc_len(doc_id);
                let contribution = self.scorer.score_term(freq, doc_len, avg_doc_len, idf);
                *scores.entry(DocId::new(doc_id)).or_insert(0.0) += contribution;
            }
        }

        let mut collector = TopKCollector::new(limit);
        for (doc_id, score) in scores {
            collector.collect(ScoredDoc { doc_id, score });
        }
        collector.into_sorted_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmap::writer::MmapIndexWriter;

    fn build_index(dir: &std::path::Path, terms: &[(&[u8], &[(u32, u16)])], doc_lens: &[u16]) -> MmapIndex {
        let mut writer = MmapIndexWriter::create(dir.join("postings.tmp")).unwrap();
        for (term, postings) in terms {
            writer.add_term(term, postings).unwrap();
        }
        let final_path = dir.join("index.bin");
        writer.finish(doc_lens, &final_path).unwrap();
        MmapIndex::open(&final_path).unwrap()
    }

    #[test]
    fn empty_query_yields_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path(), &[(b"fox", &[(0, 1)])], &[4]);
        let evaluator = QueryEvaluator::new(&index);
        assert!(evaluator.search(b"   ", 10).is_empty());
    }

    #[test]
    fn unknown_term_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(dir.path(), &[(b"fox", &[(0, 1)])], &[4]);
        let evaluator = QueryEvaluator::new(&index);
        assert!(evaluator.search(b"zzzznotindexed", 10).is_empty());
    }

    #[test]
    fn scores_and_ranks_matching_documents() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(
            dir.path(),
            &[(b"fox", &[(0, 3), (1, 1)])],
            &[4, 10],
        );
        let evaluator = QueryEvaluator::new(&index);
        let hits = evaluator.search(b"fox", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, DocId::new(0));
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn sums_contributions_across_query_terms() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(
            dir.path(),
            &[(b"fox", &[(0, 1)]), (b"quick", &[(0, 1)])],
            &[4],
        );
        let evaluator = QueryEvaluator::new(&index);
        let fox_only = evaluator.search(b"fox", 10);
        let both = evaluator.search(b"quick fox", 10);
        assert!(both[0].score > fox_only[0].score);
    }
}
