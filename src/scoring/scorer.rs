/// BM25 scorer: term-frequency saturation (`k1`) and length-normalization
/// strength (`b`), applied per query term and summed by the caller.
#[derive(Debug, Clone, Copy)]
pub struct BM25Scorer {
    pub k1: f32,
    pub b: f32,
}

impl Default for BM25Scorer {
    fn default() -> Self {
        BM25Scorer { k1: 1.2, b: 0.75 }
    }
}

impl BM25Scorer {
    /// Contribution of one query term in one document: `idf * tf_norm`
    /// where `tf_norm = (f * (k1 + 1)) / (f + k1 * (1 - b + b * dl / avg_dl))`.
    pub fn score_term(&self, freq: u16, doc_len: u16, avg_doc_len: f64, idf: f32) -> f32 {
        let tf = freq as f32;
        let dl = doc_len as f32;
        let avg_dl = avg_doc_len as f32;
        let tf_norm = (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * (dl / avg_dl)));
        idf * tf_norm
    }
}
