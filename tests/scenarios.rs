use drusdenx::core::config::Config;
use drusdenx::core::ingest::Ingest;
use drusdenx::mmap::format::idf;
use drusdenx::mmap::reader::MmapIndex;
use drusdenx::search::executor::QueryEvaluator;

fn config_in(dir: &std::path::Path) -> Config {
    Config::default().with_output_dir(dir.to_path_buf()).with_workers(2)
}

fn ingest_docs(dir: &std::path::Path, docs: &[(u32, &str)], segment_size: usize) -> MmapIndex {
    let mut ingest = Ingest::new(config_in(dir).with_segment_size(segment_size)).unwrap();
    for &(doc_id, text) in docs {
        ingest.add(doc_id, text.as_bytes()).unwrap();
    }
    let output = dir.join("index.bin");
    ingest.finish_to_mmap(&output).unwrap()
}

#[test]
fn s1_single_doc() {
    let dir = tempfile::tempdir().unwrap();
    let index = ingest_docs(dir.path(), &[(0, "the quick brown fox")], 1000);

    assert_eq!(index.num_docs(), 1);
    assert_eq!(index.doc_len(0), 4);
    for term in [b"the".as_slice(), b"quick", b"brown", b"fox"] {
        assert_eq!(index.postings_for(term).unwrap(), vec![(0, 1)]);
    }

    let expected_idf = (4.0f32 / 3.0).ln();
    assert!((index.idf(b"fox").unwrap() - expected_idf).abs() < 1e-5);

    let evaluator = QueryEvaluator::new(&index);
    let hits = evaluator.search(b"fox", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_id.value(), 0);
    assert!(hits[0].score > 0.0);
}

#[test]
fn s2_repeated_terms() {
    let dir = tempfile::tempdir().unwrap();
    let index = ingest_docs(dir.path(), &[(0, "a a a b")], 1000);

    assert_eq!(index.doc_len(0), 4);
    assert_eq!(index.postings_for(b"a").unwrap(), vec![(0, 3)]);
    assert_eq!(index.postings_for(b"b").unwrap(), vec![(0, 1)]);

    let evaluator = QueryEvaluator::new(&index);
    let hits = evaluator.search(b"a", 10);
    let idf_a = index.idf(b"a").unwrap();
    let expected = idf_a * (3.0 * 2.2 / (3.0 + 1.2 * (1.0 - 0.75 + 0.75 * 4.0 / 4.0)));
    assert!((hits[0].score - expected).abs() < 1e-4);
}

#[test]
fn s3_multi_segment_merge() {
    let dir = tempfile::tempdir().unwrap();
    let num_docs = 600;
    let docs: Vec<(u32, &str)> = (0..num_docs).map(|i| (i as u32, "shared common term")).collect();
    let index = ingest_docs(dir.path(), &docs, 200); // three segments of 200 docs each

    assert_eq!(index.num_docs(), num_docs);
    let postings = index.postings_for(b"common").unwrap();
    assert_eq!(postings.len(), num_docs as usize);
    // Concatenation across segments preserves doc-id order.
    for window in postings.windows(2) {
        assert!(window[0].0 < window[1].0);
    }
}

#[test]
fn s4_case_insensitivity() {
    let dir = tempfile::tempdir().unwrap();
    let index = ingest_docs(dir.path(), &[(0, "Foo"), (1, "FOO foo")], 1000);
    assert_eq!(index.postings_for(b"foo").unwrap(), vec![(0, 1), (1, 2)]);
}

#[test]
fn s5_non_ascii_byte_splits_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let index = ingest_docs(dir.path(), &[(0, "café latte")], 1000);
    assert!(index.postings_for(b"caf").is_some());
    assert!(index.postings_for(b"latte").is_some());
    assert!(index.postings_for("café".as_bytes()).is_none());
}

#[test]
fn s6_length_clamp() {
    let dir = tempfile::tempdir().unwrap();
    let long_doc = "word ".repeat(70_000);
    let index = ingest_docs(dir.path(), &[(0, long_doc.trim_end())], 1000);
    assert_eq!(index.doc_len(0), 65535);
    assert_eq!(index.postings_for(b"word").unwrap(), vec![(0, u16::MAX)]);
}

// --- Universal invariants (spec.md section 8) ---

#[test]
fn invariant_posting_lists_strictly_ascending_by_doc_id() {
    let dir = tempfile::tempdir().unwrap();
    let docs: Vec<(u32, &str)> = (0..50).map(|i| (i as u32, "alpha beta gamma")).collect();
    let index = ingest_docs(dir.path(), &docs, 17);
    for term in [b"alpha".as_slice(), b"beta", b"gamma"] {
        let postings = index.postings_for(term).unwrap();
        for window in postings.windows(2) {
            assert!(window[0].0 < window[1].0);
        }
    }
}

#[test]
fn invariant_round_trip_doc_count_and_avg_len() {
    let dir = tempfile::tempdir().unwrap();
    let docs = [(0, "one two three"), (1, "four five"), (2, "six seven eight nine")];
    let index = ingest_docs(dir.path(), &docs, 1000);
    assert_eq!(index.num_docs(), 3);
    let total: u32 = (0..3).map(|id| index.doc_len(id) as u32).sum();
    assert!((index.avg_doc_len() - (total as f64 / 3.0)).abs() < 1e-9);
}

#[test]
fn invariant_query_determinism() {
    let dir = tempfile::tempdir().unwrap();
    let docs: Vec<(u32, &str)> = (0..30).map(|i| (i as u32, "quick fox jumps")).collect();
    let index = ingest_docs(dir.path(), &docs, 1000);
    let evaluator = QueryEvaluator::new(&index);
    let first = evaluator.search(b"quick fox", 10);
    let second = evaluator.search(b"quick fox", 10);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.doc_id, b.doc_id);
        assert_eq!(a.score, b.score);
    }
}

#[test]
fn invariant_idf_formula_matches_reference() {
    let dir = tempfile::tempdir().unwrap();
    let docs = [(0, "shared"), (1, "shared"), (2, "other")];
    let index = ingest_docs(dir.path(), &docs, 1000);
    let df = 2;
    assert!((index.idf(b"shared").unwrap() - idf(3, df)).abs() < 1e-6);
}
