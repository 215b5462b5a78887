//! Single-node, full-text inverted-index builder and BM25 search engine.
//!
//! Pipeline: [`analysis`] tokenizes raw text into fingerprint/frequency
//! pairs, [`parallel`] and [`index`] accumulate those per-shard across
//! worker threads, [`storage`] seals accumulator snapshots to segment
//! files and [`parallel::merger`] combines them, [`mmap`] reads the sealed
//! index back in read-only, and [`scoring`]/[`search`] answer queries
//! against it. [`core`] ties the pipeline together behind the
//! [`core::ingest::Ingest`] coordinator and carries configuration and error
//! types used throughout. [`writer`] holds the optional pre-tokenized side
//! cache.

pub mod analysis;
pub mod core;
pub mod index;
pub mod mmap;
pub mod parallel;
pub mod scoring;
pub mod search;
pub mod storage;
pub mod writer;
