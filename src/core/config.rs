use std::path::PathBuf;

/// Number of independent term shards. Must be a power of two.
pub const DEFAULT_NUM_SHARDS: usize = 256;

/// Default pre-configured doc-id ceiling: bounds the dense doc-len table's
/// worst-case allocation to `DEFAULT_MAX_DOC_ID * 2` bytes (~20 MiB) rather
/// than letting a stray doc-id near `u32::MAX` force an ~8 GiB resize.
pub const DEFAULT_MAX_DOC_ID: u32 = 10_000_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory where segment files are written during ingest.
    pub output_dir: PathBuf,
    /// Number of indexing worker threads. Recommended: min(32, num_cpus).
    pub workers: usize,
    /// Number of term shards; must be a power of two.
    pub num_shards: usize,
    /// Accumulator is sealed to a segment file once it holds this many docs.
    pub segment_size: usize,
    /// Bounded ingest channel capacity, recommended num_workers * 500.
    pub channel_capacity: usize,
    /// Doc-ids above this are clamped (and logged) rather than grown into,
    /// per `ErrorKind::DocIdOutOfRange`.
    pub max_doc_id: u32,
}

impl Config {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn with_max_doc_id(mut self, max_doc_id: u32) -> Self {
        self.max_doc_id = max_doc_id;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let workers = num_cpus::get().min(32).max(1);
        Config {
            output_dir: PathBuf::from("./data"),
            workers,
            num_shards: DEFAULT_NUM_SHARDS,
            segment_size: 75_000,
            channel_capacity: workers * 500,
            max_doc_id: DEFAULT_MAX_DOC_ID,
        }
    }
}
