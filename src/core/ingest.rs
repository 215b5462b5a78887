use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Sender};

use crate::analysis::tokenizer::{DocTermFreqs, Tokenizer};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::accumulator::ShardAccumulator;
use crate::index::doclen::DocLenStore;
use crate::mmap::reader::MmapIndex;
use crate::mmap::writer::MmapIndexWriter;
use crate::parallel::local_buffer::LocalBuffer;
use crate::parallel::merger::StreamingMerger;
use crate::storage::layout::StorageLayout;
use crate::storage::segment_writer::write_segment;
use crate::writer::pretokenized::{PreTokenizedDoc, PreTokenizedReader};

/// A worker-local buffer is flushed into its shard maps once it has staged
/// this many triples, bounding the memory any single worker holds between
/// flushes independent of document size.
const LOCAL_FLUSH_THRESHOLD: usize = 4096;

enum WorkItem {
    Doc { doc_id: u32, text: Box<[u8]> },
    /// Sent once per worker when the segment threshold is crossed: each
    /// worker flushes its local buffer then waits on the shared barrier, so
    /// the caller resumes only once every worker's in-flight data has landed
    /// in the accumulator. Relies on the channel's single global FIFO order:
    /// no worker can receive a `Flush` before every `Doc` sent ahead of it.
    Flush(Arc<Barrier>),
}

/// Shared cancellation flag: cloneable so a caller can hand one end to a
/// signal handler or a watchdog thread while continuing to drive `Ingest`
/// from the original thread.
#[derive(Clone)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    /// Signals cancellation. `add`/`add_batch`/`add_pretokenized` start
    /// rejecting new documents as soon as this is observed; in-flight
    /// documents already enqueued are still tokenized and accumulated.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Coordinates tokenization workers, the sharded accumulator, segment
/// sealing, and the final streaming merge. Documents are enqueued with
/// `add`/`add_batch`; `finish_to_mmap` drains the pipeline, seals any
/// remaining partial segment, merges everything, and opens the result.
///
/// Segment writes happen on the calling thread, which naturally serializes
/// them (only one seal can be in flight at a time) and gives the documented
/// backpressure: `add`/`add_batch` block until the seal completes.
pub struct Ingest {
    config: Config,
    sender: Sender<WorkItem>,
    workers: Vec<JoinHandle<()>>,
    accumulator: Arc<ShardAccumulator>,
    doc_lens: Arc<DocLenStore>,
    layout: StorageLayout,
    segment_paths: Vec<PathBuf>,
    next_segment_seq: usize,
    segment_start_doc: u32,
    segment_doc_count: u32,
    cancel: CancellationToken,
    /// Staging buffer for `add_pretokenized`, flushed alongside the
    /// workers' buffers on every `seal_segment`. Populated directly on the
    /// calling thread since there is no tokenization work to hand off.
    pretokenized_buffer: LocalBuffer,
}

impl Ingest {
    pub fn new(config: Config) -> Result<Self> {
        let layout = StorageLayout::new(config.output_dir.clone())?;
        let accumulator = Arc::new(ShardAccumulator::new(config.num_shards));
        let doc_lens = Arc::new(DocLenStore::new(config.max_doc_id));
        let (sender, receiver) = bounded::<WorkItem>(config.channel_capacity);

        let workers = (0..config.workers)
            .map(|_| {
                let receiver = receiver.clone();
                let accumulator = Arc::clone(&accumulator);
                let doc_lens = Arc::clone(&doc_lens);
                thread::spawn(move || worker_loop(receiver, accumulator, doc_lens))
            })
            .collect();

        let pretokenized_buffer = LocalBuffer::new(config.num_shards);

        Ok(Ingest {
            config,
            sender,
            workers,
            accumulator,
            doc_lens,
            layout,
            segment_paths: Vec::new(),
            next_segment_seq: 0,
            segment_start_doc: 0,
            segment_doc_count: 0,
            cancel: CancellationToken::new(),
            pretokenized_buffer,
        })
    }

    /// A cloneable handle that lets another thread signal cancellation
    /// without holding a reference into `Ingest` itself.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Signals cancellation from the same thread driving `add`/`add_batch`.
    /// Subsequent adds return an error; call `finish_to_mmap` afterwards to
    /// drain in-flight documents, flush the accumulator to a final partial
    /// segment, and merge whatever was sealed so far.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn check_not_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::new(
                ErrorKind::Internal,
                "ingest was cancelled; call finish_to_mmap to flush pending documents",
            ));
        }
        Ok(())
    }

    /// Enqueues one document for tokenization. Seals the current segment
    /// synchronously once `config.segment_size` documents have been added
    /// since the last seal.
    pub fn add(&mut self, doc_id: u32, text: &[u8]) -> Result<()> {
        self.check_not_cancelled()?;
        self.sender
            .send(WorkItem::Doc { doc_id, text: text.into() })
            .map_err(|_| Error::new(ErrorKind::Internal, "ingest worker pool has shut down"))?;
        self.segment_doc_count += 1;
        if self.segment_doc_count as usize >= self.config.segment_size {
            self.seal_segment()?;
        }
        Ok(())
    }

    pub fn add_batch(&mut self, doc_ids: &[u32], texts: &[&[u8]]) -> Result<()> {
        for (&doc_id, &text) in doc_ids.iter().zip(texts.iter()) {
            self.add(doc_id, text)?;
        }
        Ok(())
    }

    /// Feeds one already-tokenized document straight into the accumulator,
    /// bypassing `Tokenizer::tokenize` entirely. Lets a later ingest run
    /// over the same corpus skip tokenization by replaying a side cache
    /// written by `PreTokenizedWriter`. Runs on the calling thread since
    /// there is no tokenization work to hand off to a worker.
    pub fn add_pretokenized(&mut self, doc: &PreTokenizedDoc) -> Result<()> {
        self.check_not_cancelled()?;
        self.doc_lens.set(doc.doc_id, doc.doc_len as u32);
        self.pretokenized_buffer
            .push_pretokenized(&self.accumulator, DocId::new(doc.doc_id), &doc.terms);
        self.segment_doc_count += 1;
        if self.segment_doc_count as usize >= self.config.segment_size {
            self.seal_segment()?;
        }
        Ok(())
    }

    /// Drains every document from a pre-tokenized side cache through
    /// `add_pretokenized`.
    pub fn add_pretokenized_reader(&mut self, reader: &mut PreTokenizedReader) -> Result<()> {
        while let Some(doc) = reader.next_doc()? {
            self.add_pretokenized(&doc)?;
        }
        Ok(())
    }

    /// Flushes every worker's in-flight buffer, then writes out the
    /// accumulated shards as one segment file covering the doc-id range
    /// seen since the previous seal. A no-op if nothing is pending.
    fn seal_segment(&mut self) -> Result<()> {
        if self.segment_doc_count == 0 {
            return Ok(());
        }

        let barrier = Arc::new(Barrier::new(self.workers.len() + 1));
        for _ in 0..self.workers.len() {
            self.sender
                .send(WorkItem::Flush(Arc::clone(&barrier)))
                .map_err(|_| Error::new(ErrorKind::Internal, "ingest worker pool has shut down"))?;
        }
        barrier.wait();
        self.pretokenized_buffer.flush(&self.accumulator);

        let seq = self.next_segment_seq;
        self.next_segment_seq += 1;
        let path = self.layout.segment_path(seq);

        let shards = self.accumulator.take_all();
        let end_doc = self.segment_start_doc + self.segment_doc_count - 1;
        let doc_lens = self.doc_lens.range(self.segment_start_doc, end_doc);
        write_segment(shards, &doc_lens, self.segment_doc_count, &path)?;

        self.segment_paths.push(path);
        self.segment_start_doc = end_doc + 1;
        self.segment_doc_count = 0;
        Ok(())
    }

    /// Closes the input pipeline, seals any remaining partial segment,
    /// merges every segment into a sealed mmap index at `output_path`, and
    /// opens it read-only.
    pub fn finish_to_mmap(mut self, output_path: &Path) -> Result<MmapIndex> {
        self.seal_segment()?;

        let Ingest { sender, workers, segment_paths, layout, .. } = self;
        drop(sender);
        for worker in workers {
            worker.join().ok();
        }

        if segment_paths.is_empty() {
            let postings_temp = layout.output_dir.join("empty_postings.tmp");
            let writer = MmapIndexWriter::create(postings_temp)?;
            writer.finish(&[], output_path)?;
            return MmapIndex::open(output_path);
        }

        let postings_temp = layout.output_dir.join("merge_postings.tmp");
        StreamingMerger::merge(&segment_paths, output_path, postings_temp)
    }
}

fn worker_loop(
    receiver: crossbeam::channel::Receiver<WorkItem>,
    accumulator: Arc<ShardAccumulator>,
    doc_lens: Arc<DocLenStore>,
) {
    let tokenizer = Tokenizer::new();
    let mut freqs = DocTermFreqs::new();
    let mut local = LocalBuffer::new(accumulator.num_shards());

    while let Ok(item) = receiver.recv() {
        match item {
            WorkItem::Doc { doc_id, text } => {
                let raw_len = tokenizer.tokenize(&text, &mut freqs);
                doc_lens.set(doc_id, raw_len);
                local.push_doc(&accumulator, DocId::new(doc_id), &freqs);
                if local.len() >= LOCAL_FLUSH_THRESHOLD {
                    local.flush(&accumulator);
                }
            }
            WorkItem::Flush(barrier) => {
                local.flush(&accumulator);
                barrier.wait();
            }
        }
    }
    // Channel closed (cancellation or `finish_to_mmap`): drain whatever is
    // still staged so a final `seal_segment` sees every document.
    local.flush(&accumulator);
}
