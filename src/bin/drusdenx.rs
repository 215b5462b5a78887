use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use drusdenx::core::config::Config;
use drusdenx::core::error::ErrorKind;
use drusdenx::core::ingest::Ingest;
use drusdenx::mmap::reader::MmapIndex;
use drusdenx::search::executor::QueryEvaluator;

#[derive(Parser)]
#[command(name = "drusdenx", about = "Full-text inverted-index builder and BM25 search engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tokenize every file under --input and write a sealed index to --output.
    Index {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long = "segment-size")]
        segment_size: Option<usize>,
    },
    /// Run a query against a sealed index and print `doc_id\tscore` hits.
    Search {
        #[arg(long = "index")]
        index_path: PathBuf,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Index { input, output, workers, segment_size } => run_index(input, output, workers, segment_size),
        Command::Search { index_path, query, limit } => run_search(index_path, query, limit),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            match err.kind {
                ErrorKind::InvalidMagic | ErrorKind::VersionMismatch | ErrorKind::Truncated => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

fn run_index(
    input: PathBuf,
    output: PathBuf,
    workers: Option<usize>,
    segment_size: Option<usize>,
) -> drusdenx::core::error::Result<()> {
    let output_dir = output
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = Config::default().with_output_dir(output_dir);
    if let Some(workers) = workers {
        config = config.with_workers(workers);
    }
    if let Some(segment_size) = segment_size {
        config = config.with_segment_size(segment_size);
    }

    let mut ingest = Ingest::new(config)?;
    let mut doc_id: u32 = 0;
    for entry in std::fs::read_dir(&input)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let text = std::fs::read(entry.path())?;
        ingest.add(doc_id, &text)?;
        doc_id += 1;
    }

    log::info!("tokenized {} documents from {}", doc_id, input.display());
    let index = ingest.finish_to_mmap(&output)?;
    log::info!("wrote {} ({} docs, {} terms)", output.display(), index.num_docs(), index.num_terms());
    Ok(())
}

fn run_search(index_path: PathBuf, query: String, limit: usize) -> drusdenx::core::error::Result<()> {
    let index = MmapIndex::open(&index_path)?;
    let evaluator = QueryEvaluator::new(&index);
    for hit in evaluator.search(query.as_bytes(), limit) {
        println!("{}\t{}", hit.doc_id.value(), hit.score);
    }
    Ok(())
}
