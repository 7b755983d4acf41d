#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
//! VoxRAG CLI - single-shot adapter for the retrieval engine.
//!
//! Usage:
//!   `voxrag --cmd ingest_document --data ./data --dim 1536 --input payload.json`
//!   `echo '{"query": [0.1, 0.2]}' | voxrag --cmd retrieve --data ./data --dim 1536`
//!
//! Exactly one operation runs per invocation: the payload is read from
//! `--input` (or stdin if absent), decoded, passed to the engine, and the
//! response is written as one JSON line to stdout. On failure, the error is
//! written to stderr and the process exits non-zero.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use voxrag_core::{Engine, EngineConfig, Error, IngestMessageRequest, IngestRequest, RetrieveRequest};

/// Single-shot operation selector for `--cmd`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Command {
    /// `POST /ingest` equivalent: persist a document and its chunks.
    IngestDocument,
    /// `POST /ingest_message` equivalent: persist one chat message.
    IngestMessage,
    /// `POST /retrieve` equivalent: run retrieval against the index.
    Retrieve,
}

/// VoxRAG CLI - embeddable semantic-retrieval engine, driven from the shell.
#[derive(Parser, Debug)]
#[command(name = "voxrag")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Operation to run. Required for single-shot use.
    #[arg(long)]
    cmd: Option<Command>,

    /// Path to a JSON payload file. Reads stdin if absent.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory containing `vectors.bin` and the metadata log files.
    #[arg(long, default_value = "./data", env = "VOX_DATA_DIR")]
    data: String,

    /// Vector dimension for this store.
    #[arg(long, default_value = "1536", env = "VOX_DIM")]
    dim: usize,

    /// Server address. Unused by the single-shot surface; retained for
    /// parity with the HTTP adapter's connection flags.
    #[arg(long)]
    addr: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<String> {
    let Some(cmd) = args.cmd else {
        anyhow::bail!(
            "--cmd is required (ingest-document|ingest-message|retrieve); \
             `--addr` with no `--cmd` launches the HTTP server via the voxrag-server binary instead"
        );
    };

    let payload = read_payload(args.input.as_deref())?;

    let config = EngineConfig {
        data_dir: args.data,
        dim: args.dim,
        ..EngineConfig::default()
    };
    let engine = Engine::open(config)?;

    let response = match cmd {
        Command::IngestDocument => {
            let request: IngestRequest = serde_json::from_str(&payload)?;
            serde_json::to_string(&engine.ingest_document(request).map_err(describe)?)?
        }
        Command::IngestMessage => {
            let request: IngestMessageRequest = serde_json::from_str(&payload)?;
            serde_json::to_string(&engine.ingest_message(request).map_err(describe)?)?
        }
        Command::Retrieve => {
            let request: RetrieveRequest = serde_json::from_str(&payload)?;
            serde_json::to_string(&engine.retrieve(request).map_err(describe)?)?
        }
    };

    Ok(response)
}

fn read_payload(input: Option<&std::path::Path>) -> anyhow::Result<String> {
    match input {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Maps an engine error to an `anyhow::Error` whose `Display` carries the
/// same `[VOX-XXX] ...` text the HTTP adapter puts in its JSON body.
fn describe(err: Error) -> anyhow::Error {
    anyhow::anyhow!("{err}")
}
