//! Ionian storage client simulator
//!
//! This binary exercises the full upload/download coordinator path against
//! an in-memory simulated network (see [`ionian_client::memory`]) since a
//! real storage-node/chain transport is out of scope for this crate (see
//! `SPEC_FULL.md` §1). It builds or loads a file, submits it, pushes its
//! segments to a handful of simulated storage nodes, then downloads it back
//! and checks the result is byte-identical.
//!
//! Run with: cargo run --release
//! For a larger synthetic file: cargo run --release -- --size medium

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser};
use ionian_client::cancel::CancellationToken;
use ionian_client::config::{ClientConfig, TEST_RANDOM_SEED};
use ionian_client::file::downloader::Downloader;
use ionian_client::file::uploader::Uploader;
use ionian_client::memory;
use ionian_client::metrics::{DemoFileSize, TransferMetrics};
use ionian_client::node::StorageNodeClient;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::Serialize;
use tracing::{error, info, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for the storage client simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a file to round-trip through the simulated network. A
    /// synthetic file is generated if omitted.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Size category for the generated synthetic file, when `--file` is
    /// omitted: "tiny", "small", or "medium".
    #[arg(long, default_value = "small")]
    size: String,

    /// Number of simulated storage nodes the file is replicated to.
    #[arg(long, default_value_t = 3)]
    nodes: usize,

    /// Increase output verbosity (-v for DEBUG, -vv for TRACE).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Print a JSON summary of the run to stdout in addition to the
    /// human-readable log output.
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// Machine-readable summary of one simulator run, printed with `--json`.
#[derive(Serialize)]
struct RunSummary {
    root: String,
    file_size_bytes: u64,
    num_segments: usize,
    num_nodes: usize,
    upload_duration_secs: f64,
    download_duration_secs: f64,
    round_trip_ok: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.nodes == 0 {
        error!("Error: --nodes must be at least 1");
        std::process::exit(1);
    }

    info!("");
    info!("╔══════════════════════════════════════════════════════════════╗");
    info!("║   Ionian Storage Client Simulator                             ║");
    info!("║   Upload, replicate, and download over a simulated network    ║");
    info!("╚══════════════════════════════════════════════════════════════╝");
    info!("");

    info!("[1/3] Preparing file");
    let (_synthetic, source_path) = prepare_source(cli.file, &cli.size);
    let source_size = fs::metadata(&source_path).unwrap().len();
    info!("  ✓ source file: {} ({} bytes)", source_path.display(), source_size);
    info!("");

    info!("[2/3] Upload");
    let (chain, nodes) = memory::network(cli.nodes);
    let node_refs: Vec<&dyn StorageNodeClient> = nodes.iter().map(|n| n as &dyn StorageNodeClient).collect();
    let cancel = CancellationToken::new();
    let config = ClientConfig::default();

    let uploader = Uploader::new(node_refs.clone(), &chain, config.clone());
    let upload_start = Instant::now();
    let root = {
        let _span = info_span!("upload").entered();
        uploader.upload(&source_path, &cancel).unwrap_or_else(|e| {
            error!("upload failed: {e}");
            std::process::exit(1);
        })
    };
    let upload_duration = upload_start.elapsed();
    info!("  ✓ root: {}", hex(&root));

    let metrics = TransferMetrics {
        total_duration: upload_duration,
        file_size_bytes: source_size,
        num_segments: source_size.div_ceil(ionian_client::config::SEG as u64).max(1) as usize,
        num_nodes: cli.nodes,
    };
    info!("\n{}", metrics.format_table());
    info!("");

    info!("[3/3] Download");
    let target_path = source_path.with_extension("downloaded");
    let downloader = Downloader::new(node_refs, config);
    let download_start = Instant::now();
    {
        let _span = info_span!("download").entered();
        downloader.download(root, &target_path, &cancel).unwrap_or_else(|e| {
            error!("download failed: {e}");
            std::process::exit(1);
        });
    }
    let download_duration = download_start.elapsed();
    info!("  ✓ downloaded in {:.2}s", download_duration.as_secs_f64());

    let original = fs::read(&source_path).unwrap();
    let roundtripped = fs::read(&target_path).unwrap();
    let round_trip_ok = original == roundtripped;
    if round_trip_ok {
        info!("  ✓ downloaded file is byte-identical to the source");
    } else {
        error!("  ✗ downloaded file does not match the source");
    }

    let _ = fs::remove_file(&target_path);
    info!("");

    if cli.json {
        let summary = RunSummary {
            root: hex(&root),
            file_size_bytes: source_size,
            num_segments: metrics.num_segments,
            num_nodes: cli.nodes,
            upload_duration_secs: upload_duration.as_secs_f64(),
            download_duration_secs: download_duration.as_secs_f64(),
            round_trip_ok,
        };
        println!("{}", serde_json::to_string_pretty(&summary).unwrap());
    }

    if !round_trip_ok {
        std::process::exit(1);
    }
}

/// Return an on-disk path for the file to round-trip: the user-provided
/// path, or a freshly generated synthetic file (kept alive via the returned
/// `TempPath` so it isn't deleted before the run finishes).
fn prepare_source(file: Option<PathBuf>, size: &str) -> (Option<tempfile::TempPath>, PathBuf) {
    if let Some(path) = file {
        return (None, path);
    }

    let category = match size {
        "tiny" => DemoFileSize::Tiny,
        "medium" => DemoFileSize::Medium,
        _ => DemoFileSize::Small,
    };
    let len = category.sample_size(TEST_RANDOM_SEED);

    let mut rng = StdRng::seed_from_u64(TEST_RANDOM_SEED);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);

    let mut tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
    tmp.write_all(&data).expect("failed to write temp file");
    let path = tmp.into_temp_path();
    let path_buf = path.to_path_buf();
    (Some(path), path_buf)
}

fn hex(root: &[u8; 32]) -> String {
    root.iter().map(|b| format!("{b:02x}")).collect()
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info,ionian_client=info",
        1 => "debug,ionian_client=debug",
        _ => "ionian_client=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    use tracing_tree::HierarchicalLayer;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            HierarchicalLayer::new(2)
                .with_targets(false)
                .with_bracketed_fields(true),
        )
        .init();
}
