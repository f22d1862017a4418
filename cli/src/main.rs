//! fieldgraph CLI: flatten a JSON document tree and graph the fields
//! matching a query.

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{ContentArrangement, Table};
use fieldgraph::config::{DEFAULT_CACHE_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_ROOT};
use fieldgraph::{
    CorrelationStrategy, ErrorPolicy, FlattenPolicy, OutputFormat, Pipeline, PipelineConfig,
    Record, RecordSource, RunReport,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fieldgraph",
    version,
    about = "Graph the JSON fields matching a query",
    after_help = "EXAMPLES:\n    \
        fieldgraph -q user\n    \
        fieldgraph -q user --cached -o users.gv\n    \
        fieldgraph -q order --root data/meta --format json -o orders.json"
)]
struct Cli {
    /// Case-insensitive substring matched against file, key path and value
    #[arg(short, long)]
    query: String,

    /// Load records from the cache snapshot instead of parsing the tree
    #[arg(long)]
    cached: bool,

    /// Root directory holding subdirectories of JSON documents
    #[arg(long, default_value = DEFAULT_ROOT, value_name = "DIR")]
    root: PathBuf,

    /// Cache snapshot file
    #[arg(long = "cache", default_value = DEFAULT_CACHE_PATH, value_name = "FILE")]
    cache: PathBuf,

    /// Graph description output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH, value_name = "FILE")]
    output: PathBuf,

    /// Graph description format
    #[arg(long, value_enum, default_value = "dot")]
    format: Format,

    /// Number of parser threads
    #[arg(short, long, default_value_t = fieldgraph::ingest::DEFAULT_WORKERS, value_name = "NUM")]
    workers: usize,

    /// Stop reading an object's keys after its first nested object
    #[arg(long)]
    legacy_flatten: bool,

    /// Abort on the first unreadable or malformed document
    #[arg(long)]
    strict: bool,

    /// Use the pairwise correlation pass instead of the key-path index
    #[arg(long)]
    naive_correlation: bool,

    /// Print the matched records as a table
    #[arg(long)]
    show_matches: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    Dot,
    Json,
}

impl Cli {
    fn to_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(self.query.clone());
        config.cached = self.cached;
        config.root = self.root.clone();
        config.cache_path = self.cache.clone();
        config.output_path = self.output.clone();
        config.output_format = match self.format {
            Format::Dot => OutputFormat::Dot,
            Format::Json => OutputFormat::Json,
        };
        config.workers = self.workers;
        if self.legacy_flatten {
            config.flatten_policy = FlattenPolicy::Legacy;
        }
        if self.strict {
            config.error_policy = ErrorPolicy::Abort;
        }
        if self.naive_correlation {
            config.correlation = CorrelationStrategy::Naive;
        }
        config
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let pipeline = Pipeline::new(cli.to_config()).context("Invalid configuration")?;

    // Setup signal handler for graceful shutdown
    let shutdown = pipeline.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let report = if cli.show_matches {
        pipeline.run_inspect(print_matches)
    } else {
        pipeline.run()
    }
    .context("Run failed")?;

    print_summary(&report);

    if !report.failures.is_empty() {
        info!(skipped = report.failures.len(), "Run completed with skipped documents");
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("fieldgraph=debug,warn")
        } else {
            EnvFilter::new("fieldgraph=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_matches(records: &[&Record]) {
    if records.is_empty() {
        println!("(no matching records)");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Key path", "Type", "Value"]);
    for record in records {
        table.add_row(vec![
            record.source_file.as_str(),
            record.key_path.as_str(),
            record.value_type.as_str(),
            record.value_text.as_str(),
        ]);
    }

    println!("{}", table);
    println!("{} record(s)", records.len());
}

fn print_summary(report: &RunReport) {
    let source = match report.source {
        RecordSource::Ingestion => "parsed",
        RecordSource::Cache => "cache",
    };

    println!();
    println!("Records:      {} ({})", report.records_total, source);
    println!("Files:        {}", report.files_ingested);
    println!("Matched:      {}", report.records_matched);
    println!("Vertices:     {}", report.vertices);
    println!(
        "Edges:        {} ({} containment, {} correlation)",
        report.edges, report.build.containment_edges, report.build.correlation_edges
    );
    if !report.failures.is_empty() {
        println!("Skipped:      {}", report.failures.len());
        for failure in &report.failures {
            println!("  {}", failure);
        }
    }
    if let Some(snapshot) = &report.snapshot {
        println!("Cache:        {}", snapshot.path.display());
    }
    println!("Output:       {}", report.output_path.display());
    println!("Duration:     {:.2?}", report.duration);
}
