//! foodfacts CLI - clean, normalize and load an Open Food Facts export
//!
//! `run` goes from a raw CSV export to a loaded database, `normalize` writes
//! the ten relations as NDJSON files instead, and `verify` reports on what a
//! database currently holds.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use foodfacts::diesel_runtime::{ensure_tables, verify, Database, VerificationReport};
use foodfacts::{
    load, normalize, CleaningStats, DieselSink, FieldNormalizer, FlatTable, NdjsonSink,
    NormalizedTables, PipelineConfig, PipelineError, RunManifest, SinkError, TableName,
};

#[derive(Parser)]
#[command(name = "foodfacts")]
#[command(version, about = "Normalize Open Food Facts exports into a relational schema", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, normalize and load a CSV export into the database
    Run {
        /// Raw CSV export with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Database url, overrides DATABASE_URL and the config file
        #[arg(long)]
        database_url: Option<String>,

        /// Skip the post-load verification queries
        #[arg(long)]
        skip_verify: bool,

        /// Directory to write the run's manifest.json into
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Normalize an export and write every table as NDJSON
    Normalize {
        /// Raw CSV export, or already-cleaned NDJSON (one flat record per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for <table>.ndjson files and manifest.json
        #[arg(short, long)]
        output: PathBuf,

        /// Pipeline configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print row counts and nutrition summaries of a loaded database
    Verify {
        /// Pipeline configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Database url, overrides DATABASE_URL and the config file
        #[arg(long)]
        database_url: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            config,
            database_url,
            skip_verify,
            manifest,
        } => run_pipeline(
            &input,
            config.as_deref(),
            database_url.as_deref(),
            skip_verify,
            manifest.as_deref(),
        ),
        Commands::Normalize {
            input,
            output,
            config,
        } => normalize_to_files(&input, &output, config.as_deref()),
        Commands::Verify {
            config,
            database_url,
        } => verify_database(config.as_deref(), database_url.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_pipeline(
    input: &Path,
    config_path: Option<&Path>,
    database_url: Option<&str>,
    skip_verify: bool,
    manifest_dir: Option<&Path>,
) -> Result<(), PipelineError> {
    let config = PipelineConfig::load(config_path)?;
    let mut manifest = RunManifest::start(input.display().to_string());

    println!("🍽  Processing {}", input.display());
    let (flat, cleaning) = read_input(input, &config)?;
    let tables = normalize(&flat, &config.normalize);
    print_normalize_summary(&tables, cleaning.as_ref());
    manifest.cleaning = cleaning;
    manifest.normalize = Some(tables.stats.clone());

    let url = config.database_url(database_url);
    let db = Database::new_with_config(&url, config.database.pool.clone())?;
    let mut conn = db.get_connection().map_err(SinkError::from)?;
    ensure_tables(&mut conn).map_err(SinkError::from)?;

    let report = load(&tables, DieselSink::new(&mut conn, config.database.batch_size))?;
    manifest.load = Some(report.clone());
    println!("\n✓ Loaded {} rows:", report.total_rows());
    for (table, rows) in &report.tables {
        println!("  {:<20} {:>8}", table.as_str(), rows);
    }

    if !skip_verify {
        let verification = verify(&mut conn).map_err(SinkError::from)?;
        print_verification(&verification);
    }

    manifest.finish();
    tracing::info!("Run {} finished", manifest.run_id);
    if let Some(dir) = manifest_dir {
        let path = manifest.write_to(dir)?;
        println!("  Manifest: {}", path.display());
    }
    Ok(())
}

fn normalize_to_files(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
) -> Result<(), PipelineError> {
    let config = PipelineConfig::load(config_path)?;
    let mut manifest = RunManifest::start(input.display().to_string());

    println!("🍽  Processing {}", input.display());
    let (flat, cleaning) = read_input(input, &config)?;
    let tables = normalize(&flat, &config.normalize);
    print_normalize_summary(&tables, cleaning.as_ref());
    manifest.cleaning = cleaning;
    manifest.normalize = Some(tables.stats.clone());

    let sink = NdjsonSink::create(output)?;
    let report = load(&tables, sink)?;
    manifest.load = Some(report.clone());
    manifest.finish();
    let manifest_path = manifest.write_to(output)?;

    println!("\n✓ Wrote {} rows to {}", report.total_rows(), output.display());
    println!("  Manifest: {}", manifest_path.display());
    Ok(())
}

fn verify_database(config_path: Option<&Path>, database_url: Option<&str>) -> Result<(), PipelineError> {
    let config = PipelineConfig::load(config_path)?;
    let url = config.database_url(database_url);

    let db = Database::new_with_config(&url, config.database.pool.clone())?;
    db.test_connection()?;
    let mut conn = db.get_connection().map_err(SinkError::from)?;
    let verification = verify(&mut conn).map_err(SinkError::from)?;
    print_verification(&verification);
    Ok(())
}

/// CSV exports go through the field normalizer; `.ndjson`/`.jsonl` input is
/// taken as already cleaned.
fn read_input(
    input: &Path,
    config: &PipelineConfig,
) -> Result<(FlatTable, Option<CleaningStats>), PipelineError> {
    let file = File::open(input)?;
    let is_ndjson = matches!(
        input.extension().and_then(|ext| ext.to_str()),
        Some("ndjson") | Some("jsonl")
    );

    if is_ndjson {
        Ok((FlatTable::from_ndjson(BufReader::new(file))?, None))
    } else {
        let cleaner = FieldNormalizer::new(&config.cleaning)?;
        let (table, stats) = cleaner.clean_csv(file)?;
        Ok((table, Some(stats)))
    }
}

fn print_normalize_summary(tables: &NormalizedTables, cleaning: Option<&CleaningStats>) {
    if let Some(stats) = cleaning {
        println!("  Cleaned {} rows", stats.rows);
    }
    let stats = &tables.stats;
    println!(
        "  {} products ({} rows dropped for a missing code, {} duplicate codes)",
        stats.products, stats.dropped_rows, stats.duplicate_keys
    );
    for table in TableName::ALL {
        println!("  {:<20} {:>8}", table.as_str(), tables.row_count(table));
    }
}

fn print_verification(report: &VerificationReport) {
    println!("\n📊 Verification:");
    for (table, rows) in &report.table_counts {
        println!("  {:<20} {:>8}", table.as_str(), rows);
    }
    println!("  Products with nutrition facts: {}", report.products_with_nutrition);
    match report.average_nutriscore {
        Some(avg) => println!("  Average nutrition score: {:.2}", avg),
        None => println!("  Average nutrition score: n/a"),
    }
    for (grade, count) in &report.grade_distribution {
        println!("  Grade {}: {}", grade.to_uppercase(), count);
    }
}
