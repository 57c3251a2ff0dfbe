//! RELOG CLI
//!
//! Command-line interface for the RELOG expiring resource log.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relog_api::{ApiConfig, ApiServer};
use relog_core::clock::ManualClock;
use relog_core::traits::RecordStore;
use relog_core::types::Record;
use relog_store::{FileStore, MemoryStore, StoreConfig};

/// RELOG - expiring resource log
#[derive(Parser)]
#[command(name = "relog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Store file used by the record commands
    #[arg(long, global = true, env = "RELOG_STORE_PATH", default_value = "relog.db")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Log a resource for an owner
    Add {
        /// Owner identifier
        owner: String,
        /// Resource label
        label: String,
        /// Time to live in seconds (store default when omitted)
        #[arg(short, long)]
        ttl: Option<f64>,
    },

    /// List an owner's live resources
    List {
        /// Owner identifier
        owner: String,
    },

    /// List live resources created at an exact timestamp
    At {
        /// Creation time in Unix seconds, as printed by `add`
        timestamp: f64,
    },

    /// List every live resource
    All,

    /// Remove expired records from the store file
    Reclaim,

    /// Show store statistics
    Stats,

    /// Run benchmarks
    Bench {
        /// Number of records to insert
        #[arg(short, long, default_value = "100000")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "relog=debug,info"
    } else {
        "relog=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
        Commands::Add { owner, label, ttl } => cmd_add(&cli.store, &owner, &label, ttl).await,
        Commands::List { owner } => cmd_list(&cli.store, &owner).await,
        Commands::At { timestamp } => cmd_at(&cli.store, timestamp).await,
        Commands::All => cmd_all(&cli.store).await,
        Commands::Reclaim => cmd_reclaim(&cli.store).await,
        Commands::Stats => cmd_stats(&cli.store).await,
        Commands::Bench { count } => cmd_bench(count).await,
    }
}

async fn open_store(path: &Path) -> Result<FileStore> {
    let store = ApiConfig::from_env()
        .open_file_store(path)
        .await
        .with_context(|| format!("Failed to open store at {}", path.display()))?;
    debug!(path = %path.display(), records = store.len(), "Store opened");
    Ok(store)
}

fn print_records(records: &[Record], now: f64) {
    if records.is_empty() {
        println!("{}", "No live records.".yellow());
        return;
    }

    for record in records {
        println!(
            "   {} {:<16} {:<24} {} {} {}",
            format!("#{}", record.id).dimmed(),
            record.owner.green(),
            record.label,
            "created".dimmed(),
            record
                .created_at_rfc3339()
                .unwrap_or_else(|| record.created_at.to_string()),
            format!("(expires in {:.1}s)", record.remaining(now)).dimmed(),
        );
    }
    println!("\n{} {} record(s)", "✓".green(), records.len());
}

/// Run API server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    println!("{}", "🚀 Starting RELOG API server...".cyan().bold());
    println!("   {} http://{}:{}", "Listening on:".green(), bind, port);
    println!("   {} http://{}:{}/health", "Health check:".dimmed(), bind, port);
    println!("\n   Press Ctrl+C to stop.\n");

    let config = ApiConfig::from_env();
    let server = ApiServer::from_config(config)
        .await
        .context("Failed to initialize the record store")?;

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    server.run(addr).await?;

    Ok(())
}

/// Log a resource
async fn cmd_add(store_path: &Path, owner: &str, label: &str, ttl: Option<f64>) -> Result<()> {
    let store = open_store(store_path).await?;

    let record = store.insert(owner, label, ttl).await?;
    store.flush().await.context("Failed to save store")?;

    println!("{} Logged record #{}", "✅".green(), record.id);
    println!("   {} {}", "Owner:".green(), record.owner);
    println!("   {} {}", "Resource:".green(), record.label);
    println!("   {} {}", "Timestamp:".green(), record.created_at);
    println!("   {} {}", "Expires at:".green(), record.expires_at);

    Ok(())
}

/// List an owner's records
async fn cmd_list(store_path: &Path, owner: &str) -> Result<()> {
    let store = open_store(store_path).await?;
    println!("{} {}\n", "📋 Live records for".cyan().bold(), owner.bold());
    print_records(&store.lookup_by_owner(owner, None).await?, store.memory().now());
    Ok(())
}

/// List records created at a timestamp
async fn cmd_at(store_path: &Path, timestamp: f64) -> Result<()> {
    if !timestamp.is_finite() {
        bail!("timestamp must be a finite number");
    }

    let store = open_store(store_path).await?;
    println!("{} {}\n", "📋 Live records created at".cyan().bold(), timestamp);
    print_records(
        &store.lookup_by_creation_time(timestamp, None).await?,
        store.memory().now(),
    );
    Ok(())
}

/// List every live record
async fn cmd_all(store_path: &Path) -> Result<()> {
    let store = open_store(store_path).await?;
    println!("{}\n", "📋 All live records".cyan().bold());
    print_records(&store.live_records(None).await?, store.memory().now());
    Ok(())
}

/// Reclaim expired records
async fn cmd_reclaim(store_path: &Path) -> Result<()> {
    let store = open_store(store_path).await?;
    let removed = store.reclaim(None).await?;

    if removed == 0 {
        println!("{}", "Nothing to reclaim.".yellow());
    } else {
        println!("{} Reclaimed {} expired record(s)", "✅".green(), removed);
    }
    Ok(())
}

/// Show store statistics
async fn cmd_stats(store_path: &Path) -> Result<()> {
    let store = open_store(store_path).await?;
    let stats = store.stats(None).await?;

    println!("{} {}\n", "📊 Store".cyan().bold(), store_path.display());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Run benchmarks
async fn cmd_bench(count: usize) -> Result<()> {
    println!("{} {} records", "📊 Benchmarking with".cyan().bold(), count);

    let clock = Arc::new(ManualClock::new(0.0));
    let store = MemoryStore::with_clock(StoreConfig::default(), clock.clone())?;
    let owners = (count / 10).max(1);

    // Insert
    println!("\n{}", "1. Inserting...".dimmed());
    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let start = std::time::Instant::now();
    for i in 0..count {
        // Half the records expire after 10s, the rest keep the default TTL
        let ttl = if i % 2 == 0 { Some(10.0) } else { None };
        store
            .insert(&format!("user{}", i % owners), "resource", ttl)
            .await?;
        if i % 100 == 99 {
            clock.advance(0.001);
        }
        pb.inc(1);
    }
    pb.finish();
    let insert_time = start.elapsed();
    println!("   ✓ Inserted {} records: {:?}", count, insert_time);

    // Lookups
    println!("\n{}", "2. Owner lookups...".dimmed());
    let start = std::time::Instant::now();
    let mut found = 0;
    for i in 0..owners {
        found += store.lookup_by_owner(&format!("user{}", i), None).await?.len();
    }
    let lookup_time = start.elapsed();
    println!("   ✓ {} lookups returned {} records: {:?}", owners, found, lookup_time);

    // Reclaim
    println!("\n{}", "3. Reclaiming...".dimmed());
    clock.advance(60.0);
    let start = std::time::Instant::now();
    let removed = store.reclaim(None).await?;
    let reclaim_time = start.elapsed();
    println!("   ✓ Reclaimed {} records: {:?}", removed, reclaim_time);

    println!("\n{}", "📈 Results:".green().bold());
    println!(
        "   Insert rate: {:.0} records/sec",
        count as f64 / insert_time.as_secs_f64()
    );
    println!(
        "   Time per owner lookup: {:.2}µs",
        lookup_time.as_micros() as f64 / owners as f64
    );

    let expected = count.div_ceil(2);
    if removed == expected && store.len() == count - expected {
        println!("   {} Expired records reclaimed, live records kept", "✅".green());
    } else {
        println!("   {} Expected {} reclaimed, got {}", "❌".red(), expected, removed);
    }

    Ok(())
}
