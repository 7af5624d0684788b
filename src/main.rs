use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

// Use library instead of local modules
use corp_registry::{
    init_logging, load_if_empty, CorporateRecord, CorporationService, CorporationStore,
    ImportOutcome, SqliteStore, StoreConfig,
};

/// Operator tool for the corporation store
#[derive(Parser, Debug)]
#[command(name = "corp-registry")]
#[command(about = "Import and query the corporate registry without the web server")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    store: StoreConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the source document (skipped when the store already has data)
    Import,
    /// Print the number of stored corporations
    Count,
    /// Search by company name or english name
    Search { text: String },
    /// Show one corporation by its 8-character code
    Get { code: String },
    /// List corporations with this stock code
    Stock { code: String },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let store = SqliteStore::open(&cli.store.database)?;
    let service = CorporationService::new(Arc::new(store));

    run(&service, &cli.store, cli.command)
}

fn run_import(store: &dyn CorporationStore, config: &StoreConfig) -> Result<()> {
    println!("🗄️  Corporate Registry - XML → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Source:   {}", config.source.display());
    println!("💾 Database: {}", config.database.display());

    let outcome = load_if_empty(store, &config.source)?;

    match &outcome {
        ImportOutcome::Imported(_) | ImportOutcome::AlreadyLoaded { .. } => {
            println!("\n✅ {}", outcome);
        }
        ImportOutcome::SourceMissing { .. } | ImportOutcome::Failed { .. } => {
            println!("\n❌ {}", outcome);
        }
    }

    Ok(())
}

fn run(service: &CorporationService, config: &StoreConfig, command: Command) -> Result<()> {
    match command {
        Command::Import => run_import(service.store(), config)?,
        Command::Count => {
            println!("{}", service.count()?);
        }
        Command::Search { text } => {
            print_records(&service.search_by_name(Some(&text))?);
        }
        Command::Get { code } => match service.get_by_code(&code)? {
            Some(record) => print_records(&[record]),
            None => println!("❌ Corporation {} not found", code),
        },
        Command::Stock { code } => {
            print_records(&service.search_by_short_code(Some(&code))?);
        }
    }

    Ok(())
}

fn print_records(records: &[CorporateRecord]) {
    for record in records {
        println!(
            "{}  {:<6}  {}  {}{}",
            record.code,
            record.short_code.as_deref().unwrap_or("-"),
            record.last_modified,
            record.name,
            record
                .english_name
                .as_deref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default(),
        );
    }
    println!("✓ {} corporations", records.len());
}
