use anyhow::{Context, Result};
use catalog_sync::build_ingestor;
use catalog_sync::database_ops::db::Db;
use catalog_sync::quotes::{request_quotes, QuoteSimulator};
use catalog_sync::suppliers::SupplierKind;
use catalog_sync::tracing::init_tracing;
use catalog_sync::util::env as env_util;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "catalog-sync", about = "Multi-source product catalog ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pull supplier feeds and reconcile them into the catalog store
    Sync {
        /// Comma-separated supplier tags (midocean, xd-connects); default all
        #[arg(long, value_delimiter = ',')]
        suppliers: Vec<String>,
        /// Process at most this many records per supplier
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Simulate provider quotes for a stored product and record the request
    Quotes {
        #[arg(long)]
        product_id: String,
        #[arg(long, default_value_t = 1.0)]
        quantity: f64,
        /// Fixed RNG seed for reproducible quotes
        #[arg(long)]
        seed: Option<u64>,
        /// Personalization remarks recorded on the request
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Row counts for the catalog tables
    Counts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing("info,sqlx=warn")?;
    env_util::init_env();
    // Consolidated, redacted env snapshot. Nothing is strictly required here:
    // the store falls back to a local file and unconfigured feeds are skipped.
    let _ = env_util::preflight_check(
        "catalog-sync",
        &[],
        &[
            "CATALOG_DATABASE_URL",
            "DATABASE_URL",
            "DB_MAX_CONNS",
            "MIDOCEAN_API_KEY",
            "MIDOCEAN_ENVIRONMENT",
            "XD_CONNECTS_PRODUCT_DATA_URL",
            "AUTO_IMPORT_ON_EMPTY",
        ],
    );

    let db_url = env_util::db_url();
    let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);
    let db = Db::connect(&db_url, max_conns)
        .await
        .context("Db::connect failed")?;

    // Read-oriented commands against a never-synced store can populate it
    // first. The startup hook returns a task handle; we await it here so the
    // command's output reflects the imported data.
    if matches!(cli.command, Command::Quotes { .. } | Command::Counts)
        && env_util::env_flag("AUTO_IMPORT_ON_EMPTY", false)
    {
        let ingestor = Arc::new(build_ingestor(db.clone()));
        if let Some(handle) = ingestor.spawn_initial_import().await? {
            let report = handle.await?;
            info!(imported = report.imported, "initial import finished");
        }
    }

    match cli.command {
        Command::Sync { suppliers, limit } => {
            let selected = parse_suppliers(&suppliers)?;
            let ingestor = build_ingestor(db);
            let report = ingestor.sync(selected.as_deref(), limit).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Quotes {
            product_id,
            quantity,
            seed,
            remarks,
        } => {
            let simulator = match seed {
                Some(s) => QuoteSimulator::with_seed(s),
                None => QuoteSimulator::new(),
            };
            let (request_id, quotes) =
                request_quotes(&db, &simulator, &product_id, quantity, remarks.as_deref()).await?;
            info!(request_id = %request_id, "request created");
            println!("{}", serde_json::to_string_pretty(&quotes)?);
        }
        Command::Counts => {
            let (products, variants, assets) = db.table_counts().await?;
            println!("products: {products}");
            println!("variants: {variants}");
            println!("assets:   {assets}");
        }
    }
    Ok(())
}

fn parse_suppliers(tags: &[String]) -> Result<Option<Vec<SupplierKind>>> {
    if tags.is_empty() {
        return Ok(None);
    }
    let mut kinds = Vec::new();
    for tag in tags {
        let kind = SupplierKind::from_tag(tag)
            .ok_or_else(|| anyhow::anyhow!("unknown supplier tag: {tag}"))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(Some(kinds))
}
