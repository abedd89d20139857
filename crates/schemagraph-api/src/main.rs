//! `schemagraph` binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `SCHEMAGRAPH_*` environment variables, opens the SQLite graph store, and
//! either serves the JSON API or runs one command against the store.
//!
//! ```text
//! schemagraph ingest tables.json
//! schemagraph subset candidates.json --format text
//! schemagraph tree --db sales Orders Products
//! schemagraph serve
//! ```

use std::{
  collections::BTreeSet,
  fs,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use schemagraph_api::{ServerConfig, render::render_subset};
use schemagraph_core::{
  ingest::parse_descriptions,
  schema::{Candidate, table_key},
  steiner::{TreeView, steiner_tree},
  store::{SchemaGraphStore, SchemaIngest},
};
use schemagraph_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Schema-graph subsetting")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Override the configured SQLite store path.
  #[arg(long)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Load schema descriptions from a `tables.json` file (one record or an
  /// array of records).
  Ingest { file: PathBuf },
  /// List stored database ids.
  List,
  /// Remove stored schemas.
  Drop {
    /// Database to remove.
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    db:  Option<String>,
    /// Remove every database.
    #[arg(long)]
    all: bool,
  },
  /// Compute tiered metadata for a JSON list of `{db_id, table_name}`.
  Subset {
    file:   PathBuf,
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
  },
  /// Print the connecting tree for bare table names in one database.
  Tree {
    #[arg(long)]
    db:     String,
    #[arg(required = true)]
    tables: Vec<String>,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
  Json,
  Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("SCHEMAGRAPH"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(cli.store.as_deref().unwrap_or(&server_cfg.store_path));
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Serve => serve(store, &server_cfg).await,
    Command::Ingest { file } => ingest(&store, &file).await,
    Command::List => {
      for db_id in store.list_databases().await? {
        println!("{db_id}");
      }
      Ok(())
    }
    Command::Drop { db: Some(db_id), .. } => {
      if !store.delete_database(&db_id).await? {
        anyhow::bail!("no database {db_id:?} in store");
      }
      tracing::info!(db_id = %db_id, "dropped schema");
      Ok(())
    }
    Command::Drop { db: None, .. } => {
      store.clear().await?;
      Ok(())
    }
    Command::Subset { file, format } => subset(&store, &file, format).await,
    Command::Tree { db, tables } => {
      let terminals: BTreeSet<String> = tables.iter().map(|t| table_key(&db, t)).collect();
      let tree = steiner_tree(&store, &db, &terminals).await?;
      println!("{}", serde_json::to_string_pretty(&TreeView::from(&tree))?);
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = schemagraph_api::api_router(Arc::new(store));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn ingest(store: &SqliteStore, file: &Path) -> anyhow::Result<()> {
  let raw = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
  let descriptions =
    parse_descriptions(&raw).with_context(|| format!("failed to parse {file:?}"))?;

  for description in descriptions {
    let summary = store
      .ingest(&description)
      .await
      .with_context(|| format!("failed to ingest {:?}", description.db_id))?;
    println!(
      "{}: {} tables, {} columns, {} foreign keys",
      description.db_id, summary.tables, summary.columns, summary.foreign_keys
    );
  }
  Ok(())
}

async fn subset(store: &SqliteStore, file: &Path, format: Format) -> anyhow::Result<()> {
  let raw = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
  let candidates: Vec<Candidate> =
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {file:?}"))?;

  let result = schemagraph_core::run(store, &candidates)
    .await
    .context("subsetting failed")?;
  match format {
    Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    Format::Text => print!("{}", render_subset(&result)),
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
