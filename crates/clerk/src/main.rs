use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use clerk::cli::commands;
use clerk::config::ClerkConfig;

const LOG_ENV: &str = "CLERK_LOG";

#[derive(Parser)]
#[command(name = "clerk")]
#[command(about = "Clerk - claim document extraction\nUpload claim documents for extraction and keep the results locally")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), ", courtesy of Kernelle Software"))]
struct Cli {
  /// Base URL of the extraction service [default: $CLERK_SERVER_URL]
  #[arg(long, global = true)]
  server: Option<String>,

  /// Directory extracted documents are stored in [default: $CLERK_STORAGE_DIR]
  #[arg(long, global = true)]
  storage_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Send a document to the extraction service
  Extract {
    /// Document to upload
    file: PathBuf,
    /// Do not keep the result in the local record store
    #[arg(long)]
    no_save: bool,
    /// Print the result envelope as JSON
    #[arg(long)]
    json: bool,
  },
  /// List stored extraction results
  List {
    /// Print records as JSON
    #[arg(long)]
    json: bool,
  },
  /// Remove all stored extraction results
  Clear,
}

fn init_logging() {
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();
}

fn resolve_config(cli: &Cli) -> ClerkConfig {
  ClerkConfig::from_env().with_overrides(cli.server.as_deref(), cli.storage_dir.as_deref())
}

async fn handle(command: Command, config: &ClerkConfig) -> Result<()> {
  match command {
    Command::Extract { file, no_save, json } => {
      commands::extract_document(config, &file, !no_save, json).await
    }
    Command::List { json } => commands::list_documents(config, json),
    Command::Clear => commands::clear_documents(config),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  init_logging();

  let cli = Cli::parse();
  let config = resolve_config(&cli);

  handle(cli.command, &config).await
}
