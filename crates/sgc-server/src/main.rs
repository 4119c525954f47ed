//! sgc-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `SGC_*` environment variables, opens the SQLite store, loads the
//! certificate fonts and serves the REST API over HTTP.
//!
//! # API key hash generation
//!
//! To generate the argon2 PHC string for `api_key_hash` in config.toml:
//!
//! ```
//! cargo run -p sgc-server -- --hash-key
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use sgc_certificate::PdfRenderer;
use sgc_server::{ServerConfig, auth};
use sgc_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "SGC quality-management server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for an API key entered on stdin and exit.
  #[arg(long)]
  hash_key: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_key {
    println!("{}", auth::hash_key(&read_key()?).context("failed to hash api key")?);
    return Ok(());
  }

  let server_cfg = load_config(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let fonts_dir = expand_tilde(&server_cfg.fonts_dir);
  let renderer = PdfRenderer::from_dir(&fonts_dir, &server_cfg.font_family)
    .with_context(|| format!("failed to load certificate fonts from {fonts_dir:?}"))?;

  let app = sgc_server::router(Arc::new(store), Arc::new(renderer), &server_cfg);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    store = ?store_path,
    max_upload_bytes = server_cfg.max_upload_bytes,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// `path` (optional) layered under `SGC_*` variables, e.g. `SGC_PORT=9000`.
fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("SGC"))
    .build()
    .with_context(|| format!("failed to read {}", path.display()))?
    .try_deserialize()
    .context("invalid server configuration")
}

/// Read an API key from stdin.
fn read_key() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("API key: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let key = line.trim().to_owned();
  anyhow::ensure!(!key.is_empty(), "api key must not be empty");
  Ok(key)
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
