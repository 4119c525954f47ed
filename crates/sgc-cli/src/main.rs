//! `sgc`: command-line client for the SGC server.
//!
//! # Usage
//!
//! ```
//! sgc --url http://localhost:8080 --api-key secret ls
//! sgc --config ~/.config/sgc/config.toml acpm list --status open
//! ```

mod client;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use sgc_core::{
  acpm::{AcpmStatus, AcpmTransition},
  template::FilledValues,
};
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sgc", about = "Command-line client for the SGC server")]
struct Args {
  /// Path to a TOML config file (url, api_key).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the SGC server (default: http://localhost:8080).
  #[arg(long, env = "SGC_URL")]
  url: Option<String>,

  /// Shared API key.
  #[arg(long, env = "SGC_API_KEY")]
  api_key: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List a folder, or the top level.
  Ls { folder: Option<Uuid> },
  /// Create a folder.
  Mkdir {
    name:   String,
    #[arg(long)]
    parent: Option<Uuid>,
  },
  /// Upload a local file into a folder.
  Upload { folder: Uuid, path: PathBuf },
  /// Download a file.
  Download {
    file:   Uuid,
    /// Output path; defaults to the stored file name.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Delete a file.
  RmFile { id: Uuid },
  /// Delete a folder and everything below it.
  Rmdir { id: Uuid },
  /// Corrective, preventive and improvement actions.
  #[command(subcommand)]
  Acpm(AcpmCommand),
  /// Certificates.
  #[command(subcommand)]
  Cert(CertCommand),
}

#[derive(Subcommand, Debug)]
enum AcpmCommand {
  List {
    #[arg(long)]
    status: Option<StatusArg>,
  },
  /// Close an ACPM with evidence.
  Close(CloseArgs),
}

#[derive(ClapArgs, Debug)]
struct CloseArgs {
  id:            Uuid,
  /// URL of evidence already in the drive.
  #[arg(long, conflicts_with = "evidence_file", required_unless_present = "evidence_file")]
  evidence_url:  Option<String>,
  /// Local file uploaded as evidence before closing.
  #[arg(long)]
  evidence_file: Option<PathBuf>,
  #[arg(long)]
  comment:       Option<String>,
}

#[derive(Subcommand, Debug)]
enum CertCommand {
  /// Render a certificate and store it in the drive.
  Generate {
    template: Uuid,
    /// JSON file with `{"fields": {...}, "tables": {...}}`.
    values:   PathBuf,
    #[arg(long)]
    batch:    Option<String>,
    #[arg(long)]
    client:   Option<String>,
  },
  /// Search generated certificates.
  List {
    /// Matches batch, client or template name.
    #[arg(long)]
    q: Option<String>,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusArg {
  Open,
  InProgress,
  Closed,
}

impl From<StatusArg> for AcpmStatus {
  fn from(s: StatusArg) -> Self {
    match s {
      StatusArg::Open => AcpmStatus::Open,
      StatusArg::InProgress => AcpmStatus::InProgress,
      StatusArg::Closed => AcpmStatus::Closed,
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:     String,
  #[serde(default)]
  api_key: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // Flags and environment override the config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    api_key:  args
      .api_key
      .or_else(|| (!file_cfg.api_key.is_empty()).then(|| file_cfg.api_key.clone()))
      .unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Ls { folder } => {
      let contents = client.list(folder).await?;
      if let Some(current) = &contents.folder {
        println!("{}  ({})", current.name, current.folder_id);
      }
      for f in &contents.folders {
        println!("{}  {}/", f.folder_id, f.name);
      }
      for f in &contents.files {
        println!("{}  {}  {} B  {}", f.file_id, f.name, f.size, f.mime_type);
      }
    }
    Command::Mkdir { name, parent } => {
      let folder = client.create_folder(&name, parent).await?;
      println!("{}", folder.folder_id);
    }
    Command::Upload { folder, path } => {
      let (name, content) = read_local(&path)?;
      let file = client.upload(folder, name, content).await?;
      println!("{}  {}", file.file_id, file.url);
    }
    Command::Download { file, output } => {
      let (name, content) = client.download(file).await?;
      let path = output
        .or_else(|| name.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(file.to_string()));
      std::fs::write(&path, &content)
        .with_context(|| format!("writing {}", path.display()))?;
      println!("{} ({} B)", path.display(), content.len());
    }
    Command::RmFile { id } => client.delete_file(id).await?,
    Command::Rmdir { id } => client.delete_folder(id).await?,
    Command::Acpm(AcpmCommand::List { status }) => {
      for a in client.list_acpms(status.map(Into::into)).await? {
        println!(
          "{}  {:<11}  {}  {}  {}",
          a.acpm_id, a.status, a.due_date, a.responsible, a.description
        );
      }
    }
    Command::Acpm(AcpmCommand::Close(close)) => {
      let evidence_url = match (close.evidence_url, close.evidence_file) {
        (Some(url), _) => url,
        (None, Some(path)) => {
          let (name, content) = read_local(&path)?;
          let evidence = client.upload_evidence(close.id, name, content).await?;
          println!("evidence {}  {}", evidence.file.file_id, evidence.file.name);
          evidence.url
        }
        (None, None) => anyhow::bail!("--evidence-url or --evidence-file is required"),
      };
      let acpm = client
        .transition(close.id, &AcpmTransition {
          status:          AcpmStatus::Closed,
          closure_comment: close.comment,
          evidence_url:    Some(evidence_url),
        })
        .await?;
      println!("{}  {}", acpm.acpm_id, acpm.status);
    }
    Command::Cert(CertCommand::Generate { template, values, batch, client: customer }) => {
      let raw = std::fs::read_to_string(&values)
        .with_context(|| format!("reading {}", values.display()))?;
      let values: FilledValues =
        serde_json::from_str(&raw).context("parsing certificate values")?;
      let generated = client.generate(template, values, batch, customer).await?;
      println!(
        "{}  {} page(s)  {}",
        generated.certificate_id, generated.page_count, generated.pdf_url
      );
    }
    Command::Cert(CertCommand::List { q }) => {
      for c in client.search_generated(q).await? {
        println!(
          "{}  {}  {}  {}  {}",
          c.certificate_id,
          c.created_at.format("%Y-%m-%d %H:%M"),
          c.template_name,
          c.batch.as_deref().unwrap_or("-"),
          c.client.as_deref().unwrap_or("-"),
        );
      }
    }
  }
  Ok(())
}

fn read_local(path: &Path) -> Result<(String, Vec<u8>)> {
  let content =
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "archivo".to_owned());
  Ok((name, content))
}
