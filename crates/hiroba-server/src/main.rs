//! hiroba server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `HIROBA_*`
//! environment variables, opens the SQLite store, and serves the forum API
//! over HTTP.
//!
//! # Provisioning users
//!
//! ```text
//! hiroba add-user --username aiko     # prompts for a password on stdin
//! hiroba hash-password                # prints an argon2 PHC string
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use hiroba_core::{store::UserStore, user::NewUser};
use hiroba_server::{AppState, ServerConfig, auth::hash_password, sweep};
use hiroba_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hiroba regional forum server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
  /// Create a user, or reset the password of an existing one.
  AddUser {
    #[arg(long)]
    username: String,
  },
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

  if let Some(Command::HashPassword) = cli.command {
    let password = read_password()?;
    println!("{}", hash(&password)?);
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;
  let policy = server_cfg
    .lifecycle
    .policy()
    .context("invalid lifecycle thresholds")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_policy(policy);

  match cli.command.unwrap_or(Command::Serve) {
    Command::AddUser { username } => {
      let password = read_password()?;
      let user = store
        .upsert_user(NewUser { username, password_hash: hash(&password)? })
        .await
        .context("failed to store user")?;
      println!("{}", user.user_id);
      Ok(())
    }
    Command::HashPassword => Ok(()),
    Command::Serve => serve(store, server_cfg).await,
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let store = Arc::new(store);
  let address = server_cfg.address();

  sweep::spawn(
    store.clone(),
    Duration::from_secs(server_cfg.sweep_interval_secs.max(1)),
  );

  let state = AppState { users: store.clone(), config: Arc::new(server_cfg) };
  let app = hiroba_server::router(store, state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

fn hash(password: &str) -> anyhow::Result<String> {
  hash_password(password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_string();
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
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
