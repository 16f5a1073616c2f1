use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sagra_server::config::{AppConfig, CliConfig, FileConfig};
use sagra_server::server::csrf::TokenForge;
use sagra_server::user::{SqliteUserStore, UserManager};
use sagra_server::{run_server, RequestsLoggingLevel, ServerConfig, SqliteEventStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the directory holding the SQLite databases (events.db, users.db).
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. Its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Events per page on the public listing.
    #[clap(long, default_value_t = 3)]
    pub page_size: u32,

    /// Offset from UTC, in minutes, used to decide which calendar date is
    /// "today". Defaults to the host's local offset.
    #[clap(long)]
    pub utc_offset_minutes: Option<i32>,

    /// Secret for anti-forgery tokens. When unset a random per-process
    /// secret is used and outstanding tokens expire on restart.
    #[clap(long)]
    pub token_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        page_size: cli_args.page_size,
        utc_offset_minutes: cli_args.utc_offset_minutes,
        token_secret: cli_args.token_secret,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening SQLite databases in {:?}...", config.db_dir);
    let event_store = Arc::new(SqliteEventStore::new(config.db_dir.join("events.db"))?);
    let user_store = Arc::new(SqliteUserStore::new(config.db_dir.join("users.db"))?);
    let user_manager = Arc::new(UserManager::new(user_store));
    let token_forge = Arc::new(TokenForge::new(
        config.token_secret.as_ref().map(|s| s.as_bytes().to_vec()),
    ));

    let server_config = ServerConfig {
        port: config.port,
        requests_logging_level: config.logging_level.clone(),
        page_size: config.page_size,
        utc_offset_minutes: config.utc_offset_minutes,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(server_config, event_store, user_manager, token_forge).await
}
