use anyhow::{Context, Result};
use clap::Parser;
use std::{env, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub media_dir: String,
    pub database_url: String,
    /// Prefix public media URLs are resolved under. Empty means same-origin
    /// relative URLs (`/media/...`).
    pub public_base_url: String,
    /// Deadline applied to every object-store and record-store call.
    pub store_timeout: Duration,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Event media-sharing and guestbook service")]
pub struct Args {
    /// Host to bind to (overrides KEEPSAKE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides KEEPSAKE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where media payloads are stored (overrides KEEPSAKE_MEDIA_DIR)
    #[arg(long)]
    pub media_dir: Option<String>,

    /// Database URL (overrides KEEPSAKE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Base URL media links are resolved against (overrides KEEPSAKE_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Per-store-call deadline in seconds (overrides KEEPSAKE_STORE_TIMEOUT_SECS)
    #[arg(long)]
    pub store_timeout_secs: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("KEEPSAKE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("KEEPSAKE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing KEEPSAKE_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading KEEPSAKE_PORT"),
        };
        let env_media = env::var("KEEPSAKE_MEDIA_DIR").unwrap_or_else(|_| "./data/media".into());
        let env_db = env::var("KEEPSAKE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/keepsake.db".into());
        let env_base_url = env::var("KEEPSAKE_PUBLIC_BASE_URL").unwrap_or_default();
        let env_timeout = match env::var("KEEPSAKE_STORE_TIMEOUT_SECS") {
            Ok(value) => Some(value.parse::<u64>().with_context(|| {
                format!("parsing KEEPSAKE_STORE_TIMEOUT_SECS value `{}`", value)
            })?),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context("reading KEEPSAKE_STORE_TIMEOUT_SECS"),
        };

        // --- Merge ---
        let timeout_secs = args.store_timeout_secs.or(env_timeout).unwrap_or(30);
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            media_dir: args.media_dir.unwrap_or(env_media),
            database_url: args.database_url.unwrap_or(env_db),
            public_base_url: args.public_base_url.unwrap_or(env_base_url),
            store_timeout: Duration::from_secs(timeout_secs),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Prefix media URLs are built from: `<public_base_url>/media`.
    pub fn media_url_prefix(&self) -> String {
        format!("{}/media", self.public_base_url.trim_end_matches('/'))
    }
}
