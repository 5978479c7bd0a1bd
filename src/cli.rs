//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::metrics::HitCounter;
use crate::password::{HashCost, PasswordHasher};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Deployment platform. Destructive admin endpoints only exist on `dev`.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Platform {
    #[default]
    Dev,
    Prod,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "chirpy", about = "Short posts with token authentication")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DB_URL", default_value = "chirpy.db")]
    pub database: String,

    /// Deployment platform; reset is only allowed on dev
    #[arg(long, env = "PLATFORM", value_enum, default_value = "dev")]
    pub platform: Platform,

    /// Directory served under /app/
    #[arg(long, env = "ASSETS_DIR", default_value = ".")]
    pub assets_dir: PathBuf,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Path to file containing the Polka API key. Prefer using POLKA_KEY env var instead
    #[arg(long)]
    pub polka_key_file: Option<String>,

    /// Argon2 memory cost in KiB
    #[arg(long, default_value_t = HashCost::default().memory_kib)]
    pub hash_memory_kib: u32,

    /// Argon2 iterations
    #[arg(long, default_value_t = HashCost::default().iterations)]
    pub hash_iterations: u32,

    /// Argon2 parallelism (lanes)
    #[arg(long, default_value_t = HashCost::default().parallelism)]
    pub hash_parallelism: u32,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Args {
    pub fn hash_cost(&self) -> HashCost {
        HashCost {
            memory_kib: self.hash_memory_kib,
            iterations: self.hash_iterations,
            parallelism: self.hash_parallelism,
        }
    }
}

/// Initialize logging based on the specified format.
/// The level filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logging(format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Read a secret from the environment variable `var`, or else from `file`.
///
/// The variable is removed after reading so child processes and later code
/// never see it. Returns `Ok(None)` if neither source is set.
fn read_secret(var: &str, file: Option<&str>) -> std::io::Result<Option<String>> {
    if let Ok(secret) = std::env::var(var) {
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(var) };
        return Ok(Some(secret));
    }
    match file {
        Some(path) => Ok(Some(std::fs::read_to_string(path)?.trim().to_string())),
        None => Ok(None),
    }
}

fn validate_jwt_secret(secret: Option<String>) -> Option<String> {
    let Some(secret) = secret else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} bytes. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    match read_secret("JWT_SECRET", jwt_secret_file) {
        Ok(secret) => validate_jwt_secret(secret),
        Err(e) => {
            error!(error = %e, "Failed to read JWT secret file");
            None
        }
    }
}

/// Load the Polka API key from environment variable or file.
///
/// A missing key is not fatal: the webhook then rejects every call.
/// Returns None and logs an error only if the key file cannot be read.
pub fn load_polka_key(polka_key_file: Option<&str>) -> Option<String> {
    match read_secret("POLKA_KEY", polka_key_file) {
        Ok(Some(key)) => Some(key),
        Ok(None) => {
            warn!("No Polka API key configured, webhook calls will be rejected");
            Some(String::new())
        }
        Err(e) => {
            error!(error = %e, "Failed to read Polka key file");
            None
        }
    }
}

/// Build the password hasher from the configured cost.
/// Returns None and logs an error if argon2 rejects the parameters.
pub fn build_password_hasher(cost: HashCost) -> Option<PasswordHasher> {
    match PasswordHasher::new(cost) {
        Ok(hasher) => Some(hasher),
        Err(e) => {
            error!(error = %e, ?cost, "Invalid password hashing cost");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    polka_key: String,
    platform: Platform,
    assets_dir: PathBuf,
    passwords: PasswordHasher,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        polka_key,
        platform,
        assets_dir,
        passwords,
        hits: HitCounter::new(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
