use chirpy::cli::{
    Args, build_config, build_password_hasher, init_logging, load_jwt_secret, load_polka_key,
    open_database,
};
use chirpy::{init_cleanup, run_server};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Values from .env never override the real environment
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_format);

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(polka_key) = load_polka_key(args.polka_key_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(passwords) = build_password_hasher(args.hash_cost()) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    init_cleanup(&db).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to read local address");
        std::process::exit(1);
    });

    let config = build_config(
        db,
        jwt_secret,
        polka_key,
        args.platform,
        args.assets_dir,
        passwords,
    );

    info!(
        address = %local_addr,
        assets = %config.assets_dir.display(),
        platform = ?config.platform,
        "Listening"
    );

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
