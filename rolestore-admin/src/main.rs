//! # Rolestore Admin
//!
//! Operator CLI for a rolestore deployment: first-run bootstrap, role
//! listing and user management against the configured Redis.
//!
//! ## Usage
//!
//! ```bash
//! REDIS_URL=redis://localhost:6379 cargo run -p rolestore-admin -- bootstrap
//! cargo run -p rolestore-admin -- --memory create-user new@example.com --role analyst
//! ```

use clap::Parser;
use rolestore_admin::cli::Cli;
use rolestore_admin::commands::{execute, open_store};
use rolestore_admin::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "rolestore_admin=debug,rolestore_shared=debug"
    } else {
        "rolestore_admin=info,rolestore_shared=info"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("rolestore-admin v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env(cli.memory)?;
    if config.is_memory() {
        tracing::warn!("Using in-memory store, changes are discarded on exit");
    }

    let store = open_store(&config).await?;
    let output = execute(&store, cli.command).await?;
    println!("{}", output);

    Ok(())
}
