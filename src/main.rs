use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hera_core::bootstrap::build_assistant;
use hera_core::config::Config;
use hera_gateway::GatewayServer;
use tokio::sync::watch;

/// Retrieval-augmented HR assistant.
#[derive(Debug, Parser)]
#[command(name = "hera", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "HERA_CONFIG", default_value = "config/default.toml")]
    config: PathBuf,

    /// Serve without ingesting the documents directory first.
    ///
    /// Useful with a persisted vector store that already holds the documents.
    #[arg(long)]
    skip_ingest: bool,

    /// Ingest the documents directory and exit.
    #[arg(long, conflicts_with = "skip_ingest")]
    ingest_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    let assistant = Arc::new(build_assistant(&config).await?);

    if cli.skip_ingest {
        tracing::info!("skipping startup ingestion");
    } else {
        let summary = assistant
            .ingest_all()
            .await
            .context("startup ingestion failed")?;
        tracing::info!(
            chunks = summary.total_chunks,
            files = summary.files.len(),
            path = %assistant.documents_path().display(),
            "documents ingested"
        );
    }

    if cli.ingest_only {
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.gateway.bind,
        config.gateway.port,
        assistant,
        shutdown_rx,
    )
    .with_max_body_size(config.gateway.max_body_size)
    .with_upload_dir(&config.gateway.upload_dir)
    .serve()
    .await?;

    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["hera"]).unwrap();
        assert!(!cli.skip_ingest);
        assert!(!cli.ingest_only);
    }

    #[test]
    fn cli_flags() {
        let cli =
            Cli::try_parse_from(["hera", "--config", "/etc/hera.toml", "--skip-ingest"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/hera.toml"));
        assert!(cli.skip_ingest);
        assert!(Cli::try_parse_from(["hera", "--skip-ingest", "--ingest-only"]).is_err());
    }
}
