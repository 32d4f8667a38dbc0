mod cli_args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use orin_agent::Responder;
use orin_ai::{OpenAiClient, OpenAiConfig};
use orin_gateway::{GatewayConfig, GoogleOAuthConfig};
use orin_memory::ProfileUpdater;
use orin_safety::SafetyFilter;
use orin_store::{ProfileStore, TranscriptStore};

use crate::cli_args::Cli;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_server(cli).await
}

async fn run_server(cli: Cli) -> Result<()> {
    std::fs::create_dir_all(&cli.state_dir)
        .with_context(|| format!("failed to create {}", cli.state_dir.display()))?;

    let profile_store = ProfileStore::open(cli.state_dir.join("memory.json"));
    profile_store
        .ensure_exists()
        .context("failed to initialize profile store")?;
    let transcripts = TranscriptStore::open(cli.state_dir.join("transcripts.json"));
    transcripts
        .ensure_exists()
        .context("failed to initialize transcript store")?;

    let client = Arc::new(OpenAiClient::new(OpenAiConfig::from_env()?)?);
    let safety = SafetyFilter::new()?;
    let responder = Responder::new(
        client,
        transcripts,
        ProfileUpdater::new(profile_store),
        safety,
        cli.model,
    );

    let config = GatewayConfig {
        bind: cli.bind,
        oauth: GoogleOAuthConfig {
            client_id: cli.google_client_id,
            client_secret: cli.google_client_secret,
            redirect_uri: cli.redirect_uri,
        },
        session_secret: cli.session_secret,
        session_ttl_seconds: cli.session_ttl_seconds,
    };

    orin_gateway::run(config, responder).await
}
