//! `coderag-api` — HTTP server for retrieval-augmented code search.

use clap::Parser;
use coderag_config::ApplicationConfig;
use std::net::SocketAddr;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type MainResult = Result<(), Box<dyn std::error::Error>>;

/// Index a repository and answer questions against it over HTTP.
#[derive(Parser, Debug)]
#[command(name = "coderag-api", version, about)]
struct Cli {
    /// Start indexing this directory as soon as the server is up.
    #[arg(long)]
    root: Option<String>,

    /// Exclude-pattern substring, repeatable (spec.md §4.1 exclude_patterns).
    #[arg(long = "exclude")]
    exclude_patterns: Vec<String>,

    /// Override `api.port` from configuration.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> MainResult {
    coderag_common::initialize_environment();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = ApplicationConfig::from_env().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "falling back to default configuration");
        ApplicationConfig::default()
    });
    if let Some(port) = cli.port {
        config.api.port = port;
    }

    info!(port = config.api.port, profile = %config.profile, "starting coderag-api");

    let state = coderag_api::bootstrap::initialize_app_state(&config).await?;

    if let Some(root) = cli.root {
        let indexer = std::sync::Arc::clone(&state.indexer);
        tokio::spawn(async move {
            if let Err(err) = indexer.start_indexing(&root, Some(cli.exclude_patterns)).await {
                tracing::error!(error = %err, "startup indexing run failed");
            }
        });
    }

    let mut app = coderag_api::routes::create_router(state);
    if config.api.enable_docs {
        app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", coderag_api::openapi::ApiDoc::openapi()));
    }

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
