use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt};

use subchapterizer::config::Settings;
use subchapterizer::server::{AppState, router};
use subchapterizer::services::chapterizer::{ChapterSubdivider, RetryPolicy};
use subchapterizer::services::llm::{ChatCompleter, LLMClient};
use subchapterizer::services::planner::Planner;
use subchapterizer::services::tokens::{TiktokenCounter, TokenCounter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env().context("failed to load settings")?;
    tracing::info!(
        provider = ?settings.llm.provider,
        model = %settings.llm.model,
        concurrency = settings.processing.concurrency,
        "Settings loaded"
    );

    let completer: Arc<dyn ChatCompleter> = Arc::new(LLMClient::new(&settings.llm));
    let tokenizer: Arc<dyn TokenCounter> =
        Arc::new(TiktokenCounter::new().context("failed to load the cl100k_base tokenizer")?);
    let processing = &settings.processing;
    let subdivider = ChapterSubdivider::new(completer, tokenizer)
        .with_planner(Planner::new(
            processing.unit_tokens,
            processing.min_parts,
            processing.max_parts,
        ))
        .with_retry(RetryPolicy {
            max_attempts: processing.max_attempts,
            ..RetryPolicy::default()
        })
        .with_request_timeout(processing.request_timeout);

    let app_state = AppState {
        subdivider: Arc::new(subdivider),
        concurrency: processing.concurrency,
    };

    let listener = TcpListener::bind(&settings.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.server_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(app_state)).await?;

    Ok(())
}
