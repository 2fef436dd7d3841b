use std::error::Error;

use ai_llm_service::telemetry;
use tracing_subscriber::{
    EnvFilter, Layer, filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; the process environment is used as is.
    let dotenv = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        // Dependencies go through the plain layer, workspace crates through ours.
        .with(
            fmt::layer()
                .with_filter(filter_fn(|meta| !telemetry::is_workspace_target(meta.target()))),
        )
        .with(telemetry::layer())
        .try_init()?;

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => tracing::debug!("no .env file"),
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    api::start().await?;

    Ok(())
}
