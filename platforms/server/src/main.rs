//! Binary entrypoint for the catalog server.
use tmsim_server::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Default listen address can be overridden with TMSIM_ADDR
    let addr = std::env::var("TMSIM_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    run(&addr).await
}
