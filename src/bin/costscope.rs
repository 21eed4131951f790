// costscope binary entrypoint

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("costscope=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    costscope::cli::run().await
}
