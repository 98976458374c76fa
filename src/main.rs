use emberdb::{server, Config};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging (INFO level by default, overridable via RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("EmberDB starting...");

    let config = Config::from_env();
    info!("Listening on {}, snapshot at {:?}", config.addr(), config.snapshot_path);

    if let Err(e) = server::run(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
