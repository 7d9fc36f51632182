use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worldcat_bridge::infrastructure::AppState;
use worldcat_bridge::{config, server};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldcat_bridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = config::Config::from_env().expect("Invalid configuration");
    tracing::info!(
        "Default library {} on site {}, {} library mappings, {} site mappings",
        config.default_library,
        config.default_site,
        config.library_mappings.len(),
        config.site_mappings.len()
    );

    let state = AppState::from_config(config).expect("Failed to build HTTP clients");

    if let Err(e) = server::start_server(state).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
