use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dedi_server_manager::config::Config;
use dedi_server_manager::{create_app, AppState};
use shared::repositories::launch_service::HttpLaunchService;
use shared::repositories::platform_authenticator::FacebookAuthenticator;
use shared::repositories::session_directory::{HttpMessageSink, LocalSessionDirectory};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env();
    let client = reqwest::Client::new();

    let sink = Arc::new(HttpMessageSink::new(
        client.clone(),
        &config.session_gateway_url,
    ));
    let sessions = Arc::new(LocalSessionDirectory::new(sink));
    let launcher = Arc::new(HttpLaunchService::new(
        client.clone(),
        &config.launch_service_url,
    ));
    let authenticator = Arc::new(FacebookAuthenticator::new(
        client,
        &config.facebook_graph_url,
    ));

    let state = AppState::new(
        sessions,
        launcher,
        authenticator,
        config.dedicated_server_args.clone(),
        config.matchmaking_timeout,
    );
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Dedicated server manager listening: address={}", config.bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}
