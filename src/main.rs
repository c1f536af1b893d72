use anchor_earn::ledger::LcdClient;
use anchor_earn::{api, config::Config, AnchorEarn};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let network = match config.network_config() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Query-only client over the LCD
    let ledger = match LcdClient::new(
        network.lcd_url.clone(),
        network.chain_id.clone(),
        config.request_timeout(),
    ) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to create LCD client: {}", e);
            std::process::exit(1);
        }
    };

    let mut builder = AnchorEarn::builder()
        .network(network)
        .ledger(Arc::new(ledger));
    if let Some(address) = config.address.clone() {
        builder = builder.address(address);
    }
    let client = match builder.build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build client: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Using network {} via {}",
        client.chain_id(),
        client.network().lcd_url
    );

    // Create router
    let app = api::create_router(api::AppState::new(Arc::new(client)));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
