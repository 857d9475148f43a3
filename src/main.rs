use axum::serve;
use biofed_rust::api::handlers::AppState;
use biofed_rust::api::routes::create_router;
use biofed_rust::config::{AppConfig, StorageBackend};
use biofed_rust::store;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress reqwest debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("reqwest", LevelFilter::Warn)
        .init();

    println!("BioFed: Data Federation Node API");

    // Load configuration
    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{}",
        config.server.host, config.server.port
    );

    let store = store::build_store(&config.storage);
    match config.storage.backend {
        StorageBackend::Json => println!(
            "Serving entities from the JSON document store in '{}'",
            config.storage.data_dir
        ),
        StorageBackend::Graph => println!(
            "Serving entities from the graph store at {}",
            config.storage.graph.endpoint
        ),
    }

    let state = AppState::new(store, config.data_dir());

    run_server(create_router(state), &config).await?;

    Ok(())
}

async fn run_server(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    println!("BioFed server running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
