use tracing::info;

use shelf::{Config, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = shelf::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        shelf::logging::init_console_only(&config.logging.level);
    }

    info!("Shelf - file management backend");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let server = match WebServer::new(&config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to initialize server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
