use std::sync::Arc;

use tracing::{error, info};

use taskboard::{BoardsApp, Config, MemoryDirectory};

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

    // Initialize logging
    if let Err(e) = taskboard::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        taskboard::logging::init_console_only(&config.logging.level);
    }

    info!("TASKBOARD - board permissions and batch mutations");

    let app = match BoardsApp::open(&config, Arc::new(MemoryDirectory::new())).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    match app.db().schema_version().await {
        Ok(version) => info!(
            "Database {} ready at schema version {}",
            config.database.path, version
        ),
        Err(e) => error!("Failed to read schema version: {e}"),
    }
    info!(
        "Limits: title {} chars, description {} chars, {} entities per batch",
        app.config().max_title_length,
        app.config().max_description_length,
        app.config().max_batch_entities
    );
}
