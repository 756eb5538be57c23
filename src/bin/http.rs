#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use duty_roster::{AppConfig, DutyScheduler, http_api, telemetry};

    let config = AppConfig::from_env()?;
    telemetry::init_logging(&config.log_filter)?;

    let store = config.open_store()?;
    match &config.db_path {
        Some(path) => tracing::info!(path = %path.display(), "using sqlite store"),
        None => tracing::info!("using in-memory store"),
    }

    println!("duty-roster HTTP API listening on http://{}", config.http_addr);
    http_api::serve(config.http_addr, DutyScheduler::new(store)).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
