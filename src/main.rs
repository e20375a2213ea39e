#![cfg(not(tarpaulin_include))]

use conference_dashboard::{app, Config};

/// Main entry point for the dashboard web server
///
/// Reads the backend location and API key from the environment (see
/// [`Config::from_env`]) and serves the dashboard until interrupted.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    // Start the web application with the configured backend
    app::run(config).await
}
