//! `simplo serve` — Start the HTTP chat gateway.

use simplo_config::AppConfig;
use tracing::info;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        text_model = %config.models.text,
        vision_model = %config.models.vision,
        "Serve command starting"
    );

    println!("💬 Simplo Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Upstream:  {}", config.api_url);
    println!("   Models:    {} / {}", config.models.text, config.models.vision);

    simplo_gateway::start(config).await?;

    Ok(())
}
