//! `skillrelay serve` — Start the HTTP relay.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let relay = super::build_relay(&config)?;

    println!("SkillRelay");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {}", config.relay.provider_url);
    println!("   Models:    {}", relay.models().join(" -> "));

    skillrelay_gateway::start(&config, relay).await?;

    Ok(())
}
