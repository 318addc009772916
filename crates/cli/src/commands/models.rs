//! `skillrelay models` — Show the model fallback order.

use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    println!("Fallback order ({}):", config.relay.provider_url);
    for (i, model) in config.relay.models.iter().enumerate() {
        println!("  {}. {model}", i + 1);
    }
    println!();
    println!(
        "  max_tokens={}  temperature={}  attempt_timeout={}s",
        config.relay.max_tokens, config.relay.temperature, config.relay.attempt_timeout_secs
    );

    Ok(())
}
