//! `skillrelay ask` — Send one message through the relay.

use skillrelay_core::error::RelayError;
use skillrelay_relay::DEGRADED_REPLY;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let relay = super::build_relay(&config)?;

    match relay.handle(message).await {
        Ok(reply) => {
            println!("{}", reply.reply);
            eprintln!(
                "\n  (answered by {} after {} attempt(s))",
                reply.model, reply.attempts
            );
            Ok(())
        }
        Err(RelayError::AllModelsExhausted { failures }) => {
            println!("{DEGRADED_REPLY}");
            eprintln!();
            for failure in &failures {
                eprintln!("  x {failure}");
            }
            Err(format!("all {} models failed", failures.len()).into())
        }
        Err(e) => Err(e.into()),
    }
}
