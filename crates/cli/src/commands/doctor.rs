//! `skillrelay doctor` — Diagnose configuration and provider health.

use skillrelay_config::{AppConfig, TOKEN_ENV};
use skillrelay_relay::ContextStore;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("SkillRelay Doctor");
    println!("=================\n");

    let mut issues = 0;

    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    if config_file.exists() {
        println!("  ok   Config file: {}", config_file.display());
    } else {
        println!("  --   No config file at {}, using defaults", config_file.display());
    }

    let config = match AppConfig::load(config_path) {
        Ok(config) => {
            println!("  ok   Config valid ({} candidate models)", config.relay.models.len());
            config
        }
        Err(e) => {
            println!("  FAIL Config invalid: {e}");
            println!("\n  1 issue found. Fix the config and re-run.");
            return Ok(());
        }
    };

    for check in local_checks(&config) {
        if check.passed {
            println!("  ok   {}", check.detail);
        } else {
            println!("  FAIL {}", check.detail);
            issues += 1;
        }
    }

    // The provider can only be probed once the relay can be built.
    if issues == 0 {
        let relay = super::build_relay(&config)?;
        match relay.provider().health_check().await {
            Ok(true) => println!("  ok   Provider reachable: {}", config.relay.provider_url),
            Ok(false) => {
                println!("  FAIL Provider rejected the token: {}", config.relay.provider_url);
                issues += 1;
            }
            Err(e) => {
                println!("  FAIL Provider unreachable: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  --   Provider check skipped");
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Outcome of one offline check.
#[derive(Debug)]
struct Check {
    passed: bool,
    detail: String,
}

/// Context and credential checks; each problem is reported exactly once.
fn local_checks(config: &AppConfig) -> Vec<Check> {
    let context = match ContextStore::from_config(&config.context) {
        Ok(store) => Check {
            passed: true,
            detail: format!("Context loaded ({} bytes)", store.text().len()),
        },
        Err(e) => Check {
            passed: false,
            detail: format!("Context: {e}"),
        },
    };

    let token = match config.require_token() {
        Ok(_) => Check {
            passed: true,
            detail: format!("{TOKEN_ENV} is set"),
        },
        Err(e) => Check {
            passed: false,
            detail: e.to_string(),
        },
    };

    vec![context, token]
}
