#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;

use super::{Config, ConfigError, ScoringConfig, ServerConfig, StorageConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!(
        "{}",
        style("🔧 Paper Triage Configuration Setup").bold().cyan()
    );
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Server").bold().yellow());
    eprintln!("Configure the Ollama-compatible server used to embed text.");
    eprintln!();

    configure_server(&mut config.server)?;

    eprintln!();
    eprintln!("{}", style("Scoring").bold().yellow());
    configure_models(&mut config.scoring)?;

    eprintln!();
    eprintln!("{}", style("Storage").bold().yellow());
    configure_storage(&mut config.storage)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_server_connection(&config.server)? {
        eprintln!("{}", style("✓ Embedding server reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to the embedding server").yellow()
        );
        eprintln!("You can continue, but make sure the server is running before scoring papers.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        let config_path = config
            .config_file_path()
            .context("Failed to get config file path")?;
        eprintln!(
            "Configuration saved to: {}",
            style(config_path.display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Embedding Server:").bold().yellow());
    eprintln!("  Host: {}", style(&config.server.host).cyan());
    eprintln!("  Port: {}", style(config.server.port).cyan());
    match config.server.server_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Scoring:").bold().yellow());
    eprintln!(
        "  Model chain: {}",
        style(config.scoring.models.join(", ")).cyan()
    );
    for band in &config.scoring.thresholds {
        eprintln!(
            "  {}: {} or higher",
            style(band.category).cyan(),
            band.min_score
        );
    }

    eprintln!();
    eprintln!("{}", style("Storage:").bold().yellow());
    eprintln!(
        "  Context file: {}",
        style(config.context_file_path().display()).cyan()
    );
    eprintln!(
        "  Papers directory: {}",
        style(config.papers_dir_path().display()).cyan()
    );

    let config_path = config
        .config_file_path()
        .context("Failed to get config file path")?;
    eprintln!();
    eprintln!("Config file: {}", style(config_path.display()).dim());

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load_default().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let mut config = Config::default();
            config.base_dir = Config::config_dir()?;
            Ok(config)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_server(server: &mut ServerConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == server.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Server protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Server host")
        .default(server.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = ServerConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                port: 11434, // Use default port for validation
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Server port")
        .default(server.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    server.set_protocol(protocol)?;
    server.set_host(host)?;
    server.set_port(port)?;

    Ok(())
}

fn configure_models(scoring: &mut ScoringConfig) -> Result<()> {
    let models: String = Input::new()
        .with_prompt("Embedding model chain (comma separated, tried in order)")
        .default(scoring.models.join(", "))
        .validate_with(|input: &String| -> Result<(), &str> {
            if parse_model_chain(input).is_empty() {
                Err("At least one model is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    scoring.set_models(parse_model_chain(&models))?;

    Ok(())
}

fn configure_storage(storage: &mut StorageConfig) -> Result<()> {
    let context_file: String = Input::new()
        .with_prompt("Research context file")
        .default(storage.context_file.display().to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Context file path cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let papers_dir: String = Input::new()
        .with_prompt("Papers download directory")
        .default(storage.papers_dir.display().to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Papers directory cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    storage.set_context_file(PathBuf::from(context_file))?;
    storage.set_papers_dir(PathBuf::from(papers_dir))?;

    Ok(())
}

fn parse_model_chain(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|model| model.trim().to_string())
        .filter(|model| !model.is_empty())
        .collect()
}

fn test_server_connection(server: &ServerConfig) -> Result<bool> {
    let url = format!(
        "{}://{}:{}/api/version",
        server.protocol, server.host, server.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}
