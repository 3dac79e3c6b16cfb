//! Command-line surface.
//!
//! Without a subcommand `stagerev` opens the review session. The `config`
//! subcommands edit `~/.stagerev.yaml` and exit without touching the terminal.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stagerev_core::config::{config_path, set_api_key, set_default_provider};

/// Review staged Rust changes with an LLM.
#[derive(Parser, Debug)]
#[command(name = "stagerev")]
#[command(about = "Review staged Rust changes with an LLM")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Manage ~/.stagerev.yaml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Save an API key, globally or for one provider
    SetKey {
        /// The API key to store
        api_key: String,

        /// Provider the key belongs to (openai, deepseek, ...)
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Make an already-configured provider the default
    SetProvider {
        /// Provider name as it appears under `providers`
        name: String,
    },
}

/// Runs a `config` subcommand against the real config file.
///
/// # Errors
///
/// Fails if the home directory is unknown, the file cannot be read or
/// written, or a precondition of the mutation does not hold.
pub fn run_config_command(command: &ConfigCommand) -> Result<()> {
    let path = config_path().context("Cannot locate the config file")?;
    let message = apply_config_command(command, &path)?;
    println!("✓ {message}");
    println!("  Config file: {}", path.display());
    Ok(())
}

/// Applies `command` to the config at `path` and returns the confirmation line.
fn apply_config_command(command: &ConfigCommand, path: &Path) -> Result<String> {
    match command {
        ConfigCommand::SetKey { api_key, provider } => {
            set_api_key(path, api_key, provider.as_deref())
                .with_context(|| format!("Failed to save API key to {}", path.display()))?;
            Ok(match provider {
                Some(name) => format!("API key saved for provider '{name}'"),
                None => "API key saved".to_owned(),
            })
        }
        ConfigCommand::SetProvider { name } => {
            set_default_provider(path, name)
                .with_context(|| format!("Failed to set default provider in {}", path.display()))?;
            Ok(format!("Default provider set to '{name}'"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagerev_core::ConfigDocument;

    #[test]
    fn no_subcommand_opens_the_session() {
        let cli = Cli::try_parse_from(["stagerev"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_set_key_with_provider() {
        let cli = Cli::try_parse_from(["stagerev", "config", "set-key", "ABC123", "-p", "deepseek"])
            .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Config {
                command: ConfigCommand::SetKey {
                    api_key: "ABC123".to_owned(),
                    provider: Some("deepseek".to_owned()),
                }
            })
        );
    }

    #[test]
    fn parses_set_provider() {
        let cli = Cli::try_parse_from(["stagerev", "config", "set-provider", "openai"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Config {
                command: ConfigCommand::SetProvider {
                    name: "openai".to_owned()
                }
            })
        );
    }

    #[test]
    fn set_key_requires_a_key() {
        assert!(Cli::try_parse_from(["stagerev", "config", "set-key"]).is_err());
    }

    #[test]
    fn set_key_writes_provider_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".stagerev.yaml");
        let command = ConfigCommand::SetKey {
            api_key: "ABC123".to_owned(),
            provider: Some("deepseek".to_owned()),
        };

        let message = apply_config_command(&command, &path).unwrap();
        assert_eq!(message, "API key saved for provider 'deepseek'");

        let doc = ConfigDocument::read(&path).unwrap();
        assert_eq!(doc.provider.as_deref(), Some("deepseek"));
        assert_eq!(doc.providers["deepseek"].api_key.as_deref(), Some("ABC123"));
    }

    #[test]
    fn set_provider_without_file_fails_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".stagerev.yaml");
        let command = ConfigCommand::SetProvider {
            name: "foo".to_owned(),
        };

        assert!(apply_config_command(&command, &path).is_err());
        assert!(!path.exists());
    }
}
