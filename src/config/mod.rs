pub mod toml_config;

pub use toml_config::AppConfig;

#[cfg(feature = "cli")]
use crate::core::prompt::PromptStyle;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "intent-mail")]
#[command(about = "Turn free-text requests into emails or contact updates using a local model")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the model server endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Override the model name
    #[arg(long)]
    pub model: Option<String>,

    /// Use the fine-tuned `Instruction: ... Output:` prompt format
    #[arg(long)]
    pub instruction_prompt: bool,

    /// Log outgoing mail instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the config file (or defaults) and applies command line overrides.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(endpoint) = &self.endpoint {
            config.generator.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.generator.model = model.clone();
        }
        if self.instruction_prompt {
            config.generator.prompt_style = PromptStyle::Instruction;
        }
        if self.dry_run {
            config.mail.dry_run = true;
        }

        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::parse_from([
            "intent-mail",
            "--model",
            "qwen3-lora-json",
            "--instruction-prompt",
            "--dry-run",
        ]);

        let config = cli.load().unwrap();
        assert_eq!(config.generator.model, "qwen3-lora-json");
        assert_eq!(config.generator.prompt_style, PromptStyle::Instruction);
        assert!(config.mail.dry_run);
        assert_eq!(config.generator.endpoint, "http://localhost:11434");
    }
}
