use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use crate::config::ScanlinkConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format: toml, json
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
}

pub fn execute(args: ConfigArgs, custom_config: Option<&str>) -> Result<()> {
    match args.command {
        ConfigCommand::Show { format } => {
            let config = ScanlinkConfig::load(custom_config)?;
            println!("{}", render(&config, &format)?);
        }
    }
    Ok(())
}

/// Serialize the merged configuration. The api token is never included.
fn render(config: &ScanlinkConfig, format: &str) -> Result<String> {
    let rendered = match format.to_lowercase().as_str() {
        "json" => serde_json::to_string_pretty(config)?,
        "toml" => toml::to_string_pretty(config)?,
        _ => bail!("Unsupported format: {}. Use toml or json", format),
    };
    Ok(rendered)
}
