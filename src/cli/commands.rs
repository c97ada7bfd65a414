//! CLI command implementations

use anyhow::Result;

use crate::cli::args::ConfigCommand;
use crate::config::Settings;

/// Handle `scrivener config ...`
pub fn config_command(settings: &Settings, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let content = toml::to_string_pretty(settings)?;
            print!("{}", content);
        }
        ConfigCommand::Path => {
            println!("{}", Settings::config_path()?.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    Ok(())
}
