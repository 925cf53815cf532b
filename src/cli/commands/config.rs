use clap::Subcommand;

use crate::cli::output::{info, success, warning};
use crate::core::config::{default_config, save_config, Config};
use crate::core::paths;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print where the configuration is read from
    Paths,
}

pub fn run(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Init { force } => {
            let path = paths::config_path();
            if path.exists() && !force {
                warning(&format!("{} already exists", path.display()));
                anyhow::bail!("Refusing to overwrite the configuration; use --force");
            }
            save_config(&path, &default_config())?;
            success(&format!("Wrote {}", path.display()));
        }
        ConfigCommands::Show => {
            let config = Config::load_or_default()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Paths => {
            info(&paths::describe_paths());
        }
    }
    Ok(())
}
