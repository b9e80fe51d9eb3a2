use crate::config::AppConfig;
use crate::errors::AppResult;
use clap::Args;

/// Show the effective configuration
#[derive(Args)]
pub struct ConfigCommand {
    /// Print the built-in defaults as a config.toml to start from
    #[arg(long)]
    sample: bool,
}

impl ConfigCommand {
    pub fn run(&self) -> AppResult<()> {
        if self.sample {
            print!("{}", AppConfig::sample_toml()?);
            return Ok(());
        }

        let config = AppConfig::get_defaults()?;
        config.validate()?;
        print!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }
}
