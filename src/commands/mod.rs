// ABOUTME: Command module aggregator for the banksmith CLI.
// ABOUTME: Re-exports deploy, status, and holders command handlers.

mod deploy;
mod holders;
mod status;

pub use deploy::{DeployOptions, deploy};
pub use holders::holders;
pub use status::status;

use banksmith::config::{Config, DEFAULT_STATE_DIR};
use banksmith::error::Result;
use std::env;
use std::path::PathBuf;

use crate::cli::Target;

/// A loaded configuration and the receipt directory it deploys into.
pub struct Workspace {
    pub config: Config,
    pub config_path: PathBuf,
    pub state_dir: PathBuf,
}

impl Target {
    /// Locate and load the configuration, then pick the receipt directory.
    pub fn resolve(self) -> Result<Workspace> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::locate(&env::current_dir()?)?,
        };
        let config = Config::load(&config_path)?;

        let state_dir = self.state_dir.unwrap_or_else(|| {
            config_path
                .parent()
                .map(|dir| dir.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        });

        tracing::debug!(
            "Using {} with receipts in {}",
            config_path.display(),
            state_dir.display()
        );
        Ok(Workspace {
            config,
            config_path,
            state_dir,
        })
    }
}
