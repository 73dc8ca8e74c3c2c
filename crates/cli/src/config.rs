pub use taskdeck_core::config::*;

use anyhow::Context;

use crate::cli::Cli;

pub fn from_cli(cli: &Cli) -> anyhow::Result<AppConfig> {
    AppConfig::discover(cli.overrides()).context("failed to resolve configuration")
}
