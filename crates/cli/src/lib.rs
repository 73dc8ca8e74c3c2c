pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod helpers;
pub mod logging;

pub use taskdeck_core as core;
pub use taskdeck_core::AppConfig;

use anyhow::{Context, Result};

pub use app::AppContext;

/// Run one command to completion on a current-thread runtime, writing to stdout.
pub fn run_blocking(cli: cli::Cli) -> Result<()> {
    logging::init_tracing(cli.log_filter.as_deref())?;
    let config = config::from_cli(&cli)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let ctx = AppContext::connect(&config)?;
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        commands::execute(&ctx, cli.command, &mut handle).await
    })
}
