mod app;
mod cli;
mod config;
mod effects;
mod render;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use noah_logging::{noah_info, noah_warn};

use crate::app::App;
use crate::cli::Cli;
use crate::config::{load_config, AppConfig};
use crate::effects::EffectRunner;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let (config, config_problem) = match load_config(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    noah_logging::initialize(config.log.target.into(), config.log.level_filter());
    if let Some(err) = config_problem {
        noah_warn!("{}; using defaults", err);
    }

    let mut settings = config.client_settings();
    if let Some(server) = cli.server {
        settings.base_url = server;
    }
    noah_info!("using server {}", settings.base_url);

    let runner = EffectRunner::new(settings).context("failed to start the upload engine")?;
    let page_size = app::page_size(&cli.command, config.page_size);
    let app = App::new(runner, page_size, &cli.command);
    Ok(app.run(cli.command))
}
