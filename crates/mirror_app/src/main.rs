mod cli;
mod config;
mod logging;
mod progress;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mirror_engine::{Mirror, EXIT_FATAL, EXIT_OK};
use mirror_logging::{mirror_error, mirror_info};

use crate::cli::{Cli, Command};
use crate::config::{FileConfig, Settings};
use crate::progress::LogProgressSink;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            mirror_error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let mut file = FileConfig::load(cli.config.as_deref())?;
    file.apply_cli(cli);

    let command = cli.command.unwrap_or(Command::Run);
    if command == Command::Config {
        println!("{}", file.to_ron().context("could not render config")?);
        return Ok(EXIT_OK);
    }

    let settings = Settings::from_file(&file, mirror_logging::level_for_verbosity(cli.verbose))?;
    logging::initialize(settings.log_level, settings.log_file.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("could not start async runtime")?;
    let mirror = Mirror::new(settings.mirror).context("could not set up mirror")?;

    match command {
        Command::Plan => runtime.block_on(plan(&mirror)),
        _ => runtime.block_on(mirror_site(&mirror, settings.strict)),
    }
}

async fn plan(mirror: &Mirror) -> anyhow::Result<u8> {
    let discovery = mirror.discover().await?;
    mirror_info!("Content API at {}", discovery.api_root);
    let source = mirror.content_source(&discovery);
    let permalinks = mirror.plan(&source).await?;
    for permalink in &permalinks {
        println!("{permalink}");
    }
    Ok(EXIT_OK)
}

async fn mirror_site(mirror: &Mirror, strict: bool) -> anyhow::Result<u8> {
    let config = mirror.config();
    mirror_info!(
        "Mirroring {} from {} into {:?}",
        config.site_url,
        config.fetch.origin,
        config.output_dir
    );
    let sink = LogProgressSink::default();
    let report = mirror.run(&sink).await?;
    report.log_summary();
    Ok(report.exit_code(strict))
}
