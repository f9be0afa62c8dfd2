use std::process::ExitCode;

use clap::Parser;
use groupseries_runner::{
    connect, execute, load_config, Cli, DeviceConfig, RunnerError, RunnerResult,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn device_config(cli: &Cli) -> RunnerResult<DeviceConfig> {
    let mut config = match (&cli.config, &cli.host) {
        (Some(path), _) => load_config(path)?,
        (None, Some(host)) => DeviceConfig::new(host.clone()),
        (None, None) => {
            return Err(RunnerError::InvalidArgument(
                "either --config or --host is required".to_string(),
            ))
        }
    };
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> RunnerResult<()> {
    let config = device_config(cli)?;
    groupseries_metrics::describe_metrics();

    let mut device = connect(&config)?;

    let cancel = device.cancel_token();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupted, cancelling");
        cancel.cancel();
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let report = execute(&mut device, &cli.command)?;
    println!("{}", report.to_json(cli.compact)?);
    info!("Done");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
