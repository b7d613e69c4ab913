mod config;
mod demo;

use std::io::Write;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = config::RunConfig::from_env();
    tracing::info!(?config, "kinetic starting");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match demo::run(&config, &mut out).and_then(|summary| out.flush().map(|()| summary).map_err(Into::into)) {
        Ok(summary) => {
            tracing::info!(frames = summary.frames_drawn, frame_rate = summary.frame_rate, "kinetic finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "kinetic failed");
            ExitCode::FAILURE
        }
    }
}
