//! Entry point for the expvarmon TUI. Parses args, builds one service per endpoint and runs the App.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use expvarmon::{App, Args, Config, HttpFetcher, Service};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_args(Args::parse())?;
    init_tracing(&cfg)?;

    let opts = cfg.service_options();
    let mut services = Vec::with_capacity(cfg.endpoints.len());
    for url in &cfg.endpoints {
        let service = match &cfg.export_dir {
            Some(dir) => Service::with_export(url.clone(), &opts, dir)
                .with_context(|| format!("creating export file for {url} in {}", dir.display()))?,
            None => Service::new(url.clone(), &opts),
        };
        services.push(service);
    }
    info!(endpoints = services.len(), vars = cfg.vars.len(), "configured");

    let fetcher = HttpFetcher::new(cfg.timeout)?;
    let mut app = App::new(services, cfg.vars.clone(), fetcher, cfg.interval);

    if cfg.dummy {
        app.poll_all().await;
        print!("{}", app.report());
        app.shutdown();
        return Ok(());
    }

    app.run().await.map_err(|e| anyhow!("{e}"))
}

// The TUI owns the terminal, so logs only go to a file unless running --dummy.
fn init_tracing(cfg: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(path) = &cfg.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if cfg.dummy {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
