// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Phylodiff server entrypoint.
//!
//! Serves the comparison routes over HTTP at `http://<host>:<port>/`. Settings come from an
//! optional TOML file; command-line flags override it.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use phylodiff::config::Config;
use phylodiff::logging::{init_logging, LogFormat};
use phylodiff::CompareService;

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "phylodiff", version, about = "Side-by-side phylogenetic tree comparison server")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "PHYLODIFF_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (0 = ephemeral).
    #[arg(long)]
    port: Option<u16>,
    /// Log filter, e.g. `debug` or `phylodiff=trace`. `RUST_LOG` takes precedence.
    #[arg(long)]
    log_level: Option<String>,
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }

    fn load_config(&self) -> Result<Config, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl-c handler unavailable; serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn spawn_evictor(service: &Arc<CompareService>, every: Duration) -> tokio::task::JoinHandle<()> {
    let service = Arc::clone(service);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let service = Arc::clone(&service);
            if let Err(err) = tokio::task::spawn_blocking(move || service.evict_expired()).await {
                tracing::warn!(error = %err, "session eviction failed");
            }
        }
    })
}

async fn serve(config: Config, service: Arc<CompareService>) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "phylodiff listening");

    let evictor = config
        .sessions
        .ttl()
        .map(|_| spawn_evictor(&service, Duration::from_secs(config.sessions.evict_interval_secs.max(1))));

    let served = axum::serve(listener, phylodiff::http::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Some(evictor) = evictor {
        evictor.abort();
    }
    served?;
    Ok(())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let cli = Cli::parse();
        let config = cli.load_config()?;
        init_logging(&config.logging)?;

        let service = Arc::new(config.build_service());
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        runtime.block_on(serve(config, service))
    })();

    if let Err(err) = result {
        eprintln!("phylodiff: {err}");
        std::process::exit(1);
    }
}
