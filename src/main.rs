//! WasteWise access gate
//!
//! Session and role based access control in front of the WasteWise web app.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wastewise_gate::{
    config::{AppConfig, LogFormat, load_config},
    transport::{GateState, HttpConfig, build_router, run_http_blocking},
};

/// WasteWise access gate - session and role checks in front of the web app
#[derive(Parser, Debug)]
#[command(name = "wastewise-gate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "WASTEWISE_GATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WASTEWISE_GATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long, env = "WASTEWISE_GATE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Listen host
    #[arg(long, env = "WASTEWISE_GATE_HOST")]
    host: Option<String>,

    /// Listen port
    #[arg(long, env = "WASTEWISE_GATE_PORT")]
    port: Option<u16>,

    /// Upstream app URL
    #[arg(long, env = "WASTEWISE_GATE_UPSTREAM")]
    upstream: Option<String>,
}

fn init_logging(args: &Args, config: &AppConfig) {
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let format = args
        .log_format
        .as_deref()
        .and_then(LogFormat::try_parse)
        .unwrap_or(config.logging.format);

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logging depends on the config, so load errors surface through anyhow
    let mut config = load_config(args.config.as_deref())?;

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(upstream) = &args.upstream {
        config.upstream.url = upstream.clone();
    }

    init_logging(&args, &config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        name = %config.server.name,
        backend = %config.backend.url,
        upstream = %config.upstream.url,
        "Starting access gate"
    );

    let state = GateState::from_config(&config)
        .inspect_err(|e| error!(error = %e, "Failed to initialize gate"))?;

    let http_config = HttpConfig::from_host_port(&config.server.host, config.server.port)
        .inspect_err(|e| error!(error = %e, "Invalid listen address"))?;

    run_http_blocking(build_router(state), http_config).await?;

    Ok(())
}
