//! Server process entry point.

use clap::Parser;
use log::{error, info};
use provider_core::db::open_db;
use provider_server::{build_router, AppState, ServerArgs, ServerConfig};
use std::error::Error;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServerArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_exit module=server status=error error={err}");
            eprintln!("provider_server: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ServerArgs) -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::try_from(args)?;
    provider_core::init_logging(&config.log_level, config.log_dir_str()?)?;

    let conn = open_db(&config.db_path)?;
    let state = AppState::new(conn, config.default_max_complexity);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=server status=ok addr={} db_path={}",
        config.bind_addr,
        config.db_path.display()
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("event=server_signal module=server status=error error={err}");
    }
}
