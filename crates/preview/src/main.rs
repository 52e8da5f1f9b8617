use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use transcript_preview::{Server, StartError};

/// Serve a generated transcript site over plain HTTP on localhost.
#[derive(Parser, Debug)]
#[command(name = "transcript-preview", version)]
struct Args {
    /// Directory containing the generated site
    directory: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Open the default browser once the server is listening
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let root = match args.directory.canonicalize() {
        Ok(root) if root.is_dir() => root,
        Ok(root) => {
            error!(directory = %root.display(), "not a directory");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!(cause = %e, directory = %args.directory.display(), "can't read the preview directory");
            return ExitCode::FAILURE;
        }
    };

    let server = match Server::builder().root(root).port(args.port).open_browser(args.open).build() {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid server configuration");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            // cancel is idempotent; a second signal can't double-invoke
            // shutdown logic
            shutdown.cancel();
        });
    }

    match server.run(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(StartError::PortInUse { port }) => {
            error!(port, "port is already in use, pick another one with --port");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(cause = %e, "can't start the preview server");
            ExitCode::FAILURE
        }
    }
}

/// Resolves when the process is asked to stop (ctrl-c, or SIGTERM on unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate()).expect("failed to install signal handler").recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
