use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedstash::cli::commands::{self, PollArgs};
use feedstash::cli::{Cli, Commands};
use feedstash::config::Config;
use feedstash::poller::{stop_channel, StopHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug
    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Poll {
            urls,
            interval,
            db,
            snapshot,
            once,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let (handle, token) = stop_channel();
            spawn_signal_listener(handle);

            let args = PollArgs {
                urls,
                interval,
                db,
                snapshot,
                once,
            };
            commands::poll(&config, args, token).await?;
        }
        Commands::Export {
            db,
            out,
            since,
            limit,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            commands::export(&config, db, out, since.as_deref(), limit)?;
        }
        Commands::Config { init } => {
            commands::config_info(cli.config, init)?;
        }
    }

    Ok(())
}

/// Stop the poller after the current fetch on SIGINT/SIGTERM.
fn spawn_signal_listener(handle: StopHandle) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::error!("Failed to install signal handlers: {}", e);
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
        }

        tracing::info!("Received stop signal. Will exit after current fetch.");
        handle.stop();
    });
}
