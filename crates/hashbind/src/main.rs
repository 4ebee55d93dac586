//! hashbind - main entry point

use hashbind::commands::run::RunOptions;
use hashbind::commands::scan::ScanOptions;
use hashbind::config::Overrides;
use hashbind::{Cli, Commands};
use hashbind_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    let Some(command) = cli.command else {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    };

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .output(LogOutput::Console)
        .log_file_prefix("hashbind")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {}", e);
            log_config
        },
    };

    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        },
    };

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let result = match command {
        Commands::Run {
            workers,
            batch_size,
            no_progress,
        } => {
            let options = RunOptions {
                overrides: Overrides {
                    workers,
                    batch_size,
                },
                show_progress: !no_progress && !cli.verbose,
            };
            hashbind::commands::run::run(&cli.config, options, cancel).await.map(|_| ())
        },
        Commands::Scan { workers, json } => {
            let options = ScanOptions { workers, json };
            hashbind::commands::scan::run(&cli.config, options, cancel).await.map(|_| ())
        },
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Cancel `token` on Ctrl+C or SIGTERM.
///
/// Files already being fingerprinted still finish and the batch in progress
/// is committed before the process exits.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, finishing in-flight files");
        },
        _ = terminate => {
            info!("Received terminate signal, finishing in-flight files");
        },
    }

    warn!("No new files will be started");
    token.cancel();
}
