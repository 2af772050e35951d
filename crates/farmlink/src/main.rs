// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FarmLink - WhatsApp produce marketplace backend.
//!
//! This is the binary entry point for the FarmLink server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod send;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use farmlink_config::FarmlinkConfig;

/// FarmLink - WhatsApp produce marketplace backend.
#[derive(Parser, Debug)]
#[command(name = "farmlink", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server (the default).
    Serve,
    /// Validate the configuration and print a redacted summary.
    CheckConfig,
    /// Send one WhatsApp message through the failover dispatcher.
    SendTest {
        /// Recipient phone number or `whatsapp:` address.
        #[arg(long)]
        to: String,
        /// Message text.
        #[arg(long)]
        message: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> FarmlinkConfig {
    let loaded = match path {
        Some(path) => farmlink_config::load_and_validate_path(path),
        None => farmlink_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            farmlink_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            init_tracing(&config.server.log_level);
            serve::run_serve(config, cli.config).await
        }
        Commands::CheckConfig => {
            check::run_check(&config);
            Ok(())
        }
        Commands::SendTest { to, message } => {
            init_tracing(&config.server.log_level);
            send::run_send_test(&config, cli.config, &to, message.as_deref()).await
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("farmlink={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["farmlink"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn send_test_takes_recipient_and_message() {
        let cli = Cli::try_parse_from([
            "farmlink",
            "send-test",
            "--to",
            "+919876543210",
            "--message",
            "hello",
            "--config",
            "/etc/farmlink/farmlink.toml",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::SendTest { to, message }) => {
                assert_eq!(to, "+919876543210");
                assert_eq!(message.as_deref(), Some("hello"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(
            cli.config,
            Some(PathBuf::from("/etc/farmlink/farmlink.toml"))
        );
    }

    #[test]
    fn send_test_requires_recipient() {
        assert!(Cli::try_parse_from(["farmlink", "send-test"]).is_err());
    }
}
