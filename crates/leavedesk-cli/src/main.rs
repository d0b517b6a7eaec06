//! Leavedesk - submit and review time-off requests from the terminal.
//!
//! Requests are read through a short-lived cache in front of the leavedesk
//! API and the last known collection is kept on disk, so `list` and `show`
//! still answer when the API is down.

mod commands;
mod config;
mod output;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ConfigCommand, EditArgs, ListArgs, RejectArgs, SubmitArgs};
use config::Config;

/// Leavedesk - time-off requests from the command line.
#[derive(Debug, Parser)]
#[command(name = "leavedesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List requests visible to the configured user
    List(ListArgs),
    /// Show one request in full
    Show {
        /// Request id or unique id prefix
        id: String,
    },
    /// Submit a new request
    Submit(SubmitArgs),
    /// Change a pending request
    Edit(EditArgs),
    /// Approve a pending request
    Approve {
        /// Request id or unique id prefix
        id: String,
    },
    /// Reject a pending request
    Reject(RejectArgs),
    /// Bypass the cache and reload requests from the API
    Refresh,
    /// Show notifications from the API
    Notifications,
    /// Count visible requests by status
    Summary,
    /// Show or change the saved configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=leavedesk_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    config.apply_env();
    info!(command = ?cli.command, "leavedesk starting");

    let format = cli.format;
    match cli.command {
        Command::Config(cmd) => commands::config(cmd, &mut config, format),
        Command::List(args) => commands::list(args, &config, format).await,
        Command::Show { id } => commands::show(&id, &config, format).await,
        Command::Submit(args) => commands::submit(args, &config, format).await,
        Command::Edit(args) => commands::edit(args, &config, format).await,
        Command::Approve { id } => commands::approve(&id, &config, format).await,
        Command::Reject(args) => commands::reject(args, &config, format).await,
        Command::Refresh => commands::refresh(&config, format).await,
        Command::Notifications => commands::notifications(&config, format).await,
        Command::Summary => commands::summary(&config, format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavedesk_core::{RequestStatus, RequestType};

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::parse_from([
            "leavedesk",
            "list",
            "--status",
            "pending",
            "--type",
            "sick-leave",
            "--from",
            "2024-05-01",
            "--format",
            "json",
        ]);

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.status, Some(RequestStatus::Pending));
                assert_eq!(args.request_type, Some(RequestType::SickLeave));
                assert!(args.from.is_some());
                assert!(args.to.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_time_edit_submit() {
        let cli = Cli::parse_from([
            "leavedesk",
            "submit",
            "--type",
            "time_edit",
            "--start",
            "2024-05-06",
            "--clock-in",
            "09:00",
            "--clock-out",
            "17:00",
            "--reason",
            "missed punch",
        ]);

        match cli.command {
            Command::Submit(args) => {
                assert_eq!(args.request_type, RequestType::TimeEdit);
                assert!(args.end.is_none());
                assert_eq!(args.clock_out.as_deref(), Some("17:00"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = Cli::try_parse_from([
            "leavedesk", "submit", "--type", "vacation", "--start", "2024-05-06", "--reason", "x",
        ]);
        assert!(result.is_err());
    }
}
