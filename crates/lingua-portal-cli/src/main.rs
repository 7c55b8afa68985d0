//! Lingua Portal - command line client for the language school member portal.
//!
//! Log in, check your subscription, list payments, fetch receipts, update
//! your profile, or send an enquiry through the public contact form.

mod app;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

#[derive(Parser, Debug)]
#[command(name = "lingua-portal", about = "Member portal client", version)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, env = "LINGUA_PORTAL_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Keep the session after this process exits
        #[arg(long)]
        remember: bool,
    },
    /// End the current session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Reload the profile for the current session
    Refresh,
    /// Update profile details
    Profile {
        #[arg(long)]
        full_name: String,
        #[arg(long, default_value_t = 0)]
        age: u32,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        wechat: String,
    },
    /// Change password (prompts)
    Password,
    /// Show the current subscription
    Subscription,
    /// List payment history
    Transactions,
    /// Print a receipt URL
    Receipt {
        /// Most recent receipt (default)
        #[arg(long, conflicts_with = "date")]
        latest: bool,
        /// Receipt for the UTC day of a payment, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Send an enquiry through the public contact form
    Contact {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// malay, culture or company
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
    /// Interactive session; logins without --remember last until it exits
    Shell,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_ref())?;
    info!("Lingua Portal starting");

    let mut app = App::new()?;
    let result = app.run(cli.command).await;

    info!("Lingua Portal shutting down");
    result
}
