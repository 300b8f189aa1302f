//! Operator CLI for phone verification
//!
//! Runs a real verification against the configured provider, for smoke
//! testing credentials and the send/confirm/resend lifecycle.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;

#[derive(Parser)]
#[command(name = "verify")]
#[command(about = "Phone verification CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a code to a phone number and confirm it interactively
    Send {
        /// Phone number, any formatting (digits are kept)
        #[arg(short, long)]
        phone: String,
    },

    /// Show how a provider error code is classified
    Classify {
        /// Provider error code, e.g. auth/too-many-requests
        code: String,
    },

    /// List every known provider error code
    Codes,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,phone_verify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Send { phone } => cmd::send::run(&phone).await,
        Commands::Classify { code } => {
            cmd::classify::run_classify(&code);
            Ok(())
        }
        Commands::Codes => {
            cmd::classify::run_codes();
            Ok(())
        }
    }
}
