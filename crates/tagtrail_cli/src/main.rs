//! tagtrail CLI
//!
//! Command-line tools for a tagtrail profile store.
//!
//! # Commands
//!
//! - `token` - Issue an identity token for local testing
//! - `call` - Send one request to an endpoint against a local store
//! - `inspect` - Display a stored profile
//! - `verify` - Check every stored profile for inconsistencies
//! - `repair` - Rebuild inconsistent profiles

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// tagtrail command-line tools.
#[derive(Parser)]
#[command(name = "tagtrail")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the profile store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Secret used to sign and verify identity tokens
    #[arg(global = true, long, env = "TAGTRAIL_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue an identity token
    Token {
        /// Subject identifier (random if omitted)
        #[arg(short, long)]
        subject: Option<String>,

        /// Email address carried by the token
        #[arg(short, long)]
        email: String,
    },

    /// Send one request to an endpoint
    Call {
        /// Endpoint path, e.g. signUp or /store-tag
        endpoint: String,

        /// Identity token
        #[arg(short, long)]
        token: String,

        /// JSON request body
        #[arg(short, long, default_value = "{}")]
        body: String,
    },

    /// Display a stored profile
    Inspect {
        /// Subject whose profile to show
        #[arg(short, long)]
        subject: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check every stored profile for inconsistencies
    Verify,

    /// Rebuild inconsistent profiles
    Repair {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Token { subject, email } => {
            let secret = cli.secret.ok_or("Token secret required for token")?;
            let subject = subject.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            commands::token::run(secret.as_bytes(), &subject, &email)?;
        }
        Commands::Call {
            endpoint,
            token,
            body,
        } => {
            let path = cli.path.ok_or("Store path required for call")?;
            let secret = cli.secret.ok_or("Token secret required for call")?;
            commands::call::run(&path, secret.as_bytes(), &endpoint, &token, &body)?;
        }
        Commands::Inspect { subject, format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &subject, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Repair { dry_run } => {
            let path = cli.path.ok_or("Store path required for repair")?;
            commands::repair::run(&path, dry_run)?;
        }
        Commands::Version => {
            println!("tagtrail CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("tagtrail core v{}", tagtrail_core::VERSION);
        }
    }

    Ok(())
}
