//! heroku-auth - log in to the Heroku platform API from the command line.
//!
//! Obtains an OAuth access token either with email/password or through a
//! browser SSO handoff, and optionally saves it to the netrc file so that
//! later API and git invocations can reuse it.

use std::io;
use std::num::NonZeroU64;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use heroku_auth_core::auth::{MachineStore, StoreError, DEFAULT_EXPIRES_IN};
use heroku_auth_core::{ApiClient, AuthRequest, Authenticator, Config, EnvHints, Netrc};

/// Log in to the Heroku platform API
#[derive(Parser)]
#[command(name = "heroku-auth", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Obtain an access token
    Login(LoginArgs),

    /// Show the account behind the saved credentials
    Whoami,

    /// Remove the saved credentials
    Logout,
}

#[derive(Args)]
struct LoginArgs {
    /// Log in through your organization's single sign-on
    #[arg(long)]
    sso: bool,

    /// Save the token to the netrc file
    #[arg(long)]
    save: bool,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = NonZeroU64::new(DEFAULT_EXPIRES_IN).unwrap_or(NonZeroU64::MIN))]
    expires_in: NonZeroU64,

    /// Print the credential as JSON
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn build_authenticator(config: &Config) -> Result<Authenticator> {
    let api = ApiClient::with_base_url(config.api_url()).context("Failed to create API client")?;
    let netrc_path = config.netrc_path()?;
    let load_netrc = move || -> Result<Box<dyn MachineStore>, StoreError> {
        debug!(path = %netrc_path.display(), "Loading netrc");
        Ok(Box::new(Netrc::load(&netrc_path)?))
    };

    Ok(Authenticator::new(api, load_netrc)
        .with_sso_base_url(config.sso_base_url())
        .with_git_host(config.git_host()))
}

async fn login(config: &Config, args: LoginArgs) -> Result<()> {
    let request = AuthRequest {
        sso: args.sso,
        expires_in: args.expires_in,
        save: args.save,
        hints: EnvHints::from_env(),
    };

    let issued_at = Utc::now();
    let credential = build_authenticator(config)?.login(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&credential)?);
        return Ok(());
    }

    println!("Logged in as {}", credential.email);
    if let Some(expires_at) = credential.expires_at(issued_at) {
        println!("Token expires at {}", expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;

    match cli.command {
        Command::Login(args) => login(&config, args).await,
        Command::Whoami => {
            let email = build_authenticator(&config)?.whoami().await?;
            println!("{}", email);
            Ok(())
        }
        Command::Logout => {
            if build_authenticator(&config)?.logout()? {
                info!("Removed saved credentials");
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
            Ok(())
        }
    }
}
