//! Ldapgate - directory-backed credential verification
//!
//! Checks a username/password pair against an LDAP/Active Directory server.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ldapgate_auth::ldap::keys;
use ldapgate_auth::{Authenticator, DirectoryAuthenticator};
use ldapgate_core::{GateConfig, Properties};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ldapgate")]
#[command(author = "Ldapgate Team")]
#[command(version = ldapgate_core::VERSION)]
#[command(about = "Directory-backed credential verification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LDAPGATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LDAPGATE_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a username/password pair against the directory
    Verify {
        #[arg(short, long)]
        username: String,

        /// Password (prefer the environment variable)
        #[arg(short, long, env = "LDAPGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the URL, search base and filter that would be used, without connecting
    Query {
        #[arg(short, long)]
        username: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (gate_config, file_properties) = match &cli.config {
        Some(path) => (
            GateConfig::from_file(path).with_context(|| format!("loading {}", path))?,
            Properties::from_file(path).with_context(|| format!("loading {}", path))?,
        ),
        None => (GateConfig::default(), Properties::new()),
    };

    // Initialize logging
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| gate_config.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    if gate_config.logging.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    }

    let properties = file_properties.merge(Properties::from_env(keys::ALL));
    debug!("Using {} configuration properties", properties.len());

    match cli.command {
        Commands::Verify { username, password } => {
            let authenticator = DirectoryAuthenticator::with_ldap3(properties);

            if authenticator.is_authenticated(&username, &password).await {
                println!("authenticated");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("denied");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Query { username } => {
            let authenticator = DirectoryAuthenticator::with_ldap3(properties);
            let query = authenticator.user_query(&username);

            println!("url:    {}", query.service_url);
            println!("base:   {}", query.search_base);
            println!("filter: {}", query.filter);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("ldapgate {}", ldapgate_core::VERSION);
            Ok(ExitCode::SUCCESS)
        }
    }
}
