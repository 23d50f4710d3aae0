use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// TURN secret shipped for local development. Issuing credentials with it
/// in production is a misconfiguration, so startup warns when it is seen.
pub const DEFAULT_TURN_SECRET: &str = "interview-turn-secret-change-in-production";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub turn_server: String,
    pub turn_secret: String,
    pub turn_ttl_secs: u64,
    pub workflow_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Voice-interview session API")]
pub struct Args {
    /// Host to bind to (overrides INTERVIEW_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides INTERVIEW_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides INTERVIEW_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// TURN server hostname (overrides TURN_SERVER)
    #[arg(long)]
    pub turn_server: Option<String>,

    /// TURN credential TTL in seconds (overrides TURN_CREDENTIAL_TTL)
    #[arg(long)]
    pub turn_ttl: Option<u64>,

    /// Workflow service base URL (overrides WORKFLOW_URL)
    #[arg(long)]
    pub workflow_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("INTERVIEW_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("INTERVIEW_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing INTERVIEW_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading INTERVIEW_PORT"),
        };
        let env_db = env::var("INTERVIEW_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/interview.db".into());
        let env_turn_server = env::var("TURN_SERVER").unwrap_or_else(|_| "localhost".into());
        let env_turn_secret =
            env::var("TURN_STATIC_AUTH_SECRET").unwrap_or_else(|_| DEFAULT_TURN_SECRET.into());
        let env_turn_ttl = match env::var("TURN_CREDENTIAL_TTL") {
            Ok(value) => value
                .parse::<u64>()
                .with_context(|| format!("parsing TURN_CREDENTIAL_TTL value `{}`", value))?,
            Err(env::VarError::NotPresent) => 86_400,
            Err(err) => return Err(err).context("reading TURN_CREDENTIAL_TTL"),
        };
        let env_workflow =
            env::var("WORKFLOW_URL").unwrap_or_else(|_| "http://localhost:7860".into());

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            turn_server: args.turn_server.unwrap_or(env_turn_server),
            turn_secret: env_turn_secret,
            turn_ttl_secs: args.turn_ttl.unwrap_or(env_turn_ttl),
            workflow_url: args.workflow_url.unwrap_or(env_workflow),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
