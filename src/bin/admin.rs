//! CLI administration tool for resource-service.
//!
//! Issues and inspects bearer tokens signed with the service secret, and
//! runs basic database diagnostics, without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Issue a token for user 7 named "alice"
//! cargo run --bin admin -- token issue --subject-id 7 --name alice
//!
//! # Inspect a token
//! cargo run --bin admin -- token verify <TOKEN>
//!
//! # Exchange a token close to expiry
//! cargo run --bin admin -- token refresh <TOKEN>
//!
//! # Generate a signing secret
//! cargo run --bin admin -- secret generate
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `JWT_SECRET` (required for token commands)
//! - `JWT_ISSUER`, `JWT_EXPIRE_SECONDS` (same defaults as the server)
//! - `DATABASE_URL` (required for db commands)

use resource_service::application::services::{Claims, CredentialService};
use resource_service::config::{Config, mask_connection_string};
use resource_service::domain::entities::ADMIN_IDENTITY;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::time::Duration;

/// CLI tool for managing resource-service.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Issue and inspect bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Signing secret helpers
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Token subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Issue a new token
    Issue {
        /// Numeric subject id
        #[arg(long)]
        subject_id: i64,

        /// Subject name, used for ownership checks
        #[arg(short, long)]
        name: Option<String>,

        /// Lifetime in seconds (defaults to JWT_EXPIRE_SECONDS)
        #[arg(long)]
        ttl: Option<u64>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Verify a token and print its claims
    Verify { token: String },

    /// Refresh a token that is within its refresh window
    Refresh { token: String },
}

/// Secret subcommands.
#[derive(Subcommand)]
enum SecretAction {
    /// Print a random 256-bit hex secret
    Generate,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Token { action } => handle_token_action(action)?,
        Commands::Secret { action } => handle_secret_action(action),
        Commands::Db { action } => {
            let database_url =
                std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
            let pool = PgPool::connect(&database_url)
                .await
                .context("Failed to connect to database")?;

            println!(
                "  {} {}",
                "Database:".bright_black(),
                mask_connection_string(&database_url).bright_black()
            );
            handle_db_action(action, &pool).await?;
        }
    }

    Ok(())
}

/// Builds a credential service from the same variables the server reads.
fn credential_service() -> Result<CredentialService> {
    let defaults = Config::default();

    let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    if secret.is_empty() {
        anyhow::bail!("JWT_SECRET must not be empty");
    }

    let issuer = std::env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer);
    let ttl = std::env::var("JWT_EXPIRE_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.jwt_expire_seconds);

    Ok(CredentialService::new(
        &secret,
        issuer,
        Duration::from_secs(ttl),
    ))
}

/// Dispatches token commands.
fn handle_token_action(action: TokenAction) -> Result<()> {
    let credentials = credential_service()?;

    match action {
        TokenAction::Issue {
            subject_id,
            name,
            ttl,
            yes,
        } => issue_token(&credentials, subject_id, name, ttl, yes),
        TokenAction::Verify { token } => verify_token(&credentials, &token),
        TokenAction::Refresh { token } => refresh_token(&credentials, &token),
    }
}

/// Issues a token with interactive prompts.
///
/// # Flow
///
/// 1. Prompt for subject name (or use provided)
/// 2. Ask for confirmation when issuing for the admin identity
/// 3. Sign and print the token with usage instructions
fn issue_token(
    credentials: &CredentialService,
    subject_id: i64,
    name: Option<String>,
    ttl: Option<u64>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "Issue token".bright_blue().bold());
    println!();

    let subject_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Subject name")
            .interact_text()?,
    };

    if subject_name == ADMIN_IDENTITY && !skip_confirm {
        println!(
            "{}",
            "Tokens for 'admin' can modify every record.".yellow().bold()
        );
        let confirmed = Confirm::new()
            .with_prompt("Issue an admin token?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let ttl = ttl
        .map(Duration::from_secs)
        .unwrap_or_else(|| credentials.default_ttl());

    let issued = credentials
        .issue(subject_id, &subject_name, ttl)
        .map_err(|e| anyhow::anyhow!("Failed to issue token: {}", e))?;

    print_claims(&issued.claims);
    println!("  Token: {}", issued.token.bright_yellow().bold());
    println!();
    println!("{}", "Add this to your requests:".bright_white());
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        issued.token.bright_yellow()
    );
    println!();

    Ok(())
}

/// Verifies a token and prints its claims.
fn verify_token(credentials: &CredentialService, token: &str) -> Result<()> {
    match credentials.verify(token) {
        Ok(claims) => {
            println!("{}", "Token is valid".green().bold());
            print_claims(&claims);
            Ok(())
        }
        Err(e) => {
            println!("{}", "Token is invalid".red().bold());
            Err(anyhow::anyhow!("{}", e))
        }
    }
}

/// Exchanges a token close to expiry for a fresh one.
fn refresh_token(credentials: &CredentialService, token: &str) -> Result<()> {
    let issued = credentials
        .refresh(token)
        .map_err(|e| anyhow::anyhow!("Refresh rejected: {}", e))?;

    println!("{}", "Token refreshed".green().bold());
    print_claims(&issued.claims);
    println!("  Token: {}", issued.token.bright_yellow().bold());
    println!();

    Ok(())
}

fn print_claims(claims: &Claims) {
    let remaining = claims.exp - Utc::now().timestamp();

    println!();
    println!("{}", "Claims:".bright_white().bold());
    println!("  Subject:  {} ({})", claims.username.cyan(), claims.user_id);
    println!("  Issuer:   {}", claims.iss);
    println!(
        "  Expires:  {} ({}s left)",
        claims.expires_at().format("%Y-%m-%d %H:%M:%S UTC"),
        remaining.max(0)
    );
    println!();
}

fn handle_secret_action(action: SecretAction) {
    match action {
        SecretAction::Generate => println!("{}", generate_secret()),
    }
}

/// Generates a random 256-bit secret, hex encoded.
fn generate_secret() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM examples")
                .fetch_one(pool)
                .await
                .context("examples table missing; start the server once to migrate")?;

            let deleted: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM examples WHERE deleted_at IS NOT NULL")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!(
                "  Examples:   {} ({} deleted)",
                total.to_string().bright_green().bold(),
                deleted.to_string().bright_black()
            );
            println!();
        }
    }

    Ok(())
}
