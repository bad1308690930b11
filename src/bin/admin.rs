//! CLI administration tool for snaplink.
//!
//! Inspects stored links, both click counters, and the cache without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Check database connection
//! cargo run --bin admin -- db check
//!
//! # Print the schema the service migrates to
//! cargo run --bin admin -- db schema
//!
//! # Show a link with its store and cache click counters
//! cargo run --bin admin -- stats aZ3k9Q
//!
//! # Drop a cached record (asks for confirmation)
//! cargo run --bin admin -- cache evict aZ3k9Q
//! ```
//!
//! # Environment Variables
//!
//! Same database and Redis variables as the server (`DATABASE_URL` or
//! `DB_*`, `REDIS_URL` or `REDIS_*`).

use snaplink::config::{self, Config};
use snaplink::domain::repositories::UrlRepository;
use snaplink::infrastructure::cache::{CacheService, RedisCache};
use snaplink::infrastructure::persistence::PgUrlRepository;
use snaplink::server::connect_database;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::sync::Arc;

const SCHEMA_SQL: &str = include_str!("../../migrations/20250101000000_create_urls.sql");

/// CLI tool for managing snaplink.
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
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Show a short link and its click counters
    Stats {
        /// Short code to inspect
        code: String,
    },

    /// Cache operations
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Print the schema SQL
    Schema,
}

/// Cache operation subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Remove a cached record. The cache click counter is kept.
    Evict {
        /// Short code to evict
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Commands::Db {
        action: DbAction::Schema,
    } = cli.command
    {
        println!("{}", SCHEMA_SQL);
        return Ok(());
    }

    let config = config::load_from_env()?;

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &config).await?,
        Commands::Stats { code } => handle_stats(&code, &config).await?,
        Commands::Cache { action } => handle_cache_action(action, &config).await?,
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let pool = connect_database(config).await?;
            let repo = PgUrlRepository::new(Arc::new(pool));
            repo.ping()
                .await
                .map_err(|e| anyhow::anyhow!("Database check failed: {}", e))?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Schema => println!("{}", SCHEMA_SQL),
    }

    Ok(())
}

/// Shows a link with its store and cache click counters.
///
/// The two counters are independent: the store counts redirects served from
/// the store, the cache counts redirects served from the cache. Neither is
/// ever added to the other.
///
/// # Output Format
///
/// ```text
/// 📊 Link aZ3k9Q
///
///   URL:            https://example.com/some/long/path
///   Created:        2025-01-01 12:00
///   Store clicks:   12
///   Cache clicks:   40
///   Cached record:  yes
/// ```
async fn handle_stats(code: &str, config: &Config) -> Result<()> {
    let pool = connect_database(config).await?;
    let repo = PgUrlRepository::new(Arc::new(pool));

    let record = repo
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .with_context(|| format!("Short code '{}' not found", code))?;

    println!("{}", format!("📊 Link {}", code).bright_blue().bold());
    println!();
    println!("  URL:            {}", record.original_url.cyan());
    println!(
        "  Created:        {}",
        record
            .created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );
    println!(
        "  Store clicks:   {}",
        record.click_count.to_string().bright_green().bold()
    );

    match connect_cache(config).await? {
        Some(cache) => {
            let cache_clicks = cache
                .get_click_count(code)
                .await
                .map_err(|e| anyhow::anyhow!("Cache error: {}", e))?;
            let cached = cache
                .get_url(code)
                .await
                .map_err(|e| anyhow::anyhow!("Cache error: {}", e))?
                .is_some();

            println!(
                "  Cache clicks:   {}",
                cache_clicks.to_string().bright_green().bold()
            );
            println!(
                "  Cached record:  {}",
                if cached { "yes".green() } else { "no".yellow() }
            );
        }
        None => println!("  Cache clicks:   {}", "cache not configured".bright_black()),
    }

    println!();
    println!(
        "  {}",
        "Store and cache clicks are counted separately and never merged.".bright_black()
    );
    println!();

    Ok(())
}

/// Handles cache maintenance commands.
async fn handle_cache_action(action: CacheAction, config: &Config) -> Result<()> {
    match action {
        CacheAction::Evict { code, yes } => {
            let cache = connect_cache(config)
                .await?
                .context("Redis is not configured (set REDIS_URL or REDIS_HOST)")?;

            println!("{}", "🗑️  Evict cached link".bright_blue().bold());
            println!();
            println!("  Code: {}", code.cyan());
            println!();

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Remove this record from the cache?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            cache
                .delete_url(&code)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to evict: {}", e))?;

            println!("{}", "✅ Evicted".green().bold());
        }
    }

    Ok(())
}

/// Connects to Redis when configured. Unlike the server, a configured but
/// unreachable Redis is an error here.
async fn connect_cache(config: &Config) -> Result<Option<RedisCache>> {
    let Some(redis_url) = &config.redis_url else {
        return Ok(None);
    };

    let cache = RedisCache::connect(redis_url, config.cache_ttl_seconds)
        .await
        .context("Failed to connect to Redis")?;

    Ok(Some(cache))
}
