// Hoard CLI - Serve, migrate and seed the dragon treasure API

mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use hoard_auth::Argon2Hasher;
use hoard_server::config::DEFAULT_BIND_ADDR;
use hoard_server::db;
use hoard_server::fixtures::{TreasureFactory, UserFactory};
use hoard_server::repository;
use hoard_server::security::NativeUserPasswordHasher;
use hoard_server::ServerConfig;

/// Hoard - Dragon treasure marketplace API
#[derive(Parser)]
#[command(name = "hoard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "HOARD_DB_MAX_CONNECTIONS", default_value_t = db::DEFAULT_MAX_CONNECTIONS, global = true)]
    max_connections: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations and serve the API
    Serve {
        /// Address to listen on
        #[arg(long, env = "HOARD_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
        bind: SocketAddr,

        /// Skip running migrations at startup
        #[arg(long)]
        no_migrate: bool,
    },
    /// Run pending database migrations
    Migrate,
    /// Persist randomized fixture users and treasures
    Seed {
        /// Number of users to create
        #[arg(long, default_value_t = 10)]
        users: usize,

        /// Number of treasures to create, spread over all users
        #[arg(long, default_value_t = 40)]
        treasures: usize,

        /// Password hasher cost preset (default, production, development)
        #[arg(long, env = "HOARD_HASHER", default_value = "default")]
        hasher: String,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let database_url = cli
        .database_url
        .context("No database configured: pass --database-url or set DATABASE_URL")?;

    match cli.command {
        Commands::Serve { bind, no_migrate } => {
            let config = ServerConfig::new(database_url)
                .with_bind_addr(bind)
                .with_max_connections(cli.max_connections)
                .with_migrate_on_start(!no_migrate);
            hoard_server::serve(&config).await
        }
        Commands::Migrate => handle_migrate(&database_url, cli.max_connections).await,
        Commands::Seed {
            users,
            treasures,
            hasher,
        } => handle_seed(&database_url, cli.max_connections, users, treasures, &hasher).await,
    }
}

async fn handle_migrate(database_url: &str, max_connections: u32) -> anyhow::Result<()> {
    let pool = db::create_pool(database_url, max_connections)
        .await
        .context("Failed to connect to the database")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    println!("{}", "Migrations applied.".green());
    Ok(())
}

async fn handle_seed(
    database_url: &str,
    max_connections: u32,
    users: usize,
    treasures: usize,
    hasher: &str,
) -> anyhow::Result<()> {
    let pool = db::create_pool(database_url, max_connections)
        .await
        .context("Failed to connect to the database")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let hasher = Argon2Hasher::from_preset(hasher)?;
    let user_factory = UserFactory::new(Arc::new(NativeUserPasswordHasher::new(Arc::new(hasher))));

    let created_users = user_factory.create_many(&pool, users).await?;
    tracing::info!(count = created_users.len(), "Seeded users");

    let owners = repository::fetch_all_users(&pool).await?;
    let created_treasures = TreasureFactory::create_many(&pool, treasures, &owners).await?;
    tracing::info!(count = created_treasures.len(), "Seeded treasures");

    println!(
        "{} {} users, {} treasures",
        "Seeded".green().bold(),
        created_users.len(),
        created_treasures.len()
    );
    for user in &created_users {
        println!("  {} {} <{}>", "•".dimmed(), user.username, user.email);
    }
    Ok(())
}
