use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdesk::adapters::{MemoryStore, PostgresStore};
use taskdesk::auth::AuthContext;
use taskdesk::cli::{self, Cli, Commands, DbCommands, TokenCommands, UserCommands};
use taskdesk::config::Config;
use taskdesk::health::{Dependency, PostgresChecker};
use taskdesk::ports::Repositories;
use taskdesk::{create_app, db, AppState, HttpSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        None => serve(config, false).await,
        Some(Commands::Serve { in_memory }) => serve(config, in_memory).await,
        Some(Commands::Db(DbCommands::Migrate)) => cli::handle_db_migrate(&config).await,
        Some(Commands::Config) => cli::handle_config_validate(&config).await,
        Some(Commands::User(UserCommands::Create(args))) => {
            cli::handle_user_create(&config, args).await
        }
        Some(Commands::Token(TokenCommands::Issue { user_id, role })) => {
            cli::handle_token_issue(&config, &user_id, &role)
        }
    }
}

async fn serve(config: Config, in_memory: bool) -> anyhow::Result<()> {
    let (repos, dependencies) = if in_memory {
        tracing::warn!("Serving from process memory; nothing will be persisted");
        (Repositories::from_store(MemoryStore::new()), Vec::new())
    } else {
        let pool = db::create_pool(&config)?;
        db::run_migrations(&pool).await?;

        let postgres = Dependency {
            name: "postgres",
            critical: true,
            checker: Arc::new(PostgresChecker::new(pool.clone())),
        };
        (Repositories::from_store(PostgresStore::new(pool)), vec![postgres])
    };

    let auth = AuthContext::from_config(&config);
    tracing::info!(
        environment = ?config.environment,
        policy = ?auth.policy,
        token_ttl_secs = config.token_ttl_secs,
        "Auth context initialized"
    );

    let state = AppState::new(repos, auth, dependencies);
    let app = create_app(state, &HttpSettings::from_config(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
