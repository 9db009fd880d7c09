use clap::{Args, Parser, Subcommand};

use crate::adapters::PostgresStore;
use crate::auth::{password::hash_password, AuthContext};
use crate::config::Config;
use crate::domain::{NewUser, ObjectId};
use crate::ports::Repositories;
use crate::startup::validate_environment;
use crate::validation::{validate_email, validate_name, validate_password};

const USER_NAME_MAX_LEN: usize = 100;

#[derive(Parser)]
#[command(name = "taskdesk")]
#[command(about = "Taskdesk - roles, tasks and clock-ins over HTTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Keep everything in process memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Print the effective configuration and check it
    Config,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Token commands
    #[command(subcommand)]
    Token(TokenCommands),
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user attached to an existing role
    Create(CreateUserArgs),
}

#[derive(Args)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    /// Name of an existing role
    #[arg(long)]
    pub role: String,
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Sign a session token without logging in
    Issue {
        #[arg(long, value_name = "OBJECT_ID")]
        user_id: ObjectId,
        #[arg(long)]
        role: String,
    },
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config)?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;

    println!("Database migrations completed");
    Ok(())
}

pub async fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  DB Max Connections: {}", config.db_max_connections);
    println!("  JWT Secret: {}", if config.jwt_secret.is_empty() { "<unset>" } else { "****" });
    println!("  Token TTL: {}s", config.token_ttl_secs);
    println!("  Environment: {:?}", config.environment);
    println!("  Enforce Role Allowlist: {}", config.enforce_role_allowlist);
    println!("  CORS Origins: {:?}", config.allowed_origins());
    println!("  Log Request Body: {}", config.log_request_body);

    let pool = crate::db::create_pool(config)?;
    let report = validate_environment(config, &pool).await?;
    report.print();

    if !report.is_valid() {
        anyhow::bail!("Configuration is invalid");
    }

    tracing::info!("Configuration is valid");
    Ok(())
}

pub async fn handle_user_create(config: &Config, args: CreateUserArgs) -> anyhow::Result<()> {
    let name = validate_name("name", &args.name, USER_NAME_MAX_LEN)?;
    let email = validate_email(&args.email)?;
    validate_password(&args.password)?;
    let password_hash = hash_password(&args.password)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?;

    let pool = crate::db::create_pool(config)?;
    let repos = Repositories::from_store(PostgresStore::new(pool));
    let user = repos
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            role_name: args.role.clone(),
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %args.role, "User created");
    println!("Created user {} <{}> with id {}", user.name, user.email, user.id);
    Ok(())
}

pub fn handle_token_issue(config: &Config, user_id: &ObjectId, role: &str) -> anyhow::Result<()> {
    let auth = AuthContext::from_config(config);
    let token = auth.codec.issue(user_id, role)?;

    tracing::info!(user_id = %user_id, role = %role, "Token issued from the command line");
    println!("{}", token);
    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
