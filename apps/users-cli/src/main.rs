use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbHandle};
use runtime::{AppConfig, CliOverrides};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use users::api::problem::ProblemResponse;
use users::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use users::api::rest::error::{map_domain_error, validation_problem};
use users::config::UsersConfig;
use users::UsersModule;

/// Users CLI - manage user records stored in SQLite
#[derive(Parser)]
#[command(name = "users-cli")]
#[command(about = "Users CLI - manage user records stored in SQLite")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database DSN (overrides config), e.g. sqlite://users.db or sqlite::memory:
    #[arg(long, value_name = "DSN")]
    db: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all users, newest first
    List,
    /// Show one user by id
    Get { id: i64 },
    /// Look a user up by exact email
    GetByEmail { email: String },
    /// Create a user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Change name and/or email of a user
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a user
    Delete { id: i64 },
    /// Check configuration and database reachability
    Check,
}

/// Successful command output, printed as JSON on stdout.
#[derive(Serialize)]
#[serde(untagged)]
enum Reply {
    User(UserDto),
    MaybeUser(Option<UserDto>),
    Users(Vec<UserDto>),
    Deleted { deleted: i64 },
    Check { status: &'static str, database: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        database_url: cli.db.clone(),
        verbose: cli.verbose,
    });

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        bail!("no command given, see --help");
    };

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, config.home_dir_path());
    tracing::info!("users-cli starting");

    // Open store, migrate, run one command, close store
    let db = open_database(&config).await?;
    let users_cfg: UsersConfig = config.module_config("users")?;

    let outcome = match UsersModule::init(&db, users_cfg).await {
        Ok(module) => execute(&module, command, db.dsn()).await,
        Err(e) => {
            db.close().await;
            return Err(e);
        }
    };

    db.close().await;

    match outcome {
        Ok(reply) => {
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(ProblemResponse(problem)) => {
            eprintln!("{}", serde_json::to_string(&problem)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Resolve the configured DSN against `home_dir` and connect.
async fn open_database(config: &AppConfig) -> Result<DbHandle> {
    let raw = config.database.url.trim();
    if raw.is_empty() {
        bail!("Database URL not configured");
    }

    let dsn = db::absolutize_sqlite_dsn(raw, Path::new(&config.home_dir))
        .with_context(|| format!("Invalid database DSN '{raw}'"))?;

    let connect_opts = ConnectOpts {
        max_conns: config.database.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: config
            .database
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(ms as u64)),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!("Connecting to database: {}", dsn);
    let db = DbHandle::connect(&dsn, connect_opts)
        .await
        .with_context(|| format!("failed to open database {dsn}"))?;
    Ok(db)
}

/// Run one service operation. Failures come back as the Problem a routing layer would send.
async fn execute(
    module: &UsersModule,
    command: Commands,
    dsn: &str,
) -> Result<Reply, ProblemResponse> {
    let service = module.service();
    let cfg = module.config();

    match command {
        Commands::List => {
            let users = service
                .list()
                .await
                .map_err(|e| map_domain_error(&e, "/users"))?;
            Ok(Reply::Users(users.into_iter().map(UserDto::from).collect()))
        }
        Commands::Get { id } => {
            let instance = format!("/users/{id}");
            let user = service
                .get_by_id(id)
                .await
                .map_err(|e| map_domain_error(&e, &instance))?;
            Ok(Reply::User(user.into()))
        }
        Commands::GetByEmail { email } => {
            let user = service
                .get_by_email(&email)
                .await
                .map_err(|e| map_domain_error(&e, "/users"))?;
            Ok(Reply::MaybeUser(user.map(UserDto::from)))
        }
        Commands::Create { name, email } => {
            let req = CreateUserReq { name, email };
            req.validate(cfg)
                .map_err(|errors| validation_problem(errors, "/users"))?;
            let user = service
                .create(req.into())
                .await
                .map_err(|e| map_domain_error(&e, "/users"))?;
            Ok(Reply::User(user.into()))
        }
        Commands::Update { id, name, email } => {
            let instance = format!("/users/{id}");
            let req = UpdateUserReq { name, email };
            req.validate(cfg)
                .map_err(|errors| validation_problem(errors, &instance))?;
            let user = service
                .update(id, req.into())
                .await
                .map_err(|e| map_domain_error(&e, &instance))?;
            Ok(Reply::User(user.into()))
        }
        Commands::Delete { id } => {
            let instance = format!("/users/{id}");
            service
                .delete(id)
                .await
                .map_err(|e| map_domain_error(&e, &instance))?;
            Ok(Reply::Deleted { deleted: id })
        }
        Commands::Check => {
            // reaching here means config parsed, the store opened and migrations ran
            tracing::info!("Configuration is valid");
            Ok(Reply::Check {
                status: "ok",
                database: dsn.to_string(),
            })
        }
    }
}
