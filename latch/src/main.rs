use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use latch::{Latch, LatchBuilder, SqliteRepositoryProvider, ThrottleConfig};
use latch_core::config;
use tracing_subscriber::EnvFilter;

/// Command line interface for Latch
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(
        long,
        env = "LATCH_DATABASE_URL",
        default_value = "sqlite://latch.db?mode=rwc"
    )]
    database_url: String,

    /// Consecutive failures after which a login is locked
    #[arg(long, env = config::USER_LOCK_THRESHOLD_ENV, default_value_t = config::DEFAULT_USER_LOCK_THRESHOLD)]
    user_lock_threshold: u64,

    /// Consecutive failures after which an IP address is banned
    #[arg(long, env = config::IP_BAN_THRESHOLD_ENV, default_value_t = config::DEFAULT_IP_BAN_THRESHOLD)]
    ip_ban_threshold: u64,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Register a login with a password
    Register {
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
    },
    /// Evaluate a login attempt and record its outcome
    Attempt {
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        ip: String,
    },
    /// Print banned IPs and locked logins as JSON
    Report,
    /// Show the counter of a login or an IP address
    Status(StatusArgs),
    /// Reset a login's lock counter
    Unlock {
        #[arg(long)]
        login: String,
    },
    /// Reset an IP address's ban counter
    Unban {
        #[arg(long)]
        ip: String,
    },
    /// Drop every counter
    Reset,
    /// Print version information
    Version,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct StatusArgs {
    #[arg(long)]
    login: Option<String>,
    #[arg(long)]
    ip: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    let config = ThrottleConfig::new(cli.user_lock_threshold, cli.ip_ban_threshold)?;
    let latch = LatchBuilder::new()
        .with_sqlite(&cli.database_url)
        .await?
        .with_config(config)
        .build()
        .await?;

    run(cli.command, latch).await
}

fn print_version() {
    println!("latch v{}", env!("CARGO_PKG_VERSION"));
}

async fn run(command: Commands, latch: Latch<SqliteRepositoryProvider>) -> anyhow::Result<()> {
    match command {
        Commands::Migrate => {
            latch.migrate().await.context("running migrations")?;
            println!("Migrations applied");
        }
        Commands::Register { login, password } => {
            let credential = latch.register_credential(&login, &password).await?;
            println!("Registered {} (id {})", credential.login, credential.id);
        }
        Commands::Attempt {
            login,
            password,
            ip,
        } => {
            let result = latch.login(&login, &password, &ip).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Report => {
            let report = latch.report().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Status(StatusArgs { login, ip }) => {
            let status = match (login, ip) {
                (Some(login), _) => latch.login_status(&login).await?,
                (None, Some(ip)) => latch.ip_status(&ip).await?,
                (None, None) => anyhow::bail!("either --login or --ip is required"),
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Unlock { login } => {
            let was_locked = latch.unlock_login(&login).await?;
            println!("{login}: {}", if was_locked { "unlocked" } else { "was not locked" });
        }
        Commands::Unban { ip } => {
            let was_banned = latch.unban_ip(&ip).await?;
            println!("{ip}: {}", if was_banned { "unbanned" } else { "was not banned" });
        }
        Commands::Reset => {
            let removed = latch.reset_all().await?;
            println!("Removed {removed} counters");
        }
        Commands::Version => print_version(),
    }

    Ok(())
}
