use clap::{Parser, ValueEnum};
use sqlbench_core::{BenchConfig, BenchEngine};
use sqlbench_db::{strategy_for, DbConfig, DbEngine};
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Engine {
    Postgres,
    Mysql,
}

impl From<Engine> for DbEngine {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Postgres => DbEngine::Postgres,
            Engine::Mysql => DbEngine::MySql,
        }
    }
}

/// TPC-B-style benchmark for SQL databases.
#[derive(Parser, Debug)]
#[command(name = "sqlbench", version)]
struct Cli {
    /// Database engine to benchmark.
    #[arg(long, value_enum)]
    engine: Engine,

    /// Database server's hostname.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Database server's port (default: 5432 for Postgres, 3306 for MySQL).
    #[arg(long)]
    port: Option<u16>,

    /// Database name.
    #[arg(long)]
    dbname: String,

    /// Username used to log in.
    #[arg(long)]
    username: String,

    /// Password used to log in.
    #[arg(long)]
    password: Option<String>,

    /// Create objects in the specified schema, rather than the default one.
    #[arg(long)]
    schema: Option<String>,

    /// Create objects in the specified tablespace, rather than the default one.
    #[arg(long)]
    tablespace: Option<String>,

    /// Create tables in nologging (unlogged) mode where the engine supports it.
    #[arg(long)]
    nologging: bool,

    /// Initialization scale factor, 1 = 100,000 account rows. Should be at
    /// least as large as the number of concurrent clients, or the run mostly
    /// measures update contention.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    scale: u64,

    /// Number of concurrent clients simulated.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    concurrency: u64,

    /// Run the test for this many seconds. Short runs rarely produce
    /// reproducible numbers; prefer at least a few minutes.
    #[arg(long = "time", default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    time_secs: u64,

    /// Issue read-only transactions instead of the read-write mix.
    #[arg(long)]
    read_only: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let engine = DbEngine::from(cli.engine);
    let db_config = DbConfig {
        engine,
        host: cli.host,
        port: cli.port.unwrap_or_else(|| engine.default_port()),
        dbname: cli.dbname,
        username: cli.username,
        password: cli.password,
        schema: cli.schema,
        tablespace: cli.tablespace,
        nologging: cli.nologging,
        scale: cli.scale,
    };
    let config = BenchConfig::new(
        cli.concurrency as usize,
        cli.scale,
        Duration::from_secs(cli.time_secs),
        cli.read_only,
    );

    // Result lines are logged by the engine; worker failures are surfaced as
    // warnings there and do not fail the process. Setup errors do.
    if let Err(err) = BenchEngine::new(config, strategy_for(db_config)).run().await {
        error!("{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
