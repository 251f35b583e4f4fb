use clap::Parser;
use postfeed_lib::infrastructure::database::run_migrations;
use postfeed_lib::shared::{AppConfig, logging};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "Apply pending database migrations", long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Directory holding `<version>_<description>.sql` files
    #[arg(long, env = "POSTFEED_MIGRATIONS_DIR")]
    migrations_dir: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init("migrate", cli.json_logs);

    let mut config = AppConfig::from_env().database;
    if let Some(url) = cli.database_url {
        config.url = Some(url);
    }
    if let Some(dir) = cli.migrations_dir {
        config.migrations_dir = dir;
    }

    info!("Running migrations...");
    match run_migrations(&config).await {
        Ok(report) => {
            info!(
                applied = report.applied,
                "Migrations completed in {} ms",
                report.elapsed_ms()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Migration failed");
            ExitCode::FAILURE
        }
    }
}
