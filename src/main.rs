use activity_timeline_api::{router, ActivityQueryService, AppState, Config, Database};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

/// Read-only timeline API over touchpoint events
#[derive(Parser)]
#[command(name = "activity-timeline-api")]
#[command(about = "Query API for activity timelines")]
struct Cli {
    #[arg(short, long, env = "TIMELINE_CONFIG", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Load a JSON fixture of persons and events into the database
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Config::load_from_file(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.level))
        .init();

    let db = match Database::open(&config.database.path) {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Import { file } => match db.import_fixture(&file) {
            Ok((persons, events)) => info!(persons, events, "Imported {}", file.display()),
            Err(e) => {
                error!("Import failed: {}", e);
                std::process::exit(1);
            }
        },
        Command::Serve => {
            if let Err(e) = serve(config, db).await {
                error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn serve(config: Config, db: Database) -> std::io::Result<()> {
    let service = ActivityQueryService::new(db, &config);
    let app = router(AppState { service });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    info!("Activity timeline API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
