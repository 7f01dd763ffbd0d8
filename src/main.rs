use clap::Parser;
use std::path::PathBuf;
use triagelens_lib::commands::settings::load_effective_server_settings;
use triagelens_lib::error::StartupError;
use triagelens_lib::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "triagelens", about = "Score, route and track customer feedback over HTTP")]
struct Cli {
    /// Directory holding settings.json and the database file
    #[arg(long, env = "TRIAGELENS_DATA_DIR", default_value = ".triagelens")]
    data_dir: PathBuf,

    /// Bind address, overrides settings.json
    #[arg(long, env = "TRIAGELENS_HOST")]
    host: Option<String>,

    /// Listen port, overrides settings.json
    #[arg(long, env = "TRIAGELENS_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        log::error!("{e}");
        eprintln!("triagelens: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let settings = load_effective_server_settings(&cli.data_dir).map_err(StartupError::Settings)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.log_level.as_str()))
        .init();

    let host = cli.host.unwrap_or(settings.host);
    let port = cli.port.unwrap_or(settings.port);

    let state = AppState::open(settings.database_path)?;
    triagelens_lib::run_server(&host, port, state).await
}
