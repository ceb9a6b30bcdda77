use clap::Parser;
use log::{error, info};

use asr_gateway::cli::{Cli, Commands};
use asr_gateway::config::AppConfig;
use asr_gateway::server;

#[actix_web::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { host, port } => {
            let config = match AppConfig::from_env() {
                Ok(config) => config,
                Err(e) => {
                    error!("Invalid configuration: {e:#}");
                    std::process::exit(1);
                }
            };

            info!("Starting ASR gateway ({:?} profile)", config.profile);

            if let Err(e) = server::run_server(host, port, config).await {
                error!("Server error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}
