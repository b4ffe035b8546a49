use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

use pubmed_navigator::{
    api::ApiClient,
    browse::Browser,
    config::Config,
    models::AppState,
    routes::create_router,
    search::EutilsClient,
    session::{FileSnapshotStore, MemorySnapshotStore},
    utils::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "pubmed-navigator", version, about = "Search PubMed and page through results")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the E-utilities gateway
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Search and page through results from the terminal
    Browse {
        /// Gateway base URL, e.g. http://localhost:8000/api
        #[arg(long)]
        api_base_url: Option<String>,
        /// Directory holding the last-session snapshot
        #[arg(long)]
        session_dir: Option<PathBuf>,
        /// Keep the session in memory only
        #[arg(long)]
        ephemeral: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Command::Serve { host, port } => {
            init_tracing("pubmed_navigator=debug,tower_http=debug,axum=debug");

            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            info!("Configuration loaded: {:?}", config.server);

            let state = AppState {
                eutils: EutilsClient::from_config(&config.ncbi),
                config: config.clone(),
            };
            let app = create_router(state);

            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
            info!("Gateway listening on {}", addr);

            let listener = TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .await
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
        }
        Command::Browse {
            api_base_url,
            session_dir,
            ephemeral,
        } => {
            init_tracing("pubmed_navigator=warn");

            if let Some(url) = api_base_url {
                config.client.api_base_url = url;
            }
            if let Some(dir) = session_dir {
                config.session.dir = dir;
            }

            let client = ApiClient::from_config(&config.client)?;
            if ephemeral {
                Browser::new(client, MemorySnapshotStore::new()).run().await?;
            } else {
                let store = FileSnapshotStore::new(&config.session.dir);
                info!(path = ?store.path(), "Using session snapshot");
                Browser::new(client, store).run().await?;
            }
        }
    }

    Ok(())
}
