use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use overtime::Metric;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use time::OffsetDateTime;

use repo_stats::GraphRequest;

#[derive(Debug, Parser)]
#[command(about = "Cumulative growth graphs for repository works and users")]
struct Cli {
    /// Directory holding `<metric>.json` fixtures
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/../samples"))]
    samples_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print one graph as JSON
    Graph {
        /// works | users
        metric: Metric,
        #[command(flatten)]
        req: GraphRequest,
    },
    /// Serve graphs over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0:5080")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let start_time = std::time::Instant::now();

    let ctx = Arc::new(repo_stats::create_context(&cli.samples_dir)?);
    tracing::info!("prepare time: {:?}", start_time.elapsed());

    match cli.command {
        Command::Graph { metric, req } => {
            let graph = repo_stats::graph(ctx, metric, &req, OffsetDateTime::now_utc()).await?;
            tracing::info!("execute time: {:?}", start_time.elapsed());
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
        Command::Serve { addr } => repo_stats::http::server(ctx, addr).await?,
    }
    Ok(())
}
