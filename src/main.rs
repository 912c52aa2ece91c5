use clap::Parser;
use tracing_subscriber::EnvFilter;

use studiochat::cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    if let Err(err) = cli::run(args).await {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
