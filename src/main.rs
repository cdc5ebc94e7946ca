use clap::Parser;
use deep_research_rs::cli::Args;
use deep_research_rs::generator::workflow::launch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let query = args.query.clone().filter(|q| !q.trim().is_empty());

    let config = match args.into_config() {
        Ok(config) => config,
        Err(err) => {
            println!("**Error:** {:#}", err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = launch(&config, query).await {
        println!("**Error:** {:#}", err);
        std::process::exit(1);
    }
}
