use clap::{Parser, Subcommand};

mod search;

use search::SearchArgs;

#[derive(Debug, Parser)]
#[command(name = "poisweep")]
#[command(about = "Multi-anchor point-of-interest search and aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fan a query out across the anchor registry and merge the results.
    Search(SearchArgs),
    /// List the anchors in the configured registry.
    Anchors,
    /// Great-circle distance between two lat,lon pairs.
    Distance { from: String, to: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = poisweep_core::load_app_config_from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => search::run(&config, args).await,
        Commands::Anchors => list_anchors(&config),
        Commands::Distance { from, to } => distance(&from, &to),
    }
}

fn list_anchors(config: &poisweep_core::AppConfig) -> anyhow::Result<()> {
    let registry = poisweep_core::load_anchors(&config.anchors_path)?;
    for anchor in registry.to_anchors() {
        println!(
            "{:<16} {:<28} {:>11.7} {:>12.7}",
            anchor.id, anchor.name, anchor.latitude, anchor.longitude
        );
    }
    Ok(())
}

fn distance(from: &str, to: &str) -> anyhow::Result<()> {
    let (a_lat, a_lon) = search::parse_lat_lon(from)?;
    let (b_lat, b_lon) = search::parse_lat_lon(to)?;
    let km = poisweep_core::distance_km(a_lat, a_lon, b_lat, b_lon)?;
    println!("{km:.3} km");
    Ok(())
}
