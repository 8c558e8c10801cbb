use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rswappalyzer_driver::cache::RobotsTxtCache;
use rswappalyzer_driver::config::ConfigManager;
use rswappalyzer_driver::detector::PatternEngine;
use rswappalyzer_driver::engine::DetectionEngine;
use rswappalyzer_driver::logging::init_tracing;
use rswappalyzer_driver::net::{HttpClient, ReqwestClient};
use rswappalyzer_driver::rule::DefinitionLoader;
use rswappalyzer_driver::storage::{JsonFileStore, OptionStore};

#[derive(Parser)]
#[command(name = "rswappalyzer-driver")]
#[command(about = "Wappalyzer background driver tools", long_about = None, version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file backing the option store
    #[arg(long, global = true, default_value = "driver_store.json")]
    store: PathBuf,

    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch (or read from cache) the robots.txt rules of a host
    Robots {
        /// Host, optionally with port
        host: String,
        /// Use https
        #[arg(long)]
        secure: bool,
    },

    /// Load and merge technology definitions
    Definitions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ConfigManager::get_default();
    let http: Arc<dyn HttpClient> =
        Arc::new(ReqwestClient::new(&config).context("failed to build HTTP client")?);

    match cli.command {
        Commands::Robots { host, secure } => {
            let options = OptionStore::new(Arc::new(JsonFileStore::new(&cli.store)));
            let robots = RobotsTxtCache::new(options.clone(), http, config.robots_timeout);

            let rules = robots.get_robots_txt(&host, secure).await;
            options.flush().await;

            info!("{} 条规则：{}", rules.len(), host);
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
        Commands::Definitions => {
            let definitions = DefinitionLoader::new(http, config)
                .load()
                .await
                .context("failed to load definitions")?;

            let engine = PatternEngine::new();
            engine.prepare(&definitions);

            println!("apps: {}", definitions.apps.len());
            println!("categories: {}", definitions.categories.len());
            match &definitions.category_order {
                Some(order) => println!("categoryOrder: {:?}", order),
                None => println!("categoryOrder: (extended definitions unavailable)"),
            }
            println!(
                "js patterns: {}",
                engine.js_patterns().as_object().map_or(0, |patterns| patterns.len())
            );
        }
    }

    Ok(())
}
