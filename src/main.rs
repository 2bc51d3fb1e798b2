use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ProfileCommand, RestaurantCommand};
use restaurant_picker::{server, Catalog, Config, DocumentStore, GitHubStore, MemoryStore};

#[derive(Parser)]
#[command(name = "restaurant-picker")]
#[command(version)]
#[command(about = "Backend for a shared restaurant picker", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long, short)]
        port: Option<u16>,

        /// Serve an in-memory copy of this JSON document instead of GitHub
        #[arg(long, value_name = "SEED")]
        memory: Option<PathBuf>,
    },

    /// Manage restaurants
    Restaurant(RestaurantCommand),

    /// Manage profiles
    Profile(ProfileCommand),

    /// Print a bearer credential for the configured admin password
    Token,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restaurant_picker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config)?;
    if let Some(path) = &config.config_file {
        tracing::debug!("Loaded config from {}", path.display());
    }

    match cli.command {
        Some(Commands::Serve { port, memory }) => {
            let port = port.unwrap_or(config.port);
            match memory {
                Some(seed) => {
                    tracing::warn!(
                        "Serving in-memory copy of {}; changes are not persisted",
                        seed.display()
                    );
                    let catalog = Catalog::new(MemoryStore::from_file(&seed)?, config.credentials()?);
                    server::serve(Arc::new(catalog), port).await?;
                }
                None => {
                    let catalog = github_catalog(&config)?;
                    let target = catalog.store().target();
                    tracing::info!(
                        "Using {} on {}/{}",
                        target.path,
                        target.repo,
                        target.branch
                    );
                    server::serve(Arc::new(catalog), port).await?;
                }
            }
        }
        Some(Commands::Restaurant(cmd)) => {
            let catalog = github_catalog(&config)?;
            let credential = admin_credential(&catalog, &config)?;
            cmd.run(&catalog, &credential).await?;
        }
        Some(Commands::Profile(cmd)) => {
            let catalog = github_catalog(&config)?;
            let credential = admin_credential(&catalog, &config)?;
            cmd.run(&catalog, &credential).await?;
        }
        Some(Commands::Token) => {
            let credentials = config.credentials()?;
            let secret = config.admin_password.as_deref().unwrap_or_default();
            println!("{}", credentials.authenticate(secret)?);
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

fn github_catalog(config: &Config) -> Result<Catalog<GitHubStore>, Box<dyn std::error::Error>> {
    let store = GitHubStore::new(config.github_target()?)?;
    Ok(Catalog::new(store, config.credentials()?))
}

fn admin_credential<S: DocumentStore>(
    catalog: &Catalog<S>,
    config: &Config,
) -> Result<String, Box<dyn std::error::Error>> {
    let secret = config.admin_password.as_deref().unwrap_or_default();
    Ok(catalog.authenticate(secret)?)
}
