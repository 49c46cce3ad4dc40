use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use territory::{
    config::{Config, ConfigLoader, StoreBackend},
    logging, store, web, Population,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Territory-claiming world server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the world over HTTP
    Serve(Overrides),
    /// Generate the world into storage and exit
    InitWorld(Overrides),
}

#[derive(Debug, Args)]
struct Overrides {
    /// Path to a YAML config file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// World width in tiles
    #[arg(long)]
    width: Option<u32>,

    /// World height in tiles
    #[arg(long)]
    height: Option<u32>,

    /// Generation seed
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i32>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Generate the world before accepting requests (always on for the memory store)
    #[arg(long)]
    init_on_boot: bool,

    /// Storage backend
    #[arg(long, value_enum)]
    store: Option<StoreBackend>,

    /// Directory for the json backend
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Overrides {
    fn resolve(self) -> Result<Config> {
        let loader = ConfigLoader::new(".");
        let mut config = loader.load(self.config.as_ref())?;
        if let Some(width) = self.width {
            config.world.width = width;
        }
        if let Some(height) = self.height {
            config.world.height = height;
        }
        if let Some(seed) = self.seed {
            config.world.seed = seed;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.init_on_boot {
            config.server.init_on_boot = true;
        }
        if let Some(backend) = self.store {
            config.storage.backend = backend;
        }
        if let Some(dir) = self.data_dir {
            config.storage.path = dir;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(overrides) => {
            let config = overrides.resolve()?;
            logging::init(&config.logging.level);
            let store = store::open(&config.storage)?;
            web::run(config, store).await
        }
        Command::InitWorld(overrides) => {
            let config = overrides.resolve()?;
            config.check_init_world()?;
            logging::init(&config.logging.level);
            let world = config.world;
            let batch_size = config.storage.batch_size;
            let storage = config.storage.clone();
            let outcome = tokio::task::spawn_blocking(move || -> Result<Population> {
                let mut store = store::open(&storage)?;
                Ok(territory::populate_world(&mut *store, &world, batch_size)?)
            })
            .await??;
            match outcome {
                Population::Skipped { existing } => {
                    println!("World already holds {existing} tiles; nothing generated.")
                }
                Population::Generated { tiles } => println!(
                    "Generated {}x{} world ({tiles} tiles, seed {}).",
                    world.width, world.height, world.seed
                ),
            }
            Ok(())
        }
    }
}
