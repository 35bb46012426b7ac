//! Vector store schema management CLI

use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use domain_recommendations::{
    ClipConfig, ClipHttpEmbedder, QdrantConfig, QdrantVectorStore, VectorStore,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Provision or drop the recommendation vector store schema"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Qdrant URL (falls back to QDRANT_URL, then http://localhost:6334)
    #[arg(long)]
    url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the product and user collections if missing
    Create,
    /// Delete the product and user collections
    Delete,
    /// Delete and recreate the collections
    Recreate,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    let mut config = QdrantConfig::from_env().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    if let Some(url) = args.url {
        config.url = url;
    }

    let embedder = Arc::new(ClipHttpEmbedder::new(
        ClipConfig::from_env().map_err(|e| color_eyre::eyre::eyre!("{}", e))?,
    ));
    let store = QdrantVectorStore::new(config.clone(), embedder)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    match args.command {
        Command::Create => {
            let created = store
                .ensure_schema()
                .await
                .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
            if created {
                println!("Created collections at {}", config.url);
            } else {
                println!("Collections already exist at {}", config.url);
            }
        }
        Command::Delete => {
            store
                .drop_schema()
                .await
                .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
            println!("Deleted collections at {}", config.url);
        }
        Command::Recreate => {
            store
                .drop_schema()
                .await
                .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
            store
                .ensure_schema()
                .await
                .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
            println!("Recreated collections at {}", config.url);
        }
    }

    Ok(())
}
