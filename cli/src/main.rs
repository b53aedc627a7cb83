mod recipes;
mod vault;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use larder_core::{ConfigBuilder, LocalStores, RecipeBook};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Larder recipe box", long_about = None)]
struct Cli {
    /// Directory holding the local store (default: ~/.larder)
    #[arg(long, global = true, env = "LARDER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a recipe from a web page
    Import {
        /// Page URL
        url: String,
    },
    /// Import the page named by a shared-link launch URL (`...?url=<page>`)
    Share {
        launch: String,
    },
    /// List saved recipes, newest first
    List {
        /// Only recipes whose title or source domain contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one recipe
    Show {
        id: String,
    },
    /// Delete a recipe
    Delete {
        id: String,
    },
    /// Replace a recipe's notes
    Notes {
        id: String,
        notes: String,
    },
    /// Replace a recipe's title, ingredients or instructions
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// File with one ingredient per line
        #[arg(long)]
        ingredients: Option<PathBuf>,
        /// File with one step per line
        #[arg(long)]
        instructions: Option<PathBuf>,
    },
    /// Export every recipe as a JSON array
    Export {
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import recipes from an exported JSON array
    ImportFile {
        path: PathBuf,
    },
    /// Password-protected private links
    Vault {
        /// Vault password
        #[arg(long, env = "LARDER_VAULT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[command(subcommand)]
        command: vault::VaultCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut builder = ConfigBuilder::new();
    if let Some(dir) = cli.data_dir {
        builder = builder.data_dir(dir);
    }
    let config = builder.build();
    tracing::debug!(data_dir = %config.data_dir.display(), "opening store");

    let stores = LocalStores::open(&config.data_dir)
        .await
        .with_context(|| format!("Failed to open store in {}", config.data_dir.display()))?;
    let book = RecipeBook::new(stores.recipes.clone());

    match cli.command {
        Commands::Import { url } => recipes::import(&config, book, &url).await?,
        Commands::Share { launch } => recipes::share(&config, book, &launch).await?,
        Commands::List { search } => recipes::list(&book, search.as_deref()).await?,
        Commands::Show { id } => recipes::show(&book, &id).await?,
        Commands::Delete { id } => recipes::delete(&book, &id).await?,
        Commands::Notes { id, notes } => recipes::notes(&book, &id, &notes).await?,
        Commands::Edit {
            id,
            title,
            ingredients,
            instructions,
        } => {
            recipes::edit(
                &book,
                &id,
                title,
                ingredients.as_deref(),
                instructions.as_deref(),
            )
            .await?
        }
        Commands::Export { output } => recipes::export(&book, output.as_deref()).await?,
        Commands::ImportFile { path } => recipes::import_file(&book, &path).await?,
        Commands::Vault { password, command } => {
            vault::run(&config, &stores, password, command).await?
        }
    }

    Ok(())
}
