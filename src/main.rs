use std::path::Path;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use foodgram_core::config::AppConfig;
use foodgram_core::logging::init_logging;
use foodgram_core::{db, search, shopping_list};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create any missing tables
    InitDb,
    /// Export a user's shopping list to the report directory
    ShoppingList {
        #[arg(long)]
        user_id: i32,
    },
    /// Print one recipe as JSON
    Recipe {
        #[arg(long)]
        id: i32,
        /// Compute favorite and cart flags for this user
        #[arg(long)]
        viewer: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    let _guard = init_logging(&config);
    info!("Starting foodgram, version: {}", env!("CARGO_PKG_VERSION"));

    let conn = match db::connect(&config).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("Failed to connect to the database: {}", e);
            return Err(e.into());
        }
    };

    match args.command {
        Command::InitDb => {
            db::create_schema(&conn).await?;
        }
        Command::ShoppingList { user_id } => {
            let path = shopping_list::export_report(&conn, user_id, Path::new(&config.report_dir)).await?;
            println!("{}", path.display());
        }
        Command::Recipe { id, viewer } => {
            let details = search::recipe_details(&conn, id, viewer).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
    }

    Ok(())
}
