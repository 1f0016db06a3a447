use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tabsnip")]
#[command(about = "tabsnip CLI - region capture sessions for tab surfaces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crop a region out of a captured frame file
    Crop(commands::crop::CropArgs),
    /// Run a scripted capture session against a frame file
    Session(commands::session::SessionArgs),
    /// Inspect or clear the persisted screenshot slot
    Slot {
        #[command(subcommand)]
        action: SlotAction,
    },
}

#[derive(Subcommand)]
enum SlotAction {
    /// Show what the slot currently holds
    Show(commands::slot::ShowArgs),
    /// Empty the slot
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crop(args) => commands::crop::run(args)?,
        Commands::Session(args) => commands::session::run(args).await?,
        Commands::Slot { action } => match action {
            SlotAction::Show(args) => commands::slot::show(args).await?,
            SlotAction::Clear => commands::slot::clear().await?,
        },
    }

    Ok(())
}
