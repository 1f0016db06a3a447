use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tabsnip_core::codec::data_url;
use tabsnip_core::slot::SlotStore;
use tabsnip_infrastructure::paths::TabsnipPaths;
use tabsnip_infrastructure::DirSlotStore;

#[derive(Args)]
pub struct ShowArgs {
    /// Copy the stored PNG to this path
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Print the stored PNG as a data URL
    #[arg(long, default_value_t = false)]
    pub data_url: bool,
}

fn open_store() -> Result<DirSlotStore> {
    let dir = TabsnipPaths::slot_dir().context("cannot resolve the slot directory")?;
    Ok(DirSlotStore::new(dir))
}

pub async fn show(args: ShowArgs) -> Result<()> {
    let store = open_store()?;
    let Some(stored) = store.get().await? else {
        println!("slot is empty");
        return Ok(());
    };

    println!(
        "{}x{} px, captured {}",
        stored.artifact.width, stored.artifact.height, stored.artifact.captured_at
    );
    match &stored.remote_id {
        Some(id) => println!("remote id: {id}"),
        None => println!("remote id: none"),
    }

    if let Some(out) = args.out {
        std::fs::write(&out, &stored.artifact.png)
            .with_context(|| format!("cannot write {}", out.display()))?;
        println!("written to {}", out.display());
    }
    if args.data_url {
        println!("{}", data_url::encode_png(&stored.artifact.png));
    }

    Ok(())
}

pub async fn clear() -> Result<()> {
    let store = open_store()?;
    store.clear().await?;
    println!("slot cleared");
    Ok(())
}
