use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::time::timeout;

use tabsnip_core::frame::TabId;
use tabsnip_core::protocol::CaptureEvent;
use tabsnip_infrastructure::config_loader::load_runtime_config;
use tabsnip_infrastructure::paths::TabsnipPaths;
use tabsnip_infrastructure::{DirSlotStore, PngFileFrameSource};
use tabsnip_runtime::{Coordinator, Launcher, OverlayOptions, StartOutcome};

use tabsnip_core::geometry::SelectionRect;

use super::utils::parse_rect;

/// How long the scripted run waits for the capture notification.
const CAPTURE_WAIT: Duration = Duration::from_secs(5);

/// Opposite corner of the scripted drag, in f64 so even extreme rect
/// values cannot overflow on the way in.
fn drag_end(rect: &SelectionRect) -> (f64, f64) {
    (
        rect.x as f64 + rect.width as f64,
        rect.y as f64 + rect.height as f64,
    )
}

#[derive(Args)]
pub struct SessionArgs {
    /// Frame file standing in for the tab surface (PNG)
    pub frame: PathBuf,
    /// Selection to drag out, as X,Y,WxH in viewport pixels
    #[arg(long)]
    pub rect: String,
    /// Device pixel ratio of the surface
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
    /// Tab id to run the session on
    #[arg(long, default_value_t = 1)]
    pub tab: u32,
    /// Slot directory (defaults to the platform data dir)
    #[arg(long)]
    pub slot_dir: Option<PathBuf>,
}

/// Runs one full capture session: start, scripted drag, wait for the
/// stored artifact.
pub async fn run(args: SessionArgs) -> Result<()> {
    let rect = parse_rect(&args.rect)?;
    let tab = TabId(args.tab);

    let config = load_runtime_config()?;
    let slot_dir = match args.slot_dir {
        Some(dir) => dir,
        None => TabsnipPaths::slot_dir().context("cannot resolve the slot directory")?,
    };

    let coordinator = Coordinator::spawn(
        Arc::new(PngFileFrameSource::new(&args.frame)),
        Arc::new(DirSlotStore::new(&slot_dir)),
        config,
    );
    let launcher = Launcher::new(coordinator.clone(), config);
    let mut events = coordinator.subscribe();

    let options = OverlayOptions {
        device_pixel_ratio: args.scale,
    };
    let overlay = match launcher.start_capture(tab, options).await? {
        StartOutcome::Started {
            overlay: Some(overlay),
            session_id,
        } => {
            tracing::info!("session {session_id} started on {tab}");
            overlay
        }
        StartOutcome::Started { overlay: None, .. } => {
            bail!("an overlay was already listening on {tab}; nothing to drive")
        }
        StartOutcome::Busy { other_tab } => {
            bail!("another session is live on {other_tab}")
        }
        StartOutcome::Failed { attempts } => {
            bail!("no overlay acknowledged after {attempts} attempts")
        }
    };

    // The drag a user would make, corner to corner.
    let (end_x, end_y) = drag_end(&rect);
    overlay.pointer_down(rect.x as f64, rect.y as f64).await?;
    overlay.pointer_moved(end_x, end_y).await?;
    overlay.pointer_up().await?;

    let event = timeout(CAPTURE_WAIT, events.recv())
        .await
        .context("no capture notification arrived; the selection may be below the minimum")?
        .context("coordinator went away before notifying")?;

    let CaptureEvent::ScreenshotCaptured { artifact } = event;
    println!(
        "captured {}x{} px into {}",
        artifact.width,
        artifact.height,
        slot_dir.display()
    );

    Ok(())
}
