use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use tabsnip_core::codec::{self, data_url};
use tabsnip_core::frame::{FullFrame, TabId};

use super::utils::parse_rect;

#[derive(Args)]
pub struct CropArgs {
    /// Frame file to crop (PNG)
    pub input: PathBuf,
    /// Selection as X,Y,WxH in viewport pixels (e.g. 50,50,200x150)
    #[arg(long)]
    pub rect: String,
    /// Device pixel ratio of the surface the frame came from
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
    /// Where to write the cropped PNG
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Print the result as a PNG data URL instead of writing a file
    #[arg(long, default_value_t = false)]
    pub data_url: bool,
}

pub fn run(args: CropArgs) -> Result<()> {
    let rect = parse_rect(&args.rect)?;
    if !rect.meets_minimum() {
        bail!(
            "selection {rect} is below the minimum of {} px per side",
            tabsnip_core::geometry::MIN_SELECTION_PX
        );
    }

    let png = std::fs::read(&args.input)
        .with_context(|| format!("cannot read frame file {}", args.input.display()))?;
    let frame = FullFrame::new(TabId(0), png);

    let artifact = codec::crop_frame(&frame, &rect, args.scale)?;
    tracing::info!("cropped {} to {}x{}", args.input.display(), artifact.width, artifact.height);

    if args.data_url {
        println!("{}", data_url::encode_png(&artifact.png));
        return Ok(());
    }

    let out = args
        .out
        .unwrap_or_else(|| args.input.with_extension("crop.png"));
    std::fs::write(&out, &artifact.png)
        .with_context(|| format!("cannot write {}", out.display()))?;
    println!(
        "{} ({}x{} px)",
        out.display(),
        artifact.width,
        artifact.height
    );

    Ok(())
}
