//! Project command handler

use anyhow::{bail, Result};

use flipcache::geometry::{percent_to_pixels, snap_rect, PercentRect, PixelRect, Size};

use crate::cli::ProjectArgs;

/// Percent rectangle from the arguments, snapped when requested.
pub fn project(args: &ProjectArgs) -> Result<PixelRect> {
    if args.container_width < 0.0 || args.container_height < 0.0 {
        bail!("Container dimensions must not be negative");
    }
    let rect = snap_rect(
        &PercentRect::new(args.x, args.y, args.width, args.height),
        args.snap,
    );
    Ok(percent_to_pixels(
        &rect,
        Size::new(args.container_width, args.container_height),
    ))
}

/// Print the pixel rectangle for a percent rectangle.
#[cfg(not(tarpaulin_include))]
pub fn handle(args: &ProjectArgs) -> Result<()> {
    let rect = project(args)?;
    if args.json {
        println!("{}", serde_json::to_string(&rect)?);
    } else {
        println!("{}", rect);
    }
    Ok(())
}
