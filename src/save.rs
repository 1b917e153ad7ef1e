use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Write the PNG bytes next to where the app was launched from, named
/// after the moment of the save.
pub fn save_png(png: &[u8], directory: &Path) -> Result<PathBuf> {
    let name = format!("qrcode-{}.png", jiff::Timestamp::now().as_millisecond());
    let path = directory.join(name);

    fs::write(&path, png).context("Failed to save QR code image")?;
    Ok(path)
}
