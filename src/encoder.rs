use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use qrcode::render::unicode;
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

// Fixed output configuration, not user adjustable.
const WIDTH: u32 = 300;
const QUIET_ZONE: u32 = 2;
const DARK: Rgb<u8> = Rgb([0x1a, 0x1a, 0x2e]);
const LIGHT: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);

/// The result of one generation. Self contained, nothing needs to be
/// fetched or recomputed to display or save it.
#[derive(Debug, Clone)]
pub struct QrImage {
    /// The canonical URL the symbol encodes.
    pub url: String,
    /// PNG bytes, WIDTH x WIDTH pixels.
    pub png: Vec<u8>,
    /// Half-block rendering of the same symbol for the terminal.
    pub preview: String,
}

/// Encode a canonical URL into a QR symbol at error correction level M.
/// Fails when the payload exceeds the symbol capacity at that level.
pub fn encode(url: &str) -> Result<QrImage> {
    let code = QrCode::with_error_correction_level(url, EcLevel::M)
        .context("Failed to generate QR code")?;

    // Terminals are usually dark, so the preview inverts the palette to
    // keep the symbol scannable on screen.
    let preview = code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build();

    let modules = code.width() as u32;
    let colors = code.to_colors();
    let total = modules + 2 * QUIET_ZONE;

    // Nearest-neighbor sample the module grid, quiet zone included, into
    // a fixed-size raster.
    let raster = RgbImage::from_fn(WIDTH, WIDTH, |x, y| {
        let mx = (x * total / WIDTH).wrapping_sub(QUIET_ZONE);
        let my = (y * total / WIDTH).wrapping_sub(QUIET_ZONE);
        if mx >= modules || my >= modules {
            LIGHT
        } else {
            colors[(my * modules + mx) as usize].select(DARK, LIGHT)
        }
    });

    let mut png = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode QR code image")?;

    Ok(QrImage {
        url: url.to_string(),
        png,
        preview,
    })
}
