use crate::canvas::surface::CanvasSurface;
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encodes the surface as a lossless RGBA PNG.
pub fn encode_png(surface: &CanvasSurface) -> Result<Vec<u8>> {
    if surface.is_zero_sized() {
        return Err(anyhow!("canvas surface has no pixels to encode"));
    }
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            surface.rgba(),
            surface.width(),
            surface.height(),
            ColorType::Rgba8,
        )
        .with_context(|| {
            format!(
                "encode {}x{} canvas snapshot as png",
                surface.width(),
                surface.height()
            )
        })?;
    Ok(bytes)
}

pub fn to_data_url(png: &[u8]) -> String {
    format!(
        "{}{}",
        PNG_DATA_URL_PREFIX,
        general_purpose::STANDARD.encode(png)
    )
}

/// Snapshot of the surface in the string form the solver expects.
pub fn capture_data_url(surface: &CanvasSurface) -> Result<String> {
    let png = encode_png(surface)?;
    tracing::debug!(bytes = png.len(), "captured canvas snapshot");
    Ok(to_data_url(&png))
}
