//! PNG + data URI encoding of rendered pixel buffers

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};

pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Encode a packed RGB8 buffer as PNG
pub fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ImageError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(rgb, width, height, ExtendedColorType::Rgb8)?;
    Ok(png)
}

pub fn data_uri(png: &[u8]) -> String {
    format!("{}{}", DATA_URI_PREFIX, BASE64.encode(png))
}

/// PNG bytes of a data URI produced by [`data_uri`]
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let payload = uri.strip_prefix(DATA_URI_PREFIX)?;
    BASE64.decode(payload).ok()
}
