//! Image decoding shared by the backend worker and the shell.

/// Decoded RGBA pixels ready for texture upload.
#[derive(Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let decoded =
        image::load_from_memory(bytes).map_err(|err| format!("unsupported image data: {err}"))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PreviewImage {
        width: width as usize,
        height: height as usize,
        rgba: rgba.into_raw(),
    })
}
