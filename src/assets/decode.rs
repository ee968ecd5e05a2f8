use std::sync::Arc;

use anyhow::Context;

use crate::assets::store::ImageAsset;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{TickreelError, TickreelResult};

/// Decode PNG/JPEG/... bytes into a premultiplied [`ImageAsset`].
///
/// Empty (0×0) images are rejected since nothing can be drawn from them.
pub fn decode_image(bytes: &[u8]) -> TickreelResult<ImageAsset> {
    let rgba = image::load_from_memory(bytes)
        .context("failed to decode image bytes")?
        .into_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TickreelError::validation("image has no pixels"));
    }

    let mut pixels = rgba.into_raw();
    premultiply_in_place(&mut pixels);
    Ok(ImageAsset {
        width,
        height,
        rgba8_premul: Arc::new(pixels),
    })
}

pub(crate) fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let p = Rgba8Premul::from_straight_rgba(px[0], px[1], px[2], px[3]);
        px.copy_from_slice(&p.to_array());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
