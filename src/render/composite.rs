//! Layer compositor.
//!
//! Blends the per-clip surfaces of one tick into a single premultiplied RGBA8 frame. Each layer is
//! placed by inverse-mapping every destination pixel center through the layer's transform (about
//! the frame center, camera on top) and sampling the nearest source pixel; samples that fall
//! outside the source are discarded, never wrapped.
//!
//! `normal` and `add` use the integer `mul_div255` math; `multiply`, `screen` and `overlay` use the
//! separable premultiplied formula
//! `co = cs·(1-ad) + cd·(1-as) + as·ad·B(cd/ad, cs/as)` in `f64`.

use crate::foundation::core::{Affine, Canvas, Point};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};
use crate::render::backend::FrameRGBA;
use crate::timeline::clip::BlendMode;
use crate::timeline::engine::FrameLayers;

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Blends the layers of one tick into a frame.
#[derive(Clone, Copy, Debug)]
pub struct Compositor {
    canvas: Canvas,
    seed: u64,
}

impl Compositor {
    /// Compositor for `canvas`; `seed` keys camera shake.
    pub fn new(canvas: Canvas, seed: u64) -> Self {
        Self { canvas, seed }
    }

    /// Blend `frame`'s layers bottom to top over transparent black, camera on top.
    #[tracing::instrument(skip(self, frame), fields(tick = frame.tick.0, layers = frame.layers.len()))]
    pub fn composite(&self, frame: &FrameLayers) -> TickreelResult<FrameRGBA> {
        let mut out = FrameRGBA::transparent(self.canvas);
        let camera = frame.camera.to_affine(self.canvas, self.seed, frame.tick.0);

        for layer in &frame.layers {
            if layer.surface.width != self.canvas.width || layer.surface.height != self.canvas.height {
                return Err(TickreelError::evaluation(format!(
                    "layer '{}' is {}x{}, expected {}x{}",
                    layer.clip.clip_id,
                    layer.surface.width,
                    layer.surface.height,
                    self.canvas.width,
                    self.canvas.height
                )));
            }
            let op = unit_to_u8(layer.clip.opacity);
            if op == 0 {
                continue;
            }
            let m = camera * layer.clip.transform.to_affine(self.canvas);
            blend_layer(&mut out.data, &layer.surface.data, self.canvas, m, op, layer.clip.blend);
        }
        Ok(out)
    }
}

/// Blend `src` (same size as the canvas) onto `dst` through transform `m`.
pub(crate) fn blend_layer(
    dst: &mut [u8],
    src: &[u8],
    canvas: Canvas,
    m: Affine,
    op: u16,
    mode: BlendMode,
) {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < 1e-12 {
        return;
    }
    let inv = m.inverse();
    let (w, h) = (canvas.width as usize, canvas.height as usize);

    if m == Affine::IDENTITY {
        for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
            let out = blend([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], op, mode);
            d.copy_from_slice(&out);
        }
        return;
    }

    for y in 0..h {
        for x in 0..w {
            let p = inv * Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let (sx, sy) = (p.x.floor(), p.y.floor());
            if sx < 0.0 || sy < 0.0 || sx >= w as f64 || sy >= h as f64 {
                continue;
            }
            let si = (sy as usize * w + sx as usize) * 4;
            let di = (y * w + x) * 4;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&blend(d, s, op, mode));
        }
    }
}

/// Blend one premultiplied source pixel, scaled by opacity `op` (0..=255), onto `dst`.
pub fn blend(dst: PremulRgba8, src: PremulRgba8, op: u16, mode: BlendMode) -> PremulRgba8 {
    let s = [
        mul_div255_u8(u16::from(src[0]), op),
        mul_div255_u8(u16::from(src[1]), op),
        mul_div255_u8(u16::from(src[2]), op),
        mul_div255_u8(u16::from(src[3]), op),
    ];
    if s[3] == 0 {
        return dst;
    }
    match mode {
        BlendMode::Normal => over(dst, s),
        BlendMode::Add => add(dst, s),
        BlendMode::Multiply => separable(dst, s, |cb, cs| cb * cs),
        BlendMode::Screen => separable(dst, s, |cb, cs| cb + cs - cb * cs),
        BlendMode::Overlay => separable(dst, s, |cb, cs| {
            if cb <= 0.5 {
                2.0 * cb * cs
            } else {
                let cb2 = 2.0 * cb - 1.0;
                cb2 + cs - cb2 * cs
            }
        }),
    }
}

/// Premultiplied source-over.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(u16::from(src[i]), u16::from(mul_div255_u8(u16::from(dst[i]), inv)));
    }
    out
}

fn add(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(u16::from(dst[i]), u16::from(src[i]));
    }
    // keep premultiplied invariant: color <= alpha
    for i in 0..3 {
        out[i] = out[i].min(out[3]);
    }
    out
}

fn separable(dst: PremulRgba8, src: PremulRgba8, b: impl Fn(f64, f64) -> f64) -> PremulRgba8 {
    let unit = |v: u8| f64::from(v) / 255.0;
    let (as_, ad) = (unit(src[3]), unit(dst[3]));
    let ao = as_ + ad - as_ * ad;

    let mut out = [0u8; 4];
    for i in 0..3 {
        let (cs, cd) = (unit(src[i]), unit(dst[i]));
        let cs_straight = if as_ > 0.0 { cs / as_ } else { 0.0 };
        let cd_straight = if ad > 0.0 { cd / ad } else { 0.0 };
        let co = cs * (1.0 - ad) + cd * (1.0 - as_) + as_ * ad * b(cd_straight, cs_straight);
        out[i] = to_u8(co.min(ao));
    }
    out[3] = to_u8(ao);
    out
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn add_sat_u8(a: u16, b: u16) -> u8 {
    (a + b).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
