use std::sync::Arc;

use crate::animation::value::Color;
use crate::assets::store::ImageAsset;
use crate::foundation::core::{Affine, BezPath, Rect};
use crate::foundation::error::{TickreelError, TickreelResult};
use crate::render::backend::FrameRGBA;

/// Isolated drawing target owned by one clip for one tick.
///
/// Backed by a `vello_cpu` render context; nothing is rasterized until [`Surface::finish`].
pub struct Surface {
    width: u32,
    height: u32,
    ctx: vello_cpu::RenderContext,
    transform: Affine,
    layers: u32,
}

impl Surface {
    /// Transparent surface; both sides must fit in `u16`.
    pub fn new(width: u32, height: u32) -> TickreelResult<Self> {
        let (w, h) = dims_u16(width, height)?;
        Ok(Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(w, h),
            transform: Affine::IDENTITY,
            layers: 0,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Full-surface rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Transform applied to subsequent draw calls.
    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
        self.ctx.set_transform(affine_to_cpu(transform));
    }

    /// Current transform.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Fill `rect` with a solid color.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a));
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }

    /// Fill `path` (non-zero winding) with a solid color.
    pub fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    /// Draw `image` stretched into `dst`.
    pub fn draw_image(&mut self, image: &ImageAsset, dst: Rect) -> TickreelResult<()> {
        if image.width == 0 || image.height == 0 || dst.width() <= 0.0 || dst.height() <= 0.0 {
            return Ok(());
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let placed = self.transform
            * Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(
                dst.width() / f64::from(image.width),
                dst.height() / f64::from(image.height),
            );
        self.ctx.set_transform(affine_to_cpu(placed));
        self.ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        });
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        self.ctx.set_transform(affine_to_cpu(self.transform));
        Ok(())
    }

    /// Group subsequent draws under a uniform opacity until [`Surface::pop_layer`].
    pub fn push_opacity(&mut self, opacity: f32) {
        self.ctx.push_opacity_layer(opacity.clamp(0.0, 1.0));
        self.layers += 1;
    }

    /// Close the innermost opacity layer; no-op when none is open.
    pub fn pop_layer(&mut self) {
        if self.layers > 0 {
            self.ctx.pop_layer();
            self.layers -= 1;
        }
    }

    /// Rasterize everything drawn so far into premultiplied RGBA8.
    pub fn finish(mut self) -> TickreelResult<FrameRGBA> {
        while self.layers > 0 {
            self.pop_layer();
        }
        let (w, h) = dims_u16(self.width, self.height)?;
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: self.width,
            height: self.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn dims_u16(width: u32, height: u32) -> TickreelResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(TickreelError::evaluation("surface width/height must be > 0"));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| TickreelError::evaluation("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TickreelError::evaluation("surface height exceeds u16"))?;
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> TickreelResult<vello_cpu::Pixmap> {
    let (w, h) = dims_u16(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(TickreelError::evaluation("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/blueprint/surface.rs"]
mod tests;
