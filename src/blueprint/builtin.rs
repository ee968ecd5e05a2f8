//! Primitive blueprints shipped with the crate.
//!
//! | id | props |
//! |---|---|
//! | `solid` | `color` (default white); optional `x`, `y`, `width`, `height` rectangle |
//! | `circle` | `color`, `x`, `y` (default canvas center), `radius` |
//! | `image` | `asset` (asset id); optional `x`, `y`, `width`, `height` (default full canvas) |
//! | `spectrum` | `color`, `gap`; bars follow the clip's audio frame |
//! | `particles` | `color`, `count`, `size`; positions from the clip generator |

use kurbo::Shape;

use crate::animation::value::Color;
use crate::blueprint::registry::{BlueprintRegistry, DrawContext};
use crate::foundation::core::Rect;
use crate::foundation::error::{TickreelError, TickreelResult};

const WHITE: Color = Color::rgba(255, 255, 255, 255);

/// Register `solid`, `circle`, `image`, `spectrum` and `particles`.
pub fn register_builtins(reg: &mut BlueprintRegistry) {
    reg.register("solid", solid);
    reg.register("circle", circle);
    reg.register("image", image);
    reg.register("spectrum", spectrum);
    reg.register("particles", particles);
}

fn rect_from_props(ctx: &DrawContext<'_>) -> Rect {
    let full = ctx.surface.rect();
    let x = ctx.number("x", full.x0);
    let y = ctx.number("y", full.y0);
    let w = ctx.number("width", full.width());
    let h = ctx.number("height", full.height());
    Rect::new(x, y, x + w.max(0.0), y + h.max(0.0))
}

fn solid(ctx: &mut DrawContext<'_>) -> TickreelResult<()> {
    let rect = rect_from_props(ctx);
    let color = ctx.color("color", WHITE);
    ctx.surface.fill_rect(rect, color);
    Ok(())
}

fn circle(ctx: &mut DrawContext<'_>) -> TickreelResult<()> {
    let center = ctx.surface.rect().center();
    let x = ctx.number("x", center.x);
    let y = ctx.number("y", center.y);
    let radius = ctx.number("radius", f64::from(ctx.width.min(ctx.height)) / 4.0);
    if radius <= 0.0 {
        return Ok(());
    }
    let color = ctx.color("color", WHITE);
    let path = kurbo::Circle::new((x, y), radius).to_path(0.1);
    ctx.surface.fill_path(&path, color);
    Ok(())
}

fn image(ctx: &mut DrawContext<'_>) -> TickreelResult<()> {
    let id = ctx
        .string("asset")
        .ok_or_else(|| TickreelError::evaluation("image blueprint needs an 'asset' prop"))?
        .to_owned();
    let rect = rect_from_props(ctx);
    let img = ctx
        .image(&id)
        .ok_or_else(|| TickreelError::evaluation(format!("unknown image asset '{id}'")))?
        .clone();
    ctx.surface.draw_image(&img, rect)
}

fn spectrum(ctx: &mut DrawContext<'_>) -> TickreelResult<()> {
    let Some(frame) = ctx.audio else {
        return Ok(());
    };
    let bins = &frame.frequencies;
    if bins.is_empty() {
        return Ok(());
    }
    let color = ctx.color("color", WHITE);
    let gap = ctx.number("gap", 2.0).max(0.0);
    let (w, h) = (f64::from(ctx.width), f64::from(ctx.height));
    let bar_w = (w / bins.len() as f64 - gap).max(1.0);
    for (i, mag) in bins.iter().enumerate() {
        let bar_h = (mag.clamp(0.0, 1.0) * h).round();
        if bar_h <= 0.0 {
            continue;
        }
        let x = i as f64 * (bar_w + gap);
        ctx.surface.fill_rect(Rect::new(x, h - bar_h, x + bar_w, h), color);
    }
    Ok(())
}

fn particles(ctx: &mut DrawContext<'_>) -> TickreelResult<()> {
    let count = ctx.number("count", 32.0).clamp(0.0, 10_000.0) as usize;
    let size = ctx.number("size", 3.0).max(0.0);
    let color = ctx.color("color", WHITE);
    let (w, h) = (f64::from(ctx.width), f64::from(ctx.height));
    for _ in 0..count {
        let x = ctx.rng.range(0.0, w);
        let y = ctx.rng.range(0.0, h);
        ctx.surface.fill_rect(Rect::new(x, y, x + size, y + size), color);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/blueprint/builtin.rs"]
mod tests;
