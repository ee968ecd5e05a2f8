use crate::foundation::error::{TickreelError, TickreelResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};
use crate::render::backend::FrameRGBA;
use crate::timeline::scene::EffectsConfig;

/// Apply whole-frame effects in place: vignette first, then chromatic shift.
///
/// Zero intensities leave the frame untouched.
pub fn apply_post(frame: &mut FrameRGBA, effects: &EffectsConfig) -> TickreelResult<()> {
    frame.validate()?;
    if !frame.premultiplied {
        return Err(TickreelError::evaluation(
            "post effects expect premultiplied frames",
        ));
    }
    if effects.vignette > 0.0 {
        vignette(frame, effects.vignette.min(1.0));
    }
    let shift = effects.chromatic_aberration.round();
    if shift.is_finite() && shift.abs() >= 1.0 {
        // any shift past the frame width samples the edge column
        let max = i64::from(frame.width.saturating_sub(1));
        chromatic_shift(frame, (shift as i64).clamp(-max, max));
    }
    Ok(())
}

/// Darken radially: factor `1 - intensity·d²`, `d` = distance to center over half-diagonal.
fn vignette(frame: &mut FrameRGBA, intensity: f64) {
    let (w, h) = (frame.width as usize, frame.height as usize);
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let max_d2 = cx * cx + cy * cy;
    if max_d2 <= 0.0 {
        return;
    }
    for y in 0..h {
        let dy = y as f64 + 0.5 - cy;
        for x in 0..w {
            let dx = x as f64 + 0.5 - cx;
            let d2 = (dx * dx + dy * dy) / max_d2;
            let f = unit_to_u8(1.0 - intensity * d2);
            if f == 255 {
                continue;
            }
            let i = (y * w + x) * 4;
            for c in 0..3 {
                frame.data[i + c] = mul_div255_u8(u16::from(frame.data[i + c]), f);
            }
        }
    }
}

/// Red sampled `+offset` px, blue `-offset` px along x, clamped at the edges.
fn chromatic_shift(frame: &mut FrameRGBA, offset: i64) {
    let (w, h) = (frame.width as usize, frame.height as usize);
    let src = frame.data.clone();
    let max_x = w as i64 - 1;
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let rx = (x as i64).saturating_add(offset).clamp(0, max_x) as usize;
            let bx = (x as i64).saturating_sub(offset).clamp(0, max_x) as usize;
            let i = (row + x) * 4;
            let a = src[i + 3];
            frame.data[i] = src[(row + rx) * 4].min(a);
            frame.data[i + 2] = src[(row + bx) * 4 + 2].min(a);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/post.rs"]
mod tests;
