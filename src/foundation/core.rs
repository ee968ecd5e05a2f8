//! Ticks, frame rates, canvases and pixel types.

use crate::foundation::error::{TickreelError, TickreelResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Discrete frame index; the unit of time for all scheduling.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Tick(pub u64);

/// Half-open tick range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TickRange {
    /// Inclusive range start.
    pub start: Tick,
    /// Exclusive range end.
    pub end: Tick, // exclusive
}

impl TickRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: Tick, end: Tick) -> TickreelResult<Self> {
        if start.0 > end.0 {
            return Err(TickreelError::validation("TickRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of ticks in the range.
    pub fn len_ticks(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Return `true` when the range has no ticks.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Return `true` when `t` is inside `[start, end)`.
    pub fn contains(self, t: Tick) -> bool {
        self.start.0 <= t.0 && t.0 < self.end.0
    }

    /// Iterate the ticks of the range in order.
    pub fn iter(self) -> impl Iterator<Item = Tick> {
        (self.start.0..self.end.0).map(Tick)
    }
}

/// Rational frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds).
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated rate with non-zero numerator and denominator.
    pub fn new(num: u32, den: u32) -> TickreelResult<Self> {
        if den == 0 {
            return Err(TickreelError::config("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(TickreelError::config("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// `ceil(secs × fps)`, ignoring float noise below one part in a billion of a tick.
    pub fn total_ticks(self, secs: f64) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        let exact = secs * self.as_f64();
        (exact - 1e-9).ceil().max(0.0) as u64
    }
}

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Center point of the canvas.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Size of one RGBA8 frame in bytes.
    pub fn byte_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red, premultiplied.
    pub r: u8,
    /// Green, premultiplied.
    pub g: u8,
    /// Blue, premultiplied.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Premultiply a straight-alpha color with rounding.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// `[r, g, b, a]` bytes.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
