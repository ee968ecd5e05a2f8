//! Property values handed to blueprints.
//!
//! Prop bags are closed: a value is a number, a string, a color or a boolean. JSON input is
//! converted at the boundary; `#rrggbb` and `#rrggbbaa` strings become colors, any other JSON shape
//! (null, arrays, objects) is rejected.

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{TickreelError, TickreelResult};
use std::collections::BTreeMap;

/// Named property bag, ordered by key for deterministic iteration.
pub type Props = BTreeMap<String, PropValue>;

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Build a color from straight-alpha channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(s: &str) -> TickreelResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| TickreelError::validation(format!("color '{s}' must start with '#'")))?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TickreelError::validation(format!(
                "color '{s}' must be #rrggbb or #rrggbbaa"
            )));
        }
        let byte = |i: usize| -> TickreelResult<u8> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| TickreelError::validation(format!("color '{s}': {e}")))
        };
        let a = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, a))
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Premultiplied copy for compositing.
    pub fn premultiplied(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }
}

fn looks_like_color(s: &str) -> bool {
    s.starts_with('#')
        && (s.len() == 7 || s.len() == 9)
        && s[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// A single property value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum PropValue {
    /// Finite number; interpolated by keyframes.
    Number(f64),
    /// Free-form string.
    Str(String),
    /// Color written as a hex string in JSON.
    Color(Color),
    /// Boolean flag.
    Bool(bool),
}

impl PropValue {
    /// Number value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// String value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Color value, if this is a color.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Color(_) => "color",
            Self::Bool(_) => "bool",
        }
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<Color> for PropValue {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl TryFrom<serde_json::Value> for PropValue {
    type Error = TickreelError;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(Self::Number)
                .ok_or_else(|| TickreelError::validation(format!("number {n} is not finite"))),
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::String(s) if looks_like_color(&s) => {
                Color::parse_hex(&s).map(Self::Color)
            }
            serde_json::Value::String(s) => Ok(Self::Str(s)),
            other => Err(TickreelError::validation(format!(
                "unsupported property value {other}; expected number, string, color or bool"
            ))),
        }
    }
}

impl From<PropValue> for serde_json::Value {
    fn from(v: PropValue) -> Self {
        match v {
            PropValue::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropValue::Str(s) => serde_json::Value::String(s),
            PropValue::Color(c) => serde_json::Value::String(c.to_hex()),
            PropValue::Bool(b) => serde_json::Value::Bool(b),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/value.rs"]
mod tests;
