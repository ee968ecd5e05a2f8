/// Named easing curves. Every curve maps `[0,1]` onto `[0,1]` with `f(0)=0` and `f(1)=1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// `t`.
    #[default]
    #[serde(rename = "linear")]
    Linear,
    /// `t²`.
    #[serde(rename = "easeInQuad")]
    InQuad,
    /// `1 - (1-t)²`.
    #[serde(rename = "easeOutQuad")]
    OutQuad,
    /// Quadratic in, then out.
    #[serde(rename = "easeInOutQuad")]
    InOutQuad,
    /// `t³`.
    #[serde(rename = "easeInCubic")]
    InCubic,
    /// `1 - (1-t)³`.
    #[serde(rename = "easeOutCubic")]
    OutCubic,
    /// Cubic in, then out.
    #[serde(rename = "easeInOutCubic")]
    InOutCubic,
    /// Exponential in; exactly 0 at `t = 0`.
    #[serde(rename = "easeInExpo")]
    InExpo,
    /// Exponential out; exactly 1 at `t = 1`.
    #[serde(rename = "easeOutExpo")]
    OutExpo,
    /// Exponential in, then out.
    #[serde(rename = "easeInOutExpo")]
    InOutExpo,
}

impl Ease {
    /// Every curve, in declaration order.
    pub const ALL: [Ease; 10] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::InExpo,
        Self::OutExpo,
        Self::InOutExpo,
    ];

    /// Evaluate the curve at `t`, clamped to `[0,1]` (NaN reads as 0).
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Self::OutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::InOutExpo => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
        }
    }

    /// Look up a curve by its manifest name (`"linear"`, `"easeOutQuad"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Manifest name, e.g. `easeOutQuad`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::InQuad => "easeInQuad",
            Self::OutQuad => "easeOutQuad",
            Self::InOutQuad => "easeInOutQuad",
            Self::InCubic => "easeInCubic",
            Self::OutCubic => "easeOutCubic",
            Self::InOutCubic => "easeInOutCubic",
            Self::InExpo => "easeInExpo",
            Self::OutExpo => "easeOutExpo",
            Self::InOutExpo => "easeInOutExpo",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
