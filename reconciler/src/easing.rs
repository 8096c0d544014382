use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::str::FromStr;

/// Decelerating curves only: velocity never increases, like a wheel losing
/// energy to friction.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    OutCubic,
    OutQuart,
    OutSine,
}

impl Easing {
    /// Maps linear progress in [0, 1] to eased progress in [0, 1].
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::OutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::OutSine => (t * FRAC_PI_2).sin(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Easing::OutCubic => "out_cubic",
            Easing::OutQuart => "out_quart",
            Easing::OutSine => "out_sine",
        }
    }
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "out_cubic" | "cubic" => Ok(Easing::OutCubic),
            "out_quart" | "quart" => Ok(Easing::OutQuart),
            "out_sine" | "sine" => Ok(Easing::OutSine),
            other => Err(format!("unknown easing '{}'", other)),
        }
    }
}
