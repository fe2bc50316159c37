//! Side of the pair position.

use serde::{Deserialize, Serialize};

/// Direction of a pair position.
///
/// `LongShort` is long the underlying (A) and short `beta` units of the hedge
/// (B); it is the bet that the spread rises. `ShortLong` is the mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Flat,
    LongShort,
    ShortLong,
}

impl Side {
    pub fn is_flat(self) -> bool {
        matches!(self, Side::Flat)
    }

    /// Sign of the A leg: +1 long, -1 short, 0 flat. The B leg has the opposite sign.
    pub fn leg_sign(self) -> f64 {
        match self {
            Side::Flat => 0.0,
            Side::LongShort => 1.0,
            Side::ShortLong => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Flat => "flat",
            Side::LongShort => "long_short",
            Side::ShortLong => "short_long",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
