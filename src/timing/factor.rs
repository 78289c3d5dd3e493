use crate::error::{PalfixError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An exact speed-correction ratio.
///
/// Stored in lowest terms, so `50/48` and `25/24` compare equal. Both
/// components are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RationalFactor {
    numerator: u64,
    denominator: u64,
}

impl RationalFactor {
    /// 25 fps broadcast back to 24 fps film.
    pub const PAL: RationalFactor = RationalFactor {
        numerator: 25,
        denominator: 24,
    };

    pub fn new(numerator: i64, denominator: i64) -> Result<Self> {
        if numerator <= 0 || denominator <= 0 {
            return Err(PalfixError::InvalidFactor(format!(
                "{numerator}/{denominator}: both parts must be positive"
            )));
        }

        let (n, d) = (numerator as u64, denominator as u64);
        let g = gcd(n, d);

        Ok(Self {
            numerator: n / g,
            denominator: d / g,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// The reciprocal factor.
    pub fn invert(&self) -> Self {
        Self {
            numerator: self.denominator,
            denominator: self.numerator,
        }
    }

    /// `x * num / den`, multiplying before dividing.
    pub fn apply(&self, x: f64) -> f64 {
        x * self.numerator as f64 / self.denominator as f64
    }

    /// Exact integer rescale of a millisecond count, truncated toward zero.
    ///
    /// Saturates at `u64::MAX` instead of wrapping.
    pub fn apply_millis(&self, ms: u64) -> u64 {
        let scaled = ms as u128 * self.numerator as u128 / self.denominator as u128;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    pub fn is_identity(&self) -> bool {
        self.numerator == self.denominator
    }
}

impl Default for RationalFactor {
    fn default() -> Self {
        Self::PAL
    }
}

impl fmt::Display for RationalFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for RationalFactor {
    type Err = PalfixError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((num, den)) => (num.trim(), den.trim()),
            None => (s, "1"),
        };

        let parse = |part: &str| {
            part.parse::<i64>()
                .map_err(|e| PalfixError::InvalidFactor(format!("'{s}': {e}")))
        };

        Self::new(parse(num)?, parse(den)?)
    }
}

impl Serialize for RationalFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RationalFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
