//! Confidence scores and the two fusion rules used when observations merge

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default confidence of a freshly observed entity or relationship
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A belief score in `[0, 1]`
///
/// Construction is the only place the range is checked; every operation on
/// a `Confidence` keeps the value inside the range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Create a confidence, rejecting NaN and anything outside `[0, 1]`
    pub fn new(value: f64) -> Result<Self> {
        check_unit_interval("confidence", value)?;
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Weighted blend used for entities: `(1 - w) * self + w * incoming`
    pub fn blend(self, incoming: Confidence, weight: Weight) -> Self {
        let w = weight.value();
        Self(((1.0 - w) * self.0 + w * incoming.0).clamp(0.0, 1.0))
    }

    /// Asymptotic reinforcement used for relationships: `min(1, c + w * (1 - c))`
    pub fn reinforce(self, weight: Weight) -> Self {
        Self((self.0 + weight.value() * (1.0 - self.0)).min(1.0))
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(DEFAULT_CONFIDENCE)
    }
}

impl TryFrom<f64> for Confidence {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Blend factor applied to an incoming observation, in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Weight(f64);

impl Weight {
    pub fn new(value: f64) -> Result<Self> {
        check_unit_interval("merge weight", value)?;
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self(0.3)
    }
}

impl TryFrom<f64> for Weight {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Weight> for f64 {
    fn from(w: Weight) -> Self {
        w.0
    }
}

fn check_unit_interval(what: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::validation(format!(
            "{} {} is out of range [0.0, 1.0]",
            what, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_checked() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(1.01).is_err());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(f64::NAN).is_err());
        assert!(Weight::new(2.0).is_err());
    }

    #[test]
    fn test_blend_is_exact_weighted_average() {
        let grid = [0.0, 0.1, 0.25, 0.5, 0.7, 0.9, 1.0];
        for &c0 in &grid {
            for &c1 in &grid {
                for &w in &grid {
                    let blended = Confidence::new(c0)
                        .unwrap()
                        .blend(Confidence::new(c1).unwrap(), Weight::new(w).unwrap());
                    let expected = ((1.0 - w) * c0 + w * c1).clamp(0.0, 1.0);
                    assert_eq!(blended.value(), expected);
                }
            }
        }
    }

    #[test]
    fn test_reinforce_never_decreases() {
        let mut c = Confidence::new(0.5).unwrap();
        let w = Weight::default();
        for _ in 0..50 {
            let next = c.reinforce(w);
            assert!(next.value() >= c.value());
            assert!(next.value() <= 1.0);
            c = next;
        }
        assert!((Confidence::new(0.5).unwrap().reinforce(w).value() - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        let ok: Confidence = serde_json::from_str("0.8").unwrap();
        assert_eq!(ok.value(), 0.8);
        assert!(serde_json::from_str::<Confidence>("1.5").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "0.8");
    }
}
