//! Price and log-price series for one leg of the pair.
//!
//! Prices are validated on construction: every value must be finite and
//! strictly positive, otherwise the log transform would contaminate the
//! regression with NaN or -inf.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which leg of the pair a series belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    /// The underlying (regressand).
    A,
    /// The hedge (regressor).
    B,
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::A => f.write_str("A"),
            Leg::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("leg {leg}: price at index {index} must be finite and > 0 (got {value})")]
    InvalidPrice { leg: Leg, index: usize, value: f64 },
}

/// Ordered, strictly positive prices for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    leg: Leg,
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(leg: Leg, prices: Vec<f64>) -> Result<Self, SeriesError> {
        if let Some((index, &value)) = prices
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.is_finite() && **p > 0.0))
        {
            return Err(SeriesError::InvalidPrice { leg, index, value });
        }
        Ok(Self { leg, prices })
    }

    pub fn leg(&self) -> Leg {
        self.leg
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn to_log(&self) -> LogPriceSeries {
        LogPriceSeries {
            leg: self.leg,
            values: self.prices.iter().map(|p| p.ln()).collect(),
        }
    }
}

/// Natural log of a validated [`PriceSeries`]. Always finite.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPriceSeries {
    leg: Leg,
    values: Vec<f64>,
}

impl LogPriceSeries {
    pub fn leg(&self) -> Leg {
        self.leg
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// History up to and including index `t`.
    pub fn history(&self, t: usize) -> &[f64] {
        &self.values[..=t]
    }

    /// Log return over `(t-1, t]`. Zero at `t == 0`.
    pub fn log_return(&self, t: usize) -> f64 {
        if t == 0 {
            return 0.0;
        }
        self.values[t] - self.values[t - 1]
    }
}

/// Align two series on their most recent observations.
///
/// Returns the trailing overlap of both slices; the longer one loses its
/// oldest points.
pub fn align_trailing<'a>(a: &'a [f64], b: &'a [f64]) -> (&'a [f64], &'a [f64]) {
    let n = a.len().min(b.len());
    (&a[a.len() - n..], &b[b.len() - n..])
}
