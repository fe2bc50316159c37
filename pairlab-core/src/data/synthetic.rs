//! Synthetic pair generators.
//!
//! Shocks are drawn uniformly, scaled so their standard deviation equals the
//! requested volatility. The same seed always produces the same series.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const START_PRICE: f64 = 100.0;

/// Two aligned price histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPair {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl SyntheticPair {
    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

/// Shape of a co-integrated pair.
///
/// A follows a geometric random walk from `start_price`. B tracks `ratio * A`
/// with a stationary AR(1) deviation in log space: `u[t] = phi * u[t-1] + e[t]`.
///
/// The defaults start A at 100 with B tracking half of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CointegrationParams {
    pub start_price: f64,
    /// Per-step volatility of A's log returns.
    pub leg_vol: f64,
    pub ratio: f64,
    /// AR(1) coefficient of the deviation; must be in (-1, 1).
    pub phi: f64,
    /// Per-step volatility of the deviation's innovations.
    pub noise_vol: f64,
}

impl Default for CointegrationParams {
    fn default() -> Self {
        Self {
            start_price: START_PRICE,
            leg_vol: 0.01,
            ratio: 0.5,
            phi: 0.8,
            noise_vol: 0.003,
        }
    }
}

/// Uniform shock on `[-vol*sqrt(3), vol*sqrt(3))`, which has stdev `vol`.
fn shock(rng: &mut StdRng, vol: f64) -> f64 {
    if vol <= 0.0 {
        return 0.0;
    }
    let half_width = vol * 3.0_f64.sqrt();
    rng.gen_range(-half_width..half_width)
}

fn random_walk(rng: &mut StdRng, n: usize, start: f64, vol: f64) -> Vec<f64> {
    let mut log_price = start.ln();
    let mut prices = Vec::with_capacity(n);
    for i in 0..n {
        if i > 0 {
            log_price += shock(rng, vol);
        }
        prices.push(log_price.exp());
    }
    prices
}

/// Co-integrated pair with default parameters.
pub fn cointegrated_pair(n: usize, seed: u64) -> SyntheticPair {
    cointegrated_pair_with(n, seed, &CointegrationParams::default())
}

pub fn cointegrated_pair_with(n: usize, seed: u64, params: &CointegrationParams) -> SyntheticPair {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = random_walk(&mut rng, n, params.start_price, params.leg_vol);

    let mut deviation = 0.0_f64;
    let b = a
        .iter()
        .map(|price| {
            deviation = params.phi * deviation + shock(&mut rng, params.noise_vol);
            price * params.ratio * deviation.exp()
        })
        .collect();

    SyntheticPair { a, b }
}

/// Two independent geometric random walks from 100 with 1% per-step volatility.
pub fn independent_walks(n: usize, seed: u64) -> SyntheticPair {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = random_walk(&mut rng, n, START_PRICE, 0.01);
    let b = random_walk(&mut rng, n, START_PRICE, 0.01);
    SyntheticPair { a, b }
}

/// Stable seed derived from a label, e.g. a pair name.
pub fn seed_from_label(label: &str) -> u64 {
    let hash = blake3::hash(label.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
