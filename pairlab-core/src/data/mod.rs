//! Deterministic synthetic price data for tests, benches and demos.

pub mod synthetic;

pub use synthetic::{
    cointegrated_pair, cointegrated_pair_with, independent_walks, seed_from_label,
    CointegrationParams, SyntheticPair,
};
