//! Domain types for PairLab.

pub mod series;
pub mod side;
pub mod trade;

pub use series::{align_trailing, Leg, LogPriceSeries, PriceSeries, SeriesError};
pub use side::Side;
pub use trade::{ExitReason, TradeRecord};
