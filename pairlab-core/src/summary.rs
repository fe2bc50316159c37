//! Human-readable rendering of the latest signal.

use crate::domain::Side;
use crate::signal::Signal;

/// Trade template for the most recent signal, e.g. `"Long KO / Short 0.87×PEP"`.
///
/// `LongShort` buys A and sells beta units of B, `ShortLong` the reverse.
/// A flat signal renders as `"Flat"`.
pub fn trade_template(signal: &Signal, label_a: &str, label_b: &str) -> String {
    match signal.side {
        Side::Flat => "Flat".to_string(),
        Side::LongShort => format!("Long {label_a} / Short {:.2}×{label_b}", signal.beta),
        Side::ShortLong => format!("Short {label_a} / Long {:.2}×{label_b}", signal.beta),
    }
}
