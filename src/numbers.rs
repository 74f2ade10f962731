//! Human-readable reference numbers
//!
//! Orders and quotations get a short reference customers can quote over the phone. They are
//! derived from the creation time plus a random suffix; the stores enforce uniqueness and the
//! orchestrators retry with a fresh number on conflict.

use jiff::Timestamp;
use rand::Rng;

/// Order reference: `WDX` followed by the epoch milliseconds and four random digits.
pub fn order_number(now: Timestamp) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);

    format!("WDX{}{suffix:04}", now.as_millisecond())
}

/// Quotation reference: `QT-` followed by the last eight digits of the epoch milliseconds and
/// four random digits.
pub fn quote_number(now: Timestamp) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    let millis = now.as_millisecond().rem_euclid(100_000_000);

    format!("QT-{millis:08}-{suffix:04}")
}
