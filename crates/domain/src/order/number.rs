use chrono::NaiveDate;
use rand::Rng;

/// Builds an order number: `LS`, the order date as `YYYYMMDD`, then a random
/// suffix in 1000..=9999.
///
/// Numbers are not guaranteed unique; the store rejects duplicates and the
/// caller draws again.
pub fn generate_order_number<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> String {
    format!("LS{}{}", date.format("%Y%m%d"), rng.gen_range(1000..=9999))
}
