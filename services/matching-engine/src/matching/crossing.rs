//! Crossing detection
//!
//! A taker price crosses a resting price when the fill would be at least
//! as good for the taker: buys reach down to cheaper asks, sells reach up
//! to richer bids. The same predicate drives both limit matching (taker
//! price = the limit) and market matching (taker price = the top-of-book
//! price captured at entry).

use types::numeric::Price;
use types::order::Side;

/// Can an incoming order on `taker_side` at `taker_price` trade against a
/// resting order at `resting_price`?
pub fn crosses(taker_side: Side, taker_price: Price, resting_price: Price) -> bool {
    match taker_side {
        Side::BUY => resting_price <= taker_price,
        Side::SELL => resting_price >= taker_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_crosses_cheaper_ask() {
        assert!(crosses(Side::BUY, Price::from_u64(50), Price::from_u64(49)));
    }

    #[test]
    fn test_equal_prices_cross() {
        let p = Price::from_u64(50);
        assert!(crosses(Side::BUY, p, p));
        assert!(crosses(Side::SELL, p, p));
    }

    #[test]
    fn test_buy_refuses_richer_ask() {
        assert!(!crosses(Side::BUY, Price::from_u64(49), Price::from_u64(51)));
    }

    #[test]
    fn test_sell_crosses_richer_bid() {
        assert!(crosses(Side::SELL, Price::from_u64(49), Price::from_u64(50)));
    }

    #[test]
    fn test_sell_refuses_cheaper_bid() {
        assert!(!crosses(Side::SELL, Price::from_u64(50), Price::from_u64(49)));
    }
}
