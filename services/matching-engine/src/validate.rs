//! Order admission checks
//!
//! Stateless per-order validation with configurable limits. An empty
//! symbol set accepts any non-empty symbol. MARKET orders skip the price
//! range check (they carry no price). STOP is rejected outright: the
//! matching core does not implement it, so it must never get that far.

use thiserror::Error;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType};

/// Validation rejections.
///
/// `InsufficientFunds` and `DuplicateOrderId` are part of the taxonomy but
/// not produced here; funding is settled post-trade and id uniqueness is
/// the book's concern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),
    #[error("invalid quantity: {0}")]
    InvalidQuantity(Quantity),
    #[error("invalid price: {0}")]
    InvalidPrice(Price),
    #[error("market is closed")]
    MarketClosed,
    #[error("unsupported order type: {0:?}")]
    InvalidOrderType(OrderType),
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("duplicate order id")]
    DuplicateOrderId,
}

/// Configurable order validator.
#[derive(Debug, Clone)]
pub struct OrderValidator {
    valid_symbols: Vec<String>,
    min_quantity: Quantity,
    max_quantity: Quantity,
    min_price: Price,
    max_price: Price,
    market_open: bool,
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self {
            valid_symbols: Vec::new(),
            min_quantity: Quantity::from_str("0.01").unwrap_or(Quantity::ZERO),
            max_quantity: Quantity::from_u64(1_000_000),
            min_price: Price::from_str("0.01").unwrap_or(Price::ZERO),
            max_price: Price::from_u64(1_000_000),
            market_open: true,
        }
    }
}

impl OrderValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every admission check, first failure wins.
    pub fn validate(&self, order: &Order) -> Result<(), ValidationError> {
        if !self.market_open {
            return Err(ValidationError::MarketClosed);
        }
        if order.order_type == OrderType::STOP {
            return Err(ValidationError::InvalidOrderType(order.order_type));
        }
        self.validate_symbol(order.symbol.as_str())?;
        self.validate_quantity(order.quantity)?;
        self.validate_price(order.price, order.order_type)?;
        Ok(())
    }

    pub fn validate_symbol(&self, symbol: &str) -> Result<(), ValidationError> {
        let valid = if self.valid_symbols.is_empty() {
            !symbol.is_empty()
        } else {
            self.valid_symbols.iter().any(|s| s == symbol)
        };
        if valid {
            Ok(())
        } else {
            Err(ValidationError::InvalidSymbol(symbol.to_string()))
        }
    }

    pub fn validate_quantity(&self, quantity: Quantity) -> Result<(), ValidationError> {
        if quantity >= self.min_quantity && quantity <= self.max_quantity {
            Ok(())
        } else {
            Err(ValidationError::InvalidQuantity(quantity))
        }
    }

    pub fn validate_price(
        &self,
        price: Price,
        order_type: OrderType,
    ) -> Result<(), ValidationError> {
        if order_type == OrderType::MARKET {
            return Ok(());
        }
        if price >= self.min_price && price <= self.max_price {
            Ok(())
        } else {
            Err(ValidationError::InvalidPrice(price))
        }
    }

    pub fn add_valid_symbol(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if !self.valid_symbols.contains(&symbol) {
            self.valid_symbols.push(symbol);
        }
    }

    pub fn remove_valid_symbol(&mut self, symbol: &str) {
        self.valid_symbols.retain(|s| s != symbol);
    }

    pub fn set_min_quantity(&mut self, min_quantity: Quantity) {
        self.min_quantity = min_quantity;
    }

    pub fn set_max_quantity(&mut self, max_quantity: Quantity) {
        self.max_quantity = max_quantity;
    }

    pub fn set_min_price(&mut self, min_price: Price) {
        self.min_price = min_price;
    }

    pub fn set_max_price(&mut self, max_price: Price) {
        self.max_price = max_price;
    }

    pub fn set_market_open(&mut self, open: bool) {
        self.market_open = open;
    }

    pub fn is_market_open(&self) -> bool {
        self.market_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use types::ids::{OrderId, Symbol, UserId};
    use types::order::Side;

    fn order(order_type: OrderType, qty: &str, price: &str) -> Order {
        Order::new(
            OrderId::new("O1"),
            UserId::new("u1"),
            Symbol::new("AAPL"),
            order_type,
            Side::BUY,
            Quantity::from_str(qty).unwrap(),
            Price::from_str(price).unwrap(),
        )
    }

    #[test]
    fn test_defaults_accept_reasonable_order() {
        let validator = OrderValidator::new();
        assert!(validator.validate(&order(OrderType::LIMIT, "100", "50.0")).is_ok());
    }

    #[test]
    fn test_market_closed_rejects_everything() {
        let mut validator = OrderValidator::new();
        validator.set_market_open(false);
        assert_eq!(
            validator.validate(&order(OrderType::LIMIT, "100", "50.0")),
            Err(ValidationError::MarketClosed)
        );
        assert!(!validator.is_market_open());
    }

    #[test]
    fn test_stop_orders_rejected() {
        let validator = OrderValidator::new();
        assert_eq!(
            validator.validate(&order(OrderType::STOP, "100", "50.0")),
            Err(ValidationError::InvalidOrderType(OrderType::STOP))
        );
    }

    #[test]
    fn test_symbol_allowlist() {
        let mut validator = OrderValidator::new();
        validator.add_valid_symbol("MSFT");
        assert!(matches!(
            validator.validate(&order(OrderType::LIMIT, "100", "50.0")),
            Err(ValidationError::InvalidSymbol(_))
        ));

        validator.add_valid_symbol("AAPL");
        assert!(validator.validate(&order(OrderType::LIMIT, "100", "50.0")).is_ok());

        validator.remove_valid_symbol("AAPL");
        assert!(matches!(
            validator.validate(&order(OrderType::LIMIT, "100", "50.0")),
            Err(ValidationError::InvalidSymbol(_))
        ));
    }

    #[rstest]
    #[case("0.001", false)]
    #[case("0.01", true)]
    #[case("500", true)]
    #[case("1000000", true)]
    #[case("1000001", false)]
    fn test_quantity_range(#[case] qty: &str, #[case] ok: bool) {
        let validator = OrderValidator::new();
        let result = validator.validate_quantity(Quantity::from_str(qty).unwrap());
        assert_eq!(result.is_ok(), ok, "quantity {qty}");
    }

    #[rstest]
    #[case("0.001", false)]
    #[case("0.01", true)]
    #[case("50", true)]
    #[case("1000000", true)]
    #[case("2000000", false)]
    fn test_price_range_for_limit(#[case] price: &str, #[case] ok: bool) {
        let validator = OrderValidator::new();
        let result = validator.validate_price(Price::from_str(price).unwrap(), OrderType::LIMIT);
        assert_eq!(result.is_ok(), ok, "price {price}");
    }

    #[test]
    fn test_market_orders_skip_price_check() {
        let validator = OrderValidator::new();
        // Market order price is stored as zero, far below min_price.
        assert!(validator
            .validate(&order(OrderType::MARKET, "100", "0.0"))
            .is_ok());
    }

    #[test]
    fn test_custom_limits() {
        let mut validator = OrderValidator::new();
        validator.set_min_quantity(Quantity::from_u64(10));
        validator.set_max_quantity(Quantity::from_u64(100));
        validator.set_min_price(Price::from_u64(5));
        validator.set_max_price(Price::from_u64(500));

        assert!(validator.validate(&order(OrderType::LIMIT, "10", "5")).is_ok());
        assert!(matches!(
            validator.validate(&order(OrderType::LIMIT, "9", "5")),
            Err(ValidationError::InvalidQuantity(_))
        ));
        assert!(matches!(
            validator.validate(&order(OrderType::LIMIT, "10", "501")),
            Err(ValidationError::InvalidPrice(_))
        ));
    }
}
