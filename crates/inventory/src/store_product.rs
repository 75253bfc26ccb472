//! Store products: a catalog product as stocked on the shelf.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storekeep_core::{DomainError, DomainResult};
use storekeep_products::ProductId;

/// Universal Product Code (exactly 12 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Upc(String);

impl Upc {
    pub const LEN: usize = 12;

    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.chars().count() != Self::LEN {
            return Err(DomainError::invalid_id(format!(
                "UPC must be exactly {} characters, got {:?}",
                Self::LEN,
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Upc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Upc {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Upc {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Upc> for String {
    fn from(value: Upc) -> Self {
        value.0
    }
}

/// A product as stocked in the store.
///
/// `promotional_upc` links a regular item to its promotional counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreProduct {
    pub upc: Upc,
    pub promotional_upc: Option<Upc>,
    pub product_id: ProductId,
    pub selling_price: f64,
    pub quantity: i32,
    pub promotional: bool,
}

impl StoreProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.selling_price < 0.0 {
            return Err(DomainError::validation("selling price must not be negative"));
        }
        if self.quantity < 0 {
            return Err(DomainError::validation("quantity must not be negative"));
        }
        Ok(())
    }

    /// Take `amount` units off the shelf.
    pub fn reduce_stock(&mut self, amount: i32) -> DomainResult<()> {
        if amount <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        if amount > self.quantity {
            return Err(DomainError::validation(format!(
                "insufficient stock for UPC {}: available {}, requested {}",
                self.upc, self.quantity, amount
            )));
        }
        self.quantity -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shelf_item(quantity: i32) -> StoreProduct {
        StoreProduct {
            upc: Upc::new("036000291452").unwrap(),
            promotional_upc: None,
            product_id: ProductId::new(1),
            selling_price: 10.5,
            quantity,
            promotional: false,
        }
    }

    #[test]
    fn upc_requires_exact_width() {
        assert!(Upc::new("036000291452").is_ok());
        assert!(Upc::new("12345").is_err());
    }

    #[test]
    fn reduce_stock_checks_availability() {
        let mut item = shelf_item(3);
        item.reduce_stock(2).unwrap();
        assert_eq!(item.quantity, 1);

        let err = item.reduce_stock(2).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut item = shelf_item(1);
        item.selling_price = -0.01;
        assert!(item.validate().is_err());
    }
}
