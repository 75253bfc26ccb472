//! Checks (receipts) and their sale lines.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storekeep_core::{DomainError, DomainResult, EmployeeId};
use storekeep_inventory::Upc;
use storekeep_parties::CardNumber;

/// Check natural key (exactly 10 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckNumber(String);

impl CheckNumber {
    pub const LEN: usize = 10;

    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.chars().count() != Self::LEN {
            return Err(DomainError::invalid_id(format!(
                "check number must be exactly {} characters, got {:?}",
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

impl core::fmt::Display for CheckNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CheckNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CheckNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CheckNumber> for String {
    fn from(value: CheckNumber) -> Self {
        value.0
    }
}

/// One line of a check: a quantity of one shelf item at the price captured
/// at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub upc: Upc,
    pub quantity: i32,
    pub selling_price: f64,
}

impl Sale {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("sale quantity must be positive"));
        }
        if self.selling_price <= 0.0 {
            return Err(DomainError::validation("sale price must be positive"));
        }
        Ok(())
    }

    pub fn line_total(&self) -> f64 {
        self.selling_price * f64::from(self.quantity)
    }
}

/// A printed check with its sale lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub number: CheckNumber,
    pub employee_id: EmployeeId,
    pub card_number: Option<CardNumber>,
    pub printed_at: DateTime<Utc>,
    pub total: f64,
    pub vat: f64,
    pub sales: Vec<Sale>,
}

impl Check {
    pub fn validate(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.printed_at > now {
            return Err(DomainError::validation("check date cannot be in the future"));
        }
        if self.sales.is_empty() {
            return Err(DomainError::validation("check must have at least one sale"));
        }
        for sale in &self.sales {
            sale.validate()?;
        }
        Ok(())
    }
}

/// VAT charged on the discounted total.
pub const VAT_RATE: f64 = 0.2;

/// Totals of a check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckTotals {
    pub total: f64,
    pub vat: f64,
}

/// Compute a check's totals: sum of line totals, then the loyalty-card
/// discount, then VAT on the discounted amount.
pub fn compute_totals(sales: &[Sale], discount_percent: Option<u8>) -> CheckTotals {
    let base: f64 = sales.iter().map(Sale::line_total).sum();

    let total = match discount_percent {
        Some(percent) => base * (1.0 - f64::from(percent) / 100.0),
        None => base,
    };

    CheckTotals {
        total,
        vat: total * VAT_RATE,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn sale(price: f64, quantity: i32) -> Sale {
        Sale {
            upc: Upc::new("036000291452").unwrap(),
            quantity,
            selling_price: price,
        }
    }

    #[test]
    fn totals_without_discount() {
        let totals = compute_totals(&[sale(10.0, 2), sale(5.0, 1)], None);
        assert!((totals.total - 25.0).abs() < 1e-9);
        assert!((totals.vat - 5.0).abs() < 1e-9);
    }

    #[test]
    fn discount_applies_before_vat() {
        let totals = compute_totals(&[sale(100.0, 1)], Some(10));
        assert!((totals.total - 90.0).abs() < 1e-9);
        assert!((totals.vat - 18.0).abs() < 1e-9);
    }

    #[test]
    fn zero_percent_discount_changes_nothing() {
        let totals = compute_totals(&[sale(42.0, 1)], Some(0));
        assert!((totals.total - 42.0).abs() < 1e-9);
    }

    #[test]
    fn future_checks_are_rejected() {
        let now = Utc::now();
        let check = Check {
            number: CheckNumber::new("1010101010").unwrap(),
            employee_id: EmployeeId::new("0000000001").unwrap(),
            card_number: None,
            printed_at: now + Duration::hours(1),
            total: 10.0,
            vat: 2.0,
            sales: vec![sale(10.0, 1)],
        };
        assert!(check.validate(now).is_err());
    }

    #[test]
    fn checks_need_positive_quantities() {
        let now = Utc::now();
        let check = Check {
            number: CheckNumber::new("1010101010").unwrap(),
            employee_id: EmployeeId::new("0000000001").unwrap(),
            card_number: None,
            printed_at: now,
            total: 0.0,
            vat: 0.0,
            sales: vec![sale(10.0, 0)],
        };
        assert!(check.validate(now).is_err());
    }
}
