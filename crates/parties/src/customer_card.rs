//! Customer loyalty cards.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storekeep_core::{DomainError, DomainResult};

use crate::validate_phone;

/// Loyalty card natural key (1–13 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardNumber(String);

impl CardNumber {
    pub const MAX_LEN: usize = 13;

    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let len = value.chars().count();
        if len == 0 || len > Self::MAX_LEN {
            return Err(DomainError::invalid_id(format!(
                "card number must be 1..={} characters, got {:?}",
                Self::MAX_LEN,
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CardNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CardNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CardNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CardNumber> for String {
    fn from(value: CardNumber) -> Self {
        value.0
    }
}

/// A customer's loyalty card, carrying their personal discount percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCard {
    pub card_number: CardNumber,
    pub surname: String,
    pub name: String,
    pub patronymic: Option<String>,
    pub phone: String,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
    pub percent: u8,
}

impl CustomerCard {
    pub fn validate(&self) -> DomainResult<()> {
        if self.surname.trim().is_empty() || self.name.trim().is_empty() {
            return Err(DomainError::validation(
                "customer surname and name must not be empty",
            ));
        }
        validate_phone(&self.phone)?;
        if self.percent > 100 {
            return Err(DomainError::validation("discount percent must be 0..=100"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(percent: u8) -> CustomerCard {
        CustomerCard {
            card_number: CardNumber::new("1234567890123").unwrap(),
            surname: "Kovalenko".to_string(),
            name: "Olena".to_string(),
            patronymic: None,
            phone: "+380456789012".to_string(),
            city: Some("Kyiv".to_string()),
            street: None,
            zip_code: None,
            percent,
        }
    }

    #[test]
    fn card_number_bounds() {
        assert!(CardNumber::new("").is_err());
        assert!(CardNumber::new("1").is_ok());
        assert!(CardNumber::new("12345678901234").is_err());
    }

    #[test]
    fn percent_is_bounded() {
        assert!(card(15).validate().is_ok());
        assert!(card(101).validate().is_err());
    }
}
