//! `storekeep-parties` — people records: loyalty customers and employees.

pub mod customer_card;
pub mod employee;

pub use customer_card::{CardNumber, CustomerCard};
pub use employee::Employee;

use storekeep_core::{DomainError, DomainResult};

/// Validate a phone number: `+` followed by exactly 12 digits.
pub fn validate_phone(phone: &str) -> DomainResult<()> {
    let mut chars = phone.chars();
    if chars.next() != Some('+') {
        return Err(DomainError::validation("phone number must start with '+'"));
    }
    let digits: Vec<char> = chars.collect();
    if digits.len() != 12 || !digits.iter().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::validation(
            "phone number must be '+' followed by 12 digits",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_format() {
        assert!(validate_phone("+380456789012").is_ok());
        assert!(validate_phone("380456789012").is_err());
        assert!(validate_phone("+38045678901").is_err());
        assert!(validate_phone("+3804567890ab").is_err());
    }
}
