//! Product categories.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storekeep_core::{DomainError, DomainResult};

/// Category surrogate key (storage-assigned sequence).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(i64);

impl CategoryId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for CategoryId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for CategoryId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<i64>()
            .map_err(|e| DomainError::invalid_id(format!("CategoryId: {e}")))?;
        Ok(Self(value))
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub number: CategoryId,
    pub name: String,
}

pub const NAME_MAX: usize = 50;

/// Validate a category name for create/update.
pub fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("category name must not be empty"));
    }
    if name.chars().count() > NAME_MAX {
        return Err(DomainError::validation(format!(
            "category name must be at most {NAME_MAX} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_name() {
        assert!(validate_name("Dairy").is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized_names() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }
}
