//! Employee role enumeration.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Role of an employee on the shop floor.
///
/// This is a closed enumeration: the storage layer persists the lowercase
/// string form, and anything outside it is an invariant violation at the
/// decode boundary, never a silently-picked default.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    Cashier,
    Manager,
}

impl EmployeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeRole::Cashier => "cashier",
            EmployeeRole::Manager => "manager",
        }
    }
}

impl core::fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cashier" => Ok(EmployeeRole::Cashier),
            "manager" => Ok(EmployeeRole::Manager),
            other => Err(DomainError::invariant(format!(
                "invalid employee role: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles() {
        assert_eq!("cashier".parse::<EmployeeRole>().unwrap(), EmployeeRole::Cashier);
        assert_eq!("manager".parse::<EmployeeRole>().unwrap(), EmployeeRole::Manager);
    }

    #[test]
    fn rejects_unknown_role() {
        let err = "driver".parse::<EmployeeRole>().unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }
}
