//! Employee records.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use storekeep_core::{DomainError, DomainResult, EmployeeId, EmployeeRole};

use crate::validate_phone;

/// An employee on the store's payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub surname: String,
    pub name: String,
    pub patronymic: Option<String>,
    pub role: EmployeeRole,
    pub salary: f64,
    pub date_of_birth: NaiveDate,
    pub date_of_start: NaiveDate,
    pub phone: String,
    pub city: String,
    pub street: String,
    pub zip_code: String,
}

impl Employee {
    pub fn validate(&self) -> DomainResult<()> {
        if self.surname.trim().is_empty() || self.name.trim().is_empty() {
            return Err(DomainError::validation(
                "employee surname and name must not be empty",
            ));
        }
        if self.salary < 0.0 {
            return Err(DomainError::validation("salary must not be negative"));
        }
        validate_phone(&self.phone)?;

        let zip_len = self.zip_code.chars().count();
        if !(5..=9).contains(&zip_len) {
            return Err(DomainError::validation("zip code must be 5..=9 characters"));
        }

        // At least 18 years old on the starting date.
        let threshold = adulthood_threshold(self.date_of_start);
        if self.date_of_birth > threshold {
            return Err(DomainError::validation(format!(
                "employee must be at least 18 years old at the date of start ({})",
                self.date_of_start
            )));
        }
        Ok(())
    }
}

fn adulthood_threshold(start: NaiveDate) -> NaiveDate {
    // Feb 29 starts fall back to Feb 28 in non-leap target years.
    start
        .with_year(start.year() - 18)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(start.year() - 18, 2, 28).expect("valid date"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(birth: (i32, u32, u32), start: (i32, u32, u32)) -> Employee {
        Employee {
            id: EmployeeId::new("0000000001").unwrap(),
            surname: "Shevchenko".to_string(),
            name: "Petro".to_string(),
            patronymic: Some("Ivanovych".to_string()),
            role: EmployeeRole::Cashier,
            salary: 18000.0,
            date_of_birth: NaiveDate::from_ymd_opt(birth.0, birth.1, birth.2).unwrap(),
            date_of_start: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            phone: "+380456789012".to_string(),
            city: "Kyiv".to_string(),
            street: "Khreshchatyk".to_string(),
            zip_code: "01001".to_string(),
        }
    }

    #[test]
    fn adult_employee_passes() {
        assert!(employee((2000, 5, 15), (2024, 6, 1)).validate().is_ok());
    }

    #[test]
    fn minor_at_start_is_rejected() {
        let err = employee((2010, 5, 15), (2024, 6, 1)).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn exactly_eighteen_on_start_date_passes() {
        assert!(employee((2006, 6, 1), (2024, 6, 1)).validate().is_ok());
    }

    #[test]
    fn negative_salary_is_rejected() {
        let mut e = employee((2000, 5, 15), (2024, 6, 1));
        e.salary = -1.0;
        assert!(e.validate().is_err());
    }
}
