//! Request/response DTOs and JSON mapping helpers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use storekeep_auth::User;
use storekeep_core::{EmployeeId, UserId};
use storekeep_products::CategoryId;

/// Paginated listing envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, skip: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        Self {
            data,
            total,
            page: skip / limit + 1,
            page_size: limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Common list query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

impl ListQuery {
    /// Effective page size (default 10, capped at 1000).
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 1000)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// User view without the credential hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub is_superuser: bool,
    pub employee_id: Option<EmployeeId>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_superuser: user.is_superuser,
            employee_id: user.employee_id.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub category: CategoryId,
    pub name: String,
    pub characteristics: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest<T> {
    pub ids: Vec<T>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Checks
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCheckRequest {
    pub number: String,
    pub employee_id: String,
    pub card_number: Option<String>,
    pub printed_at: DateTime<Utc>,
    pub sales: Vec<CreateSaleRequest>,
}

/// Requested line; the selling price is captured server-side at checkout.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub upc: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckListQuery {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub employee_id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Employees
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EmployeeRequest {
    pub id: String,
    pub surname: String,
    pub name: String,
    pub patronymic: Option<String>,
    pub role: String,
    pub salary: f64,
    pub date_of_birth: NaiveDate,
    pub date_of_start: NaiveDate,
    pub phone: String,
    pub city: String,
    pub street: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeListQuery {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub role: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignEmployeeRequest {
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_superuser: bool,
}
