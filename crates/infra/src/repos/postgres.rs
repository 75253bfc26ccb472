//! Postgres-backed domain repositories.
//!
//! Unique violations (`23505`) map to [`RepoError::AlreadyExists`]; rows that
//! fail domain decoding (e.g. an employee role outside the enumeration)
//! surface as [`RepoError::InvalidRow`] rather than being silently coerced.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use storekeep_core::{EmployeeId, EmployeeRole};
use storekeep_inventory::{StoreProduct, Upc};
use storekeep_parties::{CardNumber, CustomerCard, Employee};
use storekeep_products::{Category, CategoryId, Product, ProductId};
use storekeep_sales::{Check, CheckNumber, Sale};

use super::{
    CategoryRepo, CheckFilter, CheckRepo, CustomerCardRepo, EmployeeRepo, NewProduct, Page,
    ProductRepo, RepoError, RepoResult, StoreProductRepo,
};

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                return RepoError::AlreadyExists;
            }
            RepoError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::RowNotFound => RepoError::NotFound,
        other => RepoError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn decode_err(e: sqlx::Error) -> RepoError {
    RepoError::Backend(format!("failed to decode row: {e}"))
}

fn invalid_row(e: impl core::fmt::Display) -> RepoError {
    RepoError::InvalidRow(e.to_string())
}

fn page_clause(page: Page) -> String {
    match page.limit {
        Some(limit) => format!(" LIMIT {} OFFSET {}", limit.max(0), page.offset.max(0)),
        None if page.offset > 0 => format!(" OFFSET {}", page.offset),
        None => String::new(),
    }
}

/// Bundle of Postgres repositories over one connection pool.
#[derive(Clone)]
pub struct PgRepos {
    pub categories: Arc<PgCategoryRepo>,
    pub products: Arc<PgProductRepo>,
    pub store_products: Arc<PgStoreProductRepo>,
    pub customer_cards: Arc<PgCustomerCardRepo>,
    pub employees: Arc<PgEmployeeRepo>,
    pub checks: Arc<PgCheckRepo>,
}

impl PgRepos {
    pub fn new(pool: PgPool) -> Self {
        Self {
            categories: Arc::new(PgCategoryRepo { pool: pool.clone() }),
            products: Arc::new(PgProductRepo { pool: pool.clone() }),
            store_products: Arc::new(PgStoreProductRepo { pool: pool.clone() }),
            customer_cards: Arc::new(PgCustomerCardRepo { pool: pool.clone() }),
            employees: Arc::new(PgEmployeeRepo { pool: pool.clone() }),
            checks: Arc::new(PgCheckRepo { pool }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

pub struct PgCategoryRepo {
    pool: PgPool,
}

fn category_from_row(row: &PgRow) -> RepoResult<Category> {
    Ok(Category {
        number: CategoryId::new(row.try_get::<i64, _>("number").map_err(decode_err)?),
        name: row.try_get("name").map_err(decode_err)?,
    })
}

#[async_trait]
impl CategoryRepo for PgCategoryRepo {
    async fn list(&self, search: Option<&str>, page: Page) -> RepoResult<Vec<Category>> {
        let sql = format!(
            "SELECT number, name FROM category \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%') \
             ORDER BY number{}",
            page_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(search)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("category.list", e))?;
        rows.iter().map(category_from_row).collect()
    }

    async fn count(&self, search: Option<&str>) -> RepoResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM category \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')",
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("category.count", e))?;
        row.try_get::<i64, _>("n").map_err(decode_err)
    }

    async fn get(&self, number: CategoryId) -> RepoResult<Option<Category>> {
        let row = sqlx::query("SELECT number, name FROM category WHERE number = $1")
            .bind(number.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("category.get", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn create(&self, name: &str) -> RepoResult<Category> {
        let row = sqlx::query("INSERT INTO category (name) VALUES ($1) RETURNING number, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("category.create", e))?;
        category_from_row(&row)
    }

    async fn update(&self, number: CategoryId, name: &str) -> RepoResult<Category> {
        let row = sqlx::query(
            "UPDATE category SET name = $2 WHERE number = $1 RETURNING number, name",
        )
        .bind(number.as_i64())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("category.update", e))?
        .ok_or(RepoError::NotFound)?;
        category_from_row(&row)
    }

    async fn delete(&self, number: CategoryId) -> RepoResult<()> {
        sqlx::query("DELETE FROM category WHERE number = $1")
            .bind(number.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("category.delete", e))?;
        Ok(())
    }

    async fn delete_many(&self, numbers: &[CategoryId]) -> RepoResult<()> {
        let raw: Vec<i64> = numbers.iter().map(|n| n.as_i64()).collect();
        sqlx::query("DELETE FROM category WHERE number = ANY($1)")
            .bind(&raw)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("category.delete_many", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

pub struct PgProductRepo {
    pool: PgPool,
}

fn product_from_row(row: &PgRow) -> RepoResult<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get::<i64, _>("id").map_err(decode_err)?),
        category: CategoryId::new(row.try_get::<i64, _>("category_number").map_err(decode_err)?),
        name: row.try_get("name").map_err(decode_err)?,
        characteristics: row.try_get("characteristics").map_err(decode_err)?,
    })
}

#[async_trait]
impl ProductRepo for PgProductRepo {
    async fn list(
        &self,
        search: Option<&str>,
        category: Option<CategoryId>,
        page: Page,
    ) -> RepoResult<Vec<Product>> {
        let sql = format!(
            "SELECT id, category_number, name, characteristics FROM product \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%') \
               AND ($2::bigint IS NULL OR category_number = $2) \
             ORDER BY id{}",
            page_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(search)
            .bind(category.map(|c| c.as_i64()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product.list", e))?;
        rows.iter().map(product_from_row).collect()
    }

    async fn count(&self, search: Option<&str>, category: Option<CategoryId>) -> RepoResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM product \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%') \
               AND ($2::bigint IS NULL OR category_number = $2)",
        )
        .bind(search)
        .bind(category.map(|c| c.as_i64()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product.count", e))?;
        row.try_get::<i64, _>("n").map_err(decode_err)
    }

    async fn get(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, category_number, name, characteristics FROM product WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product.get", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn create(&self, product: NewProduct) -> RepoResult<Product> {
        let row = sqlx::query(
            "INSERT INTO product (category_number, name, characteristics) \
             VALUES ($1, $2, $3) \
             RETURNING id, category_number, name, characteristics",
        )
        .bind(product.category.as_i64())
        .bind(&product.name)
        .bind(&product.characteristics)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product.create", e))?;
        product_from_row(&row)
    }

    async fn update(&self, product: &Product) -> RepoResult<Product> {
        let row = sqlx::query(
            "UPDATE product SET category_number = $2, name = $3, characteristics = $4 \
             WHERE id = $1 \
             RETURNING id, category_number, name, characteristics",
        )
        .bind(product.id.as_i64())
        .bind(product.category.as_i64())
        .bind(&product.name)
        .bind(&product.characteristics)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product.update", e))?
        .ok_or(RepoError::NotFound)?;
        product_from_row(&row)
    }

    async fn delete(&self, id: ProductId) -> RepoResult<()> {
        sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product.delete", e))?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[ProductId]) -> RepoResult<()> {
        let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        sqlx::query("DELETE FROM product WHERE id = ANY($1)")
            .bind(&raw)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product.delete_many", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store products
// ─────────────────────────────────────────────────────────────────────────────

pub struct PgStoreProductRepo {
    pool: PgPool,
}

fn store_product_from_row(row: &PgRow) -> RepoResult<StoreProduct> {
    let upc: String = row.try_get("upc").map_err(decode_err)?;
    let promotional_upc: Option<String> = row.try_get("promotional_upc").map_err(decode_err)?;
    Ok(StoreProduct {
        upc: Upc::new(upc).map_err(invalid_row)?,
        promotional_upc: promotional_upc
            .map(Upc::new)
            .transpose()
            .map_err(invalid_row)?,
        product_id: ProductId::new(row.try_get::<i64, _>("product_id").map_err(decode_err)?),
        selling_price: row.try_get("selling_price").map_err(decode_err)?,
        quantity: row.try_get("quantity").map_err(decode_err)?,
        promotional: row.try_get("promotional").map_err(decode_err)?,
    })
}

const STORE_PRODUCT_COLS: &str =
    "upc, promotional_upc, product_id, selling_price, quantity, promotional";

#[async_trait]
impl StoreProductRepo for PgStoreProductRepo {
    async fn list(&self, promotional: Option<bool>, page: Page) -> RepoResult<Vec<StoreProduct>> {
        let sql = format!(
            "SELECT {STORE_PRODUCT_COLS} FROM store_product \
             WHERE ($1::boolean IS NULL OR promotional = $1) \
             ORDER BY upc{}",
            page_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(promotional)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("store_product.list", e))?;
        rows.iter().map(store_product_from_row).collect()
    }

    async fn count(&self, promotional: Option<bool>) -> RepoResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM store_product \
             WHERE ($1::boolean IS NULL OR promotional = $1)",
        )
        .bind(promotional)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("store_product.count", e))?;
        row.try_get::<i64, _>("n").map_err(decode_err)
    }

    async fn get(&self, upc: &Upc) -> RepoResult<Option<StoreProduct>> {
        let sql = format!("SELECT {STORE_PRODUCT_COLS} FROM store_product WHERE upc = $1");
        let row = sqlx::query(&sql)
            .bind(upc.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("store_product.get", e))?;
        row.as_ref().map(store_product_from_row).transpose()
    }

    async fn create(&self, item: &StoreProduct) -> RepoResult<StoreProduct> {
        let sql = format!(
            "INSERT INTO store_product ({STORE_PRODUCT_COLS}) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {STORE_PRODUCT_COLS}"
        );
        let row = sqlx::query(&sql)
            .bind(item.upc.as_str())
            .bind(item.promotional_upc.as_ref().map(|u| u.as_str().to_string()))
            .bind(item.product_id.as_i64())
            .bind(item.selling_price)
            .bind(item.quantity)
            .bind(item.promotional)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("store_product.create", e))?;
        store_product_from_row(&row)
    }

    async fn update(&self, item: &StoreProduct) -> RepoResult<StoreProduct> {
        let sql = format!(
            "UPDATE store_product \
             SET promotional_upc = $2, product_id = $3, selling_price = $4, \
                 quantity = $5, promotional = $6 \
             WHERE upc = $1 \
             RETURNING {STORE_PRODUCT_COLS}"
        );
        let row = sqlx::query(&sql)
            .bind(item.upc.as_str())
            .bind(item.promotional_upc.as_ref().map(|u| u.as_str().to_string()))
            .bind(item.product_id.as_i64())
            .bind(item.selling_price)
            .bind(item.quantity)
            .bind(item.promotional)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("store_product.update", e))?
            .ok_or(RepoError::NotFound)?;
        store_product_from_row(&row)
    }

    async fn delete(&self, upc: &Upc) -> RepoResult<()> {
        sqlx::query("DELETE FROM store_product WHERE upc = $1")
            .bind(upc.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("store_product.delete", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer cards
// ─────────────────────────────────────────────────────────────────────────────

pub struct PgCustomerCardRepo {
    pool: PgPool,
}

fn card_from_row(row: &PgRow) -> RepoResult<CustomerCard> {
    let card_number: String = row.try_get("card_number").map_err(decode_err)?;
    let percent: i32 = row.try_get("percent").map_err(decode_err)?;
    Ok(CustomerCard {
        card_number: CardNumber::new(card_number).map_err(invalid_row)?,
        surname: row.try_get("surname").map_err(decode_err)?,
        name: row.try_get("name").map_err(decode_err)?,
        patronymic: row.try_get("patronymic").map_err(decode_err)?,
        phone: row.try_get("phone").map_err(decode_err)?,
        city: row.try_get("city").map_err(decode_err)?,
        street: row.try_get("street").map_err(decode_err)?,
        zip_code: row.try_get("zip_code").map_err(decode_err)?,
        percent: u8::try_from(percent).map_err(|_| invalid_row("percent out of range"))?,
    })
}

const CARD_COLS: &str =
    "card_number, surname, name, patronymic, phone, city, street, zip_code, percent";

#[async_trait]
impl CustomerCardRepo for PgCustomerCardRepo {
    async fn list(&self, search: Option<&str>, page: Page) -> RepoResult<Vec<CustomerCard>> {
        let sql = format!(
            "SELECT {CARD_COLS} FROM customer_card \
             WHERE ($1::text IS NULL OR surname ILIKE '%' || $1 || '%') \
             ORDER BY card_number{}",
            page_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(search)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("customer_card.list", e))?;
        rows.iter().map(card_from_row).collect()
    }

    async fn count(&self, search: Option<&str>) -> RepoResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM customer_card \
             WHERE ($1::text IS NULL OR surname ILIKE '%' || $1 || '%')",
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("customer_card.count", e))?;
        row.try_get::<i64, _>("n").map_err(decode_err)
    }

    async fn get(&self, card_number: &CardNumber) -> RepoResult<Option<CustomerCard>> {
        let sql = format!("SELECT {CARD_COLS} FROM customer_card WHERE card_number = $1");
        let row = sqlx::query(&sql)
            .bind(card_number.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("customer_card.get", e))?;
        row.as_ref().map(card_from_row).transpose()
    }

    async fn create(&self, card: &CustomerCard) -> RepoResult<CustomerCard> {
        let sql = format!(
            "INSERT INTO customer_card ({CARD_COLS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {CARD_COLS}"
        );
        let row = sqlx::query(&sql)
            .bind(card.card_number.as_str())
            .bind(&card.surname)
            .bind(&card.name)
            .bind(&card.patronymic)
            .bind(&card.phone)
            .bind(&card.city)
            .bind(&card.street)
            .bind(&card.zip_code)
            .bind(i32::from(card.percent))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("customer_card.create", e))?;
        card_from_row(&row)
    }

    async fn update(&self, card: &CustomerCard) -> RepoResult<CustomerCard> {
        let sql = format!(
            "UPDATE customer_card \
             SET surname = $2, name = $3, patronymic = $4, phone = $5, \
                 city = $6, street = $7, zip_code = $8, percent = $9 \
             WHERE card_number = $1 \
             RETURNING {CARD_COLS}"
        );
        let row = sqlx::query(&sql)
            .bind(card.card_number.as_str())
            .bind(&card.surname)
            .bind(&card.name)
            .bind(&card.patronymic)
            .bind(&card.phone)
            .bind(&card.city)
            .bind(&card.street)
            .bind(&card.zip_code)
            .bind(i32::from(card.percent))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("customer_card.update", e))?
            .ok_or(RepoError::NotFound)?;
        card_from_row(&row)
    }

    async fn delete(&self, card_number: &CardNumber) -> RepoResult<()> {
        sqlx::query("DELETE FROM customer_card WHERE card_number = $1")
            .bind(card_number.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("customer_card.delete", e))?;
        Ok(())
    }

    async fn delete_many(&self, card_numbers: &[CardNumber]) -> RepoResult<()> {
        let raw: Vec<String> = card_numbers.iter().map(|c| c.as_str().to_string()).collect();
        sqlx::query("DELETE FROM customer_card WHERE card_number = ANY($1)")
            .bind(&raw)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("customer_card.delete_many", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employees
// ─────────────────────────────────────────────────────────────────────────────

pub struct PgEmployeeRepo {
    pool: PgPool,
}

fn employee_from_row(row: &PgRow) -> RepoResult<Employee> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let role: String = row.try_get("role").map_err(decode_err)?;
    Ok(Employee {
        id: EmployeeId::new(id).map_err(invalid_row)?,
        surname: row.try_get("surname").map_err(decode_err)?,
        name: row.try_get("name").map_err(decode_err)?,
        patronymic: row.try_get("patronymic").map_err(decode_err)?,
        role: role.parse::<EmployeeRole>().map_err(invalid_row)?,
        salary: row.try_get("salary").map_err(decode_err)?,
        date_of_birth: row.try_get("date_of_birth").map_err(decode_err)?,
        date_of_start: row.try_get("date_of_start").map_err(decode_err)?,
        phone: row.try_get("phone").map_err(decode_err)?,
        city: row.try_get("city").map_err(decode_err)?,
        street: row.try_get("street").map_err(decode_err)?,
        zip_code: row.try_get("zip_code").map_err(decode_err)?,
    })
}

const EMPLOYEE_COLS: &str = "id, surname, name, patronymic, role, salary, \
                             date_of_birth, date_of_start, phone, city, street, zip_code";

#[async_trait]
impl EmployeeRepo for PgEmployeeRepo {
    async fn list(
        &self,
        search: Option<&str>,
        role: Option<EmployeeRole>,
        page: Page,
    ) -> RepoResult<Vec<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLS} FROM employee \
             WHERE ($1::text IS NULL OR surname ILIKE '%' || $1 || '%') \
               AND ($2::text IS NULL OR role = $2) \
             ORDER BY surname{}",
            page_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(search)
            .bind(role.map(|r| r.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee.list", e))?;
        rows.iter().map(employee_from_row).collect()
    }

    async fn count(&self, search: Option<&str>, role: Option<EmployeeRole>) -> RepoResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM employee \
             WHERE ($1::text IS NULL OR surname ILIKE '%' || $1 || '%') \
               AND ($2::text IS NULL OR role = $2)",
        )
        .bind(search)
        .bind(role.map(|r| r.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("employee.count", e))?;
        row.try_get::<i64, _>("n").map_err(decode_err)
    }

    async fn get(&self, id: &EmployeeId) -> RepoResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLS} FROM employee WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee.get", e))?;
        row.as_ref().map(employee_from_row).transpose()
    }

    async fn create(&self, employee: &Employee) -> RepoResult<Employee> {
        let sql = format!(
            "INSERT INTO employee ({EMPLOYEE_COLS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {EMPLOYEE_COLS}"
        );
        let row = sqlx::query(&sql)
            .bind(employee.id.as_str())
            .bind(&employee.surname)
            .bind(&employee.name)
            .bind(&employee.patronymic)
            .bind(employee.role.as_str())
            .bind(employee.salary)
            .bind(employee.date_of_birth)
            .bind(employee.date_of_start)
            .bind(&employee.phone)
            .bind(&employee.city)
            .bind(&employee.street)
            .bind(&employee.zip_code)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee.create", e))?;
        employee_from_row(&row)
    }

    async fn update(&self, employee: &Employee) -> RepoResult<Employee> {
        let sql = format!(
            "UPDATE employee \
             SET surname = $2, name = $3, patronymic = $4, role = $5, salary = $6, \
                 date_of_birth = $7, date_of_start = $8, phone = $9, city = $10, \
                 street = $11, zip_code = $12 \
             WHERE id = $1 \
             RETURNING {EMPLOYEE_COLS}"
        );
        let row = sqlx::query(&sql)
            .bind(employee.id.as_str())
            .bind(&employee.surname)
            .bind(&employee.name)
            .bind(&employee.patronymic)
            .bind(employee.role.as_str())
            .bind(employee.salary)
            .bind(employee.date_of_birth)
            .bind(employee.date_of_start)
            .bind(&employee.phone)
            .bind(&employee.city)
            .bind(&employee.street)
            .bind(&employee.zip_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee.update", e))?
            .ok_or(RepoError::NotFound)?;
        employee_from_row(&row)
    }

    async fn delete(&self, id: &EmployeeId) -> RepoResult<()> {
        sqlx::query("DELETE FROM employee WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee.delete", e))?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[EmployeeId]) -> RepoResult<()> {
        let raw: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        sqlx::query("DELETE FROM employee WHERE id = ANY($1)")
            .bind(&raw)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee.delete_many", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Checks
// ─────────────────────────────────────────────────────────────────────────────

pub struct PgCheckRepo {
    pool: PgPool,
}

fn check_header_from_row(row: &PgRow) -> RepoResult<Check> {
    let number: String = row.try_get("number").map_err(decode_err)?;
    let employee_id: String = row.try_get("employee_id").map_err(decode_err)?;
    let card_number: Option<String> = row.try_get("card_number").map_err(decode_err)?;
    Ok(Check {
        number: CheckNumber::new(number).map_err(invalid_row)?,
        employee_id: EmployeeId::new(employee_id).map_err(invalid_row)?,
        card_number: card_number
            .map(CardNumber::new)
            .transpose()
            .map_err(invalid_row)?,
        printed_at: row.try_get("printed_at").map_err(decode_err)?,
        total: row.try_get("total").map_err(decode_err)?,
        vat: row.try_get("vat").map_err(decode_err)?,
        sales: Vec::new(),
    })
}

fn sale_from_row(row: &PgRow) -> RepoResult<Sale> {
    let upc: String = row.try_get("upc").map_err(decode_err)?;
    Ok(Sale {
        upc: Upc::new(upc).map_err(invalid_row)?,
        quantity: row.try_get("quantity").map_err(decode_err)?,
        selling_price: row.try_get("selling_price").map_err(decode_err)?,
    })
}

const CHECK_COLS: &str = "number, employee_id, card_number, printed_at, total, vat";

impl PgCheckRepo {
    async fn load_sales(&self, check: &mut Check) -> RepoResult<()> {
        let rows = sqlx::query(
            "SELECT upc, quantity, selling_price FROM sale WHERE check_number = $1 ORDER BY upc",
        )
        .bind(check.number.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("check.load_sales", e))?;
        check.sales = rows.iter().map(sale_from_row).collect::<RepoResult<_>>()?;
        Ok(())
    }
}

#[async_trait]
impl CheckRepo for PgCheckRepo {
    async fn list(&self, filter: &CheckFilter, page: Page) -> RepoResult<Vec<Check>> {
        let sql = format!(
            "SELECT {CHECK_COLS} FROM store_check \
             WHERE ($1::timestamptz IS NULL OR printed_at >= $1) \
               AND ($2::timestamptz IS NULL OR printed_at <= $2) \
               AND ($3::text IS NULL OR employee_id = $3) \
             ORDER BY printed_at DESC{}",
            page_clause(page)
        );
        let rows = sqlx::query(&sql)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(filter.employee_id.as_ref().map(|e| e.as_str().to_string()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check.list", e))?;

        let mut checks: Vec<Check> = rows
            .iter()
            .map(check_header_from_row)
            .collect::<RepoResult<_>>()?;
        for check in &mut checks {
            self.load_sales(check).await?;
        }
        Ok(checks)
    }

    async fn count(&self, filter: &CheckFilter) -> RepoResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM store_check \
             WHERE ($1::timestamptz IS NULL OR printed_at >= $1) \
               AND ($2::timestamptz IS NULL OR printed_at <= $2) \
               AND ($3::text IS NULL OR employee_id = $3)",
        )
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(filter.employee_id.as_ref().map(|e| e.as_str().to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("check.count", e))?;
        row.try_get::<i64, _>("n").map_err(decode_err)
    }

    async fn get(&self, number: &CheckNumber) -> RepoResult<Option<Check>> {
        let sql = format!("SELECT {CHECK_COLS} FROM store_check WHERE number = $1");
        let row = sqlx::query(&sql)
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check.get", e))?;

        match row {
            Some(row) => {
                let mut check = check_header_from_row(&row)?;
                self.load_sales(&mut check).await?;
                Ok(Some(check))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, check: &Check) -> RepoResult<Check> {
        // Header, lines and stock decrements commit or roll back together.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("check.begin", e))?;

        sqlx::query(
            "INSERT INTO store_check (number, employee_id, card_number, printed_at, total, vat) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(check.number.as_str())
        .bind(check.employee_id.as_str())
        .bind(check.card_number.as_ref().map(|c| c.as_str().to_string()))
        .bind(check.printed_at)
        .bind(check.total)
        .bind(check.vat)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("check.insert", e))?;

        for sale in &check.sales {
            sqlx::query(
                "INSERT INTO sale (check_number, upc, quantity, selling_price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(check.number.as_str())
            .bind(sale.upc.as_str())
            .bind(sale.quantity)
            .bind(sale.selling_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("check.insert_sale", e))?;

            let updated = sqlx::query(
                "UPDATE store_product SET quantity = quantity - $2 \
                 WHERE upc = $1 AND quantity >= $2",
            )
            .bind(sale.upc.as_str())
            .bind(sale.quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("check.reduce_stock", e))?;

            if updated.rows_affected() == 0 {
                // Insufficient stock or unknown UPC; the transaction drops
                // here and everything rolls back.
                return Err(RepoError::InsufficientStock(sale.upc.as_str().to_string()));
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("check.commit", e))?;

        Ok(check.clone())
    }

    async fn delete(&self, number: &CheckNumber) -> RepoResult<()> {
        sqlx::query("DELETE FROM store_check WHERE number = $1")
            .bind(number.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check.delete", e))?;
        Ok(())
    }

    async fn delete_many(&self, numbers: &[CheckNumber]) -> RepoResult<()> {
        let raw: Vec<String> = numbers.iter().map(|n| n.as_str().to_string()).collect();
        sqlx::query("DELETE FROM store_check WHERE number = ANY($1)")
            .bind(&raw)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check.delete_many", e))?;
        Ok(())
    }

    async fn list_numbers(&self) -> RepoResult<Vec<CheckNumber>> {
        let rows = sqlx::query("SELECT number FROM store_check ORDER BY number")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check.list_numbers", e))?;
        rows.iter()
            .map(|row| {
                let number: String = row.try_get("number").map_err(decode_err)?;
                CheckNumber::new(number).map_err(invalid_row)
            })
            .collect()
    }
}
