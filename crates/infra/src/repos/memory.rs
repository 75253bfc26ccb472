//! In-memory repositories for tests/dev. Not optimized for performance.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use storekeep_core::{EmployeeId, EmployeeRole};
use storekeep_inventory::{StoreProduct, Upc};
use storekeep_parties::{CardNumber, CustomerCard, Employee};
use storekeep_products::{Category, CategoryId, Product, ProductId};
use storekeep_sales::{Check, CheckNumber};

use super::{
    CategoryRepo, CheckFilter, CheckRepo, CustomerCardRepo, EmployeeRepo, NewProduct, Page,
    ProductRepo, RepoError, RepoResult, StoreProductRepo,
};

fn lock_err() -> RepoError {
    RepoError::Backend("lock poisoned".to_string())
}

fn window<T: Clone>(items: Vec<T>, page: Page) -> Vec<T> {
    let offset = usize::try_from(page.offset.max(0)).unwrap_or(0);
    let iter = items.into_iter().skip(offset);
    match page.limit {
        Some(limit) => iter.take(usize::try_from(limit.max(0)).unwrap_or(0)).collect(),
        None => iter.collect(),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Bundle of in-memory repositories sharing shelf stock with the check repo.
#[derive(Clone)]
pub struct MemoryRepos {
    pub categories: Arc<MemoryCategoryRepo>,
    pub products: Arc<MemoryProductRepo>,
    pub store_products: Arc<MemoryStoreProductRepo>,
    pub customer_cards: Arc<MemoryCustomerCardRepo>,
    pub employees: Arc<MemoryEmployeeRepo>,
    pub checks: Arc<MemoryCheckRepo>,
}

impl MemoryRepos {
    pub fn new() -> Self {
        let store_products = Arc::new(MemoryStoreProductRepo::default());
        Self {
            categories: Arc::new(MemoryCategoryRepo::default()),
            products: Arc::new(MemoryProductRepo::default()),
            store_products: store_products.clone(),
            customer_cards: Arc::new(MemoryCustomerCardRepo::default()),
            employees: Arc::new(MemoryEmployeeRepo::default()),
            checks: Arc::new(MemoryCheckRepo::new(store_products)),
        }
    }
}

impl Default for MemoryRepos {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryCategoryRepo {
    inner: RwLock<(Vec<Category>, i64)>,
}

impl MemoryCategoryRepo {
    fn filtered(&self, search: Option<&str>) -> RepoResult<Vec<Category>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state
            .0
            .iter()
            .filter(|c| search.is_none_or(|s| contains_ci(&c.name, s)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CategoryRepo for MemoryCategoryRepo {
    async fn list(&self, search: Option<&str>, page: Page) -> RepoResult<Vec<Category>> {
        let mut items = self.filtered(search)?;
        items.sort_by_key(|c| c.number);
        Ok(window(items, page))
    }

    async fn count(&self, search: Option<&str>) -> RepoResult<i64> {
        Ok(self.filtered(search)?.len() as i64)
    }

    async fn get(&self, number: CategoryId) -> RepoResult<Option<Category>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state.0.iter().find(|c| c.number == number).cloned())
    }

    async fn create(&self, name: &str) -> RepoResult<Category> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        if state.0.iter().any(|c| c.name == name) {
            return Err(RepoError::AlreadyExists);
        }
        state.1 += 1;
        let category = Category {
            number: CategoryId::new(state.1),
            name: name.to_string(),
        };
        state.0.push(category.clone());
        Ok(category)
    }

    async fn update(&self, number: CategoryId, name: &str) -> RepoResult<Category> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        let category = state
            .0
            .iter_mut()
            .find(|c| c.number == number)
            .ok_or(RepoError::NotFound)?;
        category.name = name.to_string();
        Ok(category.clone())
    }

    async fn delete(&self, number: CategoryId) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.0.retain(|c| c.number != number);
        Ok(())
    }

    async fn delete_many(&self, numbers: &[CategoryId]) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.0.retain(|c| !numbers.contains(&c.number));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryProductRepo {
    inner: RwLock<(Vec<Product>, i64)>,
}

impl MemoryProductRepo {
    fn filtered(&self, search: Option<&str>, category: Option<CategoryId>) -> RepoResult<Vec<Product>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state
            .0
            .iter()
            .filter(|p| {
                search.is_none_or(|s| contains_ci(&p.name, s))
                    && category.is_none_or(|c| p.category == c)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductRepo for MemoryProductRepo {
    async fn list(
        &self,
        search: Option<&str>,
        category: Option<CategoryId>,
        page: Page,
    ) -> RepoResult<Vec<Product>> {
        let mut items = self.filtered(search, category)?;
        items.sort_by_key(|p| p.id);
        Ok(window(items, page))
    }

    async fn count(&self, search: Option<&str>, category: Option<CategoryId>) -> RepoResult<i64> {
        Ok(self.filtered(search, category)?.len() as i64)
    }

    async fn get(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state.0.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, product: NewProduct) -> RepoResult<Product> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.1 += 1;
        let product = Product {
            id: ProductId::new(state.1),
            category: product.category,
            name: product.name,
            characteristics: product.characteristics,
        };
        state.0.push(product.clone());
        Ok(product)
    }

    async fn update(&self, product: &Product) -> RepoResult<Product> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        let slot = state
            .0
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(RepoError::NotFound)?;
        *slot = product.clone();
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.0.retain(|p| p.id != id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[ProductId]) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.0.retain(|p| !ids.contains(&p.id));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store products
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStoreProductRepo {
    inner: RwLock<Vec<StoreProduct>>,
}

impl MemoryStoreProductRepo {
    fn filtered(&self, promotional: Option<bool>) -> RepoResult<Vec<StoreProduct>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state
            .iter()
            .filter(|i| promotional.is_none_or(|p| i.promotional == p))
            .cloned()
            .collect())
    }

    fn reduce_stock(&self, upc: &Upc, amount: i32) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        let item = state
            .iter_mut()
            .find(|i| &i.upc == upc)
            .ok_or(RepoError::NotFound)?;
        if item.quantity < amount {
            return Err(RepoError::InsufficientStock(upc.as_str().to_string()));
        }
        item.quantity -= amount;
        Ok(())
    }
}

#[async_trait]
impl StoreProductRepo for MemoryStoreProductRepo {
    async fn list(&self, promotional: Option<bool>, page: Page) -> RepoResult<Vec<StoreProduct>> {
        let mut items = self.filtered(promotional)?;
        items.sort_by(|a, b| a.upc.cmp(&b.upc));
        Ok(window(items, page))
    }

    async fn count(&self, promotional: Option<bool>) -> RepoResult<i64> {
        Ok(self.filtered(promotional)?.len() as i64)
    }

    async fn get(&self, upc: &Upc) -> RepoResult<Option<StoreProduct>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state.iter().find(|i| &i.upc == upc).cloned())
    }

    async fn create(&self, item: &StoreProduct) -> RepoResult<StoreProduct> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        if state.iter().any(|i| i.upc == item.upc) {
            return Err(RepoError::AlreadyExists);
        }
        state.push(item.clone());
        Ok(item.clone())
    }

    async fn update(&self, item: &StoreProduct) -> RepoResult<StoreProduct> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        let slot = state
            .iter_mut()
            .find(|i| i.upc == item.upc)
            .ok_or(RepoError::NotFound)?;
        *slot = item.clone();
        Ok(item.clone())
    }

    async fn delete(&self, upc: &Upc) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.retain(|i| &i.upc != upc);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer cards
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryCustomerCardRepo {
    inner: RwLock<Vec<CustomerCard>>,
}

impl MemoryCustomerCardRepo {
    fn filtered(&self, search: Option<&str>) -> RepoResult<Vec<CustomerCard>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state
            .iter()
            .filter(|c| search.is_none_or(|s| contains_ci(&c.surname, s)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CustomerCardRepo for MemoryCustomerCardRepo {
    async fn list(&self, search: Option<&str>, page: Page) -> RepoResult<Vec<CustomerCard>> {
        let mut items = self.filtered(search)?;
        items.sort_by(|a, b| a.card_number.cmp(&b.card_number));
        Ok(window(items, page))
    }

    async fn count(&self, search: Option<&str>) -> RepoResult<i64> {
        Ok(self.filtered(search)?.len() as i64)
    }

    async fn get(&self, card_number: &CardNumber) -> RepoResult<Option<CustomerCard>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state.iter().find(|c| &c.card_number == card_number).cloned())
    }

    async fn create(&self, card: &CustomerCard) -> RepoResult<CustomerCard> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        if state.iter().any(|c| c.card_number == card.card_number) {
            return Err(RepoError::AlreadyExists);
        }
        state.push(card.clone());
        Ok(card.clone())
    }

    async fn update(&self, card: &CustomerCard) -> RepoResult<CustomerCard> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        let slot = state
            .iter_mut()
            .find(|c| c.card_number == card.card_number)
            .ok_or(RepoError::NotFound)?;
        *slot = card.clone();
        Ok(card.clone())
    }

    async fn delete(&self, card_number: &CardNumber) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.retain(|c| &c.card_number != card_number);
        Ok(())
    }

    async fn delete_many(&self, card_numbers: &[CardNumber]) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.retain(|c| !card_numbers.contains(&c.card_number));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employees
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryEmployeeRepo {
    inner: RwLock<Vec<Employee>>,
}

impl MemoryEmployeeRepo {
    fn filtered(
        &self,
        search: Option<&str>,
        role: Option<EmployeeRole>,
    ) -> RepoResult<Vec<Employee>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state
            .iter()
            .filter(|e| {
                search.is_none_or(|s| contains_ci(&e.surname, s))
                    && role.is_none_or(|r| e.role == r)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EmployeeRepo for MemoryEmployeeRepo {
    async fn list(
        &self,
        search: Option<&str>,
        role: Option<EmployeeRole>,
        page: Page,
    ) -> RepoResult<Vec<Employee>> {
        let mut items = self.filtered(search, role)?;
        items.sort_by(|a, b| a.surname.cmp(&b.surname));
        Ok(window(items, page))
    }

    async fn count(&self, search: Option<&str>, role: Option<EmployeeRole>) -> RepoResult<i64> {
        Ok(self.filtered(search, role)?.len() as i64)
    }

    async fn get(&self, id: &EmployeeId) -> RepoResult<Option<Employee>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state.iter().find(|e| &e.id == id).cloned())
    }

    async fn create(&self, employee: &Employee) -> RepoResult<Employee> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        if state.iter().any(|e| e.id == employee.id) {
            return Err(RepoError::AlreadyExists);
        }
        state.push(employee.clone());
        Ok(employee.clone())
    }

    async fn update(&self, employee: &Employee) -> RepoResult<Employee> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        let slot = state
            .iter_mut()
            .find(|e| e.id == employee.id)
            .ok_or(RepoError::NotFound)?;
        *slot = employee.clone();
        Ok(employee.clone())
    }

    async fn delete(&self, id: &EmployeeId) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.retain(|e| &e.id != id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[EmployeeId]) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.retain(|e| !ids.contains(&e.id));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Checks
// ─────────────────────────────────────────────────────────────────────────────

pub struct MemoryCheckRepo {
    inner: RwLock<Vec<Check>>,
    store_products: Arc<MemoryStoreProductRepo>,
}

impl MemoryCheckRepo {
    pub fn new(store_products: Arc<MemoryStoreProductRepo>) -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
            store_products,
        }
    }

    fn filtered(&self, filter: &CheckFilter) -> RepoResult<Vec<Check>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state
            .iter()
            .filter(|c| {
                filter.date_from.is_none_or(|from| c.printed_at >= from)
                    && filter.date_to.is_none_or(|to| c.printed_at <= to)
                    && filter
                        .employee_id
                        .as_ref()
                        .is_none_or(|id| &c.employee_id == id)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CheckRepo for MemoryCheckRepo {
    async fn list(&self, filter: &CheckFilter, page: Page) -> RepoResult<Vec<Check>> {
        let mut items = self.filtered(filter)?;
        items.sort_by(|a, b| b.printed_at.cmp(&a.printed_at));
        Ok(window(items, page))
    }

    async fn count(&self, filter: &CheckFilter) -> RepoResult<i64> {
        Ok(self.filtered(filter)?.len() as i64)
    }

    async fn get(&self, number: &CheckNumber) -> RepoResult<Option<Check>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state.iter().find(|c| &c.number == number).cloned())
    }

    async fn create(&self, check: &Check) -> RepoResult<Check> {
        // Not transactional: stock decrements are applied one by one and are
        // not rolled back if a later line fails (test double).
        {
            let state = self.inner.read().map_err(|_| lock_err())?;
            if state.iter().any(|c| c.number == check.number) {
                return Err(RepoError::AlreadyExists);
            }
        }

        for sale in &check.sales {
            self.store_products.reduce_stock(&sale.upc, sale.quantity)?;
        }

        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.push(check.clone());
        Ok(check.clone())
    }

    async fn delete(&self, number: &CheckNumber) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.retain(|c| &c.number != number);
        Ok(())
    }

    async fn delete_many(&self, numbers: &[CheckNumber]) -> RepoResult<()> {
        let mut state = self.inner.write().map_err(|_| lock_err())?;
        state.retain(|c| !numbers.contains(&c.number));
        Ok(())
    }

    async fn list_numbers(&self) -> RepoResult<Vec<CheckNumber>> {
        let state = self.inner.read().map_err(|_| lock_err())?;
        Ok(state.iter().map(|c| c.number.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use storekeep_sales::Sale;

    use super::*;

    fn shelf_item(upc: &str, quantity: i32) -> StoreProduct {
        StoreProduct {
            upc: Upc::new(upc).unwrap(),
            promotional_upc: None,
            product_id: ProductId::new(1),
            selling_price: 12.5,
            quantity,
            promotional: false,
        }
    }

    fn check(number: &str, upc: &str, quantity: i32) -> Check {
        Check {
            number: CheckNumber::new(number).unwrap(),
            employee_id: EmployeeId::new("0000000001").unwrap(),
            card_number: None,
            printed_at: Utc::now(),
            total: 25.0,
            vat: 5.0,
            sales: vec![Sale {
                upc: Upc::new(upc).unwrap(),
                quantity,
                selling_price: 12.5,
            }],
        }
    }

    #[tokio::test]
    async fn creating_check_decrements_stock() {
        let repos = MemoryRepos::new();
        repos
            .store_products
            .create(&shelf_item("036000291452", 5))
            .await
            .unwrap();

        repos
            .checks
            .create(&check("1010101010", "036000291452", 2))
            .await
            .unwrap();

        let left = repos
            .store_products
            .get(&Upc::new("036000291452").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(left.quantity, 3);
    }

    #[tokio::test]
    async fn overselling_is_rejected() {
        let repos = MemoryRepos::new();
        repos
            .store_products
            .create(&shelf_item("036000291452", 1))
            .await
            .unwrap();

        let err = repos
            .checks
            .create(&check("1010101010", "036000291452", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InsufficientStock(_)));
    }

    #[tokio::test]
    async fn category_names_are_unique() {
        let repos = MemoryRepos::new();
        repos.categories.create("Dairy").await.unwrap();
        let err = repos.categories.create("Dairy").await.unwrap_err();
        assert_eq!(err, RepoError::AlreadyExists);
    }

    #[tokio::test]
    async fn employee_list_filters_by_role_and_surname() {
        use chrono::NaiveDate;

        let repos = MemoryRepos::new();
        let mut employee = Employee {
            id: EmployeeId::new("0000000001").unwrap(),
            surname: "Shevchenko".to_string(),
            name: "Petro".to_string(),
            patronymic: None,
            role: EmployeeRole::Cashier,
            salary: 18000.0,
            date_of_birth: NaiveDate::from_ymd_opt(2000, 5, 15).unwrap(),
            date_of_start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            phone: "+380456789012".to_string(),
            city: "Kyiv".to_string(),
            street: "Khreshchatyk".to_string(),
            zip_code: "01001".to_string(),
        };
        repos.employees.create(&employee).await.unwrap();

        employee.id = EmployeeId::new("0000000002").unwrap();
        employee.surname = "Bondarenko".to_string();
        employee.role = EmployeeRole::Manager;
        repos.employees.create(&employee).await.unwrap();

        let cashiers = repos
            .employees
            .list(None, Some(EmployeeRole::Cashier), Page::all())
            .await
            .unwrap();
        assert_eq!(cashiers.len(), 1);
        assert_eq!(cashiers[0].surname, "Shevchenko");

        let found = repos
            .employees
            .list(Some("bond"), None, Page::all())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].role, EmployeeRole::Manager);
    }
}
