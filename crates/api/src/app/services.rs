//! Service wiring: stores, repositories and the authorization components.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use storekeep_auth::{
    AccessEngine, Authenticator, AuthStores, AuthUnitOfWork, Hs256TokenService,
    InMemoryPermissionCache, PermissionCache, PermissionCatalog, RoleAssignments,
    Sha256PasswordHasher,
};
use storekeep_auth::store::{MemoryAuthStore, MemoryUnitOfWork};
use storekeep_infra::auth_store::{PgAuthStore, PgAuthUnitOfWork};
use storekeep_infra::repos::{memory::MemoryRepos, postgres::PgRepos};
use storekeep_infra::{
    CategoryRepo, CheckRepo, CustomerCardRepo, EmployeeRepo, ProductRepo, StoreProductRepo,
};

use crate::config::AppConfig;

/// Everything the route handlers need, wired once at startup.
pub struct AppServices {
    pub engine: AccessEngine,
    pub catalog: PermissionCatalog,
    pub roles: RoleAssignments,
    pub authenticator: Arc<Authenticator>,
    pub auth_stores: AuthStores,
    pub uow: Arc<dyn AuthUnitOfWork>,
    pub cache: Arc<dyn PermissionCache>,

    pub categories: Arc<dyn CategoryRepo>,
    pub products: Arc<dyn ProductRepo>,
    pub store_products: Arc<dyn StoreProductRepo>,
    pub customer_cards: Arc<dyn CustomerCardRepo>,
    pub employees: Arc<dyn EmployeeRepo>,
    pub checks: Arc<dyn CheckRepo>,
}

/// Build services against Postgres (`DATABASE_URL` set) or the in-memory
/// stores (dev/tests).
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
            tracing::info!("connected to postgres");

            let auth_store = PgAuthStore::new(pool.clone());
            let repos = PgRepos::new(pool.clone());

            Ok(assemble(
                config,
                auth_store.stores(),
                Arc::new(PgAuthUnitOfWork::new(pool)),
                repos.categories,
                repos.products,
                repos.store_products,
                repos.customer_cards,
                repos.employees,
                repos.checks,
            ))
        }
        None => {
            let auth_store = MemoryAuthStore::new();
            let repos = MemoryRepos::new();

            Ok(assemble(
                config,
                auth_store.stores(),
                Arc::new(MemoryUnitOfWork::new(auth_store)),
                repos.categories,
                repos.products,
                repos.store_products,
                repos.customer_cards,
                repos.employees,
                repos.checks,
            ))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    config: &AppConfig,
    auth_stores: AuthStores,
    uow: Arc<dyn AuthUnitOfWork>,
    categories: Arc<dyn CategoryRepo>,
    products: Arc<dyn ProductRepo>,
    store_products: Arc<dyn StoreProductRepo>,
    customer_cards: Arc<dyn CustomerCardRepo>,
    employees: Arc<dyn EmployeeRepo>,
    checks: Arc<dyn CheckRepo>,
) -> AppServices {
    let cache: Arc<dyn PermissionCache> = Arc::new(InMemoryPermissionCache::new());

    let tokens = Arc::new(Hs256TokenService::new(
        config.jwt_secret.as_bytes(),
        config.token_ttl,
    ));
    let authenticator = Arc::new(Authenticator::new(
        auth_stores.users.clone(),
        Arc::new(Sha256PasswordHasher),
        tokens,
    ));

    AppServices {
        engine: AccessEngine::from_stores(&auth_stores, cache.clone()),
        catalog: PermissionCatalog::from_stores(&auth_stores, cache.clone()),
        roles: RoleAssignments::from_stores(&auth_stores, cache.clone()),
        authenticator,
        auth_stores,
        uow,
        cache,
        categories,
        products,
        store_products,
        customer_cards,
        employees,
        checks,
    }
}
