//! Postgres-backed auth storage.
//!
//! One adapter type implements every collaborator trait; it runs either
//! directly against the pool or bound to a single open transaction (the
//! unit-of-work path used by the employee-role synchronizer).
//!
//! Error mapping: unique violations (`23505`) become
//! [`StoreError::AlreadyExists`] so the catalog/group layers can treat them
//! as "already exists"; everything else surfaces as
//! [`StoreError::Backend`] and propagates unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction};
use tokio::sync::Mutex;

use storekeep_auth::permission::PermissionRecord;
use storekeep_auth::store::{
    AuthStores, AuthTransaction, AuthUnitOfWork, GroupGrant, GroupPermissionStore, GroupRecord,
    GroupStore, Membership, MembershipStore, PermissionFilter, PermissionStore, StoreError,
    StoreResult, UserFilter, UserStore,
};
use storekeep_auth::user::{NewUser, User};
use storekeep_core::{EmployeeId, GroupId, PermissionId, UserId};

type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// Where this adapter's queries run.
#[derive(Clone)]
enum PgHandle {
    Pool(PgPool),
    Tx(SharedTx),
}

enum ConnGuard<'a> {
    Pool(sqlx::pool::PoolConnection<Postgres>),
    Tx(tokio::sync::MutexGuard<'a, Option<Transaction<'static, Postgres>>>),
}

impl PgHandle {
    async fn acquire(&self) -> StoreResult<ConnGuard<'_>> {
        match self {
            PgHandle::Pool(pool) => {
                let conn = pool
                    .acquire()
                    .await
                    .map_err(|e| map_sqlx_error("acquire", e))?;
                Ok(ConnGuard::Pool(conn))
            }
            PgHandle::Tx(tx) => Ok(ConnGuard::Tx(tx.lock().await)),
        }
    }
}

impl ConnGuard<'_> {
    fn conn(&mut self) -> StoreResult<&mut PgConnection> {
        match self {
            ConnGuard::Pool(conn) => Ok(&mut **conn),
            ConnGuard::Tx(guard) => guard
                .as_mut()
                .map(|tx| &mut **tx)
                .ok_or(StoreError::TransactionClosed),
        }
    }
}

/// Postgres adapter for all five auth storage contracts.
pub struct PgAuthStore {
    handle: PgHandle,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self {
            handle: PgHandle::Pool(pool),
        })
    }

    fn for_tx(tx: SharedTx) -> Arc<Self> {
        Arc::new(Self {
            handle: PgHandle::Tx(tx),
        })
    }

    /// Bundle of store handles all backed by this adapter.
    pub fn stores(self: &Arc<Self>) -> AuthStores {
        AuthStores {
            permissions: self.clone(),
            groups: self.clone(),
            memberships: self.clone(),
            group_permissions: self.clone(),
            users: self.clone(),
        }
    }
}

fn permission_from_row(row: &sqlx::postgres::PgRow) -> StoreResult<PermissionRecord> {
    Ok(PermissionRecord {
        id: PermissionId::new(row.try_get::<i64, _>("id").map_err(decode_err)?),
        resource_type: row.try_get("resource_type").map_err(decode_err)?,
        codename: row.try_get("codename").map_err(decode_err)?,
    })
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> StoreResult<User> {
    let employee_id: Option<String> = row.try_get("employee_id").map_err(decode_err)?;
    let employee_id = employee_id
        .map(EmployeeId::new)
        .transpose()
        .map_err(|e| StoreError::Backend(format!("invalid employee id in user row: {e}")))?;

    Ok(User {
        id: UserId::new(row.try_get::<i64, _>("id").map_err(decode_err)?),
        username: row.try_get("username").map_err(decode_err)?,
        password_hash: row.try_get("password_hash").map_err(decode_err)?,
        is_superuser: row.try_get("is_superuser").map_err(decode_err)?,
        employee_id,
    })
}

fn decode_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to decode row: {e}"))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::AlreadyExists;
            }
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

#[async_trait]
impl PermissionStore for PgAuthStore {
    async fn search(&self, filter: &PermissionFilter) -> StoreResult<Vec<PermissionRecord>> {
        let mut guard = self.handle.acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, resource_type, codename
            FROM auth_permission
            WHERE ($1::text IS NULL OR resource_type = $1)
              AND ($2::text IS NULL OR codename = $2)
            ORDER BY id
            "#,
        )
        .bind(filter.resource_type.as_deref())
        .bind(filter.codename.as_deref())
        .fetch_all(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("permission.search", e))?;

        rows.iter().map(permission_from_row).collect()
    }

    async fn create(&self, resource_type: &str, codename: &str) -> StoreResult<PermissionRecord> {
        let mut guard = self.handle.acquire().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO auth_permission (resource_type, codename)
            VALUES ($1, $2)
            RETURNING id, resource_type, codename
            "#,
        )
        .bind(resource_type)
        .bind(codename)
        .fetch_one(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("permission.create", e))?;

        permission_from_row(&row)
    }

    async fn get(&self, id: PermissionId) -> StoreResult<PermissionRecord> {
        let mut guard = self.handle.acquire().await?;
        let row = sqlx::query(
            "SELECT id, resource_type, codename FROM auth_permission WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("permission.get", e))?
        .ok_or(StoreError::NotFound)?;

        permission_from_row(&row)
    }

    async fn list_all(&self) -> StoreResult<Vec<PermissionRecord>> {
        let mut guard = self.handle.acquire().await?;
        let rows =
            sqlx::query("SELECT id, resource_type, codename FROM auth_permission ORDER BY id")
                .fetch_all(guard.conn()?)
                .await
                .map_err(|e| map_sqlx_error("permission.list_all", e))?;

        rows.iter().map(permission_from_row).collect()
    }
}

#[async_trait]
impl GroupStore for PgAuthStore {
    async fn get_by_name(&self, name: &str) -> StoreResult<Option<GroupRecord>> {
        let mut guard = self.handle.acquire().await?;
        let row = sqlx::query("SELECT id, name FROM auth_group WHERE name = $1")
            .bind(name)
            .fetch_optional(guard.conn()?)
            .await
            .map_err(|e| map_sqlx_error("group.get_by_name", e))?;

        row.map(|row| {
            Ok(GroupRecord {
                id: GroupId::new(row.try_get::<i64, _>("id").map_err(decode_err)?),
                name: row.try_get("name").map_err(decode_err)?,
            })
        })
        .transpose()
    }

    async fn create(&self, name: &str) -> StoreResult<GroupRecord> {
        let mut guard = self.handle.acquire().await?;
        let row = sqlx::query("INSERT INTO auth_group (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(guard.conn()?)
            .await
            .map_err(|e| map_sqlx_error("group.create", e))?;

        Ok(GroupRecord {
            id: GroupId::new(row.try_get::<i64, _>("id").map_err(decode_err)?),
            name: row.try_get("name").map_err(decode_err)?,
        })
    }

    async fn list_by_ids(&self, ids: &[GroupId]) -> StoreResult<Vec<GroupRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let mut guard = self.handle.acquire().await?;
        let rows = sqlx::query("SELECT id, name FROM auth_group WHERE id = ANY($1) ORDER BY id")
            .bind(&raw)
            .fetch_all(guard.conn()?)
            .await
            .map_err(|e| map_sqlx_error("group.list_by_ids", e))?;

        rows.iter()
            .map(|row| {
                Ok(GroupRecord {
                    id: GroupId::new(row.try_get::<i64, _>("id").map_err(decode_err)?),
                    name: row.try_get("name").map_err(decode_err)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl MembershipStore for PgAuthStore {
    async fn add(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()> {
        let mut guard = self.handle.acquire().await?;
        sqlx::query("INSERT INTO auth_user_group (user_id, group_id) VALUES ($1, $2)")
            .bind(user_id.as_i64())
            .bind(group_id.as_i64())
            .execute(guard.conn()?)
            .await
            .map_err(|e| map_sqlx_error("membership.add", e))?;
        Ok(())
    }

    async fn remove(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()> {
        let mut guard = self.handle.acquire().await?;
        sqlx::query("DELETE FROM auth_user_group WHERE user_id = $1 AND group_id = $2")
            .bind(user_id.as_i64())
            .bind(group_id.as_i64())
            .execute(guard.conn()?)
            .await
            .map_err(|e| map_sqlx_error("membership.remove", e))?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Membership>> {
        let mut guard = self.handle.acquire().await?;
        let rows = sqlx::query("SELECT user_id, group_id FROM auth_user_group WHERE user_id = $1")
            .bind(user_id.as_i64())
            .fetch_all(guard.conn()?)
            .await
            .map_err(|e| map_sqlx_error("membership.list_for_user", e))?;

        rows.iter()
            .map(|row| {
                Ok(Membership {
                    user_id: UserId::new(row.try_get::<i64, _>("user_id").map_err(decode_err)?),
                    group_id: GroupId::new(row.try_get::<i64, _>("group_id").map_err(decode_err)?),
                })
            })
            .collect()
    }

    async fn list_for_group(&self, group_id: GroupId) -> StoreResult<Vec<Membership>> {
        let mut guard = self.handle.acquire().await?;
        let rows = sqlx::query("SELECT user_id, group_id FROM auth_user_group WHERE group_id = $1")
            .bind(group_id.as_i64())
            .fetch_all(guard.conn()?)
            .await
            .map_err(|e| map_sqlx_error("membership.list_for_group", e))?;

        rows.iter()
            .map(|row| {
                Ok(Membership {
                    user_id: UserId::new(row.try_get::<i64, _>("user_id").map_err(decode_err)?),
                    group_id: GroupId::new(row.try_get::<i64, _>("group_id").map_err(decode_err)?),
                })
            })
            .collect()
    }
}

#[async_trait]
impl GroupPermissionStore for PgAuthStore {
    async fn add(&self, group_id: GroupId, permission_id: PermissionId) -> StoreResult<()> {
        let mut guard = self.handle.acquire().await?;
        sqlx::query("INSERT INTO auth_group_permission (group_id, permission_id) VALUES ($1, $2)")
            .bind(group_id.as_i64())
            .bind(permission_id.as_i64())
            .execute(guard.conn()?)
            .await
            .map_err(|e| map_sqlx_error("group_permission.add", e))?;
        Ok(())
    }

    async fn remove(&self, group_id: GroupId, permission_id: PermissionId) -> StoreResult<()> {
        let mut guard = self.handle.acquire().await?;
        sqlx::query(
            "DELETE FROM auth_group_permission WHERE group_id = $1 AND permission_id = $2",
        )
        .bind(group_id.as_i64())
        .bind(permission_id.as_i64())
        .execute(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("group_permission.remove", e))?;
        Ok(())
    }

    async fn list_for_group(&self, group_id: GroupId) -> StoreResult<Vec<GroupGrant>> {
        let mut guard = self.handle.acquire().await?;
        let rows = sqlx::query(
            "SELECT group_id, permission_id FROM auth_group_permission WHERE group_id = $1",
        )
        .bind(group_id.as_i64())
        .fetch_all(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("group_permission.list_for_group", e))?;

        rows.iter().map(grant_from_row).collect()
    }

    async fn list_for_permission(&self, permission_id: PermissionId) -> StoreResult<Vec<GroupGrant>> {
        let mut guard = self.handle.acquire().await?;
        let rows = sqlx::query(
            "SELECT group_id, permission_id FROM auth_group_permission WHERE permission_id = $1",
        )
        .bind(permission_id.as_i64())
        .fetch_all(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("group_permission.list_for_permission", e))?;

        rows.iter().map(grant_from_row).collect()
    }
}

fn grant_from_row(row: &sqlx::postgres::PgRow) -> StoreResult<GroupGrant> {
    Ok(GroupGrant {
        group_id: GroupId::new(row.try_get::<i64, _>("group_id").map_err(decode_err)?),
        permission_id: PermissionId::new(
            row.try_get::<i64, _>("permission_id").map_err(decode_err)?,
        ),
    })
}

#[async_trait]
impl UserStore for PgAuthStore {
    async fn get(&self, id: UserId) -> StoreResult<User> {
        let mut guard = self.handle.acquire().await?;
        let row = sqlx::query(
            "SELECT id, username, password_hash, is_superuser, employee_id FROM auth_user WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("user.get", e))?
        .ok_or(StoreError::NotFound)?;

        user_from_row(&row)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let mut guard = self.handle.acquire().await?;
        let row = sqlx::query(
            "SELECT id, username, password_hash, is_superuser, employee_id FROM auth_user WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("user.find_by_username", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut guard = self.handle.acquire().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO auth_user (username, password_hash, is_superuser)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, is_superuser, employee_id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_superuser)
        .fetch_one(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("user.create", e))?;

        user_from_row(&row)
    }

    async fn set_employee(&self, id: UserId, employee_id: Option<EmployeeId>) -> StoreResult<User> {
        let mut guard = self.handle.acquire().await?;
        let row = sqlx::query(
            r#"
            UPDATE auth_user
            SET employee_id = $2
            WHERE id = $1
            RETURNING id, username, password_hash, is_superuser, employee_id
            "#,
        )
        .bind(id.as_i64())
        .bind(employee_id.as_ref().map(|e| e.as_str().to_string()))
        .fetch_optional(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("user.set_employee", e))?
        .ok_or(StoreError::NotFound)?;

        user_from_row(&row)
    }

    async fn search(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
        let mut guard = self.handle.acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, username, password_hash, is_superuser, employee_id
            FROM auth_user
            WHERE ($1::text IS NULL OR username = $1)
              AND ($2::text IS NULL OR employee_id = $2)
            ORDER BY id
            "#,
        )
        .bind(filter.username.as_deref())
        .bind(filter.employee_id.as_ref().map(|e| e.as_str().to_string()))
        .fetch_all(guard.conn()?)
        .await
        .map_err(|e| map_sqlx_error("user.search", e))?;

        rows.iter().map(user_from_row).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// Scoped transaction boundary over the Postgres auth stores.
///
/// `begin` opens one database transaction; the returned handle's stores all
/// run inside it. Dropping the handle without committing rolls back.
pub struct PgAuthUnitOfWork {
    pool: PgPool,
}

impl PgAuthUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthUnitOfWork for PgAuthUnitOfWork {
    async fn begin(&self) -> StoreResult<Box<dyn AuthTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PgAuthTransaction {
            tx: Arc::new(Mutex::new(Some(tx))),
        }))
    }
}

struct PgAuthTransaction {
    tx: SharedTx,
}

#[async_trait]
impl AuthTransaction for PgAuthTransaction {
    fn stores(&self) -> AuthStores {
        PgAuthStore::for_tx(self.tx.clone()).stores()
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.take().ok_or(StoreError::TransactionClosed)?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }
}
