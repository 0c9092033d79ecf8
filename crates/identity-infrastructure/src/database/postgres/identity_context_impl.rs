// ============================================================================
// Identity Infrastructure - PostgreSQL Identity Context
// File: crates/identity-infrastructure/src/database/postgres/identity_context_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgDatabaseError;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use identity_core::application::{ApplicationRole, ApplicationUser};
use identity_core::domain::{IdentityRole, IdentityUser};
use identity_core::error::PersistenceError;
use identity_core::query::{Predicate, Query};
use identity_core::repositories::IdentityContext;

const USER_COLUMNS: &str = r#"
    id, tenant_id, user_name, normalized_user_name, email, normalized_email,
    email_confirmed, password_hash, security_stamp, concurrency_stamp,
    phone_number, phone_number_confirmed, two_factor_enabled,
    lockout_end, lockout_enabled, access_failed_count
"#;

const ROLE_COLUMNS: &str = "id, tenant_id, name, normalized_name, concurrency_stamp";

#[derive(Default)]
struct Pending {
    users: Vec<ApplicationUser>,
    roles: Vec<ApplicationRole>,
}

/// Identity context backed by the `identity_users` and `identity_roles` tables.
pub struct PgIdentityContext {
    pool: PgPool,
    pending: Mutex<Pending>,
}

impl PgIdentityContext {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, pending: Mutex::new(Pending::default()) }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct UserRow {
    pub id: Uuid,
    pub tenant_id: String,
    pub user_name: Option<String>,
    pub normalized_user_name: Option<String>,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub email_confirmed: bool,
    pub password_hash: Option<String>,
    pub security_stamp: Option<String>,
    pub concurrency_stamp: Option<String>,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub two_factor_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: i32,
}

impl From<UserRow> for ApplicationUser {
    fn from(row: UserRow) -> Self {
        ApplicationUser {
            identity: IdentityUser {
                id: row.id,
                user_name: row.user_name,
                normalized_user_name: row.normalized_user_name,
                email: row.email,
                normalized_email: row.normalized_email,
                email_confirmed: row.email_confirmed,
                password_hash: row.password_hash,
                security_stamp: row.security_stamp,
                concurrency_stamp: row.concurrency_stamp,
                phone_number: row.phone_number,
                phone_number_confirmed: row.phone_number_confirmed,
                two_factor_enabled: row.two_factor_enabled,
                lockout_end: row.lockout_end,
                lockout_enabled: row.lockout_enabled,
                access_failed_count: row.access_failed_count,
            },
            tenant_id: Some(row.tenant_id),
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: Option<String>,
    pub normalized_name: Option<String>,
    pub concurrency_stamp: Option<String>,
}

impl From<RoleRow> for ApplicationRole {
    fn from(row: RoleRow) -> Self {
        ApplicationRole {
            identity: IdentityRole {
                id: row.id,
                name: row.name,
                normalized_name: row.normalized_name,
                concurrency_stamp: row.concurrency_stamp,
            },
            tenant_id: Some(row.tenant_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Users,
    Roles,
}

/// Appends one `AND` clause per predicate. A predicate the table has no
/// column for matches nothing.
fn push_predicates(qb: &mut QueryBuilder<'_, Postgres>, table: Table, query: &Query<String>) {
    qb.push(" WHERE TRUE");
    for predicate in query.predicates() {
        match (predicate, table) {
            (Predicate::NormalizedUserName(name), Table::Users) => {
                qb.push(" AND normalized_user_name = ").push_bind(name.clone());
            }
            (Predicate::NormalizedEmail(email), Table::Users) => {
                qb.push(" AND normalized_email = ").push_bind(email.clone());
            }
            (Predicate::NormalizedRoleName(name), Table::Roles) => {
                qb.push(" AND normalized_name = ").push_bind(name.clone());
            }
            (Predicate::Tenant(tenant), _) => {
                qb.push(" AND tenant_id = ").push_bind(tenant.clone());
            }
            _ => {
                qb.push(" AND FALSE");
            }
        }
    }
    qb.push(" LIMIT 1");
}

fn select(table: Table, query: &Query<String>) -> QueryBuilder<'static, Postgres> {
    let mut qb = match table {
        Table::Users => QueryBuilder::new(format!("SELECT {} FROM identity_users", USER_COLUMNS)),
        Table::Roles => QueryBuilder::new(format!("SELECT {} FROM identity_roles", ROLE_COLUMNS)),
    };
    push_predicates(&mut qb, table, query);
    qb
}

/// The failing column as Postgres reports it, or the server message when the
/// column field is absent.
fn not_null_column(column: Option<&str>, message: &str) -> String {
    column.unwrap_or(message).to_string()
}

fn map_db_error(e: sqlx::Error) -> PersistenceError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            Some("23505") => {
                return PersistenceError::UniqueViolation {
                    constraint: db.constraint().unwrap_or_default().to_string(),
                };
            }
            Some("23502") => {
                let column = db.try_downcast_ref::<PgDatabaseError>().and_then(PgDatabaseError::column);
                return PersistenceError::NotNullViolation { column: not_null_column(column, db.message()) };
            }
            Some("40001") => return PersistenceError::Concurrency,
            _ => {}
        }
    }
    PersistenceError::Database(e.to_string())
}

async fn insert_user(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    user: &ApplicationUser,
) -> Result<(), sqlx::Error> {
    let u = &user.identity;
    sqlx::query(
        r#"
        INSERT INTO identity_users (
            id, tenant_id, user_name, normalized_user_name, email, normalized_email,
            email_confirmed, password_hash, security_stamp, concurrency_stamp,
            phone_number, phone_number_confirmed, two_factor_enabled,
            lockout_end, lockout_enabled, access_failed_count
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#
    )
    .bind(u.id)
    .bind(&user.tenant_id)
    .bind(&u.user_name)
    .bind(&u.normalized_user_name)
    .bind(&u.email)
    .bind(&u.normalized_email)
    .bind(u.email_confirmed)
    .bind(&u.password_hash)
    .bind(&u.security_stamp)
    .bind(&u.concurrency_stamp)
    .bind(&u.phone_number)
    .bind(u.phone_number_confirmed)
    .bind(u.two_factor_enabled)
    .bind(u.lockout_end)
    .bind(u.lockout_enabled)
    .bind(u.access_failed_count)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_role(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    role: &ApplicationRole,
) -> Result<(), sqlx::Error> {
    let r = &role.identity;
    sqlx::query(
        r#"
        INSERT INTO identity_roles (id, tenant_id, name, normalized_name, concurrency_stamp)
        VALUES ($1, $2, $3, $4, $5)
        "#
    )
    .bind(r.id)
    .bind(&role.tenant_id)
    .bind(&r.name)
    .bind(&r.normalized_name)
    .bind(&r.concurrency_stamp)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl IdentityContext for PgIdentityContext {
    type User = ApplicationUser;
    type Role = ApplicationRole;

    async fn first_user(&self, query: &Query<String>) -> Result<Option<ApplicationUser>, PersistenceError> {
        let mut qb = select(Table::Users, query);
        let row: Option<UserRow> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e: sqlx::Error| {
                error!("Database error finding user: {}", e);
                map_db_error(e)
            })?;

        Ok(row.map(|r| r.into()))
    }

    async fn first_role(&self, query: &Query<String>) -> Result<Option<ApplicationRole>, PersistenceError> {
        let mut qb = select(Table::Roles, query);
        let row: Option<RoleRow> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e: sqlx::Error| {
                error!("Database error finding role: {}", e);
                map_db_error(e)
            })?;

        Ok(row.map(|r| r.into()))
    }

    async fn add_user(&self, user: ApplicationUser) {
        self.pending.lock().await.users.push(user);
    }

    async fn add_role(&self, role: ApplicationRole) {
        self.pending.lock().await.roles.push(role);
    }

    async fn save_changes(&self) -> Result<usize, PersistenceError> {
        let pending = std::mem::take(&mut *self.pending.lock().await);
        let written = pending.users.len() + pending.roles.len();
        if written == 0 {
            return Ok(0);
        }

        let result: Result<(), sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;
            for user in &pending.users {
                insert_user(&mut tx, user).await?;
            }
            for role in &pending.roles {
                insert_role(&mut tx, role).await?;
            }
            tx.commit().await
        }
        .await;

        result.map_err(|e| {
            error!("Database error saving identity changes: {}", e);
            map_db_error(e)
        })?;

        info!(written, "Identity changes committed");
        Ok(written)
    }

    async fn pending_changes(&self) -> usize {
        let pending = self.pending.lock().await;
        pending.users.len() + pending.roles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_scoped_user_query_sql() {
        let query = Query::user_name("ALICE").scoped_to("T1".to_string());
        let qb = select(Table::Users, &query);
        let sql = squash(qb.sql());
        assert!(sql.starts_with("SELECT id, tenant_id, user_name"));
        assert!(sql.ends_with("FROM identity_users WHERE TRUE AND normalized_user_name = $1 AND tenant_id = $2 LIMIT 1"));
    }

    #[test]
    fn test_role_query_sql() {
        let query = Query::role_name("ADMIN").scoped_to("T2".to_string());
        let sql = squash(select(Table::Roles, &query).sql());
        assert_eq!(
            sql,
            "SELECT id, tenant_id, name, normalized_name, concurrency_stamp FROM identity_roles \
             WHERE TRUE AND normalized_name = $1 AND tenant_id = $2 LIMIT 1"
        );
    }

    #[test]
    fn test_foreign_predicate_matches_nothing() {
        let query = Query::<String>::email("A@X.COM");
        let sql = squash(select(Table::Roles, &query).sql());
        assert!(sql.contains("WHERE TRUE AND FALSE LIMIT 1"));
    }

    #[test]
    fn test_not_null_column_reported_as_given() {
        assert_eq!(not_null_column(Some("normalized_name"), "null value"), "normalized_name");
        assert_eq!(
            not_null_column(None, "null value in column \"tenant_id\""),
            "null value in column \"tenant_id\""
        );
    }

    #[test]
    fn test_non_database_errors_map_to_database() {
        assert!(matches!(map_db_error(sqlx::Error::RowNotFound), PersistenceError::Database(_)));
    }
}
