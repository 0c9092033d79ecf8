//! Tenant-aware identity schema.
//!
//! User names and role names are unique per tenant, never globally. Emails
//! are indexed per tenant but not unique.

use sqlx::PgPool;
use tracing::info;

pub const USERS_TENANT_USER_NAME_UNIQUE: &str = "ux_identity_users_tenant_user_name";
pub const ROLES_TENANT_NAME_UNIQUE: &str = "ux_identity_roles_tenant_name";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS identity_users (
        id                      UUID PRIMARY KEY,
        tenant_id               TEXT NOT NULL,
        user_name               VARCHAR(256),
        normalized_user_name    VARCHAR(256),
        email                   VARCHAR(256),
        normalized_email        VARCHAR(256),
        email_confirmed         BOOLEAN NOT NULL DEFAULT FALSE,
        password_hash           TEXT,
        security_stamp          TEXT,
        concurrency_stamp       TEXT,
        phone_number            TEXT,
        phone_number_confirmed  BOOLEAN NOT NULL DEFAULT FALSE,
        two_factor_enabled      BOOLEAN NOT NULL DEFAULT FALSE,
        lockout_end             TIMESTAMPTZ,
        lockout_enabled         BOOLEAN NOT NULL DEFAULT FALSE,
        access_failed_count     INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS identity_roles (
        id                  UUID PRIMARY KEY,
        tenant_id           TEXT NOT NULL,
        name                VARCHAR(256),
        normalized_name     VARCHAR(256),
        concurrency_stamp   TEXT
    )
    "#,
    // Global indexes from earlier single-tenant deployments.
    r#"DROP INDEX IF EXISTS "UserNameIndex""#,
    r#"DROP INDEX IF EXISTS "EmailIndex""#,
    r#"DROP INDEX IF EXISTS "RoleNameIndex""#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_identity_users_tenant_user_name
        ON identity_users (tenant_id, normalized_user_name)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS ix_identity_users_tenant_email
        ON identity_users (tenant_id, normalized_email)
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_identity_roles_tenant_name
        ON identity_roles (tenant_id, normalized_name)
    "#,
];

/// Creates the identity tables and their tenant-scoped indexes. Idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    info!("Identity schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniqueness_is_tenant_scoped() {
        let unique: Vec<&str> = SCHEMA
            .iter()
            .filter(|s| s.contains("CREATE UNIQUE INDEX"))
            .copied()
            .collect();
        assert_eq!(unique.len(), 2);
        assert!(unique.iter().all(|s| s.contains("(tenant_id, ")));
        assert!(unique[0].contains(USERS_TENANT_USER_NAME_UNIQUE));
        assert!(unique[1].contains(ROLES_TENANT_NAME_UNIQUE));
    }

    #[test]
    fn test_tenant_column_not_null() {
        let tables: Vec<String> = SCHEMA
            .iter()
            .filter(|s| s.contains("CREATE TABLE"))
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(tables.len(), 2);
        assert!(tables.iter().all(|s| s.contains("tenant_id TEXT NOT NULL")));
    }
}
