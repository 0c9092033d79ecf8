use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use identity_core::application::{ApplicationContext, ApplicationRole};
use identity_core::repositories::{QueryableRoleStore, RoleStore};
use identity_core::tenant::{resolver_from_settings, ScopeHints, TenantResolver};
use identity_core::{CancellationToken, IdentityScope, LookupNormalizer, UpperInvariantLookupNormalizer};
use identity_infrastructure::database::{connection, schema};
use identity_infrastructure::PgIdentityContext;
use identity_shared::config::{AppConfig, TenancySettings, TenantResolution};

/// One set of hints per tenant the deployment serves.
fn seed_hints(tenancy: &TenancySettings) -> Vec<ScopeHints> {
    match tenancy.resolution {
        TenantResolution::Static => vec![ScopeHints::default()],
        TenantResolution::Header => vec![ScopeHints::for_header(tenancy.tenant_id.clone())],
        TenantResolution::Host => {
            let mut hints: Vec<ScopeHints> = tenancy.hosts.keys().map(ScopeHints::for_host).collect();
            if tenancy.fallback_tenant.is_some() {
                hints.push(ScopeHints::default());
            }
            hints
        }
    }
}

async fn seed_roles<C: ApplicationContext>(
    context: &Arc<C>,
    resolver: &dyn TenantResolver<String>,
    hints: &ScopeHints,
    tenancy: &TenancySettings,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let scope = IdentityScope::begin(Arc::clone(context), resolver, hints, tenancy.auto_save_changes)?;
    let normalizer = UpperInvariantLookupNormalizer;

    for name in &tenancy.seed_roles {
        if scope.roles().find_by_name(&normalizer.normalize_name(name), cancel).await?.is_some() {
            info!("Role {} already present for tenant {}", name, scope.tenant_id());
            continue;
        }
        let result = scope.roles().create(ApplicationRole::new(name.as_str()), cancel).await?;
        if !result.succeeded() {
            error!("Seeding role {} failed: {:?}", name, result.errors());
        }
    }

    if !tenancy.auto_save_changes {
        let written = scope.roles().inner().save_changes(cancel).await?;
        info!("Committed {} seeded roles for tenant {}", written, scope.tenant_id());
    }

    scope.end();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize telemetry
    let _guard = identity_shared::telemetry::init_telemetry(&config.logging);

    info!("{} starting ({})...", config.app.name, config.app.env);

    // Connect to Database
    let pool = connection::create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    info!("Database connection established.");

    schema::ensure_schema(&pool).await.context("Failed to ensure identity schema")?;

    let resolver = resolver_from_settings(&config.tenancy)?;
    let context = Arc::new(PgIdentityContext::new(pool));
    let cancel = CancellationToken::new();

    for hints in seed_hints(&config.tenancy) {
        seed_roles(&context, resolver.as_ref(), &hints, &config.tenancy, &cancel).await?;
    }

    info!("Identity bootstrap complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use identity_core::application::ApplicationUser;
    use identity_core::tenant::StaticTenantResolver;
    use identity_core::TenantScoped;
    use identity_infrastructure::InMemoryIdentityContext;

    type MemoryContext = InMemoryIdentityContext<ApplicationUser, ApplicationRole>;

    fn tenancy(resolution: TenantResolution) -> TenancySettings {
        TenancySettings {
            resolution,
            tenant_id: "TenantId-1".into(),
            hosts: HashMap::from([("a.example.com".to_string(), "T1".to_string())]),
            fallback_tenant: Some("T0".into()),
            auto_save_changes: true,
            seed_roles: vec!["Admin".into()],
        }
    }

    #[test]
    fn test_seed_hints_per_resolution() {
        assert_eq!(seed_hints(&tenancy(TenantResolution::Static)).len(), 1);

        let header = seed_hints(&tenancy(TenantResolution::Header));
        assert_eq!(header[0].tenant_header.as_deref(), Some("TenantId-1"));

        let host = seed_hints(&tenancy(TenantResolution::Host));
        assert_eq!(host.len(), 2);
        assert_eq!(host[0].host.as_deref(), Some("a.example.com"));
    }

    async fn seed_in_memory(auto_save_changes: bool) -> Arc<MemoryContext> {
        let mut settings = tenancy(TenantResolution::Static);
        settings.auto_save_changes = auto_save_changes;
        settings.seed_roles = vec!["Administrator".into(), "User".into()];

        let context = Arc::new(MemoryContext::new());
        let resolver = StaticTenantResolver::new(&settings.tenant_id).unwrap();
        let cancel = CancellationToken::new();
        seed_roles(&context, &resolver, &ScopeHints::default(), &settings, &cancel)
            .await
            .unwrap();
        context
    }

    #[tokio::test]
    async fn test_seeded_roles_committed_without_auto_save() {
        let context = seed_in_memory(false).await;
        let roles = context.roles().await;
        assert_eq!(roles.len(), 2);
        assert!(roles.iter().all(|r| r.tenant_id() == Some(&"TenantId-1".to_string())));
        assert_eq!(context.commits().await, 1);
    }

    #[tokio::test]
    async fn test_seeding_twice_skips_existing_roles() {
        let context = seed_in_memory(true).await;
        assert_eq!(context.roles().await.len(), 2);

        let mut settings = tenancy(TenantResolution::Static);
        settings.seed_roles = vec!["administrator".into(), "User".into()];
        let resolver = StaticTenantResolver::new(&settings.tenant_id).unwrap();
        seed_roles(&context, &resolver, &ScopeHints::default(), &settings, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(context.roles().await.len(), 2);
    }
}
