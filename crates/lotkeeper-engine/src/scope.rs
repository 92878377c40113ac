//! # Scope Guard
//!
//! Turns an authenticated user plus request headers into a
//! [`RequestContext`], and checks that context against the database before
//! any tenant-scoped work runs.
//!
//! ## Boundary Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  authorize(user_id, headers)                                            │
//! │    user exists and is active ─────────────────────────► else FORBIDDEN  │
//! │    RequestContext::resolve (operator pin beats header) ► else FORBIDDEN │
//! │    tenant exists and is ACTIVE ───────────────────────► else FORBIDDEN  │
//! │    location belongs to tenant ────────────────────────► else FORBIDDEN  │
//! │                                                                         │
//! │  guard_tenant / guard_location (every operation)                        │
//! │    context present ───────────────────────────────────► else FORBIDDEN  │
//! │    same checks again against the current rows                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A supplied location that belongs to another tenant is rejected, never
//! silently dropped.

use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::Engine;
use lotkeeper_core::scope::{Principal, RequestHeaders};
use lotkeeper_core::{CoreError, Location, LocationScope, RequestContext, Scope, Tenant, TenantScope};

impl Engine {
    /// Resolves the request context for an authenticated user.
    pub async fn authorize(&self, user_id: &str, headers: &RequestHeaders) -> EngineResult<RequestContext> {
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| EngineError::forbidden(format!("User {user_id} is not active")))?;

        let ctx = RequestContext::resolve(&Principal::from(&user), headers)?;

        if let Scope::Tenant {
            tenant_id,
            location_id,
        } = &ctx.scope
        {
            let tenant = TenantScope {
                tenant_id: tenant_id.clone(),
            };
            self.active_tenant(&tenant).await?;
            if let Some(location_id) = location_id {
                self.owned_location(&LocationScope::new(tenant_id, location_id)).await?;
            }
        }

        debug!(user_id, role = ?ctx.role, scope = ?ctx.scope, "Request authorized");
        Ok(ctx)
    }

    /// Tenant context for a tenant-scoped operation.
    pub(crate) async fn guard_tenant(&self, ctx: &RequestContext) -> EngineResult<TenantScope> {
        let scope = ctx.scope.require_tenant()?;
        self.active_tenant(&scope).await?;
        Ok(scope)
    }

    /// Tenant and location context for a location-scoped operation.
    pub(crate) async fn guard_location(&self, ctx: &RequestContext) -> EngineResult<LocationScope> {
        let scope = ctx.scope.require_location()?;
        self.checked_location(scope).await
    }

    /// Like [`Engine::guard_location`] for an explicitly named location.
    /// A context pinned to another location is rejected.
    pub(crate) async fn guard_location_id(
        &self,
        ctx: &RequestContext,
        location_id: &str,
    ) -> EngineResult<LocationScope> {
        let tenant = ctx.scope.require_tenant()?;
        if let Some(pinned) = ctx.scope.location_id() {
            if pinned != location_id {
                return Err(EngineError::forbidden(format!(
                    "Request is bound to location {pinned}"
                )));
            }
        }
        self.checked_location(LocationScope::new(tenant.tenant_id, location_id))
            .await
    }

    async fn checked_location(&self, scope: LocationScope) -> EngineResult<LocationScope> {
        self.active_tenant(&scope.tenant()).await?;
        let location = self.owned_location(&scope).await?;
        if !location.is_active {
            return Err(EngineError::forbidden(format!(
                "Location {} is not active",
                location.id
            )));
        }
        Ok(scope)
    }

    pub(crate) fn require_admin(&self, ctx: &RequestContext) -> EngineResult<()> {
        if !ctx.role.is_admin() {
            return Err(EngineError::forbidden("Administrator role required"));
        }
        Ok(())
    }

    pub(crate) fn require_super_admin(&self, ctx: &RequestContext) -> EngineResult<()> {
        if !ctx.is_super_admin() {
            return Err(EngineError::forbidden("Super Admin role required"));
        }
        Ok(())
    }

    async fn active_tenant(&self, scope: &TenantScope) -> EngineResult<Tenant> {
        match self.db.tenants().get_by_id(&scope.tenant_id).await? {
            Some(tenant) if tenant.is_active() => Ok(tenant),
            Some(tenant) => Err(EngineError::forbidden(format!(
                "Tenant {} is {}",
                tenant.id,
                tenant.status.as_str()
            ))),
            None => Err(EngineError::forbidden(format!(
                "Tenant {} does not exist",
                scope.tenant_id
            ))),
        }
    }

    async fn owned_location(&self, scope: &LocationScope) -> EngineResult<Location> {
        match self.db.locations().get(&scope.tenant(), &scope.location_id).await? {
            Some(location) => Ok(location),
            None => {
                warn!(
                    tenant_id = %scope.tenant_id,
                    location_id = %scope.location_id,
                    "Rejected location outside tenant"
                );
                Err(CoreError::LocationTenantMismatch {
                    location_id: scope.location_id.clone(),
                    tenant_id: scope.tenant_id.clone(),
                }
                .into())
            }
        }
    }
}
