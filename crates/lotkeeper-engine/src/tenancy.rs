//! # Tenancy Administration
//!
//! Tenant registration and archival, and the creation of locations and
//! users inside a tenant. Creation of locations and users is gated by the
//! usage limiter; the decision is returned with the created row so the
//! caller can surface soft/critical warnings.
//!
//! Tenants are never deleted. Archiving flips the status, which locks every
//! user of the tenant out at the scope guard.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ConflictKind, EngineError, EngineResult, FieldError};
use crate::Engine;
use lotkeeper_core::usage::{PlanLimits, UsageAction, UsageDecision};
use lotkeeper_core::validation::{validate_email, validate_name, validate_slug};
use lotkeeper_core::{
    CoreError, Location, LocationSettings, RequestContext, Tenant, TenantScope, TenantStatus, User,
    UserRole,
};

// =============================================================================
// Requests / Results
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTenant {
    pub name: String,
    pub slug: String,
    pub plan_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub settings: LocationSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Fixed assignment. Operators with one cannot switch locations.
    #[serde(default)]
    pub location_id: Option<String>,
}

/// A created resource and the quota decision that admitted it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created<T> {
    pub value: T,
    pub usage: UsageDecision,
}

// =============================================================================
// Operations
// =============================================================================

impl Engine {
    /// Registers a tenant on `plan_code`.
    ///
    /// The plan must exist, or be listed in the configured fallback table.
    /// The plan's location and user quotas are snapshotted on the tenant.
    pub async fn register_tenant(&self, request: RegisterTenant) -> EngineResult<Tenant> {
        validate_name("name", &request.name)?;
        validate_slug(&request.slug)?;

        let limits = self.registration_limits(&request.plan_code).await?;

        if let Some(existing) = self.db.tenants().get_by_slug(&request.slug).await? {
            return Err(EngineError::conflict(
                ConflictKind::Duplicate,
                format!("Slug {} is taken", request.slug),
                Some(existing.id),
            ));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            slug: request.slug,
            plan_code: request.plan_code,
            status: TenantStatus::Active,
            max_locations: limits.max_locations,
            max_users: limits.max_users,
            created_at: now,
            updated_at: now,
        };
        self.db.tenants().insert(&tenant).await?;

        info!(tenant_id = %tenant.id, slug = %tenant.slug, plan = %tenant.plan_code, "Tenant registered");
        Ok(tenant)
    }

    /// Archives a tenant. Super Admin only.
    pub async fn archive_tenant(&self, ctx: &RequestContext, tenant_id: &str) -> EngineResult<Tenant> {
        self.require_super_admin(ctx)?;
        let tenant = self
            .db
            .tenants()
            .set_status(tenant_id, TenantStatus::Archived)
            .await?;

        info!(tenant_id, user_id = %ctx.user_id, "Tenant archived");
        Ok(tenant)
    }

    /// Adds a location to the context tenant.
    pub async fn create_location(
        &self,
        ctx: &RequestContext,
        request: NewLocation,
    ) -> EngineResult<Created<Location>> {
        self.require_admin(ctx)?;
        validate_name("name", &request.name)?;
        let tenant = self.guard_tenant(ctx).await?;
        let usage = self
            .ensure_usage_allowed(&tenant, UsageAction::AddLocation)
            .await?;

        let settings = serde_json::to_string(&request.settings).map_err(|e| {
            EngineError::validation(FieldError {
                field: "settings".to_string(),
                message: e.to_string(),
            })
        })?;

        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant.tenant_id.clone(),
            name: request.name.trim().to_string(),
            address: request.address,
            settings,
            is_active: true,
            current_ticket_number: 0,
            current_receipt_number: 0,
            created_at: now,
            updated_at: now,
        };
        self.db.locations().insert(&location).await?;

        info!(tenant_id = %location.tenant_id, location_id = %location.id, "Location created");
        Ok(Created {
            value: location,
            usage,
        })
    }

    /// Adds a user to the context tenant.
    pub async fn create_user(&self, ctx: &RequestContext, request: NewUser) -> EngineResult<Created<User>> {
        self.require_admin(ctx)?;
        if request.role.is_super_admin() {
            return Err(EngineError::forbidden("Super Admins cannot be created inside a tenant"));
        }
        validate_name("name", &request.name)?;
        validate_email(&request.email)?;

        let tenant = self.guard_tenant(ctx).await?;
        if let Some(location_id) = &request.location_id {
            self.ensure_location_in_tenant(&tenant, location_id).await?;
        }

        let usage = self.ensure_usage_allowed(&tenant, UsageAction::AddUser).await?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            tenant_id: Some(tenant.tenant_id.clone()),
            location_id: request.location_id,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            role: request.role,
            is_active: true,
            created_at: Utc::now(),
        };
        self.db.users().insert(&user).await?;

        info!(tenant_id = %tenant.tenant_id, user_id = %user.id, role = ?user.role, "User created");
        Ok(Created { value: user, usage })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn registration_limits(&self, plan_code: &str) -> EngineResult<PlanLimits> {
        if let Some(plan) = self.db.plans().get_by_code(plan_code).await? {
            return Ok(PlanLimits::from(&plan));
        }
        if self.config.is_fallback_plan(plan_code) {
            return Ok(self.config.fallback_limits(plan_code));
        }
        Err(EngineError::validation(FieldError {
            field: "plan_code".to_string(),
            message: format!("Unknown plan {plan_code}"),
        }))
    }

    async fn ensure_location_in_tenant(&self, tenant: &TenantScope, location_id: &str) -> EngineResult<()> {
        match self.db.locations().get(tenant, location_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::LocationTenantMismatch {
                location_id: location_id.to_string(),
                tenant_id: tenant.tenant_id.clone(),
            }
            .into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
