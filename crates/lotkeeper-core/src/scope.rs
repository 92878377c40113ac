//! # Tenant / Location Scope
//!
//! The request context is an explicit value threaded through every core
//! call. Nothing here is global or mutable.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Principal (authenticated user)   +   RequestHeaders                    │
//! │                                                                         │
//! │  SUPER_ADMIN                                                            │
//! │    tenant header?  ──yes──► Scope::Tenant { tenant, header location }   │
//! │          │ no                                                           │
//! │          ▼                                                              │
//! │    Scope::Unscoped  (cross-tenant admin reads only)                     │
//! │                                                                         │
//! │  ADMIN / OPERATOR                                                       │
//! │    tenant = user's tenant  (header naming another tenant ⇒ rejected)    │
//! │    location = fixed assignment (OPERATOR) ▸ header ▸ none               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tenant-scoped writes call [`Scope::require_tenant`] or
//! [`Scope::require_location`], which fail closed: there is no path that
//! turns a missing context into a global write.
//!
//! Whether a header location really belongs to the tenant needs storage and
//! is checked by the engine's scope guard.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{User, UserRole};

// =============================================================================
// Scope
// =============================================================================

/// Data-access scope passed explicitly to every repository call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Restricted to one tenant, optionally one location.
    Tenant {
        tenant_id: String,
        location_id: Option<String>,
    },
    /// No tenant filter. Only Super Admins obtain this.
    Unscoped,
}

impl Scope {
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Scope::Tenant {
            tenant_id: tenant_id.into(),
            location_id: None,
        }
    }

    pub fn location(tenant_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Scope::Tenant {
            tenant_id: tenant_id.into(),
            location_id: Some(location_id.into()),
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Scope::Tenant { tenant_id, .. } => Some(tenant_id),
            Scope::Unscoped => None,
        }
    }

    pub fn location_id(&self) -> Option<&str> {
        match self {
            Scope::Tenant { location_id, .. } => location_id.as_deref(),
            Scope::Unscoped => None,
        }
    }

    pub fn is_unscoped(&self) -> bool {
        matches!(self, Scope::Unscoped)
    }

    /// Tenant context or [`CoreError::MissingTenantContext`].
    pub fn require_tenant(&self) -> CoreResult<TenantScope> {
        match self {
            Scope::Tenant { tenant_id, .. } => Ok(TenantScope {
                tenant_id: tenant_id.clone(),
            }),
            Scope::Unscoped => Err(CoreError::MissingTenantContext),
        }
    }

    /// Tenant and location context, or the matching missing-context error.
    pub fn require_location(&self) -> CoreResult<LocationScope> {
        match self {
            Scope::Tenant {
                tenant_id,
                location_id: Some(location_id),
            } => Ok(LocationScope {
                tenant_id: tenant_id.clone(),
                location_id: location_id.clone(),
            }),
            Scope::Tenant {
                location_id: None, ..
            } => Err(CoreError::MissingLocationContext),
            Scope::Unscoped => Err(CoreError::MissingTenantContext),
        }
    }
}

/// Proof that a tenant context exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope {
    pub tenant_id: String,
}

/// Proof that a tenant and location context exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationScope {
    pub tenant_id: String,
    pub location_id: String,
}

impl LocationScope {
    pub fn new(tenant_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            location_id: location_id.into(),
        }
    }

    pub fn tenant(&self) -> TenantScope {
        TenantScope {
            tenant_id: self.tenant_id.clone(),
        }
    }
}

impl From<LocationScope> for Scope {
    fn from(scope: LocationScope) -> Self {
        Scope::Tenant {
            tenant_id: scope.tenant_id,
            location_id: Some(scope.location_id),
        }
    }
}

impl From<TenantScope> for Scope {
    fn from(scope: TenantScope) -> Self {
        Scope::tenant(scope.tenant_id)
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Tenant and location headers as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeaders {
    pub tenant_id: Option<String>,
    pub location_id: Option<String>,
}

impl RequestHeaders {
    pub fn new(tenant_id: Option<&str>, location_id: Option<&str>) -> Self {
        let clean = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Self {
            tenant_id: clean(tenant_id),
            location_id: clean(location_id),
        }
    }
}

/// The authenticated actor, as far as scoping is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: UserRole,
    pub tenant_id: Option<String>,
    pub location_id: Option<String>,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            tenant_id: user.tenant_id.clone(),
            location_id: user.location_id.clone(),
        }
    }
}

/// Per-request context handed to every engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: String,
    pub role: UserRole,
    pub scope: Scope,
}

impl RequestContext {
    /// Applies the resolution rules to a principal and its headers.
    ///
    /// ## Example
    /// ```rust
    /// use lotkeeper_core::scope::{Principal, RequestContext, RequestHeaders};
    /// use lotkeeper_core::UserRole;
    ///
    /// let operator = Principal {
    ///     user_id: "u-1".into(),
    ///     role: UserRole::Operator,
    ///     tenant_id: Some("t-1".into()),
    ///     location_id: Some("loc-fixed".into()),
    /// };
    /// let headers = RequestHeaders::new(None, Some("loc-other"));
    /// let ctx = RequestContext::resolve(&operator, &headers).unwrap();
    ///
    /// // The fixed assignment wins over the header
    /// assert_eq!(ctx.scope.location_id(), Some("loc-fixed"));
    /// ```
    pub fn resolve(principal: &Principal, headers: &RequestHeaders) -> CoreResult<Self> {
        let scope = if principal.role.is_super_admin() {
            match &headers.tenant_id {
                Some(tenant_id) => Scope::Tenant {
                    tenant_id: tenant_id.clone(),
                    location_id: headers.location_id.clone(),
                },
                None => Scope::Unscoped,
            }
        } else {
            let tenant_id = principal
                .tenant_id
                .clone()
                .ok_or(CoreError::MissingTenantContext)?;

            if let Some(requested) = &headers.tenant_id {
                if requested != &tenant_id {
                    return Err(CoreError::TenantMismatch {
                        requested: requested.clone(),
                    });
                }
            }

            let location_id = match (&principal.role, &principal.location_id) {
                (UserRole::Operator, Some(fixed)) => Some(fixed.clone()),
                _ => headers.location_id.clone(),
            };

            Scope::Tenant {
                tenant_id,
                location_id,
            }
        };

        Ok(Self {
            user_id: principal.user_id.clone(),
            role: principal.role,
            scope,
        })
    }

    /// Context for a user acting at a known location (tests, seed tooling).
    pub fn at_location(user_id: impl Into<String>, role: UserRole, scope: LocationScope) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            scope: scope.into(),
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }
}
