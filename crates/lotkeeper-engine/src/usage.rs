//! # Usage Limiter
//!
//! Quota checks run before every resource-creating action.
//!
//! ```text
//!   addLocation   ── live COUNT(*) of active locations
//!   addUser       ── live COUNT(*) of active users
//!   createSession ── usage_records[tenant, YYYY-MM].sessions_count
//! ```
//!
//! Limits come from the tenant's pricing plan. When the plan cannot be
//! loaded (missing row, deactivated plan, query failure) the `[usage]`
//! fallback table in [`crate::config`] is used instead of blocking.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::Engine;
use lotkeeper_core::usage::{month_key, PlanLimits, UsageAction, UsageDecision, WarningLevel};
use lotkeeper_core::TenantScope;

impl Engine {
    /// Evaluates `action` for `tenant_id` without side effects.
    pub async fn check_usage(&self, tenant_id: &str, action: UsageAction) -> EngineResult<UsageDecision> {
        self.check_usage_at(tenant_id, action, Utc::now()).await
    }

    /// [`Engine::check_usage`] with sessions counted in the month of `at`.
    pub async fn check_usage_at(
        &self,
        tenant_id: &str,
        action: UsageAction,
        at: DateTime<Utc>,
    ) -> EngineResult<UsageDecision> {
        let scope = TenantScope {
            tenant_id: tenant_id.to_string(),
        };
        let limits = self.plan_limits(&scope).await?;
        let current = self.current_count(&scope, action, at).await?;
        let decision = limits.evaluate(action, current);

        match decision.warning_level {
            WarningLevel::None => {
                debug!(tenant_id, %action, current, "Usage within plan");
            }
            WarningLevel::Soft | WarningLevel::Critical => {
                warn!(
                    tenant_id,
                    %action,
                    current,
                    limit = ?decision.limit,
                    level = ?decision.warning_level,
                    "Tenant approaching plan limit"
                );
            }
            WarningLevel::Blocked => {
                warn!(
                    tenant_id,
                    %action,
                    current,
                    hard_limit = ?decision.hard_limit,
                    "Tenant blocked by plan limit"
                );
            }
        }

        Ok(decision)
    }

    /// Like [`Engine::check_usage`], but a blocked decision becomes
    /// [`EngineError::QuotaExceeded`]. Warnings pass through.
    pub(crate) async fn ensure_usage_allowed(
        &self,
        scope: &TenantScope,
        action: UsageAction,
    ) -> EngineResult<UsageDecision> {
        self.ensure_usage_allowed_at(scope, action, Utc::now()).await
    }

    pub(crate) async fn ensure_usage_allowed_at(
        &self,
        scope: &TenantScope,
        action: UsageAction,
        at: DateTime<Utc>,
    ) -> EngineResult<UsageDecision> {
        let decision = self.check_usage_at(&scope.tenant_id, action, at).await?;
        if decision.blocked {
            return Err(EngineError::QuotaExceeded {
                action,
                current: decision.current_count,
                limit: decision.limit.unwrap_or(-1),
                hard_limit: decision.hard_limit.unwrap_or(-1),
            });
        }
        Ok(decision)
    }

    async fn current_count(
        &self,
        scope: &TenantScope,
        action: UsageAction,
        at: DateTime<Utc>,
    ) -> EngineResult<i64> {
        let count = match action {
            UsageAction::AddLocation => self.db.locations().count_active(scope).await?,
            UsageAction::AddUser => self.db.users().count_active(scope).await?,
            UsageAction::CreateSession => {
                self.db
                    .usage()
                    .sessions_count(scope, &month_key(at))
                    .await?
            }
        };
        Ok(count)
    }

    /// Plan limits for the tenant, degrading to the static table.
    async fn plan_limits(&self, scope: &TenantScope) -> EngineResult<PlanLimits> {
        let tenant = self
            .db
            .tenants()
            .get_by_id(&scope.tenant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Tenant", scope.tenant_id.clone()))?;

        match self.db.plans().get_by_code(&tenant.plan_code).await {
            Ok(Some(plan)) => Ok(PlanLimits::from(&plan)),
            Ok(None) => {
                warn!(
                    tenant_id = %tenant.id,
                    plan_code = %tenant.plan_code,
                    "Plan not found, using fallback limits"
                );
                Ok(self.config.fallback_limits(&tenant.plan_code))
            }
            Err(err) => {
                warn!(
                    tenant_id = %tenant.id,
                    plan_code = %tenant.plan_code,
                    error = %err,
                    "Plan lookup failed, using fallback limits"
                );
                Ok(self.config.fallback_limits(&tenant.plan_code))
            }
        }
    }
}
