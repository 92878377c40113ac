//! # Scope Filter
//!
//! Turns a [`Scope`] into `WHERE` conditions on a dynamic query.
//!
//! ```text
//! Scope::Tenant { t, None }      →  ... AND tenant_id = ?
//! Scope::Tenant { t, Some(l) }   →  ... AND tenant_id = ? AND location_id = ?
//! Scope::Unscoped                →  ...            (Super Admin only)
//! ```
//!
//! List queries start from [`select_scoped`], so a repository cannot forget
//! the tenant condition: the filter is part of building the statement.

use lotkeeper_core::Scope;
use sqlx::{QueryBuilder, Sqlite};

/// Columns a table uses to carry tenant and location ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeColumns {
    pub tenant: &'static str,
    pub location: Option<&'static str>,
}

impl ScopeColumns {
    /// Row belongs to a tenant and a location (sessions, tariffs, shifts, ...).
    pub const LOCATION_OWNED: ScopeColumns = ScopeColumns {
        tenant: "tenant_id",
        location: Some("location_id"),
    };

    /// Row belongs to a tenant only; a location in scope does not narrow it.
    pub const TENANT_OWNED: ScopeColumns = ScopeColumns {
        tenant: "tenant_id",
        location: None,
    };

    /// The `tenants` table itself.
    pub const TENANT_ROW: ScopeColumns = ScopeColumns {
        tenant: "id",
        location: None,
    };

    /// The `locations` table itself.
    pub const LOCATION_ROW: ScopeColumns = ScopeColumns {
        tenant: "tenant_id",
        location: Some("id"),
    };
}

/// Starts `SELECT * FROM <table> WHERE 1 = 1` with the scope conditions
/// already pushed. Callers append further `AND ...` conditions and ordering.
pub fn select_scoped<'args>(
    table: &str,
    scope: &Scope,
    columns: ScopeColumns,
) -> QueryBuilder<'args, Sqlite> {
    let mut builder = QueryBuilder::new(format!("SELECT * FROM {table} WHERE 1 = 1"));
    push_scope(&mut builder, scope, columns);
    builder
}

/// Same as [`select_scoped`] for `SELECT COUNT(*)`.
pub fn count_scoped<'args>(
    table: &str,
    scope: &Scope,
    columns: ScopeColumns,
) -> QueryBuilder<'args, Sqlite> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {table} WHERE 1 = 1"));
    push_scope(&mut builder, scope, columns);
    builder
}

/// Appends the scope conditions to an existing `WHERE` clause.
pub fn push_scope(builder: &mut QueryBuilder<'_, Sqlite>, scope: &Scope, columns: ScopeColumns) {
    let Scope::Tenant {
        tenant_id,
        location_id,
    } = scope
    else {
        return;
    };

    builder
        .push(format!(" AND {} = ", columns.tenant))
        .push_bind(tenant_id.clone());

    if let (Some(column), Some(location_id)) = (columns.location, location_id) {
        builder
            .push(format!(" AND {column} = "))
            .push_bind(location_id.clone());
    }
}
