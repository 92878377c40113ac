//! # Parking Session State Machine
//!
//! Governs the lifecycle of a [`ParkingSession`]:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │  ENTRY preconditions            EXIT preconditions                    │
//! │  ───────────────────            ──────────────────                    │
//! │  • active shift (user+loc)      • active shift (user+loc)             │
//! │  • no ACTIVE session for plate  • ACTIVE session for plate            │
//! │  • capacity (if enabled)                                              │
//! │          │                                  │                         │
//! │          ▼                                  ▼                         │
//! │      ParkingSession::open  ──► ACTIVE ──► complete() ──► COMPLETED    │
//! │                                  │                                    │
//! │                                  └──► cancel() ──► CANCELLED          │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shift lookup and persistence live in the engine; this module only decides
//! whether a transition is legal and what it stamps.

use chrono::{DateTime, Utc};

use crate::discount::AppliedDiscount;
use crate::error::{CoreError, CoreResult};
use crate::types::{ParkingSession, PlanType, SessionStatus, VehicleType};

/// Data needed to open a session at entry.
#[derive(Debug, Clone)]
pub struct OpenSession {
    pub id: String,
    pub tenant_id: String,
    pub location_id: String,
    pub plate: String,
    pub vehicle_type: VehicleType,
    pub plan_type: PlanType,
    pub entry_time: DateTime<Utc>,
    pub entry_shift_id: String,
    pub ticket_number: Option<String>,
    pub created_by: String,
}

/// What an exit stamps onto the session.
#[derive(Debug, Clone)]
pub struct ExitStamp {
    pub exit_time: DateTime<Utc>,
    pub exit_shift_id: String,
    pub applied: AppliedDiscount,
}

impl ParkingSession {
    /// Creates a new ACTIVE session.
    pub fn open(params: OpenSession) -> Self {
        ParkingSession {
            id: params.id,
            tenant_id: params.tenant_id,
            location_id: params.location_id,
            plate: params.plate,
            vehicle_type: params.vehicle_type,
            plan_type: params.plan_type,
            entry_time: params.entry_time,
            exit_time: None,
            cost: None,
            status: SessionStatus::Active,
            entry_shift_id: params.entry_shift_id,
            exit_shift_id: None,
            discount: 0,
            discount_reason: None,
            agreement_id: None,
            ticket_number: params.ticket_number,
            created_by: params.created_by,
            created_at: params.entry_time,
            updated_at: params.entry_time,
        }
    }

    /// Rejects any transition out of a terminal state.
    pub fn ensure_active(&self) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::InvalidSessionStatus {
                session_id: self.id.clone(),
                current_status: self.status.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// ACTIVE → COMPLETED, stamping exit time, final cost and discount.
    ///
    /// The stored `cost` is the amount charged after discount.
    pub fn complete(&mut self, stamp: ExitStamp) -> CoreResult<()> {
        self.ensure_active()?;
        if stamp.exit_time < self.entry_time {
            return Err(CoreError::ExitBeforeEntry {
                entry_time: self.entry_time.to_rfc3339(),
                exit_time: stamp.exit_time.to_rfc3339(),
            });
        }

        self.status = SessionStatus::Completed;
        self.exit_time = Some(stamp.exit_time);
        self.exit_shift_id = Some(stamp.exit_shift_id);
        self.cost = Some(stamp.applied.final_cost.amount());
        self.discount = stamp.applied.discount.amount();
        self.discount_reason = stamp.applied.reason;
        self.agreement_id = stamp.applied.agreement_id;
        self.updated_at = stamp.exit_time;
        Ok(())
    }

    /// ACTIVE → CANCELLED. No cost is recorded.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_active()?;
        self.status = SessionStatus::Cancelled;
        self.exit_time = Some(at);
        self.updated_at = at;
        Ok(())
    }
}

/// Entry precondition: the plate must not already be parked.
///
/// Returns the conflicting session id inside the error.
pub fn ensure_plate_free(existing: Option<&ParkingSession>) -> CoreResult<()> {
    match existing {
        Some(session) if session.is_active() => Err(CoreError::ActiveSessionExists {
            plate: session.plate.clone(),
            session_id: session.id.clone(),
        }),
        _ => Ok(()),
    }
}

/// Capacity rule. `capacity = None` means unlimited.
///
/// ## Example
/// ```rust
/// use lotkeeper_core::session::check_capacity;
/// use lotkeeper_core::VehicleType;
///
/// assert!(check_capacity(VehicleType::Car, 49, Some(50)).is_ok());
/// assert!(check_capacity(VehicleType::Car, 50, Some(50)).is_err());
/// assert!(check_capacity(VehicleType::Other, 10_000, None).is_ok());
/// ```
pub fn check_capacity(vehicle_type: VehicleType, active: i64, capacity: Option<i64>) -> CoreResult<()> {
    match capacity {
        Some(capacity) if active >= capacity => Err(CoreError::CapacityReached {
            vehicle_type: vehicle_type.as_str().to_string(),
            active,
            capacity,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::{Duration, TimeZone};

    fn open_session() -> ParkingSession {
        ParkingSession::open(OpenSession {
            id: "s-1".to_string(),
            tenant_id: "t-1".to_string(),
            location_id: "loc-1".to_string(),
            plate: "ABC123".to_string(),
            vehicle_type: VehicleType::Car,
            plan_type: PlanType::Hour,
            entry_time: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            entry_shift_id: "shift-1".to_string(),
            ticket_number: Some("1".to_string()),
            created_by: "u-1".to_string(),
        })
    }

    fn stamp(session: &ParkingSession) -> ExitStamp {
        ExitStamp {
            exit_time: session.entry_time + Duration::minutes(70),
            exit_shift_id: "shift-2".to_string(),
            applied: AppliedDiscount {
                original: Money::from_amount(6000),
                discount: Money::from_amount(1000),
                final_cost: Money::from_amount(5000),
                reason: Some("promo".to_string()),
                agreement_id: None,
            },
        }
    }

    #[test]
    fn test_open_is_active() {
        let session = open_session();
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.cost.is_none());
        assert!(session.exit_time.is_none());
    }

    #[test]
    fn test_complete_stamps_fields() {
        let mut session = open_session();
        let s = stamp(&session);
        session.complete(s).unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.cost, Some(5000));
        assert_eq!(session.discount, 1000);
        assert_eq!(session.exit_shift_id.as_deref(), Some("shift-2"));
        assert_eq!(session.discount_reason.as_deref(), Some("promo"));
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut session = open_session();
        let s = stamp(&session);
        session.complete(s.clone()).unwrap();

        let err = session.complete(s).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSessionStatus { .. }));

        let at = session.entry_time;
        assert!(session.cancel(at).is_err());
    }

    #[test]
    fn test_cancel() {
        let mut session = open_session();
        let at = session.entry_time + Duration::minutes(1);
        session.cancel(at).unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
        assert!(session.cost.is_none());
    }

    #[test]
    fn test_plate_conflict_reports_session() {
        let session = open_session();
        let err = ensure_plate_free(Some(&session)).unwrap_err();
        match err {
            CoreError::ActiveSessionExists { session_id, .. } => assert_eq!(session_id, "s-1"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(ensure_plate_free(None).is_ok());
    }
}
