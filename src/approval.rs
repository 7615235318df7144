use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::error::Result;
use crate::models::DailyReport;
use crate::store::get_daily_report;
use crate::users::get_user;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalState {
    Pending,
    Approved { by: Option<i64>, at: Option<NaiveDateTime> },
}

impl ApprovalState {
    pub fn of(report: &DailyReport) -> Self {
        if report.is_approved {
            Self::Approved {
                by: report.approved_by,
                at: report.approved_at,
            }
        } else {
            Self::Pending
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved { .. } => "approved",
        }
    }
}

/// Mark a report approved by `approver_id` at `at`.
///
/// There is no way back to pending. Approving an approved report again
/// overwrites the approver and timestamp.
pub fn approve(
    conn: &Connection,
    report_id: i64,
    approver_id: i64,
    at: NaiveDateTime,
) -> Result<ApprovalState> {
    let before = get_daily_report(conn, report_id)?;
    get_user(conn, approver_id)?;

    if before.is_approved {
        tracing::warn!(
            report_id,
            previous_approver = ?before.approved_by,
            "report already approved, re-stamping"
        );
    }

    conn.execute(
        "UPDATE daily_reports SET is_approved = 1, approved_at = ?1, approved_by = ?2 WHERE id = ?3",
        rusqlite::params![at, approver_id, report_id],
    )?;
    tracing::info!(report_id, approver_id, "approved daily report");

    Ok(ApprovalState::of(&get_daily_report(conn, report_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{add_user, test_db};
    use crate::error::DaybookError;
    use crate::store::create_report;
    use crate::store::test_support::submission;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_new_report_is_pending() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let id = create_report(&conn, user, &submission("2025-03-04", &["category=1"])).unwrap();
        let report = get_daily_report(&conn, id).unwrap();
        assert_eq!(ApprovalState::of(&report), ApprovalState::Pending);
        assert_eq!(report.approved_at, None);
    }

    #[test]
    fn test_approve_stamps_approver_and_time() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let manager = add_user(&conn, "Maya");
        let id = create_report(&conn, user, &submission("2025-03-04", &["category=1"])).unwrap();
        let state = approve(&conn, id, manager, at("2025-03-05 09:00:00")).unwrap();
        assert_eq!(
            state,
            ApprovalState::Approved {
                by: Some(manager),
                at: Some(at("2025-03-05 09:00:00"))
            }
        );
        assert_eq!(state.label(), "approved");
    }

    #[test]
    fn test_reapproval_overwrites_stamp() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let first = add_user(&conn, "Maya");
        let second = add_user(&conn, "Rudi");
        let id = create_report(&conn, user, &submission("2025-03-04", &["category=1"])).unwrap();
        approve(&conn, id, first, at("2025-03-05 09:00:00")).unwrap();
        let state = approve(&conn, id, second, at("2025-03-06 14:30:00")).unwrap();
        assert_eq!(
            state,
            ApprovalState::Approved {
                by: Some(second),
                at: Some(at("2025-03-06 14:30:00"))
            }
        );
    }

    #[test]
    fn test_approve_missing_report() {
        let (_dir, conn) = test_db();
        let manager = add_user(&conn, "Maya");
        let err = approve(&conn, 5, manager, at("2025-03-05 09:00:00")).unwrap_err();
        assert!(matches!(err, DaybookError::NotFound { entity: "report", id: 5 }));
    }

    #[test]
    fn test_approve_unknown_approver() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let id = create_report(&conn, user, &submission("2025-03-04", &["category=1"])).unwrap();
        let err = approve(&conn, id, 99, at("2025-03-05 09:00:00")).unwrap_err();
        assert!(matches!(err, DaybookError::NotFound { entity: "user", id: 99 }));
        let report = get_daily_report(&conn, id).unwrap();
        assert!(!report.is_approved);
    }
}
