//! Scan-submission orchestration.
//!
//! A single submission walks a strictly linear pipeline: decode, session
//! lookup, time-window check, enrollment check, conditional ledger insert,
//! device telemetry. Every step either advances or terminates; nothing is
//! resumable, a second submission always restarts from decode.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use tracing::{info, warn};

use db::models::{
    attendance_record::Model as AttendanceRecord,
    attendance_session::{Entity as SessionEntity, Model as Session},
    enrollment::Model as Enrollment,
    session_device::Model as SessionDevice,
};
use util::config;

use crate::error::AttendanceError;
use crate::qr_token::{self, IssuedToken};

/// Terminal state of an accepted submission.
///
/// `AlreadyMarked` is deliberately not an error: from the student's point
/// of view a repeat scan is a benign "you're already marked present".
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttendanceOutcome {
    Accepted {
        record: AttendanceRecord,
        /// Distinct sessions this device fingerprint has been seen on,
        /// when a fingerprint was supplied. Advisory only.
        device_sessions: Option<u64>,
    },
    AlreadyMarked {
        record: AttendanceRecord,
    },
}

pub struct AttendanceService;

impl AttendanceService {
    /// Validates a scanned token and records attendance at most once per
    /// (session, student).
    ///
    /// Check order is fixed: decode (integrity + freshness), session
    /// lookup, time window, enrollment, ledger insert. A stale token on an
    /// open session therefore reports `ExpiredToken`, not `SessionClosed`.
    pub async fn submit(
        db: &DatabaseConnection,
        raw_token: &str,
        student_id: i64,
        device_fingerprint: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let payload = qr_token::decode(
            raw_token,
            &config::qr_secret(),
            now,
            config::qr_freshness_seconds(),
        )?;

        let session = SessionEntity::find_by_id(payload.s)
            .one(db)
            .await?
            .ok_or(AttendanceError::SessionNotFound)?;

        if !session.is_scannable(now) {
            return Err(AttendanceError::SessionClosed);
        }

        if !Enrollment::is_enrolled(db, student_id, session.unit_id).await? {
            return Err(AttendanceError::NotEnrolled);
        }

        let (created, record) = AttendanceRecord::record_if_absent(
            db,
            session.id,
            student_id,
            now,
            device_fingerprint,
        )
        .await?;

        if !created {
            return Ok(AttendanceOutcome::AlreadyMarked { record });
        }

        // Telemetry is best-effort: an accepted record is never rolled back
        // because the device-set write failed.
        let device_sessions = match device_fingerprint {
            Some(fp) => match SessionDevice::note_usage(db, session.id, fp, now).await {
                Ok(count) => {
                    if count > 1 {
                        info!(
                            session_id = session.id,
                            fingerprint = fp,
                            sessions_seen = count,
                            "Device fingerprint reused across sessions"
                        );
                    }
                    Some(count)
                }
                Err(e) => {
                    warn!(
                        session_id = session.id,
                        error = %e,
                        "Failed to record device usage; attendance kept"
                    );
                    None
                }
            },
            None => None,
        };

        info!(
            session_id = session.id,
            student_id, "Attendance recorded"
        );

        Ok(AttendanceOutcome::Accepted {
            record,
            device_sessions,
        })
    }

    /// Issues the current QR material for a session.
    ///
    /// Uses the same time-window predicate as the scan path, so a session
    /// that cannot be scanned cannot hand out codes either.
    pub fn issue_qr(session: &Session, now: DateTime<Utc>) -> Result<IssuedToken, AttendanceError> {
        if !session.is_scannable(now) {
            return Err(AttendanceError::SessionClosed);
        }
        qr_token::encode(
            session.id,
            &config::qr_secret(),
            now,
            config::qr_rotation_seconds(),
        )
    }
}
