use sea_orm::DbErr;
use thiserror::Error;

/// Everything that can terminate a QR issuance or scan submission.
///
/// Each variant maps to a distinct user-facing outcome at the API boundary;
/// only `Db` surfaces as an opaque internal error. "Already marked" is not
/// an error at all, it is a soft-success [`crate::AttendanceOutcome`].
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Token fails to parse as base64/JSON or is missing required fields.
    #[error("Malformed attendance token")]
    MalformedToken,

    /// Recomputed digest mismatch; tampering or corruption.
    #[error("Attendance token failed integrity check")]
    IntegrityFailure,

    /// The token's freshness window has elapsed; a fresh QR code is needed.
    #[error("Attendance token has expired")]
    ExpiredToken,

    /// The token references a session that does not exist.
    #[error("Attendance session not found")]
    SessionNotFound,

    /// The session is outside its time window or has been ended.
    #[error("Attendance session is not open for scanning")]
    SessionClosed,

    /// The student has no enrollment record for the session's unit.
    #[error("Student is not enrolled in this unit")]
    NotEnrolled,

    /// QR image rendering failed at issuance time (lecturer-facing).
    #[error("Failed to render QR code: {0}")]
    EncodingFailure(String),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}
