pub mod attendance;
pub mod error;
pub mod qr_token;

pub use attendance::{AttendanceOutcome, AttendanceService};
pub use error::AttendanceError;
pub use qr_token::{IssuedToken, QrTokenPayload};
