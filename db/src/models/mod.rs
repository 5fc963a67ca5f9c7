pub mod attendance_record;
pub mod attendance_session;
pub mod course;
pub mod department;
pub mod enrollment;
pub mod session_device;
pub mod unit;
pub mod user;
