pub mod m202601120001_create_users;
pub mod m202601120002_create_departments;
pub mod m202601120003_create_courses;
pub mod m202601120004_create_units;
pub mod m202601120005_create_enrollments;
pub mod m202601120006_create_attendance;
