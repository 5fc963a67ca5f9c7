mod delete_test;
mod get_test;
mod post_test;
mod put_test;

use axum::body::Body as AxumBody;
use axum::http::Request;
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;

use api::auth::generate_jwt;
use db::models::{
    attendance_session::Model as SessionModel,
    course::Model as CourseModel,
    department::Model as DepartmentModel,
    enrollment::Model as Enrollment,
    unit::Model as UnitModel,
    user::{Model as UserModel, Role},
};

pub struct TestCtx {
    pub lecturer: UserModel,
    pub other_lecturer: UserModel,
    pub admin: UserModel,
    pub student: UserModel,
    pub unit: UnitModel,
    pub session: SessionModel,
    pub window: (DateTime<Utc>, DateTime<Utc>),
}

/// Seeds one unit with an owning lecturer, an enrolled student, an
/// unrelated lecturer, an admin, and one session that is open right now.
pub async fn setup(db: &DatabaseConnection) -> TestCtx {
    let lecturer = UserModel::create(db, "lect1", "lect1@uni.test", "password", Role::Lecturer)
        .await
        .unwrap();
    let other_lecturer =
        UserModel::create(db, "lect2", "lect2@uni.test", "password", Role::Lecturer)
            .await
            .unwrap();
    let admin = UserModel::create(
        db,
        "admin1",
        "admin1@uni.test",
        "password",
        Role::DepartmentAdmin,
    )
    .await
    .unwrap();
    let student = UserModel::create(db, "stud1", "stud1@uni.test", "password", Role::Student)
        .await
        .unwrap();

    let dept = DepartmentModel::create(db, "SCI", "Science").await.unwrap();
    let course = CourseModel::create(db, dept.id, "CS", "Computer Science")
        .await
        .unwrap();
    let unit = UnitModel::create(db, course.id, lecturer.id, "CS101", "Intro to CS")
        .await
        .unwrap();

    Enrollment::enroll(db, student.id, unit.id).await.unwrap();

    let start = Utc::now() - Duration::minutes(5);
    let end = start + Duration::hours(1);
    let session = SessionModel::create(db, unit.id, lecturer.id, "Lecture 5", start, end)
        .await
        .unwrap();

    TestCtx {
        lecturer,
        other_lecturer,
        admin,
        student,
        unit,
        session,
        window: (start, end),
    }
}

pub fn bearer(user: &UserModel) -> String {
    let (token, _) = generate_jwt(user.id, user.role);
    format!("Bearer {token}")
}

pub fn get(uri: &str, user: &UserModel) -> Request<AxumBody> {
    empty_req("GET", uri, user)
}

pub fn empty_req(method: &str, uri: &str, user: &UserModel) -> Request<AxumBody> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", bearer(user))
        .body(AxumBody::empty())
        .unwrap()
}

pub fn json_req(
    method: &str,
    uri: &str,
    user: &UserModel,
    body: serde_json::Value,
) -> Request<AxumBody> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", bearer(user))
        .header("Content-Type", "application/json")
        .body(AxumBody::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
