use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One student's presence claim for one session.
///
/// The composite primary key enforces at-most-once per (session, student);
/// writes go through [`Model::record_if_absent`] so a lost race maps to the
/// existing row instead of a duplicate-key error.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    pub status: Status,
    /// Server time at acceptance, never client-supplied.
    pub taken_at: DateTime<Utc>,
    pub device_fingerprint: Option<String>,
}

/// Attendance status. The scan path only ever writes `Present`; the other
/// values exist for the lecturer-facing toggle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Status {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "late")]
    Late,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inserts a `Present` record unless one already exists for
    /// (session, student).
    ///
    /// A single conditional insert against the composite primary key; the
    /// duplicate-key outcome is mapped to `(false, existing)` so concurrent
    /// scans by the same student can never produce two rows.
    pub async fn record_if_absent(
        db: &DatabaseConnection,
        session_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
        device_fingerprint: Option<&str>,
    ) -> Result<(bool, Model), DbErr> {
        let insert = Entity::insert(ActiveModel {
            session_id: Set(session_id),
            user_id: Set(user_id),
            status: Set(Status::Present),
            taken_at: Set(now),
            device_fingerprint: Set(device_fingerprint.map(|s| s.to_owned())),
        })
        .on_conflict(
            OnConflict::columns([Column::SessionId, Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;

        let created = match insert {
            Ok(_) => true,
            Err(DbErr::RecordNotInserted) => false,
            Err(e) => return Err(e),
        };

        let record = Entity::find_by_id((session_id, user_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!(
                    "Attendance record ({session_id}, {user_id}) vanished after insert"
                ))
            })?;

        Ok((created, record))
    }

    /// Lecturer-facing status toggle. Not reachable from the scan path.
    pub async fn set_status(
        self,
        db: &DatabaseConnection,
        status: Status,
    ) -> Result<Model, DbErr> {
        let mut active: ActiveModel = self.into();
        active.status = Set(status);
        active.update(db).await
    }

    pub async fn find_for_session(
        db: &DatabaseConnection,
        session_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .all(db)
            .await
    }
}
