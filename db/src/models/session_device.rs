use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, Set};

/// A device fingerprint seen against a session. Advisory telemetry for
/// abuse review, never an access-control gate.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "session_devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub fingerprint: String,
    pub first_seen_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Adds the fingerprint to the session's seen-device set (idempotent)
    /// and returns how many distinct sessions this fingerprint has been
    /// seen on historically.
    pub async fn note_usage(
        db: &DatabaseConnection,
        session_id: i64,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let insert = Entity::insert(ActiveModel {
            session_id: Set(session_id),
            fingerprint: Set(fingerprint.to_owned()),
            first_seen_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([Column::SessionId, Column::Fingerprint])
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;

        match insert {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }

        Entity::find()
            .filter(Column::Fingerprint.eq(fingerprint))
            .count(db)
            .await
    }
}
