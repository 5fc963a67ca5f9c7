use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryOrder, Set};

/// One time-boxed lecture meeting eligible for attendance scanning.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub unit_id: i64,
    pub created_by: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub ended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    Unit,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
    #[sea_orm(has_many = "super::session_device::Entity")]
    Devices,
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::session_device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Devices.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a session after validating its time window.
    pub async fn create(
        db: &DatabaseConnection,
        unit_id: i64,
        created_by: i64,
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        if start_time >= end_time {
            return Err(DbErr::Custom("start_time must be before end_time".into()));
        }

        let now = Utc::now();
        ActiveModel {
            unit_id: Set(unit_id),
            created_by: Set(created_by),
            title: Set(title.to_owned()),
            start_time: Set(start_time),
            end_time: Set(end_time),
            ended: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Whether this session currently accepts scans.
    ///
    /// The one predicate used by both QR issuance and scan validation, so the
    /// two paths cannot drift apart. Both window edges are inclusive.
    #[inline]
    pub fn is_scannable(&self, now: DateTime<Utc>) -> bool {
        !self.ended && self.start_time <= now && now <= self.end_time
    }

    /// Marks the session ended. No attendance may be recorded afterwards.
    pub async fn end(self, db: &DatabaseConnection) -> Result<Model, DbErr> {
        let mut active: ActiveModel = self.into();
        active.ended = Set(true);
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    /// The most recent session of a unit that is open for scanning right now.
    pub async fn find_current(
        db: &DatabaseConnection,
        unit_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Model>, DbErr> {
        let open = Entity::find()
            .filter(Column::UnitId.eq(unit_id))
            .filter(Column::Ended.eq(false))
            .filter(Column::StartTime.lte(now))
            .filter(Column::EndTime.gte(now))
            .order_by_desc(Column::StartTime)
            .one(db)
            .await?;
        Ok(open)
    }

    pub async fn attended_count(
        db: &DatabaseConnection,
        session_id: i64,
    ) -> Result<i64, DbErr> {
        let c = super::attendance_record::Entity::find()
            .filter(super::attendance_record::Column::SessionId.eq(session_id))
            .count(db)
            .await?;
        Ok(c as i64)
    }

    pub async fn attended_counts_for(
        db: &DatabaseConnection,
        session_ids: &[i64],
    ) -> Result<std::collections::HashMap<i64, i64>, DbErr> {
        use sea_orm::{FromQueryResult, QuerySelect};
        use sea_orm::sea_query::{Expr, Func};

        if session_ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        #[derive(FromQueryResult)]
        struct Row {
            session_id: i64,
            cnt: i64,
        }

        let rows: Vec<Row> = super::attendance_record::Entity::find()
            .select_only()
            .column(super::attendance_record::Column::SessionId)
            .column_as(
                Expr::expr(Func::count(Expr::col(
                    super::attendance_record::Column::UserId,
                ))),
                "cnt",
            )
            .filter(
                super::attendance_record::Column::SessionId.is_in(session_ids.iter().cloned()),
            )
            .group_by(super::attendance_record::Column::SessionId)
            .into_model::<Row>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(|r| (r.session_id, r.cnt)).collect())
    }
}
