use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, Set};

/// Asserts that a student belongs to a unit. Attendance is only accepted
/// for enrolled students.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub unit_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    Unit,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn enroll(
        db: &DatabaseConnection,
        user_id: i64,
        unit_id: i64,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            unit_id: Set(unit_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }

    /// Point lookup backing the enrollment check of the scan path.
    pub async fn is_enrolled(
        db: &DatabaseConnection,
        user_id: i64,
        unit_id: i64,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((user_id, unit_id)).one(db).await?.is_some())
    }

    pub async fn student_count_for_unit(
        db: &DatabaseConnection,
        unit_id: i64,
    ) -> Result<i64, DbErr> {
        let c = Entity::find()
            .filter(Column::UnitId.eq(unit_id))
            .count(db)
            .await?;
        Ok(c as i64)
    }
}
