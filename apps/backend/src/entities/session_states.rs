use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One coordination record per session. `phase` holds the snake_case phase
/// name; every update filters on it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "session_id")]
    pub session_id: String,
    pub phase: String,
    #[sea_orm(column_name = "timer_deadline")]
    pub timer_deadline: Option<OffsetDateTime>,
    #[sea_orm(column_name = "phase_entered_at")]
    pub phase_entered_at: OffsetDateTime,
    pub topic: Option<String>,
    #[sea_orm(column_name = "topic_conflict_count")]
    pub topic_conflict_count: i32,
    #[sea_orm(column_name = "pro_pick")]
    pub pro_pick: Option<String>,
    #[sea_orm(column_name = "con_pick")]
    pub con_pick: Option<String>,
    pub version: i32,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sessions::Entity",
        from = "Column::SessionId",
        to = "super::sessions::Column::Id"
    )]
    Session,
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
