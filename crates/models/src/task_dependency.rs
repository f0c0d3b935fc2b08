use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task;

/// `task_id` cannot start before `depends_on_task_id` finishes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_dependency")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub task_id: Uuid,
    pub depends_on_task_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Task, DependsOn }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Task => Entity::belongs_to(task::Entity)
                .from(Column::TaskId)
                .to(task::Column::Id)
                .fk_name("fk_task_dependency_task")
                .into(),
            Relation::DependsOn => Entity::belongs_to(task::Entity)
                .from(Column::DependsOnTaskId)
                .to(task::Column::Id)
                .fk_name("fk_task_dependency_depends_on")
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
