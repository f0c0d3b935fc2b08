//! Optimistic-concurrency helpers.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter};

use crate::errors::ServiceError;

/// Reject an update made against a stale copy of the record.
pub fn check_version(entity: &str, expected: i32, actual: i32) -> Result<(), ServiceError> {
    if expected != actual {
        return Err(ServiceError::Conflict(format!(
            "{entity} was modified concurrently (current version {actual}, request carried {expected})"
        )));
    }
    Ok(())
}

/// Write `am` only while the stored row still carries `expected` in
/// `version_col`. A row changed since it was read is a `Conflict`.
pub async fn update_versioned<A, C>(
    db: &C,
    am: A,
    version_col: <A::Entity as EntityTrait>::Column,
    expected: i32,
) -> Result<<A::Entity as EntityTrait>::Model, ServiceError>
where
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    match <A::Entity as EntityTrait>::update(am).filter(version_col.eq(expected)).exec(db).await {
        Ok(saved) => Ok(saved),
        Err(DbErr::RecordNotUpdated) => Err(ServiceError::Conflict(format!(
            "record was modified concurrently (expected version {expected})"
        ))),
        Err(e) => Err(e.into()),
    }
}
