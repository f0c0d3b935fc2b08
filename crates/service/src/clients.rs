use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use common::pagination::Pagination;
use models::client::{self, NewClient};
use models::project::{self, ProjectStatus};
use models::{audit, validate};

use crate::audit::{check_version, update_versioned};
use crate::errors::ServiceError;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClientPatch {
    pub expected_version: i32,
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub billing_address: Option<String>,
    pub payment_terms_days: Option<i32>,
}

/// Create a client.
pub async fn create_client(db: &DatabaseConnection, input: NewClient, actor: &str) -> Result<client::Model, ServiceError> {
    let created = client::create(db, input, actor).await?;
    info!(client_id = %created.id, "client_created");
    Ok(created)
}

/// Get a client by id; deleted clients are not found.
pub async fn get_client(db: &DatabaseConnection, id: Uuid) -> Result<client::Model, ServiceError> {
    client::Entity::find_by_id(id)
        .filter(client::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("client"))
}

pub async fn list_clients(db: &DatabaseConnection, paging: Pagination) -> Result<Vec<client::Model>, ServiceError> {
    let (page, per_page) = paging.normalize();
    Ok(client::Entity::find()
        .filter(client::Column::IsDeleted.eq(false))
        .order_by_asc(client::Column::Name)
        .paginate(db, per_page)
        .fetch_page(page)
        .await?)
}

pub async fn update_client(db: &DatabaseConnection, id: Uuid, patch: ClientPatch) -> Result<client::Model, ServiceError> {
    let current = get_client(db, id).await?;
    check_version("client", patch.expected_version, current.row_version)?;
    let version = current.row_version;
    let mut am: client::ActiveModel = current.into();
    if let Some(name) = patch.name {
        am.name = Set(client::validate_name(&name)?);
    }
    if let Some(email) = patch.contact_email {
        am.contact_email = Set(validate::optional_email(Some(&email))?);
    }
    if let Some(address) = patch.billing_address {
        am.billing_address = Set(Some(address.trim().to_string()).filter(|a| !a.is_empty()));
    }
    if let Some(days) = patch.payment_terms_days {
        client::validate_payment_terms(days)?;
        am.payment_terms_days = Set(days);
    }
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, client::Column::RowVersion, version).await
}

/// Soft delete; refused while the client still has running projects.
pub async fn soft_delete_client(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let current = get_client(db, id).await?;
    let running = project::Entity::find()
        .filter(project::Column::ClientId.eq(id))
        .filter(project::Column::IsDeleted.eq(false))
        .filter(project::Column::Status.is_in([ProjectStatus::Active, ProjectStatus::OnHold]))
        .count(db)
        .await?;
    if running > 0 {
        return Err(ServiceError::conflict(format!("client has {running} running project(s)")));
    }
    let version = current.row_version;
    let mut am: client::ActiveModel = current.into();
    am.is_deleted = Set(true);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, client::Column::RowVersion, version).await?;
    info!(client_id = %id, "client_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::change_project_status;
    use crate::test_support::{get_db, staffed_project};

    #[tokio::test]
    async fn client_crud_service() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        let c = create_client(
            &db,
            NewClient { name: "  Acme Corp ".into(), contact_email: Some("ap@acme.test".into()), ..Default::default() },
            "alice",
        )
        .await?;
        assert_eq!(c.name, "Acme Corp");
        assert_eq!(c.payment_terms_days, client::DEFAULT_PAYMENT_TERMS_DAYS);

        let stale = ClientPatch { expected_version: c.row_version + 1, name: Some("x".into()), ..Default::default() };
        assert!(matches!(update_client(&db, c.id, stale).await, Err(ServiceError::Conflict(_))));

        let patch = ClientPatch { expected_version: c.row_version, payment_terms_days: Some(45), ..Default::default() };
        let updated = update_client(&db, c.id, patch).await?;
        assert_eq!(updated.payment_terms_days, 45);
        assert_eq!(updated.row_version, c.row_version + 1);

        soft_delete_client(&db, c.id).await?;
        assert!(matches!(get_client(&db, c.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_terms_rejected() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let input = NewClient { name: "Late Payer".into(), payment_terms_days: Some(365), ..Default::default() };
        assert!(matches!(create_client(&db, input, "t").await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn write_from_stale_read_is_conflict() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let read = create_client(&db, NewClient { name: "Racing Ltd".into(), ..Default::default() }, "t").await?;

        // another writer gets in first
        let patch = ClientPatch { expected_version: read.row_version, payment_terms_days: Some(60), ..Default::default() };
        update_client(&db, read.id, patch).await?;

        let mut am: client::ActiveModel = read.clone().into();
        am.payment_terms_days = Set(15);
        am.row_version = Set(read.row_version + 1);
        let err = update_versioned(&db, am, client::Column::RowVersion, read.row_version).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err}");
        assert_eq!(get_client(&db, read.id).await?.payment_terms_days, 60);
        Ok(())
    }

    #[tokio::test]
    async fn client_with_running_project_is_kept() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let f = staffed_project(&db).await?;
        assert!(matches!(soft_delete_client(&db, f.client.id).await, Err(ServiceError::Conflict(_))));

        let held = change_project_status(&db, f.project.id, f.project.row_version, ProjectStatus::OnHold).await?;
        assert!(matches!(soft_delete_client(&db, f.client.id).await, Err(ServiceError::Conflict(_))));

        change_project_status(&db, held.id, held.row_version, ProjectStatus::Cancelled).await?;
        soft_delete_client(&db, f.client.id).await?;
        assert!(matches!(get_client(&db, f.client.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
