use anyhow::Result;
use sea_orm::{EntityTrait, TransactionTrait};

use super::{test_db, unique};
use crate::client;

#[tokio::test]
async fn committed_insert_is_visible() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let txn = db.begin().await?;
    let created = client::create(&txn, client::NewClient { name: unique("Commit"), ..Default::default() }, "tester").await?;
    txn.commit().await?;
    assert!(client::Entity::find_by_id(created.id).one(&db).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn rolled_back_insert_is_gone() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let txn = db.begin().await?;
    let id = client::create(&txn, client::NewClient { name: unique("Rollback"), ..Default::default() }, "tester").await?.id;
    txn.rollback().await?;
    assert!(client::Entity::find_by_id(id).one(&db).await?.is_none());
    Ok(())
}
