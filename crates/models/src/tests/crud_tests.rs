use anyhow::Result;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use super::{test_db, unique};
use crate::errors::ModelError;
use crate::{audit, client, employee, vendor};

fn new_employee(code: &str) -> employee::NewEmployee {
    employee::NewEmployee {
        code: code.to_string(),
        full_name: "Priya Natarajan".into(),
        email: format!("{}@example.com", code.to_ascii_lowercase()),
        designation: "Consultant".into(),
        monthly_salary: dec!(7000),
        monthly_incentive: dec!(500),
        monthly_commission_share: dec!(0),
        billing_rate: dec!(90),
    }
}

#[tokio::test]
async fn client_create_read_update() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };

    let input = client::NewClient { name: unique("Globex"), contact_email: Some(" ap@globex.test ".into()), ..Default::default() };
    let created = client::create(&db, input, "tester").await?;
    assert_eq!(created.contact_email.as_deref(), Some("ap@globex.test"));
    assert_eq!(created.payment_terms_days, client::DEFAULT_PAYMENT_TERMS_DAYS);
    assert_eq!(created.row_version, audit::INITIAL_VERSION);
    assert_eq!(created.created_by, "tester");

    let found = client::Entity::find_by_id(created.id).one(&db).await?;
    assert_eq!(found.as_ref().map(|c| c.id), Some(created.id));

    let mut am: client::ActiveModel = created.into();
    am.payment_terms_days = Set(45);
    let updated = am.update(&db).await?;
    assert_eq!(updated.payment_terms_days, 45);
    Ok(())
}

#[tokio::test]
async fn duplicate_employee_code_is_reported_as_duplicate() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let code = unique("EMP");
    let first = employee::create(&db, new_employee(&code), "tester").await?;
    assert_eq!(first.monthly_cost(), dec!(7500));

    let mut again = new_employee(&code);
    again.email = "other@example.com".into();
    match employee::create(&db, again, "tester").await {
        Err(ModelError::Duplicate(_)) => Ok(()),
        other => panic!("expected a duplicate error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_vendor_email_never_reaches_the_database() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let input = vendor::NewVendor { name: unique("Initech"), email: Some("no-at-sign".into()), ..Default::default() };
    assert!(matches!(vendor::create(&db, input, "tester").await, Err(ModelError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn schema_sync_is_repeatable() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    crate::schema::sync(&db).await?;
    Ok(())
}
