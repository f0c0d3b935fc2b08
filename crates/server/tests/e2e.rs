use std::net::SocketAddr;

use configs::AppConfig;
use reqwest::StatusCode as HttpStatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

struct TestApp {
    base_url: String,
    client: reqwest::Client,
}

impl TestApp {
    async fn post(&self, path: &str, body: Value) -> anyhow::Result<(HttpStatusCode, Value)> {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("X-Actor", "e2e-tester")
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        Ok((status, res.json::<Value>().await.unwrap_or(Value::Null)))
    }

    async fn get(&self, path: &str) -> anyhow::Result<(HttpStatusCode, Value)> {
        let res = self.client.get(format!("{}{}", self.base_url, path)).send().await?;
        let status = res.status();
        Ok((status, res.json::<Value>().await.unwrap_or(Value::Null)))
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    // Use DATABASE_URL from environment; if not present, skip tests gracefully
    let url = std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("missing DATABASE_URL"))?;
    let mut cfg = AppConfig::default();
    cfg.database.url = url;
    cfg.database.connect_timeout_secs = 3;
    cfg.database.acquire_timeout_secs = 3;
    cfg.business.default_tax_rate_pct = 10.into();

    let app = server::startup::build_app(cfg).await?;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });
    Ok(TestApp { base_url: format!("http://{}:{}", addr.ip(), addr.port()), client: reqwest::Client::new() })
}

async fn app_or_skip() -> Option<TestApp> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return None; }
    match start_server().await {
        Ok(a) => Some(a),
        Err(e) => {
            eprintln!("skip e2e tests: {e}");
            None
        }
    }
}

fn amount(v: &Value) -> Option<Decimal> {
    v.as_str().and_then(|s| s.parse().ok())
}

fn tag(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..10]).to_ascii_uppercase()
}

/// Client, active project, employee, one slot and a 60% assignment on it.
async fn staffed(app: &TestApp) -> anyhow::Result<(Value, Value, Value)> {
    let (status, client) = app.post("/api/clients", json!({"name": tag("ACME"), "payment_terms_days": 30})).await?;
    assert_eq!(status, HttpStatusCode::CREATED);
    assert_eq!(client["created_by"], "e2e-tester");

    let (_, project) = app
        .post(
            "/api/projects",
            json!({
                "client_id": client["id"],
                "code": tag("P"),
                "name": "Data platform",
                "start_date": "2025-01-01",
                "end_date": "2025-12-31",
                "budget_amount": "120000"
            }),
        )
        .await?;
    let path = format!("/api/projects/{}/status", project["id"].as_str().unwrap_or_default());
    let (status, project) = app.post(&path, json!({"expected_version": project["row_version"], "status": "active"})).await?;
    assert_eq!(status, HttpStatusCode::OK);

    let (status, employee) = app
        .post(
            "/api/employees",
            json!({
                "code": tag("E"),
                "full_name": "Dana Reyes",
                "email": format!("{}@example.com", tag("dana").to_lowercase()),
                "monthly_salary": "8000",
                "billing_rate": "100"
            }),
        )
        .await?;
    assert_eq!(status, HttpStatusCode::CREATED);

    let (status, slot) = app
        .post(
            "/api/slots",
            json!({
                "project_id": project["id"],
                "role": "Engineer",
                "planned_allocation_pct": 100,
                "start_date": "2025-01-01",
                "end_date": "2025-06-30",
                "monthly_salary": "8000"
            }),
        )
        .await?;
    assert_eq!(status, HttpStatusCode::CREATED);

    let (status, assignment) = app
        .post(
            "/api/assignments",
            json!({
                "slot_id": slot["id"],
                "employee_id": employee["id"],
                "allocation_pct": 60,
                "start_date": "2025-01-01",
                "end_date": "2025-03-31"
            }),
        )
        .await?;
    assert_eq!(status, HttpStatusCode::CREATED);
    Ok((project, employee, assignment))
}

#[tokio::test]
async fn e2e_health() -> anyhow::Result<()> {
    let Some(app) = app_or_skip().await else { return Ok(()) };
    let (status, body) = app.get("/health").await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_overlapping_allocation_is_refused() -> anyhow::Result<()> {
    let Some(app) = app_or_skip().await else { return Ok(()) };
    let (project, employee, _) = staffed(&app).await?;

    let (_, slot) = app
        .post(
            "/api/slots",
            json!({
                "project_id": project["id"],
                "role": "Reviewer",
                "planned_allocation_pct": 100,
                "start_date": "2025-01-01",
                "end_date": "2025-06-30",
                "monthly_salary": "8000"
            }),
        )
        .await?;
    // 60% already held from January to March
    let (status, err) = app
        .post(
            "/api/assignments",
            json!({
                "slot_id": slot["id"],
                "employee_id": employee["id"],
                "allocation_pct": 50,
                "start_date": "2025-03-01",
                "end_date": "2025-04-30"
            }),
        )
        .await?;
    assert_eq!(status, HttpStatusCode::CONFLICT);
    assert_eq!(err["title"], "Allocation Exceeded");

    // starting the day after the first one ends is fine
    let (status, _) = app
        .post(
            "/api/assignments",
            json!({
                "slot_id": slot["id"],
                "employee_id": employee["id"],
                "allocation_pct": 50,
                "start_date": "2025-04-01",
                "end_date": "2025-04-30"
            }),
        )
        .await?;
    assert_eq!(status, HttpStatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn e2e_time_to_paid_invoice() -> anyhow::Result<()> {
    let Some(app) = app_or_skip().await else { return Ok(()) };
    let (project, _, assignment) = staffed(&app).await?;

    for (day, hours) in [("2025-01-06", "8"), ("2025-01-07", "4")] {
        let (status, entry) = app
            .post("/api/time-entries", json!({"assignment_id": assignment["id"], "work_date": day, "hours": hours}))
            .await?;
        assert_eq!(status, HttpStatusCode::CREATED);
        let review = format!("/api/time-entries/{}/review", entry["id"].as_str().unwrap_or_default());
        let (_, entry) = app.post(&review, json!({"expected_version": entry["row_version"], "action": "submit"})).await?;
        let (status, _) = app.post(&review, json!({"expected_version": entry["row_version"], "action": "approve"})).await?;
        assert_eq!(status, HttpStatusCode::OK);
    }

    let (status, invoice) = app
        .post(
            "/api/invoices",
            json!({"project_id": project["id"], "period_from": "2025-01-01", "period_to": "2025-01-31"}),
        )
        .await?;
    assert_eq!(status, HttpStatusCode::CREATED);
    // 12 h at 100, plus 10% tax
    assert_eq!(invoice["lines"].as_array().map(|l| l.len()), Some(1));
    assert_eq!(amount(&invoice["total"]), Some(dec!(1320)));
    assert!(invoice["invoice_number"].as_str().unwrap_or_default().starts_with("INV-2025-"));

    let id = invoice["id"].as_str().unwrap_or_default().to_string();
    let (status, issued) = app.post(&format!("/api/invoices/{id}/issue"), json!({"issue_date": "2025-02-01"})).await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(issued["due_date"], "2025-03-03");

    let (status, receipt) = app
        .post(&format!("/api/invoices/{id}/payments"), json!({"amount": "1320", "paid_on": "2025-02-20", "method": "wire"}))
        .await?;
    assert_eq!(status, HttpStatusCode::CREATED);
    assert_eq!(receipt["invoice"]["status"], "paid");

    // a second generation finds nothing left to bill
    let (status, _) = app
        .post(
            "/api/invoices",
            json!({"project_id": project["id"], "period_from": "2025-01-01", "period_to": "2025-01-31"}),
        )
        .await?;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    Ok(())
}
