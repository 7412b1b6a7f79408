//! HTTP API tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot` over the
//! in-memory stores.

use std::str::FromStr;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use interface_api::auth::{create_token, roles};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState, Ports};

const SECRET: &str = "api-test-secret";

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let config = ApiConfig {
            jwt_secret: SECRET.to_string(),
            ..Default::default()
        };
        let state = AppState::new(config, Ports::in_memory(false)).unwrap();
        Self {
            router: create_router(state),
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn token(subject: Uuid, role: &str) -> String {
    create_token(&subject.to_string(), vec![role.to_string()], SECRET, 300).unwrap()
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

struct Actors {
    admin: String,
    finance: String,
    workflow: String,
    agent_id: Uuid,
    agent: String,
}

fn actors() -> Actors {
    let agent_id = Uuid::new_v4();
    Actors {
        admin: token(Uuid::new_v4(), roles::ADMIN),
        finance: token(Uuid::new_v4(), roles::FINANCE),
        workflow: token(Uuid::new_v4(), roles::WORKFLOW),
        agent_id,
        agent: token(agent_id, roles::AGENT),
    }
}

/// Flat 500 rule for the agent and course, plus one approved commission
async fn approved_500(app: &TestApp, who: &Actors) -> Value {
    let course_id = Uuid::new_v4();
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/rules",
            Some(&who.admin),
            Some(json!({
                "agent_id": who.agent_id,
                "course_id": course_id,
                "kind": "flat",
                "value": "500",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, record) = app
        .call(
            Method::POST,
            "/api/v1/commissions",
            Some(&who.workflow),
            Some(json!({
                "application_id": Uuid::new_v4(),
                "agent_id": who.agent_id,
                "course_id": course_id,
                "university_id": Uuid::new_v4(),
                "base_amount": "10000",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&record["amount"]), dec!(500));
    assert_eq!(record["status"], "pending");

    let uri = format!("/api/v1/commissions/{}/approve", record["id"].as_str().unwrap());
    let (status, record) = app.call(Method::POST, &uri, Some(&who.finance), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "approved");
    record
}

// ============================================================================
// Health and authentication
// ============================================================================

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn readiness_reports_every_store() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["adapters"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/api/v1/rules", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app
        .call(Method::GET, "/api/v1/rules", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn agent_cannot_manage_rules() {
    let app = TestApp::new();
    let who = actors();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/rules",
            Some(&who.agent),
            Some(json!({ "course_id": Uuid::new_v4(), "kind": "percentage", "value": "10" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn agent_cannot_read_another_agents_earnings() {
    let app = TestApp::new();
    let who = actors();
    let uri = format!("/api/v1/agents/{}/earnings", Uuid::new_v4());
    let (status, _) = app.call(Method::GET, &uri, Some(&who.agent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let own = format!("/api/v1/agents/{}/earnings", who.agent_id);
    let (status, _) = app.call(Method::GET, &own, Some(&who.agent), None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Rules
// ============================================================================

#[tokio::test]
async fn invalid_rule_is_unprocessable() {
    let app = TestApp::new();
    let who = actors();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/rules",
            Some(&who.admin),
            Some(json!({ "course_id": Uuid::new_v4(), "kind": "percentage", "value": "150" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn rule_can_be_repriced_and_deactivated() {
    let app = TestApp::new();
    let who = actors();
    let (_, rule) = app
        .call(
            Method::POST,
            "/api/v1/rules",
            Some(&who.admin),
            Some(json!({ "university_id": Uuid::new_v4(), "kind": "percentage", "value": "10" })),
        )
        .await;
    assert_eq!(rule["priority"], 4);
    let id = rule["id"].as_str().unwrap().to_string();

    let (status, rule) = app
        .call(
            Method::PUT,
            &format!("/api/v1/rules/{id}/pricing"),
            Some(&who.admin),
            Some(json!({ "kind": "flat", "value": "750" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rule["kind"], "flat");

    let (status, rule) = app
        .call(Method::POST, &format!("/api/v1/rules/{id}/deactivate"), Some(&who.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rule["active"], false);

    let (status, rules) = app
        .call(Method::GET, "/api/v1/rules?active=true", Some(&who.finance), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(rules.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rule_query_rejects_unknown_priority() {
    let app = TestApp::new();
    let who = actors();
    let (status, _) = app
        .call(Method::GET, "/api/v1/rules?priority=9", Some(&who.admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Commissions
// ============================================================================

#[tokio::test]
async fn unmatched_commission_is_zero() {
    let app = TestApp::new();
    let who = actors();
    let (status, record) = app
        .call(
            Method::POST,
            "/api/v1/commissions",
            Some(&who.workflow),
            Some(json!({
                "application_id": Uuid::new_v4(),
                "agent_id": who.agent_id,
                "course_id": Uuid::new_v4(),
                "university_id": Uuid::new_v4(),
                "base_amount": "8000",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&record["amount"]), Decimal::ZERO);
    assert!(record["rule_id"].is_null());
}

#[tokio::test]
async fn duplicate_application_is_bad_request() {
    let app = TestApp::new();
    let who = actors();
    let body = json!({
        "application_id": Uuid::new_v4(),
        "agent_id": who.agent_id,
        "course_id": Uuid::new_v4(),
        "university_id": Uuid::new_v4(),
        "base_amount": "8000",
    });

    let (status, _) = app
        .call(Method::POST, "/api/v1/commissions", Some(&who.workflow), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = app
        .call(Method::POST, "/api/v1/commissions", Some(&who.workflow), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "bad_request");
}

#[tokio::test]
async fn foreign_currency_commission_is_refused() {
    let app = TestApp::new();
    let who = actors();
    approved_500(&app, &who).await;

    let (status, error) = app
        .call(
            Method::POST,
            "/api/v1/commissions",
            Some(&who.workflow),
            Some(json!({
                "application_id": Uuid::new_v4(),
                "agent_id": who.agent_id,
                "course_id": Uuid::new_v4(),
                "university_id": Uuid::new_v4(),
                "base_amount": "1000",
                "currency": "EUR",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "bad_request");

    let uri = format!("/api/v1/agents/{}/earnings", who.agent_id);
    let (status, earnings) = app.call(Method::GET, &uri, Some(&who.agent), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(earnings["currency"], "USD");
    assert_eq!(decimal(&earnings["approved"]), dec!(500));
}

#[tokio::test]
async fn approving_twice_is_bad_request() {
    let app = TestApp::new();
    let who = actors();
    let record = approved_500(&app, &who).await;

    let uri = format!("/api/v1/commissions/{}/approve", record["id"].as_str().unwrap());
    let (status, _) = app.call(Method::POST, &uri, Some(&who.finance), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_commission_is_not_found() {
    let app = TestApp::new();
    let who = actors();
    let uri = format!("/api/v1/commissions/{}", Uuid::new_v4());
    let (status, body) = app.call(Method::GET, &uri, Some(&who.finance), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

// ============================================================================
// Payouts
// ============================================================================

#[tokio::test]
async fn commission_to_payout_end_to_end() {
    let app = TestApp::new();
    let who = actors();
    approved_500(&app, &who).await;

    let (status, payout) = app
        .call(
            Method::POST,
            "/api/v1/payouts",
            Some(&who.agent),
            Some(json!({ "amount": "500" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payout["status"], "requested");
    assert!(payout["payout_number"].as_str().unwrap().starts_with("PO-"));
    let id = payout["id"].as_str().unwrap().to_string();

    let (status, payout) = app
        .call(
            Method::POST,
            &format!("/api/v1/payouts/{id}/approve"),
            Some(&who.finance),
            Some(json!({ "payment_method": "bank_transfer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payout["status"], "approved");
    assert_eq!(payout["settled_commissions"], 1);

    let (status, payout) = app
        .call(
            Method::POST,
            &format!("/api/v1/payouts/{id}/mark-paid"),
            Some(&who.finance),
            Some(json!({ "payment_reference": "TRX-1001" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payout["status"], "paid");

    let uri = format!("/api/v1/agents/{}/earnings", who.agent_id);
    let (_, earnings) = app.call(Method::GET, &uri, Some(&who.agent), None).await;
    assert_eq!(decimal(&earnings["approved"]), Decimal::ZERO);
    assert_eq!(decimal(&earnings["paid"]), dec!(500));
    assert_eq!(decimal(&earnings["total"]), dec!(500));

    let uri = format!("/api/v1/agents/{}/commissions?status=paid", who.agent_id);
    let (_, records) = app.call(Method::GET, &uri, Some(&who.agent), None).await;
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn over_balance_request_reports_available_amount() {
    let app = TestApp::new();
    let who = actors();
    approved_500(&app, &who).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/payouts",
            Some(&who.agent),
            Some(json!({ "amount": "600" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let details: Vec<String> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap().to_string())
        .collect();
    let available = details
        .iter()
        .find_map(|d| d.strip_prefix("available: "))
        .unwrap();
    assert_eq!(Decimal::from_str(available).unwrap(), dec!(500));

    let uri = format!("/api/v1/agents/{}/payouts", who.agent_id);
    let (_, payouts) = app.call(Method::GET, &uri, Some(&who.agent), None).await;
    assert!(payouts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn agent_cannot_process_payouts() {
    let app = TestApp::new();
    let who = actors();
    approved_500(&app, &who).await;

    let (_, payout) = app
        .call(Method::POST, "/api/v1/payouts", Some(&who.agent), Some(json!({ "amount": "100" })))
        .await;
    let uri = format!("/api/v1/payouts/{}/approve", payout["id"].as_str().unwrap());
    let (status, _) = app
        .call(
            Method::POST,
            &uri,
            Some(&who.agent),
            Some(json!({ "payment_method": "paypal" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejected_payout_cannot_be_paid() {
    let app = TestApp::new();
    let who = actors();
    approved_500(&app, &who).await;

    let (_, payout) = app
        .call(Method::POST, "/api/v1/payouts", Some(&who.agent), Some(json!({ "amount": "200" })))
        .await;
    let id = payout["id"].as_str().unwrap().to_string();

    let (status, payout) = app
        .call(
            Method::POST,
            &format!("/api/v1/payouts/{id}/reject"),
            Some(&who.finance),
            Some(json!({ "notes": "bank details missing" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payout["status"], "rejected");

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/payouts/{id}/mark-paid"),
            Some(&who.finance),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn back_office_payout_needs_agent_id() {
    let app = TestApp::new();
    let who = actors();
    let (status, _) = app
        .call(Method::POST, "/api/v1/payouts", Some(&who.admin), Some(json!({ "amount": "10" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
