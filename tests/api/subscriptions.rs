use serde_json::json;

use sqlx::PgPool;

use fitcoach::domain::{PlanTier, SubscriptionStatus};
use fitcoach::repo::SubscriberRepo;

use crate::helpers::{new_request_body, TestApp};

#[sqlx::test]
async fn submit_creates_a_pending_record(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let id = app.submit_default("amira@example.com", "hunter42!").await;

    let record = SubscriberRepo::fetch_by_id(&pool, id)
        .await
        .expect("Failed to fetch record")
        .expect("Record missing");

    assert_eq!(SubscriptionStatus::Pending, record.status);
    assert_eq!("amira@example.com", record.email);
    assert_eq!(PlanTier::Monthly, record.plan);
    assert_eq!(PlanTier::Monthly.price_cents(), record.plan_price_cents);
    assert!(record.access_expires_at.is_none());
}

#[sqlx::test]
async fn submit_without_a_password_is_accepted(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .submit_request(&new_request_body("amira@example.com", None))
        .await
        .expect("Failed to execute submit request");

    assert_eq!(201, res.status().as_u16());
}

#[sqlx::test]
async fn submit_rejects_malformed_fields(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let cases = [
        ("email", json!("not-an-email"), "a malformed email"),
        ("phone", json!("12"), "a too-short phone number"),
        ("phone", json!("+96650abc4567"), "letters in the phone number"),
        ("plan", json!("lifetime"), "an unknown plan tier"),
        ("payment_proof", json!("not a url"), "a malformed proof URL"),
        ("name", json!("  "), "a blank name"),
    ];

    for (field, value, description) in cases {
        let mut body = new_request_body("amira@example.com", Some("hunter42!"));
        body[field] = value;

        let res = app
            .submit_request(&body)
            .await
            .expect("Failed to execute submit request");

        assert_eq!(
            400,
            res.status().as_u16(),
            "Submission with {} should be refused",
            description
        );
    }
}

#[sqlx::test]
async fn submit_rejects_missing_fields(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .submit_request(&json!({ "email": "amira@example.com" }))
        .await
        .expect("Failed to execute submit request");

    assert_eq!(400, res.status().as_u16());
}

#[sqlx::test]
async fn duplicate_active_request_is_a_conflict(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    app.submit_default("amira@example.com", "hunter42!").await;

    let res = app
        .submit_request(&new_request_body("amira@example.com", Some("hunter42!")))
        .await
        .expect("Failed to execute submit request");

    assert_eq!(409, res.status().as_u16());

    let body: serde_json::Value = res.json().await.expect("Failed to parse error body");
    assert_eq!("conflict", body["error"]);
}

#[sqlx::test]
async fn resubmission_after_rejection_is_accepted(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let id = app.submit_default("amira@example.com", "hunter42!").await;

    let coach_token = app.coach_token().await;
    let res = app
        .reject(&coach_token, id, Some("payment proof unreadable"))
        .await
        .expect("Failed to execute reject request");
    assert_eq!(200, res.status().as_u16());

    let res = app
        .submit_request(&new_request_body("amira@example.com", Some("hunter42!")))
        .await
        .expect("Failed to execute submit request");
    assert_eq!(201, res.status().as_u16());
}
