use chrono::{Duration, Utc};

use reqwest::Method;

use serde_json::{json, Value};

use sqlx::PgPool;

use fitcoach::repo::SubscriberRepo;

use crate::helpers::{approved_subscriber, TestApp};

async fn assign_default_resources(app: &TestApp, id: uuid::Uuid) {
    let coach_token = app.coach_token().await;
    let body = json!({
        "documents": [
            {
                "title": "Week 1 plan",
                "url": "https://cdn.test/plans/week-1.pdf",
                "category": "training"
            },
        ],
        "videos": [
            { "title": "Squat form", "url": "https://videos.test/squat" },
        ],
    });
    let res = app
        .assign_resources(&coach_token, id, &body)
        .await
        .expect("Failed to execute assign request");
    assert_eq!(200, res.status().as_u16());
}

#[sqlx::test]
async fn resources_require_a_session_token(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .request(Method::GET, "me/resources")
        .send()
        .await
        .expect("Failed to execute dashboard request");
    assert_eq!(401, res.status().as_u16());

    let res = app
        .my_resources("not-a-real-token")
        .await
        .expect("Failed to execute dashboard request");
    assert_eq!(401, res.status().as_u16());
}

#[sqlx::test]
async fn coach_token_is_not_a_subscriber_session(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let coach_token = app.coach_token().await;
    let res = app
        .my_resources(&coach_token)
        .await
        .expect("Failed to execute dashboard request");

    assert_eq!(403, res.status().as_u16());
}

#[sqlx::test]
async fn dashboard_shows_state_assignments_and_usage(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    let (id, token) = approved_subscriber(&app, "amira@example.com", "hunter42!").await;
    assign_default_resources(&app, id).await;

    let res = app
        .my_resources(&token)
        .await
        .expect("Failed to execute dashboard request");
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.expect("Failed to parse dashboard");
    assert_eq!("approved", body["subscription"]["status"]);
    assert_eq!("monthly", body["subscription"]["plan"]);
    assert!(body["subscription"]["access_expires_at"].is_string());
    assert_eq!(1, body["resources"]["documents"].as_array().unwrap().len());
    assert_eq!(1, body["resources"]["videos"].as_array().unwrap().len());
    assert_eq!(0, body["usage"]["trainings_accessed"]);
    assert_eq!(0, body["usage"]["videos_accessed"]);
}

#[sqlx::test]
async fn training_quota_allows_five_per_day(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    let (_, token) = approved_subscriber(&app, "amira@example.com", "hunter42!").await;

    for i in 1..=5 {
        let res = app
            .access_resource(&token, "training")
            .await
            .expect("Failed to execute access request");
        assert_eq!(200, res.status().as_u16(), "Access {} should succeed", i);

        let body: Value = res.json().await.expect("Failed to parse access response");
        assert_eq!(5 - i, body["remaining"]);
        assert_eq!(i, body["usage"]["trainings_accessed"]);
    }

    let res = app
        .access_resource(&token, "training")
        .await
        .expect("Failed to execute access request");
    assert_eq!(429, res.status().as_u16());

    let body: Value = res.json().await.expect("Failed to parse error body");
    assert_eq!("quota_exceeded", body["error"]);
    assert_eq!(5, body["limit"]);
    assert_eq!(5, body["current"]);
}

#[sqlx::test]
async fn video_quota_is_one_per_day(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    let (_, token) = approved_subscriber(&app, "amira@example.com", "hunter42!").await;

    let res = app
        .access_resource(&token, "video")
        .await
        .expect("Failed to execute access request");
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.expect("Failed to parse access response");
    assert_eq!(0, body["remaining"]);

    let res = app
        .access_resource(&token, "video")
        .await
        .expect("Failed to execute access request");
    assert_eq!(429, res.status().as_u16());

    let body: Value = res.json().await.expect("Failed to parse error body");
    assert_eq!(1, body["limit"]);
    assert_eq!(1, body["current"]);
}

#[sqlx::test]
async fn quota_categories_are_independent(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    let (_, token) = approved_subscriber(&app, "amira@example.com", "hunter42!").await;

    let res = app
        .access_resource(&token, "video")
        .await
        .expect("Failed to execute access request");
    assert_eq!(200, res.status().as_u16());

    // Spending the video quota leaves the training quota untouched
    let res = app
        .access_resource(&token, "training")
        .await
        .expect("Failed to execute access request");
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.expect("Failed to parse access response");
    assert_eq!(4, body["remaining"]);
}

#[sqlx::test]
async fn unknown_category_is_refused(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    let (_, token) = approved_subscriber(&app, "amira@example.com", "hunter42!").await;

    let res = app
        .access_resource(&token, "diet")
        .await
        .expect("Failed to execute access request");

    assert_eq!(400, res.status().as_u16());
}

#[sqlx::test]
async fn pending_subscriber_is_gated_but_sees_the_dashboard(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    app.submit_default("amira@example.com", "hunter42!").await;

    let token = app.login_token("amira@example.com", "hunter42!").await;

    let res = app
        .my_resources(&token)
        .await
        .expect("Failed to execute dashboard request");
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.expect("Failed to parse dashboard");
    assert_eq!("pending", body["subscription"]["status"]);

    let res = app
        .access_resource(&token, "training")
        .await
        .expect("Failed to execute access request");
    assert_eq!(403, res.status().as_u16());

    // A refused access leaves the counters untouched
    let res = app
        .my_resources(&token)
        .await
        .expect("Failed to execute dashboard request");
    let body: Value = res.json().await.expect("Failed to parse dashboard");
    assert_eq!(0, body["usage"]["trainings_accessed"]);
}

#[sqlx::test]
async fn expired_access_is_forbidden(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    let (id, token) = approved_subscriber(&app, "amira@example.com", "hunter42!").await;

    // Backdate the access window
    let now = Utc::now();
    SubscriberRepo::approve(&pool, id, 30, now - Duration::days(1), None, now)
        .await
        .expect("Failed to backdate expiry")
        .expect("Backdating should apply");

    // Login still works for expired accounts
    app.login_token("amira@example.com", "hunter42!").await;

    let res = app
        .access_resource(&token, "training")
        .await
        .expect("Failed to execute access request");
    assert_eq!(403, res.status().as_u16());
}

#[sqlx::test]
async fn blocking_invalidates_live_sessions(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    let (id, token) = approved_subscriber(&app, "amira@example.com", "hunter42!").await;

    let coach_token = app.coach_token().await;
    let res = app
        .block(&coach_token, id)
        .await
        .expect("Failed to execute block request");
    assert_eq!(200, res.status().as_u16());

    // The token is cryptographically valid but the record lookup refuses it
    let res = app
        .my_resources(&token)
        .await
        .expect("Failed to execute dashboard request");
    assert_eq!(403, res.status().as_u16());

    let res = app
        .access_resource(&token, "training")
        .await
        .expect("Failed to execute access request");
    assert_eq!(403, res.status().as_u16());
}
