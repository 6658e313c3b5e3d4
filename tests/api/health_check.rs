use sqlx::PgPool;

use crate::helpers::TestApp;

#[sqlx::test]
async fn health_check_works(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .health_check()
        .await
        .expect("Failed to execute health check request");

    assert!(res.status().is_success());
}
