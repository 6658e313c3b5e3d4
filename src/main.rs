use std::net::TcpListener;

use anyhow::Context;

use sqlx::PgPool;

use fitcoach::app;
use fitcoach::crypto::SigningKey;
use fitcoach::settings::Settings;
use fitcoach::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info".into(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load().context("Failed to load settings")?;

    let pool = PgPool::connect_with(settings.database.with_db()).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let signing_key = SigningKey::new(settings.app.secret_key())?;
    let listener = TcpListener::bind(settings.app.addr())?;

    app::run(listener, pool, signing_key, settings.coach)?
        .await
        .context("Failed to run app")
}
