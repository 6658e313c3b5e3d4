use std::net::TcpListener;

use reqwest::{Client, Method, Response};

use secrecy::Secret;

use serde_json::{json, Value};

use sqlx::PgPool;

use uuid::Uuid;

use fitcoach::app;
use fitcoach::crypto::{self, SigningKey};
use fitcoach::settings::CoachSettings;

pub const COACH_EMAIL: &str = "coach@test.com";
pub const COACH_PASSWORD: &str = "coach-test-password";

pub struct TestApp {
    addr: String,

    pub client: Client,
}

impl TestApp {
    pub async fn spawn(pool: &PgPool) -> Self {
        use rand::{distributions::Alphanumeric, Rng};

        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to listen on random port");
        let port = listener.local_addr().unwrap().port();

        let addr = format!("http://127.0.0.1:{}", port);

        let signing_key = {
            let rand_key: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(32)
                .map(char::from)
                .collect();
            let rand_key = Secret::new(rand_key);

            SigningKey::new(&rand_key).expect("Failed to create crypto signing key")
        };

        let coach = {
            let password = Secret::new(COACH_PASSWORD.to_string());
            let password_hash =
                crypto::hash_password(&password).expect("Failed to hash coach password");
            CoachSettings::new(COACH_EMAIL, Secret::new(password_hash))
        };

        let server = app::run(listener, pool.clone(), signing_key, coach)
            .expect("Failed to spawn app instance");
        let _ = tokio::spawn(server);

        let client = Client::new();

        Self { addr, client }
    }

    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", &self.addr, url);
        self.client.request(method, url)
    }

    pub fn authorized_request(
        &self,
        method: Method,
        url: &str,
        token: &str,
    ) -> reqwest::RequestBuilder {
        self.request(method, url).bearer_auth(token)
    }

    pub async fn health_check(&self) -> reqwest::Result<Response> {
        self.request(Method::GET, "health_check").send().await
    }

    pub async fn submit_request(&self, body: &Value) -> reqwest::Result<Response> {
        self.request(Method::POST, "subscriptions")
            .json(body)
            .send()
            .await
    }

    /// Submit a valid request for the given email, returning the new id
    pub async fn submit_default(&self, email: &str, password: &str) -> Uuid {
        let res = self
            .submit_request(&new_request_body(email, Some(password)))
            .await
            .expect("Failed to execute submit request");
        assert_eq!(201, res.status().as_u16(), "Submit should succeed");

        let body: Value = res.json().await.expect("Failed to parse submit response");
        body["id"]
            .as_str()
            .expect("Submit response missing id")
            .parse()
            .expect("Submit response id is not a uuid")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Result<Response> {
        self.request(Method::POST, "auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
    }

    /// Log in and return the session token, asserting success
    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let res = self
            .login(email, password)
            .await
            .expect("Failed to execute login request");
        assert_eq!(200, res.status().as_u16(), "Login should succeed");

        let body: Value = res.json().await.expect("Failed to parse login response");
        body["token"]
            .as_str()
            .expect("Login response missing token")
            .to_string()
    }

    pub async fn coach_token(&self) -> String {
        self.login_token(COACH_EMAIL, COACH_PASSWORD).await
    }

    pub async fn approve(
        &self,
        token: &str,
        id: Uuid,
        access_duration_days: i32,
        password: Option<&str>,
    ) -> reqwest::Result<Response> {
        let mut body = json!({ "access_duration_days": access_duration_days });
        if let Some(password) = password {
            body["password"] = json!(password);
        }
        self.authorized_request(
            Method::POST,
            &format!("admin/subscriptions/{}/approve", id),
            token,
        )
        .json(&body)
        .send()
        .await
    }

    pub async fn reject(
        &self,
        token: &str,
        id: Uuid,
        reason: Option<&str>,
    ) -> reqwest::Result<Response> {
        self.authorized_request(
            Method::POST,
            &format!("admin/subscriptions/{}/reject", id),
            token,
        )
        .json(&json!({ "reason": reason }))
        .send()
        .await
    }

    pub async fn block(&self, token: &str, id: Uuid) -> reqwest::Result<Response> {
        self.authorized_request(
            Method::POST,
            &format!("admin/subscriptions/{}/block", id),
            token,
        )
        .send()
        .await
    }

    pub async fn list_requests(&self, token: &str, query: &str) -> reqwest::Result<Response> {
        self.authorized_request(
            Method::GET,
            &format!("admin/subscriptions{}", query),
            token,
        )
        .send()
        .await
    }

    pub async fn assign_resources(
        &self,
        token: &str,
        id: Uuid,
        body: &Value,
    ) -> reqwest::Result<Response> {
        self.authorized_request(
            Method::PUT,
            &format!("admin/subscriptions/{}/resources", id),
            token,
        )
        .json(body)
        .send()
        .await
    }

    pub async fn my_resources(&self, token: &str) -> reqwest::Result<Response> {
        self.authorized_request(Method::GET, "me/resources", token)
            .send()
            .await
    }

    pub async fn access_resource(
        &self,
        token: &str,
        category: &str,
    ) -> reqwest::Result<Response> {
        self.authorized_request(Method::POST, "me/resources/access", token)
            .json(&json!({ "category": category }))
            .send()
            .await
    }
}

/// A well-formed subscription request body
pub fn new_request_body(email: &str, password: Option<&str>) -> Value {
    let mut body = json!({
        "email": email,
        "name": "Test Subscriber",
        "phone": "+966501234567",
        "goals": "Lose 5kg before summer",
        "plan": "monthly",
        "payment_proof": "https://uploads.test/receipt.png",
    });
    if let Some(password) = password {
        body["password"] = json!(password);
    }
    body
}

/// Submit + approve + login in one go, returning (id, subscriber token)
pub async fn approved_subscriber(app: &TestApp, email: &str, password: &str) -> (Uuid, String) {
    let id = app.submit_default(email, password).await;

    let coach_token = app.coach_token().await;
    let res = app
        .approve(&coach_token, id, 30, None)
        .await
        .expect("Failed to execute approve request");
    assert_eq!(200, res.status().as_u16(), "Approve should succeed");

    let token = app.login_token(email, password).await;
    (id, token)
}
