#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chirpy::{
    ServerConfig,
    cli::Platform,
    create_app,
    db::Database,
    jwt::JwtConfig,
    metrics::HitCounter,
    password::{HashCost, PasswordHasher},
};
use serde_json::Value;
use std::path::PathBuf;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret-at-least-32-bytes-long";
pub const TEST_POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

/// Router plus handles on the state behind it.
pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub hits: HitCounter,
    pub jwt: JwtConfig,
}

pub struct TestOptions {
    pub platform: Platform,
    pub polka_key: String,
    pub assets_dir: PathBuf,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            platform: Platform::Dev,
            polka_key: TEST_POLKA_KEY.to_string(),
            assets_dir: PathBuf::from("."),
        }
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(TestOptions::default()).await
}

pub async fn create_test_app_with(options: TestOptions) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");

    // Minimal argon2 cost keeps the suite fast
    let passwords = PasswordHasher::new(HashCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("Invalid test hash cost");

    let hits = HitCounter::new();
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_JWT_SECRET.to_vec(),
        polka_key: options.polka_key,
        platform: options.platform,
        assets_dir: options.assets_dir,
        passwords,
        hits: hits.clone(),
    };

    TestApp {
        app: create_app(&config),
        db,
        hits,
        jwt: JwtConfig::new(TEST_JWT_SECRET),
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn api_key(key: &str) -> String {
    format!("ApiKey {}", key)
}

impl TestApp {
    /// Send a request and return the status and body.
    /// An empty body becomes `Value::Null`, a non-JSON body a `Value::String`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn register(&self, email: &str, password: &str) -> Value {
        let (status, json) = self
            .send(
                "POST",
                "/api/users",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", json);
        json
    }

    pub async fn login(&self, email: &str, password: &str) -> Value {
        let (status, json) = self
            .send(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", json);
        json
    }

    /// Register and log in, returning `(user id, access token, refresh token)`.
    pub async fn signup(&self, email: &str, password: &str) -> (String, String, String) {
        self.register(email, password).await;
        let json = self.login(email, password).await;
        (
            json["id"].as_str().unwrap().to_string(),
            json["token"].as_str().unwrap().to_string(),
            json["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn create_chirp(&self, access_token: &str, body: &str) -> Value {
        let (status, json) = self
            .send(
                "POST",
                "/api/chirps",
                Some(&bearer(access_token)),
                Some(serde_json::json!({ "body": body })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create chirp failed: {}", json);
        json
    }
}
