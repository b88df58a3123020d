// Infra compartilhada dos testes de integração: banco em memória + router.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower::ServiceExt;

use dna_sample_manager::config::AppState;

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

impl TestApp {
    /// Uma única conexão mantida viva: o banco em memória some quando ela fecha.
    pub async fn spawn() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::migrate!().run(&pool).await.unwrap();

        let state = AppState::from_pool(pool.clone()).unwrap();
        Self {
            router: dna_sample_manager::app(state),
            pool,
        }
    }

    pub async fn raw(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, HeaderMap, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(payload) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(payload.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes)
    }

    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, _, bytes) = self.raw(method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, None).await
    }

    // ---
    // Criação de dados via API
    // ---
    pub async fn individual(&self, code: &str, family: &str, projects: &[&str]) -> i64 {
        let (status, body) = self
            .post(
                "/api/individuals",
                json!({ "individual_code": code, "family_id": family, "projects": projects, "sex": 1 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn sample(&self, code: &str, individual_id: i64, sample_type: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/samples",
                json!({ "sample_code": code, "individual_id": individual_id, "sample_type": sample_type }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn storage_box(&self, name: &str, rows: i64, cols: i64) -> i64 {
        let (status, body) = self
            .post(
                "/api/boxes",
                json!({ "name": name, "freezer": "F-80", "grid_rows": rows, "grid_cols": cols }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn tube(&self, payload: Value) -> (StatusCode, Value) {
        self.post("/api/tubes", payload).await
    }

    pub async fn tube_id(&self, payload: Value) -> i64 {
        let (status, body) = self.tube(payload).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}
