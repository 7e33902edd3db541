//! Read-only HTTP surface over the machine catalog.
//!
//! The catalog is built and validated once at startup and shared by reference with every
//! request; there are no mutation endpoints.

use anyhow::Context;
use axum::{extract::State, routing::get, Json, Router};
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::sync::Arc;
use tmsim::{Catalog, CatalogEntry};
use tower_http::trace::TraceLayer;

pub fn create_app(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route("/machines", get(machines))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(catalog)
}

/// The whole catalog keyed by machine identifier, in declared order.
async fn machines(State(catalog): State<Arc<Catalog>>) -> Json<IndexMap<String, CatalogEntry>> {
    Json(catalog.entries().clone())
}

async fn health(State(catalog): State<Arc<Catalog>>) -> Json<Value> {
    Json(json!({ "status": "ok", "machines": catalog.len() }))
}

pub async fn run(addr: &str) -> anyhow::Result<()> {
    let catalog = Arc::new(Catalog::builtin()?);
    let app = create_app(Arc::clone(&catalog));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("tmsim catalog server listening on {} ({} machines)", addr, catalog.len());
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn fetch(uri: &str) -> (StatusCode, Vec<u8>) {
        let app = create_app(Arc::new(Catalog::builtin().unwrap()));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_machines_returns_catalog_in_order() {
        let (status, body) = fetch("/machines").await;
        assert_eq!(status, StatusCode::OK);

        let machines: IndexMap<String, Value> = serde_json::from_slice(&body).unwrap();
        let keys: Vec<&str> = machines.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["anbn", "palindrome", "zerononen", "even_ones", "odd_ones", "ww", "anbncn"]
        );

        let anbn = &machines["anbn"];
        assert_eq!(anbn["alphabet"], json!(["a", "b"]));
        assert_eq!(anbn["machine"]["start"], "q0");
        assert_eq!(anbn["machine"]["transitions"]["q0"]["a"], json!(["X", "R", "q1"]));
    }

    #[tokio::test]
    async fn test_served_catalog_loads_back() {
        let (_, body) = fetch("/machines").await;
        let catalog = Catalog::from_json(std::str::from_utf8(&body).unwrap()).unwrap();
        assert_eq!(catalog.len(), 7);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = fetch("/health").await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "status": "ok", "machines": 7 }));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = fetch("/machines/anbn/run").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
