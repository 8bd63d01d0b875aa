use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{handler::*, AppState};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/todo", get(list_todos).post(create_todo))
        .route(
            "/api/todo/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/api/healthcheck", get(health_checker_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use crate::migrate;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::DateTime;
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        let db = Db::Sqlite(pool);
        migrate::run(&db).await.expect("migrations");
        create_router(Arc::new(AppState { db }))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn updated_at(item: &Value) -> DateTime<chrono::Utc> {
        DateTime::parse_from_rfc3339(item["updated_at"].as_str().unwrap())
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    #[tokio::test]
    async fn health_check_reports_backend() {
        let app = test_app().await;
        let (status, body) = send(&app, "GET", "/api/healthcheck", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "sqlite");
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let app = test_app().await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/todo",
            Some(json!({"title": "Buy milk", "priority": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Buy milk");
        assert_eq!(created["completed"], false);
        assert_eq!(created["priority"], 1);
        assert_eq!(created["description"], Value::Null);

        let id = created["id"].as_i64().unwrap();
        let (status, fetched) = send(&app, "GET", &format!("/api/todo/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_carries_optional_fields() {
        let app = test_app().await;
        let (status, created) = send(
            &app,
            "POST",
            "/api/todo",
            Some(json!({
                "title": "Buy milk",
                "description": "2 liters",
                "due_date": "2026-09-01T12:00:00Z",
                "payload": {"tags": ["shopping"], "estimate": 5},
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["description"], "2 liters");
        assert_eq!(created["priority"], 2);
        assert_eq!(created["payload"], json!({"tags": ["shopping"], "estimate": 5}));
    }

    #[tokio::test]
    async fn create_rejects_bad_bodies() {
        let app = test_app().await;

        // missing title
        let (status, body) = send(&app, "POST", "/api/todo", Some(json!({"priority": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        // empty title
        let (status, body) =
            send(&app, "POST", "/api/todo", Some(json!({"title": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "title cannot be empty");

        // oversized title
        let long = "x".repeat(300);
        let (status, _) = send(&app, "POST", "/api/todo", Some(json!({"title": long}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // priority outside the scale
        let (status, _) = send(
            &app,
            "POST",
            "/api/todo",
            Some(json!({"title": "Buy milk", "priority": 9})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/todo")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_id_is_400() {
        let app = test_app().await;
        let (status, _) = send(&app, "GET", "/api/todo/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields_and_bumps_updated_at() {
        let app = test_app().await;
        let (_, created) = send(
            &app,
            "POST",
            "/api/todo",
            Some(json!({"title": "Buy milk", "description": "2 liters", "priority": 1})),
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/todo/{id}"),
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["completed"], true);
        assert_eq!(updated["title"], "Buy milk");
        assert_eq!(updated["description"], "2 liters");
        assert_eq!(updated["priority"], 1);
        assert_eq!(updated["created_at"], created["created_at"]);
        assert!(updated_at(&updated) > updated_at(&created));
    }

    #[tokio::test]
    async fn update_missing_is_404() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            "PUT",
            "/api/todo/999",
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Todo with ID: 999 not found");
    }

    #[tokio::test]
    async fn list_filters_by_completed_and_priority() {
        let app = test_app().await;
        let (_, open) = send(&app, "POST", "/api/todo", Some(json!({"title": "open", "priority": 1}))).await;
        let (_, done) = send(&app, "POST", "/api/todo", Some(json!({"title": "done", "priority": 1}))).await;
        send(
            &app,
            "PUT",
            &format!("/api/todo/{}", done["id"]),
            Some(json!({"completed": true})),
        )
        .await;

        let (status, listed) = send(&app, "GET", "/api/todo?completed=false", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().unwrap();
        assert!(listed.iter().all(|t| t["completed"] == false));
        assert!(listed.iter().any(|t| t["id"] == open["id"]));
        assert!(!listed.iter().any(|t| t["id"] == done["id"]));

        let (status, listed) = send(&app, "GET", "/api/todo?completed=true&priority=1", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], done["id"]);

        let (status, _) = send(&app, "GET", "/api/todo?priority=nine", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let app = test_app().await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/todo",
            Some(json!({"title": "Buy milk", "priority": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/todo/{id}"),
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["completed"], true);
        assert_eq!(updated["priority"], 1);

        let (_, listed) = send(&app, "GET", "/api/todo?completed=true", None).await;
        assert!(listed.as_array().unwrap().iter().any(|t| t["id"] == id));

        let (status, _) = send(&app, "DELETE", &format!("/api/todo/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/api/todo/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &format!("/api/todo/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn concurrent_updates_land_on_exactly_one_payload() {
        let app = test_app().await;
        let (_, created) = send(&app, "POST", "/api/todo", Some(json!({"title": "seed"}))).await;
        let id = created["id"].as_i64().unwrap();

        // Each writer submits a tied (title, priority, description) triple
        let mut handles = Vec::new();
        for i in 0..8i64 {
            let app = app.clone();
            let uri = format!("/api/todo/{id}");
            handles.push(tokio::spawn(async move {
                let body = json!({
                    "title": format!("writer-{i}"),
                    "priority": i % 5,
                    "description": format!("from writer {i}"),
                });
                let request = Request::builder()
                    .method("PUT")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap();
                app.oneshot(request).await.unwrap().status()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::OK);
        }

        // Last write wins: the stored item matches one submission exactly,
        // with no mixing of fields across submissions
        let (status, fetched) = send(&app, "GET", &format!("/api/todo/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let title = fetched["title"].as_str().unwrap();
        let i: i64 = title.strip_prefix("writer-").unwrap().parse().unwrap();
        assert_eq!(fetched["priority"], json!(i % 5));
        assert_eq!(fetched["description"], json!(format!("from writer {i}")));
    }
}
