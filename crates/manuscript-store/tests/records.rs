//! Record management routes: list, get, status update, delete

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tokio_test::assert_ok;
use tower::ServiceExt;

use helpers::*;

async fn upload_journal(app: &TestApp) -> String {
    let response = app
        .router
        .clone()
        .oneshot(journal_form().into_request("/api/journals"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["journal"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

fn patch_status(uri: &str, status: &str) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "status": status }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_list_and_get() {
    let app = TestApp::new(MockStore::new("primary"), None);
    let id = upload_journal(&app).await;

    let response = app.router.clone().oneshot(get("/api/journals")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["records"][0]["id"], id.as_str());

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/journals/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["kind"], "journal");

    // Journals are not visible through the submissions collection
    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/submissions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.router.clone().oneshot(get("/api/journals/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_update_respects_collection() {
    let app = TestApp::new(MockStore::new("primary"), None);
    let id = upload_journal(&app).await;
    let uri = format!("/api/journals/{}/status", id);

    let response = app
        .router
        .clone()
        .oneshot(patch_status(&uri, "published"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "published");

    let response = app
        .router
        .clone()
        .oneshot(patch_status(&uri, "under-review"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["fields"], serde_json::json!(["status"]));
}

#[tokio::test]
async fn test_delete_removes_remote_objects() {
    let store = MockStore::new("primary");
    let app = TestApp::new(store.clone(), None);
    let id = upload_journal(&app).await;
    assert_eq!(store.object_ids().len(), 2);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/journals/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["remoteDeleteFailures"], 0);
    assert!(store.object_ids().is_empty());
    assert_eq!(store.deleted().len(), 2);

    let parsed = assert_ok!(id.parse::<uuid::Uuid>());
    assert!(app
        .state
        .db()
        .get(manuscript_store::RecordKind::Journal, &parsed)
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_with_failed_remote_cleans_local_copies() {
    let app = TestApp::new(MockStore::failing("primary"), None);
    let id = upload_journal(&app).await;
    assert_eq!(app.stored_files().len(), 2);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/journals/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_health_ready_and_info() {
    let app = TestApp::new(MockStore::new("primary"), None);

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app.router.clone().oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    app.state.set_ready(false);
    let response = app.router.clone().oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.router.clone().oneshot(get("/api/info")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["storage"]["primary"], "primary");
    assert_eq!(json["records"]["journals"], 0);
}
