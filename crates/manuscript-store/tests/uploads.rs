//! Upload endpoint scenarios: healthy remote, degraded remote, rejected files

mod helpers;

use axum::http::StatusCode;
use tower::ServiceExt;

use helpers::*;
use manuscript_store::RecordKind;

#[tokio::test]
async fn test_healthy_remote_removes_local_copies() {
    let store = MockStore::new("primary");
    let app = TestApp::new(store.clone(), None);

    let response = app
        .router
        .clone()
        .oneshot(journal_form().into_request("/api/journals"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let journal = &json["journal"];
    assert_eq!(journal["title"], "Deep Learning: A Survey");
    assert_eq!(journal["authors"], serde_json::json!(["Ada Lovelace", "Alan Turing"]));
    assert_eq!(journal["keywords"], serde_json::json!(["ml", "survey"]));
    assert_eq!(journal["status"], "submitted");
    assert_eq!(journal["googleDriveUploadFailed"], false);
    assert!(journal["googleDriveError"].is_null());
    assert!(journal["pdfLink"].as_str().unwrap().starts_with("https://cdn.test/"));
    assert!(journal["docxLink"].as_str().unwrap().starts_with("https://cdn.test/"));

    assert_eq!(store.object_ids().len(), 2);
    assert!(store.object_ids().iter().all(|id| id.starts_with("journals/")));
    assert!(app.stored_files().is_empty());

    let id = journal["id"].as_str().unwrap().parse().unwrap();
    let record = app.state.db().get(RecordKind::Journal, &id).unwrap().unwrap();
    assert!(record.pdf_remote_id.is_some());
    assert!(record.docx_remote_url.is_some());
    // Local names are kept as history even though the files are gone
    assert!(record.pdf_local_name.unwrap().ends_with("-survey.pdf"));
}

#[tokio::test]
async fn test_unreachable_remote_keeps_local_copies() {
    let app = TestApp::new(MockStore::failing("primary"), None);

    let response = app
        .router
        .clone()
        .oneshot(journal_form().into_request("/api/journals"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let journal = &json["journal"];
    assert_eq!(journal["googleDriveUploadFailed"], true);
    assert_eq!(journal["docxUploadFailed"], true);
    assert_eq!(journal["pdfUploadFailed"], true);
    assert!(journal["googleDriveError"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    let id = journal["id"].as_str().unwrap();
    assert_eq!(journal["pdfLink"], format!("/download/pdf/{}", id));

    let files = app.stored_files();
    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.ends_with("-survey.pdf")));
    assert!(files.iter().any(|f| f.ends_with("-survey.docx")));
}

#[tokio::test]
async fn test_one_of_two_remote_failures() {
    let store = MockStore::new("primary");
    store.fail_extension("pdf");
    let app = TestApp::new(store.clone(), None);

    let response = app
        .router
        .clone()
        .oneshot(journal_form().into_request("/api/journals"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["journal"]["googleDriveUploadFailed"], true);
    assert_eq!(json["journal"]["pdfUploadFailed"], true);
    assert_eq!(json["journal"]["docxUploadFailed"], false);

    let id = json["journal"]["id"].as_str().unwrap().parse().unwrap();
    let record = app.state.db().get(RecordKind::Journal, &id).unwrap().unwrap();
    assert!(record.docx_remote_id.is_some());
    assert!(record.pdf_remote_id.is_none());

    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".pdf"));
}

#[tokio::test]
async fn test_mirror_failure_does_not_degrade() {
    let primary = MockStore::new("primary");
    let mirror = MockStore::failing("mirror");
    let app = TestApp::new(primary.clone(), Some(mirror));

    let response = app
        .router
        .clone()
        .oneshot(journal_form().into_request("/api/journals"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["journal"]["googleDriveUploadFailed"], false);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_mirror_ids_recorded() {
    let primary = MockStore::new("primary");
    let mirror = MockStore::new("mirror");
    let app = TestApp::new(primary, Some(mirror.clone()));

    let response = app
        .router
        .clone()
        .oneshot(journal_form().into_request("/api/journals"))
        .await
        .unwrap();
    let json = body_json(response).await;

    let id = json["journal"]["id"].as_str().unwrap().parse().unwrap();
    let record = app.state.db().get(RecordKind::Journal, &id).unwrap().unwrap();
    assert!(record.pdf_mirror_id.is_some());
    assert!(record.docx_mirror_id.is_some());
    assert_eq!(mirror.object_ids().len(), 2);
}

#[tokio::test]
async fn test_executable_renamed_docx_is_rejected() {
    let store = MockStore::new("primary");
    let app = TestApp::new(store.clone(), None);

    let request = MultipartBody::new()
        .text("title", "T")
        .text("abstract", "A")
        .file("pdfFile", "paper.pdf", "application/pdf", &sample_pdf())
        .file("docxFile", "setup.docx", DOCX_MIME, b"MZ\x90\x00\x03\x00\x00\x00\x04\x00")
        .into_request("/api/journals");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "FileTypeError");

    assert!(app.stored_files().is_empty());
    assert!(store.object_ids().is_empty());
    assert_eq!(app.state.db().count(RecordKind::Journal).unwrap(), 0);
}

#[tokio::test]
async fn test_suspicious_name_is_rejected() {
    let app = TestApp::new(MockStore::new("primary"), None);

    let request = MultipartBody::new()
        .text("title", "T")
        .text("abstract", "A")
        .file("pdfFile", "invoice.exe.pdf", "application/pdf", &sample_pdf())
        .file("docxFile", "paper.docx", DOCX_MIME, &sample_docx("x"))
        .into_request("/api/journals");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["type"], "SuspiciousFileNameError");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_missing_file_and_fields() {
    let app = TestApp::new(MockStore::new("primary"), None);

    let request = MultipartBody::new()
        .text("title", "T")
        .text("abstract", "A")
        .file("pdfFile", "paper.pdf", "application/pdf", &sample_pdf())
        .into_request("/api/journals");
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "MissingFileError");
    assert!(app.stored_files().is_empty());

    let request = MultipartBody::new()
        .text("title", " ")
        .text("keywords", "[]")
        .file("pdfFile", "paper.pdf", "application/pdf", &sample_pdf())
        .file("docxFile", "paper.docx", DOCX_MIME, &sample_docx("x"))
        .into_request("/api/journals");
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "ValidationError");
    assert_eq!(
        json["error"]["fields"],
        serde_json::json!(["title", "abstract", "keywords"])
    );
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_submission_derives_pdf() {
    let store = MockStore::new("primary");
    let app = TestApp::new(store.clone(), None);

    let request = MultipartBody::new()
        .text("title", "A Manuscript")
        .text("abstract", "Short abstract")
        .text("authors", r#"["Grace Hopper"]"#)
        .file("file", "manuscript.docx", DOCX_MIME, &sample_docx("Manuscript body text"))
        .into_request("/api/submissions");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let submission = &json["submission"];
    assert_eq!(submission["authors"], serde_json::json!(["Grace Hopper"]));
    assert_eq!(submission["hasPdf"], true);
    assert_eq!(submission["hasDocx"], true);

    let ids = store.object_ids();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|id| id.starts_with("submissions/")));
    let pdf_id = ids.iter().find(|id| id.ends_with(".pdf")).unwrap();
    assert!(store.get(pdf_id).unwrap().starts_with(b"%PDF"));
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_submission_with_unreadable_docx() {
    let app = TestApp::new(MockStore::new("primary"), None);

    let request = MultipartBody::new()
        .text("title", "T")
        .text("abstract", "A")
        .file("file", "broken.docx", DOCX_MIME, b"PK\x03\x04garbage")
        .into_request("/api/submissions");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["type"], "FileTypeError");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_same_stem_pair_gets_two_remote_objects() {
    let store = MockStore::new("primary");
    let app = TestApp::new(store.clone(), None);

    // survey.pdf and survey.docx share a stem and upload concurrently
    let response = app
        .router
        .clone()
        .oneshot(journal_form().into_request("/api/journals"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let id = json["journal"]["id"].as_str().unwrap().parse().unwrap();
    let record = app.state.db().get(RecordKind::Journal, &id).unwrap().unwrap();

    let docx_id = record.docx_remote_id.unwrap();
    let pdf_id = record.pdf_remote_id.unwrap();
    assert_ne!(docx_id, pdf_id);
    assert_ne!(record.docx_remote_url, record.pdf_remote_url);

    assert_eq!(store.object_ids().len(), 2);
    assert!(store.get(&pdf_id).unwrap().starts_with(b"%PDF"));
    assert!(store.get(&docx_id).unwrap().starts_with(b"PK\x03\x04"));
}

#[tokio::test]
async fn test_persist_failure_rolls_back_uploads() {
    let store = MockStore::new("primary");
    store.fail_extension("pdf");
    let app = TestApp::with_file_db(store.clone(), None);

    rusqlite::Connection::open(app.db_path())
        .unwrap()
        .execute_batch("DROP TABLE journals;")
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(journal_form().into_request("/api/journals"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["type"], "RecordPersistError");

    // The uploaded DOCX is removed remotely, the retained PDF locally
    let deleted = store.deleted();
    assert_eq!(deleted.len(), 1);
    assert!(deleted[0].ends_with("-survey.docx"));
    assert!(store.object_ids().is_empty());
    assert!(app.stored_files().is_empty());
    assert_eq!(app.state.db().count(RecordKind::Submission).unwrap(), 0);
}
