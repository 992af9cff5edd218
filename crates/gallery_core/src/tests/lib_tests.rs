use super::*;
use std::collections::HashMap;

use axum::{
    extract::{Multipart, Query, RawForm, State},
    http::{Method, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use shared::domain::{ItemKind, NeighborLinks};
use shared::error::ErrorCode;
use shared::protocol::{FormField, ItemSummary, PageBody, PageSnapshot};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

async fn bind_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn sample_snapshot() -> PageSnapshot {
    PageSnapshot {
        path: "holiday".to_string(),
        breadcrumbs: Vec::new(),
        tree: Vec::new(),
        neighbors: NeighborLinks {
            previous: Some("archive".to_string()),
            next: None,
        },
        upload_url: Some("/:/holiday?upload".to_string()),
        favorite: None,
        body: PageBody::Listing {
            items: vec![
                ItemSummary {
                    name: "beach.jpg".to_string(),
                    kind: ItemKind::Image,
                    href: "holiday/beach.jpg".to_string(),
                    thumb_url: Some("/g/holiday/beach.jpg?thumb".to_string()),
                    deferred: true,
                },
                ItemSummary {
                    name: "clips".to_string(),
                    kind: ItemKind::Dir,
                    href: "holiday/clips".to_string(),
                    thumb_url: None,
                    deferred: false,
                },
            ],
        },
    }
}

fn upload_file(name: &str, len: usize) -> UploadFile {
    UploadFile {
        filename: name.to_string(),
        mime_type: Some("image/png".to_string()),
        bytes: vec![0u8; len],
    }
}

async fn wait_for_finished(events: &mut broadcast::Receiver<GalleryEvent>, submitted: usize) {
    timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await.expect("event stream closed") {
                GalleryEvent::UploadFinished { submitted: n } => {
                    assert_eq!(n, submitted);
                    break;
                }
                _ => {}
            }
        }
    })
    .await
    .expect("upload batch did not finish in time");
}

#[tokio::test]
async fn fetch_page_decodes_snapshot() {
    let app = Router::new().route("/c/holiday", get(|| async { Json(sample_snapshot()) }));
    let server_url = bind_server(app).await;

    let client = GalleryClient::new(&server_url).expect("client");
    let snapshot = client.fetch_page("holiday").await.expect("snapshot");

    assert_eq!(snapshot.path, "holiday");
    assert_eq!(snapshot.neighbors.previous.as_deref(), Some("archive"));
    match snapshot.body {
        PageBody::Listing { items } => {
            assert_eq!(items.len(), 2);
            assert!(items[0].deferred);
        }
        PageBody::Single { .. } => panic!("expected a listing body"),
    }
}

#[tokio::test]
async fn fetch_page_surfaces_structured_errors() {
    let app = Router::new().route(
        "/c/missing",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::new(ErrorCode::NotFound, "no such content path")),
            )
        }),
    );
    let server_url = bind_server(app).await;

    let client = GalleryClient::new(&server_url).expect("client");
    let err = client.fetch_page("missing").await.expect_err("must fail");
    let text = err.to_string();
    assert!(
        text.contains("NotFound") && text.contains("no such content path"),
        "unexpected error: {text}"
    );
}

#[derive(Clone)]
struct UploadCapture {
    tx: mpsc::UnboundedSender<(String, String, usize)>,
    status: StatusCode,
}

async fn handle_upload(State(state): State<UploadCapture>, mut multipart: Multipart) -> StatusCode {
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.expect("field bytes");
        let _ = state.tx.send((name, file_name, bytes.len()));
    }
    state.status
}

#[tokio::test]
async fn upload_posts_one_multipart_request_per_file() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/up", post(handle_upload))
        .with_state(UploadCapture {
            tx,
            status: StatusCode::OK,
        });
    let server_url = bind_server(app).await;

    let client = GalleryClient::new(&server_url).expect("client");
    let mut events = client.subscribe_events();
    client
        .upload_files("/up", vec![upload_file("a.png", 3), upload_file("b.png", 5)])
        .await
        .expect("batch start");
    wait_for_finished(&mut events, 2).await;

    let mut seen = Vec::new();
    while let Ok(part) = rx.try_recv() {
        seen.push(part);
    }
    assert_eq!(seen.len(), 2, "expected one request per file");
    for (field, _, _) in &seen {
        assert_eq!(field, "file");
    }
    let mut names: Vec<String> = seen.iter().map(|(_, name, _)| name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["a.png".to_string(), "b.png".to_string()]);

    let batch = client.current_batch().await.expect("batch");
    assert_eq!(batch.percent(), 100);
    assert!(batch.is_done());
}

#[tokio::test]
async fn error_status_still_counts_as_delivered() {
    // The endpoint contract is arrival only; status codes are not inspected.
    let (tx, _rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/up", post(handle_upload))
        .with_state(UploadCapture {
            tx,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        });
    let server_url = bind_server(app).await;

    let client = GalleryClient::new(&server_url).expect("client");
    let mut events = client.subscribe_events();
    client
        .upload_files("/up", vec![upload_file("a.png", 3)])
        .await
        .expect("batch start");
    wait_for_finished(&mut events, 1).await;
}

#[tokio::test]
async fn unreachable_destination_leaves_batch_short() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = GalleryClient::new(&format!("http://{addr}")).expect("client");
    let mut events = client.subscribe_events();
    client
        .upload_files("/up", vec![upload_file("a.png", 3), upload_file("b.png", 4)])
        .await
        .expect("batch start");

    let mut failures = 0;
    timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await.expect("event stream closed") {
                GalleryEvent::UploadFailed { .. } => {
                    failures += 1;
                    if failures == 2 {
                        break;
                    }
                }
                GalleryEvent::UploadFinished { .. } => {
                    panic!("batch must not finish when every upload fails")
                }
                _ => {}
            }
        }
    })
    .await
    .expect("expected upload failures");

    let batch = client.current_batch().await.expect("batch");
    assert_eq!(batch.completed(), 0);
    assert!(!batch.is_done());
}

#[tokio::test]
async fn empty_file_list_starts_no_batch() {
    let client = GalleryClient::new("http://127.0.0.1:9").expect("client");
    client
        .upload_files("/up", Vec::new())
        .await
        .expect("no-op upload");
    assert!(client.current_batch().await.is_none());
}

#[derive(Clone)]
struct FormCapture {
    tx: mpsc::UnboundedSender<(String, String, String)>,
}

async fn handle_form(
    State(state): State<FormCapture>,
    method: Method,
    uri: Uri,
    RawForm(body): RawForm,
) -> StatusCode {
    let _ = state.tx.send((
        method.to_string(),
        uri.to_string(),
        String::from_utf8_lossy(&body).to_string(),
    ));
    StatusCode::OK
}

#[tokio::test]
async fn favorite_form_is_submitted_verbatim() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/favorite", post(handle_form))
        .with_state(FormCapture { tx });
    let server_url = bind_server(app).await;

    let client = GalleryClient::new(&server_url).expect("client");
    let form = FavoriteForm {
        method: "post".to_string(),
        action: "/favorite".to_string(),
        fields: vec![FormField {
            name: "item".to_string(),
            value: "holiday/beach.jpg".to_string(),
        }],
        checked: false,
    };

    client.toggle_favorite(&form, true).await.expect("enable");
    let (method, _, body) = rx.recv().await.expect("captured request");
    assert_eq!(method, "POST");
    assert!(body.contains("item=holiday%2Fbeach.jpg"), "body: {body}");
    assert!(body.contains("toggle-favorite=on"), "body: {body}");

    // Disabling drops the checkbox field, checkbox-style.
    client.toggle_favorite(&form, false).await.expect("disable");
    let (_, _, body) = rx.recv().await.expect("captured request");
    assert!(!body.contains("toggle-favorite"), "body: {body}");
    assert!(body.contains("item=holiday%2Fbeach.jpg"), "body: {body}");
}

#[tokio::test]
async fn management_posts_target_the_manage_route() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    // The manage route's literal ":" segment is not expressible as an axum
    // route path, so capture everything.
    let app = Router::new()
        .fallback(handle_form)
        .with_state(FormCapture { tx });
    let server_url = bind_server(app).await;

    let client = GalleryClient::new(&server_url).expect("client");

    client
        .create_folder("holiday", "trip")
        .await
        .expect("create folder");
    let (method, uri, body) = rx.recv().await.expect("captured request");
    assert_eq!(method, "POST");
    assert!(uri.starts_with("/:/holiday"), "uri: {uri}");
    assert!(uri.contains("new_folder"), "uri: {uri}");
    assert_eq!(body, "folder-name=trip");

    client
        .delete_item("holiday", "beach.jpg")
        .await
        .expect("delete item");
    let (_, uri, body) = rx.recv().await.expect("captured request");
    assert!(uri.contains("delete"), "uri: {uri}");
    assert_eq!(body, "item-name=beach.jpg");
}

#[derive(Clone)]
struct QueryCapture {
    tx: mpsc::UnboundedSender<HashMap<String, String>>,
}

async fn handle_page_query(
    State(state): State<QueryCapture>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<PageSnapshot> {
    let _ = state.tx.send(params);
    Json(sample_snapshot())
}

#[tokio::test]
async fn favorites_and_search_use_query_arguments() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/c/holiday", get(handle_page_query))
        .with_state(QueryCapture { tx });
    let server_url = bind_server(app).await;

    let client = GalleryClient::new(&server_url).expect("client");

    client
        .fetch_favorites("holiday")
        .await
        .expect("favorites listing");
    let params = rx.recv().await.expect("captured query");
    assert!(params.contains_key("favorites"));

    client.search("holiday", "beach").await.expect("search");
    let params = rx.recv().await.expect("captured query");
    assert_eq!(params.get("search").map(String::as_str), Some("beach"));
}
