//! Mock adjacent server for proxy integration tests.

use axum::{
    Router,
    body::Bytes,
    extract::{OriginalUri, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use tokio::net::TcpListener;

/// Host header clients use in these tests.
pub const TEST_HOST: &str = "maps.test";

/// Serve a fake STAC/TiTiler backend on an ephemeral port and return the port.
///
/// Every absolute link it emits uses `http://localhost:<port>`, the same
/// base URL the proxy targets in non-Docker mode.
pub async fn spawn_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://localhost:{port}");

    let app = Router::new()
        .route("/api", get(api_document))
        .route("/api.html", get(api_page))
        .route("/collections", get(collections).post(create_collection))
        .route("/tile.png", get(tile))
        .route("/redirect", get(redirect))
        .route("/cog/stac", get(echo_path))
        .route("/echo-path", get(echo_path))
        .with_state(base);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    port
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn api_document(State(base): State<String>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        format!(
            r#"{{"openapi":"3.0.2","info":{{"title":"stac-fastapi","description":"{base}/docs"}},"servers":[{{"url":"{base}"}},{{"url":"http://other"}}]}}"#
        ),
    )
}

async fn api_page() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<script>const ui = SwaggerUIBundle({url: '/api', oauth2RedirectUrl: '/docs/oauth2-redirect'})</script>",
    )
}

async fn collections(State(base): State<String>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        format!(r#"{{"links":[{{"rel":"self","href":"{base}/collections"}},{{"rel":"root","href":"{base}/"}}]}}"#),
    )
}

async fn create_collection(body: Bytes) -> impl IntoResponse {
    (StatusCode::CREATED, [(header::CONTENT_TYPE, "application/json")], body)
}

async fn tile(State(base): State<String>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "image/png")],
        format!("PNG-BYTES {base}"),
    )
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/elsewhere")])
}

async fn echo_path(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        uri.path_and_query().map(ToString::to_string).unwrap_or_default(),
    )
}
