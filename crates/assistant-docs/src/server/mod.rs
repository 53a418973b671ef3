//! HTTP server for the document service

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Document HTTP server
pub struct AppServer {
    config: AppConfig,
    state: AppState,
}

impl AppServer {
    /// Create a new server with the configured backend
    pub async fn new(config: AppConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create a server around existing state
    pub fn from_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting document server on http://{}", addr);
        tracing::info!("API info: http://{}/api/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Router over the given state
pub fn build_router(state: AppState) -> Router {
    let server = &state.config().server;
    let max_upload_size = server.max_upload_size;
    let enable_cors = server.enable_cors;

    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .merge(routes::extraction_routes(max_upload_size))
        .nest("/api", routes::api_routes(max_upload_size))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        // Outermost so preflight requests never reach the handlers
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> axum::http::StatusCode {
    if state.is_ready().await {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ObjectStore;
    use crate::test_support::{alpha_beta_gamma_pdf, config_in, local_backend, pdf_with_pages};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "assistant-docs-test-boundary";

    struct TestApp {
        _dir: tempfile::TempDir,
        router: Router,
        state: AppState,
    }

    fn app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let (store, table) = local_backend(&config);
        let state = AppState::from_parts(config, store, table);
        TestApp {
            _dir: dir,
            router: AppServer::from_state(state.clone()).router(),
            state,
        }
    }

    /// One multipart part: field name, optional filename and content type, body
    type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a [u8]);

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
                ),
            }
            if let Some(content_type) = content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(router, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = app();
        let (status, body) = send(&app.router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");

        let (status, _) = send(&app.router, get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_extract_pdf_text_from_bucket() {
        let app = app();
        let pdf = alpha_beta_gamma_pdf();
        app.state
            .store()
            .upload("company-documents", "company/1_deck.pdf", &pdf, "application/pdf")
            .await
            .unwrap();

        let (status, body) = send_json(
            &app.router,
            json_request(
                "/functions/extract-pdf-text",
                r#"{"filePath":"company/1_deck.pdf","bucket":"company-documents"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["fileSize"], pdf.len() as u64);
        let content = body["content"].as_str().unwrap();
        assert!(content.starts_with("Alpha"));
        assert!(content.contains("Gamma"));
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_extract_pdf_text_failures() {
        let app = app();

        let (status, body) = send_json(
            &app.router,
            json_request(
                "/functions/extract-pdf-text",
                r#"{"filePath":"company/missing.pdf","bucket":"company-documents"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let (status, body) = send_json(
            &app.router,
            json_request("/functions/extract-pdf-text", r#"{"filePath":"x.pdf"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send_json(
            &app.router,
            json_request(
                "/functions/extract-pdf-text",
                r#"{"filePath":"x.pdf","bucket":"avatars"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        app.state
            .store()
            .upload("user-documents", "u/1_fake.pdf", b"plain bytes", "application/pdf")
            .await
            .unwrap();
        let (status, body) = send_json(
            &app.router,
            json_request(
                "/functions/extract-pdf-text",
                r#"{"filePath":"u/1_fake.pdf","bucket":"user-documents"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_extract_text_multipart() {
        let app = app();
        let pdf = alpha_beta_gamma_pdf();
        let (status, body) = send_json(
            &app.router,
            multipart_request(
                "/extract-text",
                &[("file", Some("deck.pdf"), Some("application/pdf"), &pdf[..])],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["text"].as_str().unwrap().contains("Beta"));

        let blank = pdf_with_pages(&[&[]]);
        let (_, body) = send_json(
            &app.router,
            multipart_request("/extract-text", &[("file", Some("scan.pdf"), None, &blank[..])]),
        )
        .await;
        assert_eq!(body["success"], true);
        assert!(body["text"]
            .as_str()
            .unwrap()
            .starts_with("PDF Document: scan.pdf"));

        let (_, body) = send_json(
            &app.router,
            multipart_request("/extract-text", &[("file", Some("bad.pdf"), None, &b"nope"[..])]),
        )
        .await;
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app.router,
            multipart_request("/extract-text", &[("other", None, None, &b"x"[..])]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let app = app();
        let pdf = alpha_beta_gamma_pdf();

        let (status, body) = send_json(
            &app.router,
            multipart_request(
                "/api/documents",
                &[
                    ("user_id", None, None, &b"frank"[..]),
                    ("file", Some("deck.pdf"), Some("application/pdf"), &pdf[..]),
                    ("file", Some("notes.txt"), Some("text/plain"), &b"meeting notes"[..]),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["succeeded"], 2);
        assert_eq!(body["failed"], 0);
        let deck = &body["files"][0]["document"];
        assert_eq!(deck["has_extracted_text"], true);
        assert_eq!(deck["user_id"], "frank");
        let deck_id = deck["id"].as_str().unwrap().to_string();
        let notes_id = body["files"][1]["file_id"].as_str().unwrap().to_string();

        let (_, list) = send_json(&app.router, get("/api/documents?user_id=frank")).await;
        assert_eq!(list["total_count"], 2);
        assert_eq!(list["documents"][0]["filename"], "notes.txt");

        let (_, company) = send_json(&app.router, get("/api/documents?scope=company")).await;
        assert_eq!(company["total_count"], 0);

        let (status, context) = send_json(&app.router, get("/api/context?user_id=frank")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(context["user_documents"], 2);
        let text = context["context"].as_str().unwrap();
        assert!(text.contains("- deck.pdf (application/pdf)"));
        assert!(text.contains("- notes.txt (text/plain)"));

        let response = app
            .router
            .clone()
            .oneshot(get(&format!("/api/documents/{}/download", notes_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"meeting notes");

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/documents/{}", deck_id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send_json(&app.router, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "deck.pdf");

        let (status, body) =
            send_json(&app.router, get(&format!("/api/documents/{}", deck_id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found");

        let (_, list) = send_json(&app.router, get("/api/documents?user_id=frank")).await;
        assert_eq!(list["total_count"], 1);
    }

    #[tokio::test]
    async fn test_upload_without_files_rejected() {
        let app = app();
        let (status, body) = send_json(
            &app.router,
            multipart_request("/api/documents", &[("user_id", None, None, &b"frank"[..])]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request");
    }

    #[tokio::test]
    async fn test_unreadable_part_keeps_earlier_files() {
        let app = app();

        let mut body = multipart_body(&[
            ("user_id", None, None, &b"gina"[..]),
            ("file", Some("first.txt"), Some("text/plain"), &b"complete part"[..]),
        ]);
        // Replace the closing boundary with a part that is cut off mid-data
        body.truncate(body.len() - format!("--{}--\r\n", BOUNDARY).len());
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"second.txt\"\r\n\
                 Content-Type: text/plain\r\n\r\npartial da",
                BOUNDARY
            )
            .as_bytes(),
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send_json(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["succeeded"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["files"][0]["filename"], "first.txt");
        assert_eq!(body["files"][0]["state"], "complete");
        assert_eq!(body["files"][1]["filename"], "second.txt");
        assert_eq!(body["files"][1]["state"], "error");

        let (_, list) = send_json(&app.router, get("/api/documents?user_id=gina")).await;
        assert_eq!(list["total_count"], 1);
        assert_eq!(list["documents"][0]["filename"], "first.txt");
    }

    #[tokio::test]
    async fn test_context_without_documents() {
        let app = app();
        let (_, body) = send_json(&app.router, get("/api/context")).await;
        assert_eq!(body["context"], crate::generation::NO_DOCUMENTS_CONTEXT);
    }
}
