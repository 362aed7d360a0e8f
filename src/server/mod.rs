//! Post server with on-demand page generation and preview mode

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::cms::ContentClient;
use crate::error::Error;
use crate::generator::{is_safe_slug, Generator};
use crate::helpers::{post_url, url_for};
use crate::Blog;

/// Cookie carrying the preview ref
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Server state
pub struct ServerState {
    generator: Generator,
    public_dir: PathBuf,
    /// Slugs whose page is being generated right now
    in_flight: Mutex<HashSet<String>>,
}

impl ServerState {
    pub fn new(blog: &Blog, client: Arc<dyn ContentClient>) -> Result<Self> {
        Ok(Self {
            generator: Generator::new(blog, client)?,
            public_dir: blog.public_dir.clone(),
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// Claim `slug` for generation; `None` if someone else already has it
    fn claim(&self, slug: &str) -> Option<InFlight<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(slug.to_string()) {
            return None;
        }
        Some(InFlight {
            set: &self.in_flight,
            slug: slug.to_string(),
        })
    }
}

/// Marks a slug as being generated until dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    slug: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.slug);
    }
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    let static_files = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/post/:slug", get(post_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, client: Arc<dyn ContentClient>, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(ServerState::new(blog, client)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn preview_ref(jar: &CookieJar) -> Option<String> {
    jar.get(PREVIEW_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// `/post/:slug`
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> Response {
    if !is_safe_slug(&slug) {
        return not_found(&state);
    }
    let renderer = state.generator.renderer();

    // Preview pages always come straight from the store
    if let Some(reference) = preview_ref(&jar) {
        return match renderer.render_slug(&slug, Some(&reference)).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => error_response(&state, &slug, e),
        };
    }

    let cached = state.generator.output_path(&slug);
    match tokio::fs::read_to_string(&cached).await {
        Ok(html) if !html.is_empty() => return Html(html).into_response(),
        Ok(_) => tracing::warn!("Cached page {:?} is empty, regenerating", cached),
        Err(_) => {}
    }

    let Some(_ticket) = state.claim(&slug) else {
        tracing::debug!("Post {} is still being generated", slug);
        return loading(&state);
    };

    match renderer.render_slug(&slug, None).await {
        Ok(html) => {
            let writer = Arc::clone(&state);
            let (key, page) = (slug.clone(), html.clone());
            let written =
                tokio::task::spawn_blocking(move || writer.generator.write_post(&key, &page)).await;
            match written {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("Failed to cache post {}: {}", slug, e),
                Err(e) => tracing::warn!("Failed to cache post {}: {}", slug, e),
            }
            Html(html).into_response()
        }
        Err(e) => error_response(&state, &slug, e),
    }
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    token: String,
    #[serde(rename = "documentId")]
    document_id: String,
}

/// `/api/preview?token=..&documentId=..`
async fn preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PreviewQuery>,
    jar: CookieJar,
) -> Response {
    let renderer = state.generator.renderer();
    let document = match renderer
        .client()
        .fetch_by_id(&query.document_id, Some(&query.token))
        .await
    {
        Ok(document) => document,
        Err(e) => return error_response(&state, &query.document_id, e),
    };

    let Some(slug) = document.uid else {
        tracing::warn!("Preview document {} has no uid", document.id);
        return not_found(&state);
    };

    let cookie = Cookie::build((PREVIEW_COOKIE, query.token)).path("/");
    let location = post_url(renderer.config(), &slug);
    (jar.add(cookie), Redirect::temporary(&location)).into_response()
}

/// `/api/exit-preview`
async fn exit_preview_handler(
    State(state): State<Arc<ServerState>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let cookie = Cookie::build(PREVIEW_COOKIE).path("/");
    let home = url_for(state.generator.renderer().config(), "/");
    (jar.remove(cookie), Redirect::temporary(&home))
}

fn loading(state: &ServerState) -> Response {
    match state.generator.renderer().render_loading() {
        Ok(html) => (StatusCode::ACCEPTED, [(header::REFRESH, "1")], Html(html)).into_response(),
        Err(e) => internal_error(&e),
    }
}

fn not_found(state: &ServerState) -> Response {
    match state.generator.renderer().render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => internal_error(&e),
    }
}

fn error_response(state: &ServerState, slug: &str, error: Error) -> Response {
    if error.is_not_found() {
        tracing::debug!("No post for {}", slug);
        return not_found(state);
    }
    tracing::error!("Failed to render {}: {}", slug, error);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

fn internal_error(error: &Error) -> Response {
    tracing::error!("Server error: {}", error);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{FixtureClient, RawDocument};
    use crate::config::SiteConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn fixture_client() -> Arc<dyn ContentClient> {
        let value: serde_json::Value =
            serde_json::from_str(include_str!("../../fixtures/posts.json")).unwrap();
        let documents: Vec<RawDocument> =
            serde_json::from_value(value["results"].clone()).unwrap();
        Arc::new(FixtureClient::new(documents, "posts"))
    }

    fn state(dir: &std::path::Path) -> Arc<ServerState> {
        state_with(dir, SiteConfig::default())
    }

    fn state_with(dir: &std::path::Path, config: SiteConfig) -> Arc<ServerState> {
        let blog = Blog::with_config(dir, config);
        Arc::new(ServerState::new(&blog, fixture_client()).unwrap())
    }

    async fn send(state: &Arc<ServerState>, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        router(state.clone())
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_post_is_generated_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let response = send(&state, "/post/como-utilizar-hooks", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body(response).await;
        assert!(html.contains("<h1>Como utilizar Hooks</h1>"));

        let cached = dir.path().join("public/post/como-utilizar-hooks/index.html");
        assert_eq!(std::fs::read_to_string(&cached).unwrap(), html);
        assert!(state.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cached_page_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let cached = dir.path().join("public/post/como-utilizar-hooks/index.html");
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, "<p>from disk</p>").unwrap();

        let response = send(&state, "/post/como-utilizar-hooks", None).await;
        assert_eq!(body(response).await, "<p>from disk</p>");
    }

    #[tokio::test]
    async fn test_empty_cached_page_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let cached = dir.path().join("public/post/como-utilizar-hooks/index.html");
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, "").unwrap();

        let response = send(&state, "/post/como-utilizar-hooks", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body(response).await;
        assert!(html.contains("<h1>Como utilizar Hooks</h1>"));
        assert_eq!(std::fs::read_to_string(&cached).unwrap(), html);
    }

    #[tokio::test]
    async fn test_unknown_post_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let response = send(&state, "/post/nao-existe", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body(response).await.contains("Post não encontrado"));
        assert!(!dir.path().join("public/post/nao-existe").exists());
    }

    #[tokio::test]
    async fn test_in_flight_post_shows_loading() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let _ticket = state.claim("como-utilizar-hooks").unwrap();
        assert!(state.claim("como-utilizar-hooks").is_none());

        let response = send(&state, "/post/como-utilizar-hooks", None).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[header::REFRESH], "1");
        assert!(body(response).await.contains("Carregando..."));
    }

    #[tokio::test]
    async fn test_preview_render_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let response = send(
            &state,
            "/post/como-utilizar-hooks",
            Some("io.prismic.preview=preview-ref"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body(response).await;
        assert!(html.contains(r#"href="/api/exit-preview""#));
        assert!(!dir.path().join("public/post/como-utilizar-hooks").exists());
    }

    #[tokio::test]
    async fn test_preview_sets_cookie_and_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let value: serde_json::Value =
            serde_json::from_str(include_str!("../../fixtures/posts.json")).unwrap();
        let id = value["results"][0]["id"].as_str().unwrap().to_string();

        let response = send(
            &state,
            &format!("/api/preview?token=preview-ref&documentId={}", id),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/post/como-utilizar-hooks"
        );
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("io.prismic.preview=preview-ref"));
    }

    #[tokio::test]
    async fn test_preview_unknown_document_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let response = send(&state, "/api/preview?token=t&documentId=nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_exit_preview_clears_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let response = send(&state, "/api/exit-preview", Some("io.prismic.preview=x")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("io.prismic.preview="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_exit_preview_redirects_to_site_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            root: "/blog/".to_string(),
            ..SiteConfig::default()
        };
        let state = state_with(dir.path(), config);

        let response = send(&state, "/api/exit-preview", Some("io.prismic.preview=x")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/blog/");
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join("public/style.css"), "body {}").unwrap();

        let response = send(&state, "/style.css", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "body {}");
    }
}
