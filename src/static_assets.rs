use anyhow::Result;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::error::AppError;

const PLACEHOLDER: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Telemetry Viewer</title>
  </head>
  <body>
    <h1>Telemetry Viewer</h1>
    <p>No dashboard build configured. Start with <code>--static-root</code>, or query <code>/data</code> and <code>/alldata</code> directly.</p>
  </body>
</html>
"#;

/// First path segments owned by the JSON API. Unknown paths under them get a
/// JSON 404 instead of the dashboard shell.
const API_SEGMENTS: [&str; 4] = ["data", "alldata", "api", "healthz"];

enum Dashboard {
    Build(ServeDir),
    Placeholder,
}

fn is_api_path(path: &str) -> bool {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    API_SEGMENTS
        .iter()
        .any(|segment| first.starts_with(segment))
}

/// Client-side routes have no file extension in their last segment.
fn is_client_route(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .map_or(true, |last| !last.contains('.'))
}

fn not_found(path: &str) -> Response {
    AppError::new(StatusCode::NOT_FOUND, format!("Not found: {path}")).into_response()
}

fn with_cache_control(mut response: Response, value: &'static str) -> Response {
    if response.status().is_success() && !response.headers().contains_key(CACHE_CONTROL) {
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static(value));
    }
    response
}

async fn from_build(dir: &ServeDir, req: Request) -> Response {
    let path = req.uri().path().to_owned();
    let method = req.method().clone();

    let mut dir = dir.clone();
    let response = match dir.try_call(req).await {
        Ok(response) => response.into_response(),
        Err(err) => {
            tracing::error!(error = %err, path = %path, "failed to read dashboard asset");
            return AppError::internal("Error reading dashboard asset").into_response();
        }
    };

    if response.status() != StatusCode::NOT_FOUND {
        let policy = if path.starts_with("/static/") {
            "public, max-age=31536000, immutable"
        } else if is_client_route(&path) {
            "no-store"
        } else {
            "public, max-age=86400"
        };
        return with_cache_control(response, policy);
    }
    if !is_client_route(&path) {
        return not_found(&path);
    }

    let index = axum::http::Request::builder()
        .method(method)
        .uri("/index.html")
        .body(Body::empty());
    match index {
        Ok(index) => match dir.try_call(index).await {
            Ok(response) if response.status().is_success() => {
                with_cache_control(response.into_response(), "no-store")
            }
            Ok(_) => not_found(&path),
            Err(err) => {
                tracing::error!(error = %err, "failed to read dashboard index.html");
                AppError::internal("Error reading dashboard asset").into_response()
            }
        },
        Err(err) => {
            tracing::error!(error = %err, "failed to build index.html request");
            AppError::internal("Error reading dashboard asset").into_response()
        }
    }
}

async fn serve_dashboard(State(dashboard): State<Arc<Dashboard>>, req: Request) -> Response {
    let path = req.uri().path().to_owned();
    if is_api_path(&path) {
        return not_found(&path);
    }
    match dashboard.as_ref() {
        Dashboard::Build(dir) => from_build(dir, req).await,
        Dashboard::Placeholder if is_client_route(&path) => {
            with_cache_control(Html(PLACEHOLDER).into_response(), "no-store")
        }
        Dashboard::Placeholder => not_found(&path),
    }
}

/// Fallback for everything the API router does not match: the dashboard
/// build from `static_root` (client routes get `index.html`), or a
/// placeholder page when no build is configured.
pub fn dashboard(static_root: Option<PathBuf>) -> Result<Router> {
    let dashboard = match static_root {
        Some(root) => {
            if !root.join("index.html").is_file() {
                anyhow::bail!("dashboard build has no index.html under {}", root.display());
            }
            Dashboard::Build(ServeDir::new(root).append_index_html_on_directories(true))
        }
        None => Dashboard::Placeholder,
    };
    Ok(Router::new()
        .fallback(serve_dashboard)
        .with_state(Arc::new(dashboard)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_samples, test_state};
    use axum::http::Request;
    use tower::ServiceExt;

    fn build_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<html>dash</html>").expect("index");
        std::fs::create_dir_all(dir.path().join("static/js")).expect("static dir");
        std::fs::write(dir.path().join("static/js/main.abc123.js"), "console.log(1)")
            .expect("bundle");
        dir
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&body).into_owned()
    }

    fn cache_control(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
    }

    #[test]
    fn build_without_index_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = dashboard(Some(dir.path().join("missing"))).unwrap_err();
        assert!(err.to_string().contains("no index.html"));
        let err = dashboard(Some(dir.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("no index.html"));
    }

    #[test]
    fn classifies_api_paths_by_first_segment() {
        for path in ["/data", "/dataa", "/data/nope", "/alldata/x", "/api/v2", "/healthz/"] {
            assert!(is_api_path(path), "{path}");
        }
        for path in ["/", "/history", "/machines/data", "/static/js/main.js"] {
            assert!(!is_api_path(path), "{path}");
        }
    }

    #[tokio::test]
    async fn client_routes_get_the_index() {
        let dir = build_dir();
        let app = dashboard(Some(dir.path().to_path_buf())).expect("dashboard");

        let resp = get(app.clone(), "/history/machine-1").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(cache_control(&resp), Some("no-store"));
        assert_eq!(body_text(resp).await, "<html>dash</html>");

        let resp = get(app, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(cache_control(&resp), Some("no-store"));
    }

    #[tokio::test]
    async fn bundles_are_immutable_and_missing_assets_stay_missing() {
        let dir = build_dir();
        let app = dashboard(Some(dir.path().to_path_buf())).expect("dashboard");

        let resp = get(app.clone(), "/static/js/main.abc123.js").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            cache_control(&resp),
            Some("public, max-age=31536000, immutable")
        );

        let resp = get(app, "/static/js/main.gone.js").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(cache_control(&resp).is_none());
    }

    #[tokio::test]
    async fn unknown_api_paths_are_json_404s() {
        let dir = build_dir();
        let built = dashboard(Some(dir.path().to_path_buf())).expect("dashboard");
        let placeholder = dashboard(None).expect("dashboard");

        for app in [built, placeholder] {
            let resp = get(app, "/dataa").await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let body: serde_json::Value =
                serde_json::from_str(&body_text(resp).await).expect("json");
            assert_eq!(body["message"], "Not found: /dataa");
        }
    }

    #[tokio::test]
    async fn api_router_wins_over_the_dashboard_fallback() {
        let app = crate::routes::router(test_state(fixture_samples()))
            .fallback_service(dashboard(None).expect("dashboard"));

        assert_eq!(get(app.clone(), "/data").await.status(), StatusCode::OK);
        assert_eq!(get(app.clone(), "/dataa").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(app.clone(), "/alldata/extra").await.status(), StatusCode::NOT_FOUND);

        let resp = get(app, "/settings").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Telemetry Viewer"));
    }
}
