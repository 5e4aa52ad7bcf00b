//! Host server for the shop pages

use crate::views::{PageRenderer, RenderedPage, Views};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use pokeshop_errors::{Error, UserFacingError};
use pokeshop_metadata::MetadataResolver;
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared state of all requests
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<MetadataResolver>,
    pub renderer: PageRenderer,
    pub views: Views,
}

/// Routes of the shop; anything else is served from `static_dir`
pub fn router(state: AppState, static_dir: &FsPath) -> Router {
    Router::new()
        .route("/", get(catalog_index))
        .route("/catalog/:number", get(catalog_page))
        .route("/cart", get(cart))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn catalog_index(State(state): State<AppState>) -> Response {
    catalog(&state, 1).await
}

/// Page numbers are plain integers; anything else is rejected with 400
/// before it can reach the template
async fn catalog_page(State(state): State<AppState>, Path(number): Path<u32>) -> Response {
    catalog(&state, number).await
}

async fn catalog(state: &AppState, page_number: u32) -> Response {
    let metadata = state.metadata.snapshot().await;
    respond(
        state
            .views
            .render_catalog(&state.renderer, metadata, page_number)
            .await,
    )
}

async fn cart(State(state): State<AppState>) -> Response {
    let metadata = state.metadata.snapshot().await;
    respond(state.views.render_cart(&state.renderer, metadata).await)
}

/// A failed required fragment turns the response into a 500 that still
/// carries the composed document
fn respond(result: Result<RenderedPage, Error>) -> Response {
    match result {
        Ok(page) if page.is_fatal() => {
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page.html)).into_response()
        }
        Ok(page) => Html(page.html).into_response(),
        Err(e) => {
            error!(code = ?e.user_code(), "failed to render page: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.user_message().into_owned()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::shop_elements;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use httpmock::prelude::*;
    use pokeshop_config::FragmentConfig;
    use pokeshop_net::{NetClient, NetConfig};
    use tower::ServiceExt;

    struct Fixture {
        _dir: tempfile::TempDir,
        static_dir: std::path::PathBuf,
        state: AppState,
    }

    async fn fixture(server: &MockServer) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        let static_dir = dir.path().join("dist");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("main.css"), "body { margin: 0; }").unwrap();
        std::fs::write(
            templates.join("index.html"),
            format!(
                r#"<html><body><header-component></header-component><title-component text="Catalog"></title-component><front-end-fragment id="catalog-fragment" required="true" url="{}"></front-end-fragment></body></html>"#,
                server.url("/catalog/page/{currentPageNumber}")
            ),
        )
        .unwrap();
        std::fs::write(
            templates.join("cart.html"),
            format!(
                r#"<html><body><front-end-fragment id="cart-fragment" required="true" url="{}"><fragment-error-component slot="fragment-error"></fragment-error-component></front-end-fragment></body></html>"#,
                server.url("/cart")
            ),
        )
        .unwrap();

        let client = NetClient::new(NetConfig {
            retry_count: 0,
            ..NetConfig::default()
        })
        .unwrap();
        let (tx, _rx) = pokeshop_events::channel();
        let metadata = MetadataResolver::of(client.clone(), vec![server.url("/")], tx.clone());
        metadata.wait().await;

        let state = AppState {
            metadata,
            renderer: PageRenderer::new(
                client,
                FragmentConfig::default(),
                shop_elements(&server.url("/")).unwrap(),
                tx,
            ),
            views: Views::new(templates),
        };
        Fixture {
            _dir: dir,
            static_dir,
            state,
        }
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_catalog_page_is_composed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200).json_body(serde_json::json!({
                "eventsProvider": [{"events": ["cart:add"], "serviceFile": "/cart.js"}]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/catalog/page/3");
            then.status(200)
                .header("X-Event-Dependency", "cart:add")
                .body("<ul><li>Eevee</li></ul>");
        });
        let fixture = fixture(&server).await;
        let app = router(fixture.state.clone(), &fixture.static_dir);

        let (status, html) = get(app, "/catalog/3").await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<ul><li>Eevee</li></ul>"));
        assert!(html.contains("<h1>Catalog</h1>"));
        assert!(html.contains(r#"id="cart-counter-fragment""#));
        assert!(html.contains(r#"{"cart:add":"/cart.js"}"#));
        assert!(html.contains(r#"<script src="/cart.js" type="application/javascript"></script>"#));
    }

    #[tokio::test]
    async fn test_non_numeric_catalog_page_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200).json_body(serde_json::json!({ "eventsProvider": [] }));
        });
        let catalog = server.mock(|when, then| {
            when.method(GET).path_contains("/catalog/page/");
            then.status(200).body("<ul></ul>");
        });
        let fixture = fixture(&server).await;
        let app = router(fixture.state.clone(), &fixture.static_dir);

        let (status, _) = get(app, "/catalog/1%22%3E%3Cscript%3Ex()%3C%2Fscript%3E").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        catalog.assert_hits(0);
    }

    #[tokio::test]
    async fn test_fatal_fragment_sets_500_with_document() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200).json_body(serde_json::json!({ "eventsProvider": [] }));
        });
        let fixture = fixture(&server).await;
        // Point the cart at a closed port
        std::fs::write(
            fixture.state.views.template_dir().join("cart.html"),
            r#"<html><body><front-end-fragment id="cart-fragment" required="true" url="http://127.0.0.1:9/"><fragment-error-component slot="fragment-error"></fragment-error-component></front-end-fragment></body></html>"#,
        )
        .unwrap();
        let app = router(fixture.state.clone(), &fixture.static_dir);

        let (status, html) = get(app, "/cart").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains(r#"<slot name="fragment-error"></slot>"#));
        assert!(html.contains("An error has occurred!"));
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let server = MockServer::start();
        let fixture = fixture(&server).await;
        let app = router(fixture.state.clone(), &fixture.static_dir);

        let (status, body) = get(app, "/main.css").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body { margin: 0; }");
    }
}
