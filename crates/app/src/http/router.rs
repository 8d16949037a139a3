use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::http::middleware::same_origin;
use crate::http::routes::{auth, health, pages, posts, search, sync};
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let menu_actions = Router::new()
        .route("/sync/new", post(sync::sync_new))
        .route("/sync/all", post(sync::sync_all))
        .route("/logout", post(sync::logout))
        .layer(middleware::from_fn(same_origin::require_same_origin));

    let pages = Router::new()
        .route("/", get(pages::home))
        .route("/search", get(pages::search_page))
        .merge(menu_actions)
        .route("/login", get(auth::login))
        .route("/auth/callback", get(auth::callback));

    let mut api = Router::new()
        .route("/health", get(health::health))
        .route("/api/posts", get(posts::list_posts))
        .route("/api/me", get(posts::me))
        .route("/api/search", get(search::search));
    if let Some(cors) = build_cors(&state) {
        api = api.layer(cors);
    }

    pages.merge(api).with_state(state)
}

fn build_cors(state: &AppState) -> Option<CorsLayer> {
    let mut origins = Vec::new();
    let mut allow_any = false;
    for origin in state.config.cors_allow_origins.iter() {
        if is_wildcard_origin(origin) {
            allow_any = true;
            break;
        }
        match HeaderValue::from_str(origin.trim()) {
            Ok(value) => origins.push(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "invalid CORS origin ignored");
            }
        }
    }

    let cors = CorsLayer::new().allow_methods([Method::GET, Method::OPTIONS]);

    if !should_enable_cors(allow_any, &origins) {
        return None;
    }

    if allow_any {
        Some(cors.allow_origin(Any).allow_headers(Any))
    } else {
        Some(
            cors.allow_origin(AllowOrigin::list(origins))
                .allow_credentials(true)
                .allow_headers([CONTENT_TYPE]),
        )
    }
}

fn is_wildcard_origin(origin: &str) -> bool {
    origin.trim() == "*"
}

fn should_enable_cors(allow_any: bool, origins: &[HeaderValue]) -> bool {
    allow_any || !origins.is_empty()
}
