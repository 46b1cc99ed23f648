use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::set_header::response::SetResponseHeaderLayer;

use crate::settings::SettingsAssembler;

pub mod jwt;
pub mod settings_handlers;

// ---------- shared state ----------

#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<SettingsAssembler>,
    pub jwt_secret: String,
}

// ---------- error type ----------

/// A JSON error response: `{"error": "..."}` with an HTTP status.
pub struct ApiErr(StatusCode, String);

impl ApiErr {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self(status, msg.into())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

// ---------- router ----------

pub fn api_router(state: AppState) -> Router {
    let allowed_origins: Vec<HeaderValue> = std::env::var("FS_CORS_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new() // no origins allowed = same-origin only
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route(
            "/api/frontend/settings",
            get(settings_handlers::get_frontend_settings),
        )
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::datasources::NoPermissionFilter;
    use crate::licensing::OssLicensing;
    use crate::plugins::{DbPluginCatalog, PluginRegistry};
    use axum::body::Body;
    use axum::http::Request;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use tower::ServiceExt;

    async fn router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let assembler = SettingsAssembler::new(
            db.clone(),
            Arc::new(Config::default()),
            [1u8; 32],
            Arc::new(DbPluginCatalog::new(Arc::new(PluginRegistry::core()), db)),
            Arc::new(NoPermissionFilter),
            Arc::new(OssLicensing::new("")),
        );
        api_router(AppState {
            assembler: Arc::new(assembler),
            jwt_secret: "test-secret".to_string(),
        })
    }

    #[tokio::test]
    async fn health_is_ok() {
        let res = router()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_token_is_unauthorized() {
        let res = router()
            .await
            .oneshot(
                Request::get("/api/frontend/settings")
                    .header("Authorization", "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn security_headers_present() {
        let res = router()
            .await
            .oneshot(
                Request::get("/api/frontend/settings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
        assert_eq!(res.headers()["cache-control"], "no-store");
    }

    #[test]
    fn api_err_body() {
        let res = ApiErr::new(StatusCode::BAD_REQUEST, "bad").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
