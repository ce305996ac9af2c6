//! HTTP surface: router, shared state, and server lifecycle.

pub(crate) mod handlers;
mod middleware;
mod openapi;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

use crate::{
    accounts::AccountService,
    auth::{LoginService, TokenService},
    etl::EtlProvider,
    store::Stores,
};

/// Everything the handlers need, built once at startup and injected as a
/// single extension.
pub struct AppState {
    pub login: LoginService,
    pub tokens: TokenService,
    pub accounts: AccountService,
    pub stores: Stores,
    pub etl: Option<Arc<dyn EtlProvider>>,
    pub enforce_mfa: bool,
}

/// Build the full application router against the given state.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/v1/openapi.json", get(openapi::serve))
        .route("/v1/config", get(handlers::appconfig::config))
        .route("/v1/auth/login", post(handlers::auth::login))
        .route("/v1/auth/mfa", post(handlers::auth::mfa))
        .route("/v1/auth/refresh", post(handlers::auth::refresh))
        .route("/v1/auth/revoke", post(handlers::auth::revoke))
        .route("/v1/mfa/uri", post(handlers::mfa::totp_uri))
        .route("/v1/mfa/confirm", post(handlers::mfa::confirm));

    let protected = Router::new()
        .route(
            "/v1/accounts",
            post(handlers::accounts::create).get(handlers::accounts::list),
        )
        .route("/v1/organizations", post(handlers::orgs::create))
        .route("/v1/organizations/:key", get(handlers::orgs::retrieve))
        .route(
            "/v1/projects",
            post(handlers::projects::create).get(handlers::projects::list),
        )
        .route("/v1/projects/:key", get(handlers::projects::retrieve))
        .route(
            "/v1/projects/:key/datasources",
            get(handlers::datasources::list_for_project),
        )
        .route("/v1/datasources", post(handlers::datasources::create))
        .route(
            "/v1/datasources/:id/schemas",
            get(handlers::datasources::schemas),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_auth));

    public.merge(protected).layer(Extension(state))
}

/// Bind and serve until ctrl-c.
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(port: u16, state: Arc<AppState>) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    );

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
