use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::get,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Request pipeline: authentication, parameter binding, authorization.
pub mod auth;
pub mod binder;
pub mod extract;
pub mod operations;

// HTTP surface.
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;

// Domain, persistence and startup.
pub mod config;
pub mod models;
pub mod password;
pub mod repository;

// --- Public Re-exports ---

pub use auth::TokenCodec;
pub use config::AppConfig;
pub use envelope::Envelope;
pub use error::ApiError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every operation annotated with `#[utoipa::path]` and every DTO
/// deriving `ToSchema`. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_actor, handlers::put_actor, handlers::get_actor_films,
        handlers::delete_actor, handlers::post_actor_film, handlers::get_film,
        handlers::create_film, handlers::change_film, handlers::get_film_search,
        handlers::delete_film, handlers::login, handlers::signup
    ),
    components(
        schemas(
            models::Actor, models::Film, models::ActorFilms, models::FilmCredit,
            models::SignupRequest,
        )
    ),
    modifiers(&TokenSecurity),
    tags(
        (name = "filmbase", description = "Film and actor catalogue API")
    )
)]
pub struct ApiDoc;

/// Registers the `Token` header as the API key scheme referenced by protected operations.
struct TokenSecurity;

impl Modify for TokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(auth::TOKEN_HEADER))),
            );
        }
    }
}

/// AppState
///
/// The single immutable container shared by every request: the persistence
/// layer, the token codec built from the configured secret, and the configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub tokens: TokenCodec,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            tokens: TokenCodec::new(&config.jwt_secret),
            repo,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(app_state: &AppState) -> TokenCodec {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// bootstrap_admin
///
/// Creates the configured admin account unless a user with that name already
/// exists. Returns whether an account was created.
pub async fn bootstrap_admin(
    repo: &RepositoryState,
    username: &str,
    password: &str,
) -> Result<bool, ApiError> {
    if repo.find_user(username).await?.is_some() {
        tracing::info!(%username, "admin account already present");
        return Ok(false);
    }

    let hash = password::hash_password(password).map_err(|err| ApiError::Internal(err.to_string()))?;
    repo.create_user(models::User {
        username: username.to_string(),
        password: hash,
        role: auth::Role::Admin.as_str().to_string(),
    })
    .await?;

    tracing::info!(%username, "admin account created");
    Ok(true)
}

/// create_router
///
/// Assembles the operation routes, health check and API docs, then wraps them in
/// the observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(|| async { "ok" }))
        .merge(routes::operation_routes())
        // Installed last so they cover every mounted path.
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::method_not_allowed)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`: method, uri and the `x-request-id` set by the layer above,
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
