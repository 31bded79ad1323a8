//! Router Module
//!
//! Builds the operation router from the flat `OPERATIONS` table: each entry is
//! mounted at its path for its method, with the handler chosen by its id. The
//! authentication, binding and authorization stages live in the `Authorized`
//! extractor each protected handler takes, so no route-level layer is needed.

use axum::{
    Router,
    http::Uri,
    routing::{MethodRouter, on},
};

use crate::{
    AppState,
    error::ApiError,
    handlers,
    operations::{OPERATIONS, OperationId, OperationSpec},
};

fn handler_for(op: &OperationSpec) -> MethodRouter<AppState> {
    let filter = op.method.filter();
    match op.id {
        OperationId::CreateActor => on(filter, handlers::create_actor),
        OperationId::PutActor => on(filter, handlers::put_actor),
        OperationId::GetActorFilms => on(filter, handlers::get_actor_films),
        OperationId::DeleteActor => on(filter, handlers::delete_actor),
        OperationId::PostActorFilm => on(filter, handlers::post_actor_film),
        OperationId::GetFilm => on(filter, handlers::get_film),
        OperationId::CreateFilm => on(filter, handlers::create_film),
        OperationId::ChangeFilm => on(filter, handlers::change_film),
        OperationId::GetFilmSearch => on(filter, handlers::get_film_search),
        OperationId::DeleteFilm => on(filter, handlers::delete_film),
        OperationId::Login => on(filter, handlers::login),
        OperationId::Signup => on(filter, handlers::signup),
    }
}

/// Every operation in the table, mounted at its path.
pub fn operation_routes() -> Router<AppState> {
    OPERATIONS.iter().fold(Router::new(), |router, op| {
        tracing::trace!(operation = %op, "mounting route");
        // Repeated paths merge into one method router.
        router.route(op.path, handler_for(op))
    })
}

/// Envelope-shaped 404 for paths no operation is mounted at.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no operation at {}", uri.path()))
}

/// Envelope-shaped 405. Must be installed after every route is mounted.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
