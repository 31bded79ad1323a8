use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Actor, ActorFilms, Film, FilmCredit, FilmSort, User};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// The persistence failures the HTTP layer distinguishes. Everything the backend
/// reports beyond "missing row" or "duplicate row" is an opaque `Storage` failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Storage(err.to_string())
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// FilmbaseRepository
///
/// Abstract contract for all persistence operations over actors, films, their
/// associations, and API users. Handlers only see this trait, so the Postgres
/// implementation and the in-memory one are interchangeable.
///
/// **Send + Sync + async_trait** make `Arc<dyn FilmbaseRepository>` shareable
/// across Axum's request tasks.
#[async_trait]
pub trait FilmbaseRepository: Send + Sync {
    // --- Actors ---
    /// Inserts the actor, ignoring `actor.id`, and returns the new id.
    async fn create_actor(&self, actor: Actor) -> RepoResult<i64>;
    /// Replaces the actor identified by `actor.id`.
    async fn update_actor(&self, actor: Actor) -> RepoResult<()>;
    /// Deletes the actor and its film associations.
    async fn delete_actor(&self, actor_id: i64) -> RepoResult<()>;

    // --- Associations ---
    /// Every actor that has at least one film, with those films.
    async fn actor_films(&self) -> RepoResult<Vec<ActorFilms>>;
    async fn link_actor_film(&self, actor_id: i64, film_id: i64) -> RepoResult<()>;

    // --- Films ---
    async fn list_films(&self, sort: FilmSort) -> RepoResult<Vec<Film>>;
    /// Associations whose film name contains `film_name` and whose actor name
    /// contains `actor_name`, both compared case-insensitively.
    async fn search_films(
        &self,
        film_name: &str,
        actor_name: &str,
        sort: FilmSort,
    ) -> RepoResult<Vec<FilmCredit>>;
    async fn create_film(&self, film: Film) -> RepoResult<i64>;
    async fn update_film(&self, film: Film) -> RepoResult<()>;
    async fn delete_film(&self, film_id: i64) -> RepoResult<()>;

    // --- Users ---
    async fn find_user(&self, username: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: User) -> RepoResult<()>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn FilmbaseRepository>;

/// Groups flat actor/film rows into one entry per actor, preserving row order.
pub(crate) fn group_actor_films(rows: Vec<FilmCredit>) -> Vec<ActorFilms> {
    let mut grouped: Vec<ActorFilms> = Vec::new();
    for FilmCredit { actor, film } in rows {
        match grouped.iter_mut().find(|entry| entry.actor.id == actor.id) {
            Some(entry) => entry.films.push(film),
            None => grouped.push(ActorFilms {
                actor,
                films: vec![film],
            }),
        }
    }
    grouped
}
