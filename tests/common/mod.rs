#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use filmbase::{
    AppConfig, AppState, Envelope, TokenCodec, create_router,
    auth::Claims,
    models::{Actor, ActorFilms, Film, FilmCredit, FilmSort, User},
    repository::{FilmbaseRepository, InMemoryRepository, RepoResult, RepositoryState},
};
use http_body_util::BodyExt;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tower::ServiceExt;

// --- Recording Repository ---

/// Delegates to an `InMemoryRepository` and counts every call, so tests can
/// assert that a short-circuited request never reached persistence.
#[derive(Default)]
pub struct RecordingRepo {
    inner: InMemoryRepository,
    calls: AtomicUsize,
}

impl RecordingRepo {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FilmbaseRepository for RecordingRepo {
    async fn create_actor(&self, actor: Actor) -> RepoResult<i64> {
        self.record();
        self.inner.create_actor(actor).await
    }
    async fn update_actor(&self, actor: Actor) -> RepoResult<()> {
        self.record();
        self.inner.update_actor(actor).await
    }
    async fn delete_actor(&self, actor_id: i64) -> RepoResult<()> {
        self.record();
        self.inner.delete_actor(actor_id).await
    }
    async fn actor_films(&self) -> RepoResult<Vec<ActorFilms>> {
        self.record();
        self.inner.actor_films().await
    }
    async fn link_actor_film(&self, actor_id: i64, film_id: i64) -> RepoResult<()> {
        self.record();
        self.inner.link_actor_film(actor_id, film_id).await
    }
    async fn list_films(&self, sort: FilmSort) -> RepoResult<Vec<Film>> {
        self.record();
        self.inner.list_films(sort).await
    }
    async fn search_films(
        &self,
        film_name: &str,
        actor_name: &str,
        sort: FilmSort,
    ) -> RepoResult<Vec<FilmCredit>> {
        self.record();
        self.inner.search_films(film_name, actor_name, sort).await
    }
    async fn create_film(&self, film: Film) -> RepoResult<i64> {
        self.record();
        self.inner.create_film(film).await
    }
    async fn update_film(&self, film: Film) -> RepoResult<()> {
        self.record();
        self.inner.update_film(film).await
    }
    async fn delete_film(&self, film_id: i64) -> RepoResult<()> {
        self.record();
        self.inner.delete_film(film_id).await
    }
    async fn find_user(&self, username: &str) -> RepoResult<Option<User>> {
        self.record();
        self.inner.find_user(username).await
    }
    async fn create_user(&self, user: User) -> RepoResult<()> {
        self.record();
        self.inner.create_user(user).await
    }
}

// --- App Scaffolding ---

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<RecordingRepo>,
    pub tokens: TokenCodec,
}

pub fn test_app() -> TestApp {
    let repo = Arc::new(RecordingRepo::default());
    let state = AppState::new(repo.clone() as RepositoryState, AppConfig::default());
    let tokens = state.tokens.clone();

    TestApp {
        router: create_router(state),
        repo,
        tokens,
    }
}

impl TestApp {
    pub fn token(&self, role: &str) -> String {
        self.tokens
            .issue(&Claims::new(format!("{role}-caller"), role))
            .expect("token issue")
    }

    pub fn admin_token(&self) -> String {
        self.token("admin")
    }

    pub fn user_token(&self) -> String {
        self.token("user")
    }

    /// Sends one request through the full router and decodes the envelope.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Envelope) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let envelope: Envelope = serde_json::from_slice(&bytes)
            .unwrap_or_else(|err| panic!("response is not an envelope ({err}): {bytes:?}"));

        (status, envelope)
    }

    /// Seeds one actor and one film linked together, returning their ids.
    pub async fn seed_pair(&self, actor_name: &str, film_name: &str, rating: i32) -> (i64, i64) {
        let actor_id = self
            .repo
            .create_actor(actor(actor_name))
            .await
            .expect("seed actor");
        let film_id = self
            .repo
            .create_film(film(film_name, rating))
            .await
            .expect("seed film");
        self.repo
            .link_actor_film(actor_id, film_id)
            .await
            .expect("seed link");
        self.repo.reset();
        (actor_id, film_id)
    }
}

// --- Request Builders ---

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Token", token);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}

// --- Fixtures ---

pub fn actor(name: &str) -> Actor {
    Actor {
        id: 0,
        name: name.to_string(),
        gender: "female".to_string(),
        birthdate: "1980-05-17".to_string(),
    }
}

pub fn film(name: &str, rating: i32) -> Film {
    Film {
        id: 0,
        name: name.to_string(),
        description: format!("{name} description"),
        release_date: "2001-01-01".to_string(),
        rating,
    }
}
