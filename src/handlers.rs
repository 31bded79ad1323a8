use axum::{
    extract::State,
    http::{HeaderMap, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    AppState,
    auth::{Claims, Role},
    binder::{BindError, BoundParams, OperationParams},
    envelope::Envelope,
    error::ApiError,
    extract::{Authorized, ValidatedJson},
    models::{Actor, ActorFilms, Film, FilmCredit, FilmSort, SignupRequest, SortField, SortOrder, User},
    operations::OperationId,
    password,
    repository::RepositoryState,
};

// --- Operation Parameters ---

/// Declares a parameter struct for an operation that takes no path or query input.
macro_rules! no_params {
    ($name:ident, $op:ident) => {
        #[derive(Debug)]
        pub struct $name;

        impl OperationParams for $name {
            const OPERATION: OperationId = OperationId::$op;

            fn from_bound(_: &BoundParams) -> Result<Self, BindError> {
                Ok($name)
            }
        }
    };
}

no_params!(CreateActorParams, CreateActor);
no_params!(PutActorParams, PutActor);
no_params!(GetActorFilmsParams, GetActorFilms);
no_params!(CreateFilmParams, CreateFilm);
no_params!(ChangeFilmParams, ChangeFilm);

#[derive(Debug)]
pub struct DeleteActorParams {
    pub actor_id: i64,
}

impl OperationParams for DeleteActorParams {
    const OPERATION: OperationId = OperationId::DeleteActor;

    fn from_bound(bound: &BoundParams) -> Result<Self, BindError> {
        Ok(Self {
            actor_id: bound.int("actorId")?,
        })
    }
}

#[derive(Debug)]
pub struct PostActorFilmParams {
    pub actor_id: i64,
    pub film_id: i64,
}

impl OperationParams for PostActorFilmParams {
    const OPERATION: OperationId = OperationId::PostActorFilm;

    fn from_bound(bound: &BoundParams) -> Result<Self, BindError> {
        Ok(Self {
            actor_id: bound.int("actorId")?,
            film_id: bound.int("filmId")?,
        })
    }
}

#[derive(Debug)]
pub struct DeleteFilmParams {
    pub film_id: i64,
}

impl OperationParams for DeleteFilmParams {
    const OPERATION: OperationId = OperationId::DeleteFilm;

    fn from_bound(bound: &BoundParams) -> Result<Self, BindError> {
        Ok(Self {
            film_id: bound.int("filmId")?,
        })
    }
}

/// GetFilmParams
///
/// `sort_by`/`sort_key` keep exactly what the caller sent: `None` when absent,
/// `Some("")` when sent empty. Defaults are applied by `sort()`.
#[derive(Debug, PartialEq, Eq)]
pub struct GetFilmParams {
    pub sort_by: Option<String>,
    pub sort_key: Option<String>,
}

impl GetFilmParams {
    pub fn sort(&self) -> Result<FilmSort, BindError> {
        resolve_sort(self.sort_by.as_deref(), self.sort_key.as_deref())
    }
}

impl OperationParams for GetFilmParams {
    const OPERATION: OperationId = OperationId::GetFilm;

    fn from_bound(bound: &BoundParams) -> Result<Self, BindError> {
        Ok(Self {
            sort_by: bound.optional_text("sortBy"),
            sort_key: bound.optional_text("sortKey"),
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct GetFilmSearchParams {
    pub film_name: String,
    pub actor_name: String,
    pub sort_by: Option<String>,
    pub sort_key: Option<String>,
}

impl GetFilmSearchParams {
    pub fn sort(&self) -> Result<FilmSort, BindError> {
        resolve_sort(self.sort_by.as_deref(), self.sort_key.as_deref())
    }
}

impl OperationParams for GetFilmSearchParams {
    const OPERATION: OperationId = OperationId::GetFilmSearch;

    fn from_bound(bound: &BoundParams) -> Result<Self, BindError> {
        Ok(Self {
            film_name: bound.required_text("filmName")?,
            actor_name: bound.required_text("actorName")?,
            sort_by: bound.optional_text("sortBy"),
            sort_key: bound.optional_text("sortKey"),
        })
    }
}

fn resolve_sort(sort_by: Option<&str>, sort_key: Option<&str>) -> Result<FilmSort, BindError> {
    let field = SortField::resolve(sort_by).ok_or_else(|| BindError::InvalidParamFormat {
        name: "sortBy",
        cause: format!("unsupported sort field `{}`", sort_by.unwrap_or_default()),
    })?;
    let order = SortOrder::resolve(sort_key).ok_or_else(|| BindError::InvalidParamFormat {
        name: "sortKey",
        cause: format!("unsupported sort order `{}`", sort_key.unwrap_or_default()),
    })?;
    Ok(FilmSort { field, order })
}

/// PUT bodies name the row they replace; a missing `id` decodes as 0.
fn require_row_id(id: i64, table: &str) -> Result<(), ApiError> {
    if id < 1 {
        return Err(ApiError::BodyValidation(format!(
            "{table} body must carry a positive id"
        )));
    }
    Ok(())
}

// --- Actor Handlers ---

/// create_actor
///
/// [Write] Inserts an actor and returns its generated id.
#[utoipa::path(
    post,
    path = "/actor",
    request_body = Actor,
    responses(
        (status = 200, description = "Actor created, body is the new id", body = i64),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin role required"),
        (status = 422, description = "Invalid body")
    ),
    security(("token" = []))
)]
pub async fn create_actor(
    _: Authorized<CreateActorParams>,
    State(repo): State<RepositoryState>,
    ValidatedJson(actor): ValidatedJson<Actor>,
) -> Result<Envelope<i64>, ApiError> {
    let id = repo.create_actor(actor).await?;
    tracing::info!(actor_id = id, "actor created");
    Ok(Envelope::ok(id))
}

/// put_actor
///
/// [Write] Replaces the actor named by the body's `id`.
#[utoipa::path(
    put,
    path = "/actor",
    request_body = Actor,
    responses(
        (status = 200, description = "Actor updated"),
        (status = 404, description = "No actor with that id"),
        (status = 422, description = "Invalid body")
    ),
    security(("token" = []))
)]
pub async fn put_actor(
    _: Authorized<PutActorParams>,
    State(repo): State<RepositoryState>,
    ValidatedJson(actor): ValidatedJson<Actor>,
) -> Result<Envelope<()>, ApiError> {
    require_row_id(actor.id, "actor")?;
    repo.update_actor(actor).await?;
    Ok(Envelope::empty())
}

/// get_actor_films
///
/// [Read] Every actor with at least one film, grouped with their films.
#[utoipa::path(
    get,
    path = "/actor/films",
    responses((status = 200, description = "Actors with their films", body = [ActorFilms])),
    security(("token" = []))
)]
pub async fn get_actor_films(
    _: Authorized<GetActorFilmsParams>,
    State(repo): State<RepositoryState>,
) -> Result<Envelope<Vec<ActorFilms>>, ApiError> {
    Ok(Envelope::ok(repo.actor_films().await?))
}

/// delete_actor
///
/// [Write] Deletes the actor and its film associations.
#[utoipa::path(
    delete,
    path = "/actor/{actorId}",
    params(("actorId" = i64, Path, description = "Actor id")),
    responses(
        (status = 200, description = "Actor deleted"),
        (status = 400, description = "actorId is not an integer"),
        (status = 404, description = "No actor with that id")
    ),
    security(("token" = []))
)]
pub async fn delete_actor(
    Authorized { params, .. }: Authorized<DeleteActorParams>,
    State(repo): State<RepositoryState>,
) -> Result<Envelope<()>, ApiError> {
    repo.delete_actor(params.actor_id).await?;
    tracing::info!(actor_id = params.actor_id, "actor deleted");
    Ok(Envelope::empty())
}

/// post_actor_film
///
/// [Write] Links an existing actor to an existing film.
#[utoipa::path(
    post,
    path = "/actor/{actorId}/{filmId}",
    params(
        ("actorId" = i64, Path, description = "Actor id"),
        ("filmId" = i64, Path, description = "Film id")
    ),
    responses(
        (status = 200, description = "Association created"),
        (status = 404, description = "Actor or film does not exist"),
        (status = 409, description = "Association already exists")
    ),
    security(("token" = []))
)]
pub async fn post_actor_film(
    Authorized { params, .. }: Authorized<PostActorFilmParams>,
    State(repo): State<RepositoryState>,
) -> Result<Envelope<()>, ApiError> {
    repo.link_actor_film(params.actor_id, params.film_id).await?;
    Ok(Envelope::empty())
}

// --- Film Handlers ---

/// get_film
///
/// [Read] Lists every film, sorted by `sortBy` (default `rating`) in `sortKey`
/// order (default `DESC`).
#[utoipa::path(
    get,
    path = "/film",
    params(
        ("sortBy" = Option<String>, Query, description = "name, rating, release-date"),
        ("sortKey" = Option<String>, Query, description = "ASC or DESC")
    ),
    responses((status = 200, description = "Films", body = [Film])),
    security(("token" = []))
)]
pub async fn get_film(
    Authorized { params, .. }: Authorized<GetFilmParams>,
    State(repo): State<RepositoryState>,
) -> Result<Envelope<Vec<Film>>, ApiError> {
    let films = repo.list_films(params.sort()?).await?;
    Ok(Envelope::ok(films))
}

/// create_film
///
/// [Write] Inserts a film and returns its generated id.
#[utoipa::path(
    post,
    path = "/film",
    request_body = Film,
    responses(
        (status = 200, description = "Film created, body is the new id", body = i64),
        (status = 422, description = "Invalid body")
    ),
    security(("token" = []))
)]
pub async fn create_film(
    _: Authorized<CreateFilmParams>,
    State(repo): State<RepositoryState>,
    ValidatedJson(film): ValidatedJson<Film>,
) -> Result<Envelope<i64>, ApiError> {
    let id = repo.create_film(film).await?;
    tracing::info!(film_id = id, "film created");
    Ok(Envelope::ok(id))
}

#[utoipa::path(
    put,
    path = "/film",
    request_body = Film,
    responses(
        (status = 200, description = "Film updated"),
        (status = 404, description = "No film with that id"),
        (status = 422, description = "Invalid body")
    ),
    security(("token" = []))
)]
pub async fn change_film(
    _: Authorized<ChangeFilmParams>,
    State(repo): State<RepositoryState>,
    ValidatedJson(film): ValidatedJson<Film>,
) -> Result<Envelope<()>, ApiError> {
    require_row_id(film.id, "film")?;
    repo.update_film(film).await?;
    Ok(Envelope::empty())
}

/// get_film_search
///
/// [Read] Actor/film pairs whose film name contains `filmName` and whose actor
/// name contains `actorName`.
#[utoipa::path(
    get,
    path = "/film/search",
    params(
        ("filmName" = String, Query, description = "Film name fragment"),
        ("actorName" = String, Query, description = "Actor name fragment"),
        ("sortBy" = Option<String>, Query, description = "name, rating, release-date"),
        ("sortKey" = Option<String>, Query, description = "ASC or DESC")
    ),
    responses(
        (status = 200, description = "Matching pairs", body = [FilmCredit]),
        (status = 400, description = "filmName or actorName missing")
    ),
    security(("token" = []))
)]
pub async fn get_film_search(
    Authorized { params, .. }: Authorized<GetFilmSearchParams>,
    State(repo): State<RepositoryState>,
) -> Result<Envelope<Vec<FilmCredit>>, ApiError> {
    let hits = repo
        .search_films(&params.film_name, &params.actor_name, params.sort()?)
        .await?;
    Ok(Envelope::ok(hits))
}

#[utoipa::path(
    delete,
    path = "/film/{filmId}",
    params(("filmId" = i64, Path, description = "Film id")),
    responses(
        (status = 200, description = "Film deleted"),
        (status = 404, description = "No film with that id")
    ),
    security(("token" = []))
)]
pub async fn delete_film(
    Authorized { params, .. }: Authorized<DeleteFilmParams>,
    State(repo): State<RepositoryState>,
) -> Result<Envelope<()>, ApiError> {
    repo.delete_film(params.film_id).await?;
    tracing::info!(film_id = params.film_id, "film deleted");
    Ok(Envelope::empty())
}

// --- Account Handlers ---

/// Splits `Authorization: Basic base64(username:password)`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// login
///
/// [Public] Exchanges Basic credentials for a signed token carrying the user's role.
#[utoipa::path(
    post,
    path = "/login",
    responses(
        (status = 200, description = "Signed token", body = String),
        (status = 401, description = "Missing or rejected credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Envelope<String>, ApiError> {
    let Some((username, password)) = basic_credentials(&headers) else {
        tracing::info!("Request discarded: missing or malformed basic credentials");
        return Err(ApiError::Unauthorized);
    };

    let Some(user) = state.repo.find_user(&username).await? else {
        tracing::info!(%username, "Request discarded: unknown user");
        return Err(ApiError::Unauthorized);
    };

    // argon2 is blocking CPU work.
    let stored = user.password.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_password(&password, &stored))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    if !verified {
        tracing::info!(%username, "Request discarded: wrong password");
        return Err(ApiError::Unauthorized);
    }

    let token = state
        .tokens
        .issue(&Claims::new(user.username, user.role))
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    tracing::info!(%username, "token issued");
    Ok(Envelope::ok(token))
}

/// signup
///
/// [Public] Registers a new account with the `user` role.
#[utoipa::path(
    post,
    path = "/sign",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 409, description = "Username taken"),
        (status = 422, description = "Invalid body")
    )
)]
pub async fn signup(
    State(repo): State<RepositoryState>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<Envelope<()>, ApiError> {
    let SignupRequest { username, password } = request;

    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    repo.create_user(User {
        username: username.clone(),
        password: hash,
        role: Role::User.as_str().to_string(),
    })
    .await?;

    tracing::info!(%username, "account created");
    Ok(Envelope::created())
}
