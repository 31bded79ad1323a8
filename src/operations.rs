use std::fmt;

use axum::routing::MethodFilter;

use crate::{
    auth::Capability,
    binder::{PathKind, PathParamSpec, QueryKind, QueryParamSpec},
};

/// Allowed values of the `sortBy` query parameter.
pub const SORT_FIELDS: &[&str] = &["name", "rating", "release-date", "release_date"];
/// Allowed values of the `sortKey` query parameter.
pub const SORT_ORDERS: &[&str] = &["ASC", "DESC"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationId {
    CreateActor,
    PutActor,
    GetActorFilms,
    DeleteActor,
    PostActorFilm,
    GetFilm,
    CreateFilm,
    ChangeFilm,
    GetFilmSearch,
    DeleteFilm,
    Login,
    Signup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Delete => MethodFilter::DELETE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// OperationSpec
///
/// Static description of one routable operation. The router, the binder, and the
/// authorization policy all read from the same entry, so an operation's method,
/// path, parameter shape, and capability are declared in exactly one place.
#[derive(Debug)]
pub struct OperationSpec {
    pub id: OperationId,
    pub method: HttpMethod,
    /// axum path template; captures use `{name}`.
    pub path: &'static str,
    /// `None` only for login and signup.
    pub capability: Option<Capability>,
    pub path_params: &'static [PathParamSpec],
    pub query_params: &'static [QueryParamSpec],
}

impl fmt::Display for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} {}", self.id, self.method.as_str(), self.path)
    }
}

const ACTOR_ID: PathParamSpec = PathParamSpec {
    name: "actorId",
    kind: PathKind::Int64,
};

const FILM_ID: PathParamSpec = PathParamSpec {
    name: "filmId",
    kind: PathKind::Int64,
};

const SORT_BY: QueryParamSpec = QueryParamSpec {
    name: "sortBy",
    required: false,
    kind: QueryKind::OneOf(SORT_FIELDS),
};

const SORT_KEY: QueryParamSpec = QueryParamSpec {
    name: "sortKey",
    required: false,
    kind: QueryKind::OneOf(SORT_ORDERS),
};

/// The complete, fixed operation set served by the API.
pub static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        id: OperationId::CreateActor,
        method: HttpMethod::Post,
        path: "/actor",
        capability: Some(Capability::Write),
        path_params: &[],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::PutActor,
        method: HttpMethod::Put,
        path: "/actor",
        capability: Some(Capability::Write),
        path_params: &[],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::GetActorFilms,
        method: HttpMethod::Get,
        path: "/actor/films",
        capability: Some(Capability::Read),
        path_params: &[],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::DeleteActor,
        method: HttpMethod::Delete,
        path: "/actor/{actorId}",
        capability: Some(Capability::Write),
        path_params: &[ACTOR_ID],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::PostActorFilm,
        method: HttpMethod::Post,
        path: "/actor/{actorId}/{filmId}",
        capability: Some(Capability::Write),
        path_params: &[ACTOR_ID, FILM_ID],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::GetFilm,
        method: HttpMethod::Get,
        path: "/film",
        capability: Some(Capability::Read),
        path_params: &[],
        query_params: &[SORT_BY, SORT_KEY],
    },
    OperationSpec {
        id: OperationId::CreateFilm,
        method: HttpMethod::Post,
        path: "/film",
        capability: Some(Capability::Write),
        path_params: &[],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::ChangeFilm,
        method: HttpMethod::Put,
        path: "/film",
        capability: Some(Capability::Write),
        path_params: &[],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::GetFilmSearch,
        method: HttpMethod::Get,
        path: "/film/search",
        capability: Some(Capability::Read),
        path_params: &[],
        query_params: &[
            QueryParamSpec {
                name: "filmName",
                required: true,
                kind: QueryKind::Text,
            },
            QueryParamSpec {
                name: "actorName",
                required: true,
                kind: QueryKind::Text,
            },
            SORT_BY,
            SORT_KEY,
        ],
    },
    OperationSpec {
        id: OperationId::DeleteFilm,
        method: HttpMethod::Delete,
        path: "/film/{filmId}",
        capability: Some(Capability::Write),
        path_params: &[FILM_ID],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::Login,
        method: HttpMethod::Post,
        path: "/login",
        capability: None,
        path_params: &[],
        query_params: &[],
    },
    OperationSpec {
        id: OperationId::Signup,
        method: HttpMethod::Post,
        path: "/sign",
        capability: None,
        path_params: &[],
        query_params: &[],
    },
];

/// Looks up the table entry of an operation. Every `OperationId` has exactly one.
pub fn spec(id: OperationId) -> &'static OperationSpec {
    OPERATIONS
        .iter()
        .find(|op| op.id == id)
        .unwrap_or_else(|| unreachable!("operation {id:?} missing from OPERATIONS"))
}
