use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// --- Core Application Schemas (Mapped to Database) ---

/// Actor
///
/// A row of the `actor` table, and the body of `POST /actor` and `PUT /actor`.
/// `id` is ignored on create and identifies the row to change on update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Validate, Default, PartialEq, Eq, Hash)]
#[ts(export)]
pub struct Actor {
    #[serde(default)]
    pub id: i64,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(custom(function = "validate_gender"))]
    pub gender: String,
    /// ISO date, `YYYY-MM-DD`.
    #[validate(custom(function = "validate_iso_date"))]
    pub birthdate: String,
}

/// Film
///
/// A row of the `film` table, and the body of `POST /film` and `PUT /film`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Validate, Default, PartialEq, Eq)]
#[ts(export)]
pub struct Film {
    #[serde(default)]
    pub id: i64,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
    /// ISO date, `YYYY-MM-DD`. Sent as `release-date` on the wire.
    #[serde(rename = "release-date")]
    #[validate(custom(function = "validate_iso_date"))]
    pub release_date: String,
    #[validate(range(min = 0, max = 10))]
    pub rating: i32,
}

/// ActorFilms
///
/// One actor with every film they are linked to (GET /actor/films).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct ActorFilms {
    pub actor: Actor,
    pub films: Vec<Film>,
}

/// FilmCredit
///
/// One actor/film association matched by GET /film/search.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct FilmCredit {
    pub actor: Actor,
    pub film: Film,
}

/// User
///
/// A row of the `api_users` table. `password` holds the argon2 hash, never the
/// plaintext, and is never serialized into a response.
#[derive(Debug, Clone, FromRow, Default, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password: String,
    pub role: String,
}

// --- Request Payloads (Input Schemas) ---

/// SignupRequest
///
/// Body of `POST /sign`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

// --- Sorting ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    #[default]
    Rating,
    ReleaseDate,
}

impl SortField {
    /// Parses a bound `sortBy` value. Absent and empty both fall back to `rating`.
    pub fn resolve(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            None | Some("") => Some(SortField::default()),
            Some("name") => Some(SortField::Name),
            Some("rating") => Some(SortField::Rating),
            Some("release-date") | Some("release_date") => Some(SortField::ReleaseDate),
            Some(_) => None,
        }
    }

    /// Column name in the `film` table.
    pub fn column(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Rating => "rating",
            SortField::ReleaseDate => "release_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses a bound `sortKey` value. Absent and empty both fall back to `DESC`.
    pub fn resolve(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::to_ascii_uppercase).as_deref() {
            None | Some("") => Some(SortOrder::default()),
            Some("ASC") => Some(SortOrder::Asc),
            Some("DESC") => Some(SortOrder::Desc),
            Some(_) => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// FilmSort
///
/// Ordering applied to film listings. Ties are always broken by ascending film id
/// so that repeated queries over unchanged data return the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilmSort {
    pub field: SortField,
    pub order: SortOrder,
}

// --- Field Validators ---

/// Accepts only zero-padded `YYYY-MM-DD`, so stored dates order lexically.
pub fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) if date.format("%Y-%m-%d").to_string() == value => Ok(()),
        _ => Err(ValidationError::new("iso_date")),
    }
}

pub fn validate_gender(value: &str) -> Result<(), ValidationError> {
    match value {
        "male" | "female" => Ok(()),
        _ => Err(ValidationError::new("gender")),
    }
}
