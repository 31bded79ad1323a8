use axum::http::StatusCode;
use filmbase::{
    ApiError, Envelope,
    models::{Actor, Film, FilmSort, SignupRequest, SortField, SortOrder, validate_iso_date},
    repository::RepositoryError,
};
use serde_json::json;
use validator::Validate;

// --- Wire Format ---

#[test]
fn test_film_release_date_uses_dashed_json_name() {
    let film: Film = serde_json::from_value(json!({
        "name": "Heat",
        "description": "Crime",
        "release-date": "1995-12-15",
        "rating": 9
    }))
    .unwrap();

    assert_eq!(film.id, 0);
    assert_eq!(film.release_date, "1995-12-15");

    let value = serde_json::to_value(&film).unwrap();
    assert_eq!(value["release-date"], "1995-12-15");
    assert!(value.get("release_date").is_none());
}

#[test]
fn test_envelope_omits_absent_fields() {
    let ok = serde_json::to_value(Envelope::ok(5i64)).unwrap();
    assert_eq!(ok, json!({"code": 200, "body": 5}));

    let err = serde_json::to_value(Envelope::<()>::error(StatusCode::FORBIDDEN, "forbidden")).unwrap();
    assert_eq!(err, json!({"code": 403, "error": "forbidden"}));

    assert_eq!(serde_json::to_value(Envelope::<()>::created()).unwrap(), json!({"code": 201}));
}

#[test]
fn test_every_api_error_status_matches_its_class() {
    let cases = [
        (ApiError::Unauthorized, 401),
        (ApiError::Forbidden, 403),
        (ApiError::MissingParameter("filmName".into()), 400),
        (
            ApiError::InvalidParameterFormat {
                name: "actorId".into(),
                cause: "nope".into(),
            },
            400,
        ),
        (ApiError::BodyValidation("empty".into()), 422),
        (ApiError::NotFound("film 1".into()), 404),
        (ApiError::MethodNotAllowed, 405),
        (ApiError::Conflict("user kim".into()), 409),
        (ApiError::Repository("down".into()), 500),
        (ApiError::Internal("boom".into()), 500),
    ];

    for (error, code) in cases {
        assert_eq!(error.status().as_u16(), code, "{error}");
    }
}

#[test]
fn test_repository_errors_map_to_http_classes() {
    let not_found: ApiError = RepositoryError::NotFound("actor 1".into()).into();
    let duplicate: ApiError = RepositoryError::Duplicate("user kim".into()).into();
    let storage: ApiError = RepositoryError::Storage("connection reset".into()).into();

    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(storage.to_string().contains("connection reset"));
}

// --- Field Validation ---

#[test]
fn test_actor_validation_rules() {
    let valid = Actor {
        id: 0,
        name: "Ann".into(),
        gender: "female".into(),
        birthdate: "1980-02-29".into(),
    };
    assert!(valid.validate().is_ok());

    let long_name = Actor {
        name: "x".repeat(101),
        ..valid.clone()
    };
    assert!(long_name.validate().is_err());

    let bad_gender = Actor {
        gender: "Female".into(),
        ..valid.clone()
    };
    assert!(bad_gender.validate().is_err());

    let impossible_date = Actor {
        birthdate: "1981-02-29".into(),
        ..valid
    };
    assert!(impossible_date.validate().is_err());
}

#[test]
fn test_film_validation_rules() {
    let valid = Film {
        id: 0,
        name: "Heat".into(),
        description: "Crime".into(),
        release_date: "1995-12-15".into(),
        rating: 0,
    };
    assert!(valid.validate().is_ok());
    assert!(Film { rating: 10, ..valid.clone() }.validate().is_ok());
    assert!(Film { rating: -1, ..valid.clone() }.validate().is_err());
    assert!(Film { name: "x".repeat(51), ..valid.clone() }.validate().is_err());
    assert!(Film { description: String::new(), ..valid }.validate().is_err());
}

#[test]
fn test_signup_request_requires_credentials() {
    let empty = SignupRequest {
        username: String::new(),
        password: "pw".into(),
    };
    assert!(empty.validate().is_err());
}

#[test]
fn test_iso_date_format() {
    assert!(validate_iso_date("2024-01-31").is_ok());
    assert!(validate_iso_date("31-01-2024").is_err());
    assert!(validate_iso_date("").is_err());
    assert!(validate_iso_date("2001-2-1").is_err());
    assert!(validate_iso_date("2001-02-1").is_err());
    assert!(validate_iso_date("2001-02-01").is_ok());
}

// --- Sorting ---

#[test]
fn test_sort_resolution() {
    assert_eq!(SortField::resolve(None), Some(SortField::Rating));
    assert_eq!(SortField::resolve(Some("")), Some(SortField::Rating));
    assert_eq!(SortField::resolve(Some("release_date")), Some(SortField::ReleaseDate));
    assert_eq!(SortField::resolve(Some("NAME")), Some(SortField::Name));
    assert_eq!(SortField::resolve(Some("budget")), None);

    assert_eq!(SortOrder::resolve(None), Some(SortOrder::Desc));
    assert_eq!(SortOrder::resolve(Some("asc")), Some(SortOrder::Asc));
    assert_eq!(SortOrder::resolve(Some("up")), None);

    let default = FilmSort::default();
    assert_eq!((default.field.column(), default.order.keyword()), ("rating", "DESC"));
}
