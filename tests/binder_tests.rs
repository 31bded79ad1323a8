use filmbase::{
    binder::{BindError, OperationParams, bind},
    handlers::{DeleteActorParams, GetFilmParams, GetFilmSearchParams, PostActorFilmParams},
    models::{FilmSort, SortField, SortOrder},
    operations::{OPERATIONS, OperationId, spec},
};

fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// --- Operation Table ---

#[test]
fn test_every_operation_has_exactly_one_table_entry() {
    let all = [
        OperationId::CreateActor,
        OperationId::PutActor,
        OperationId::GetActorFilms,
        OperationId::DeleteActor,
        OperationId::PostActorFilm,
        OperationId::GetFilm,
        OperationId::CreateFilm,
        OperationId::ChangeFilm,
        OperationId::GetFilmSearch,
        OperationId::DeleteFilm,
        OperationId::Login,
        OperationId::Signup,
    ];

    assert_eq!(OPERATIONS.len(), all.len());
    for id in all {
        assert_eq!(OPERATIONS.iter().filter(|op| op.id == id).count(), 1, "{id:?}");
        assert_eq!(spec(id).id, id);
    }
}

#[test]
fn test_only_login_and_signup_lack_a_capability() {
    for op in OPERATIONS {
        let public = matches!(op.id, OperationId::Login | OperationId::Signup);
        assert_eq!(op.capability.is_none(), public, "{op}");
    }
}

#[test]
fn test_method_and_path_pairs_are_unique() {
    for (i, a) in OPERATIONS.iter().enumerate() {
        for b in &OPERATIONS[i + 1..] {
            assert!(a.method != b.method || a.path != b.path, "{a} clashes with {b}");
        }
    }
}

// --- Binding ---

#[test]
fn test_get_film_binds_explicit_sort_values() {
    let bound = bind(
        spec(OperationId::GetFilm),
        &[],
        &query(&[("sortBy", "rating"), ("sortKey", "DESC")]),
    )
    .unwrap();
    let params = GetFilmParams::from_bound(&bound).unwrap();

    assert_eq!(params.sort_by.as_deref(), Some("rating"));
    assert_eq!(params.sort_key.as_deref(), Some("DESC"));
    assert_eq!(
        params.sort().unwrap(),
        FilmSort {
            field: SortField::Rating,
            order: SortOrder::Desc
        }
    );
}

#[test]
fn test_get_film_absent_values_resolve_to_defaults() {
    let bound = bind(spec(OperationId::GetFilm), &[], &[]).unwrap();
    let params = GetFilmParams::from_bound(&bound).unwrap();

    assert_eq!(params.sort_by, None);
    assert_eq!(params.sort_key, None);
    assert_eq!(params.sort().unwrap(), FilmSort::default());
}

#[test]
fn test_empty_optional_value_is_kept_as_empty() {
    let bound = bind(spec(OperationId::GetFilm), &[], &query(&[("sortBy", "")])).unwrap();
    let params = GetFilmParams::from_bound(&bound).unwrap();

    assert_eq!(params.sort_by.as_deref(), Some(""));
    assert_eq!(params.sort().unwrap().field, SortField::Rating);
}

#[test]
fn test_sort_values_are_case_insensitive() {
    let bound = bind(
        spec(OperationId::GetFilm),
        &[],
        &query(&[("sortBy", "Release-Date"), ("sortKey", "asc")]),
    )
    .unwrap();
    let params = GetFilmParams::from_bound(&bound).unwrap();

    assert_eq!(
        params.sort().unwrap(),
        FilmSort {
            field: SortField::ReleaseDate,
            order: SortOrder::Asc
        }
    );
}

#[test]
fn test_unsupported_sort_value_is_invalid_format() {
    let err = bind(spec(OperationId::GetFilm), &[], &query(&[("sortKey", "up")])).unwrap_err();

    assert!(matches!(err, BindError::InvalidParamFormat { name: "sortKey", .. }));
}

#[test]
fn test_repeated_query_key_keeps_first_value() {
    let bound = bind(
        spec(OperationId::GetFilm),
        &[],
        &query(&[("sortBy", "name"), ("sortBy", "rating")]),
    )
    .unwrap();

    assert_eq!(GetFilmParams::from_bound(&bound).unwrap().sort_by.as_deref(), Some("name"));
}

#[test]
fn test_film_search_required_fragments() {
    let op = spec(OperationId::GetFilmSearch);

    assert_eq!(
        bind(op, &[], &query(&[("actorName", "ann")])).unwrap_err(),
        BindError::RequiredParam { name: "filmName" }
    );
    assert_eq!(
        bind(op, &[], &query(&[("filmName", "dune"), ("actorName", "")])).unwrap_err(),
        BindError::RequiredParam { name: "actorName" }
    );

    let bound = bind(op, &[], &query(&[("filmName", "dune"), ("actorName", "ann")])).unwrap();
    let params = GetFilmSearchParams::from_bound(&bound).unwrap();
    assert_eq!(params.film_name, "dune");
    assert_eq!(params.actor_name, "ann");
    assert_eq!(params.sort_by, None);
}

#[test]
fn test_path_ids_parse_as_signed_64_bit() {
    let bound = bind(
        spec(OperationId::PostActorFilm),
        &[("actorId", "7"), ("filmId", "-3")],
        &[],
    )
    .unwrap();
    let params = PostActorFilmParams::from_bound(&bound).unwrap();
    assert_eq!((params.actor_id, params.film_id), (7, -3));

    let err = bind(spec(OperationId::DeleteActor), &[("actorId", "9223372036854775808")], &[])
        .unwrap_err();
    assert!(matches!(err, BindError::InvalidParamFormat { name: "actorId", .. }));

    let err = bind(spec(OperationId::DeleteActor), &[("actorId", "abc")], &[]).unwrap_err();
    assert!(matches!(err, BindError::InvalidParamFormat { name: "actorId", .. }));
}

#[test]
fn test_params_for_other_operation_are_rejected() {
    // DeleteActorParams reads `actorId`, which GetFilm never binds.
    let bound = bind(spec(OperationId::GetFilm), &[], &[]).unwrap();
    assert!(DeleteActorParams::from_bound(&bound).is_err());
}

#[test]
fn test_operations_without_parameters_bind_nothing() {
    let bound = bind(spec(OperationId::CreateActor), &[], &query(&[("extra", "ignored")])).unwrap();
    assert_eq!(bound, Default::default());
}
