use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, query_builder::QueryBuilder};

use super::{FilmbaseRepository, RepoResult, RepositoryError, group_actor_films};
use crate::models::{Actor, ActorFilms, Film, FilmCredit, FilmSort, User};

const FILM_COLUMNS: &str = r#"
    id, name, description,
    to_char(release_date, 'YYYY-MM-DD') AS release_date,
    rating::int4 AS rating
"#;

const CREDIT_COLUMNS: &str = r#"
    a.id AS actor_id, a.name AS actor_name, a.gender AS actor_gender,
    to_char(a.birthdate, 'YYYY-MM-DD') AS actor_birthdate,
    f.id AS film_id, f.name AS film_name, f.description AS film_description,
    to_char(f.release_date, 'YYYY-MM-DD') AS film_release_date,
    f.rating::int4 AS film_rating
"#;

/// One joined actor/film row, flattened so it can be decoded with `FromRow`.
#[derive(FromRow)]
struct CreditRow {
    actor_id: i64,
    actor_name: String,
    actor_gender: String,
    actor_birthdate: String,
    film_id: i64,
    film_name: String,
    film_description: String,
    film_release_date: String,
    film_rating: i32,
}

impl From<CreditRow> for FilmCredit {
    fn from(row: CreditRow) -> Self {
        FilmCredit {
            actor: Actor {
                id: row.actor_id,
                name: row.actor_name,
                gender: row.actor_gender,
                birthdate: row.actor_birthdate,
            },
            film: Film {
                id: row.film_id,
                name: row.film_name,
                // Legacy rows were stored as blank-padded char columns.
                description: row.film_description.trim_end().to_string(),
                release_date: row.film_release_date,
                rating: row.film_rating,
            },
        }
    }
}

/// Maps constraint violations onto the errors the HTTP layer distinguishes.
fn classify(err: sqlx::Error, what: impl Into<String>) -> RepositoryError {
    let violation = err
        .as_database_error()
        .map(|db| (db.is_unique_violation(), db.is_foreign_key_violation()));

    match violation {
        Some((true, _)) => RepositoryError::Duplicate(what.into()),
        Some((_, true)) => RepositoryError::NotFound(what.into()),
        _ => {
            tracing::error!(error = ?err, "database error");
            RepositoryError::from(err)
        }
    }
}

fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, prefix: &str, sort: FilmSort) {
    // Column and keyword come from closed enums, never from request text.
    builder.push(format!(
        " ORDER BY {prefix}{} {}, {prefix}id ASC",
        sort.field.column(),
        sort.order.keyword()
    ));
}

/// Wraps a name fragment as an ILIKE pattern that matches it literally.
fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// PostgresRepository
///
/// The `FilmbaseRepository` backed by PostgreSQL. Queries are checked at runtime,
/// and dynamic ordering goes through `QueryBuilder` with whitelisted columns.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FilmbaseRepository for PostgresRepository {
    async fn create_actor(&self, actor: Actor) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO actor (name, gender, birthdate) VALUES ($1, $2, $3::date) RETURNING id",
        )
        .bind(&actor.name)
        .bind(&actor.gender)
        .bind(&actor.birthdate)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify(err, format!("actor {}", actor.name)))
    }

    async fn update_actor(&self, actor: Actor) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE actor SET name = $1, gender = $2, birthdate = $3::date WHERE id = $4",
        )
        .bind(&actor.name)
        .bind(&actor.gender)
        .bind(&actor.birthdate)
        .bind(actor.id)
        .execute(&self.pool)
        .await
        .map_err(|err| classify(err, format!("actor {}", actor.id)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("actor {}", actor.id)));
        }
        Ok(())
    }

    /// Associations are removed by `ON DELETE CASCADE` on `actor_films`.
    async fn delete_actor(&self, actor_id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM actor WHERE id = $1")
            .bind(actor_id)
            .execute(&self.pool)
            .await
            .map_err(|err| classify(err, format!("actor {actor_id}")))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("actor {actor_id}")));
        }
        Ok(())
    }

    async fn actor_films(&self) -> RepoResult<Vec<ActorFilms>> {
        let sql = format!(
            "SELECT {CREDIT_COLUMNS} FROM actor_films af \
             JOIN actor a ON a.id = af.actorid \
             JOIN film f ON f.id = af.filmid \
             ORDER BY a.id ASC, f.id ASC"
        );
        let rows = sqlx::query_as::<_, CreditRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| classify(err, "actor films"))?;

        Ok(group_actor_films(rows.into_iter().map(FilmCredit::from).collect()))
    }

    async fn link_actor_film(&self, actor_id: i64, film_id: i64) -> RepoResult<()> {
        sqlx::query("INSERT INTO actor_films (actorid, filmid) VALUES ($1, $2)")
            .bind(actor_id)
            .bind(film_id)
            .execute(&self.pool)
            .await
            .map_err(|err| classify(err, format!("link between actor {actor_id} and film {film_id}")))?;
        Ok(())
    }

    async fn list_films(&self, sort: FilmSort) -> RepoResult<Vec<Film>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {FILM_COLUMNS} FROM film"));
        push_order_by(&mut builder, "", sort);

        let films = builder
            .build_query_as::<Film>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| classify(err, "films"))?;

        Ok(films
            .into_iter()
            .map(|film| Film {
                description: film.description.trim_end().to_string(),
                ..film
            })
            .collect())
    }

    async fn search_films(
        &self,
        film_name: &str,
        actor_name: &str,
        sort: FilmSort,
    ) -> RepoResult<Vec<FilmCredit>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {CREDIT_COLUMNS} FROM actor_films af \
             JOIN actor a ON a.id = af.actorid \
             JOIN film f ON f.id = af.filmid \
             WHERE f.name ILIKE "
        ));
        builder.push_bind(contains_pattern(film_name));
        builder.push(" ESCAPE '\\' AND a.name ILIKE ");
        builder.push_bind(contains_pattern(actor_name));
        builder.push(" ESCAPE '\\'");
        push_order_by(&mut builder, "f.", sort);
        builder.push(", a.id ASC");

        let rows = builder
            .build_query_as::<CreditRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| classify(err, "film search"))?;

        Ok(rows.into_iter().map(FilmCredit::from).collect())
    }

    async fn create_film(&self, film: Film) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO film (name, description, release_date, rating) \
             VALUES ($1, $2, $3::date, $4) RETURNING id",
        )
        .bind(&film.name)
        .bind(&film.description)
        .bind(&film.release_date)
        .bind(film.rating)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify(err, format!("film {}", film.name)))
    }

    async fn update_film(&self, film: Film) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE film SET name = $1, description = $2, release_date = $3::date, rating = $4 \
             WHERE id = $5",
        )
        .bind(&film.name)
        .bind(&film.description)
        .bind(&film.release_date)
        .bind(film.rating)
        .bind(film.id)
        .execute(&self.pool)
        .await
        .map_err(|err| classify(err, format!("film {}", film.id)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("film {}", film.id)));
        }
        Ok(())
    }

    async fn delete_film(&self, film_id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM film WHERE id = $1")
            .bind(film_id)
            .execute(&self.pool)
            .await
            .map_err(|err| classify(err, format!("film {film_id}")))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("film {film_id}")));
        }
        Ok(())
    }

    async fn find_user(&self, username: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT username, password, role FROM api_users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| classify(err, format!("user {username}")))
    }

    async fn create_user(&self, user: User) -> RepoResult<()> {
        sqlx::query("INSERT INTO api_users (username, password, role) VALUES ($1, $2, $3)")
            .bind(&user.username)
            .bind(&user.password)
            .bind(&user.role)
            .execute(&self.pool)
            .await
            .map_err(|err| classify(err, format!("user {}", user.username)))?;
        Ok(())
    }
}
