use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use super::{FilmbaseRepository, RepoResult, RepositoryError, group_actor_films};
use crate::models::{Actor, ActorFilms, Film, FilmCredit, FilmSort, SortField, SortOrder, User};

#[derive(Default)]
struct Tables {
    actors: BTreeMap<i64, Actor>,
    films: BTreeMap<i64, Film>,
    // (actor_id, film_id)
    links: BTreeSet<(i64, i64)>,
    users: HashMap<String, User>,
    next_actor_id: i64,
    next_film_id: i64,
}

/// InMemoryRepository
///
/// A process-local implementation of `FilmbaseRepository` with the same observable
/// semantics as `PostgresRepository`: ids start at 1, deletes cascade to associations,
/// and orderings break ties by id. Used for local runs without a database and as the
/// backing store of the integration tests.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_films(a: &Film, b: &Film, sort: FilmSort) -> Ordering {
    let by_field = match sort.field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Rating => a.rating.cmp(&b.rating),
        // Validated dates are zero-padded ISO, so they order lexically.
        SortField::ReleaseDate => a.release_date.cmp(&b.release_date),
    };
    let by_field = match sort.order {
        SortOrder::Asc => by_field,
        SortOrder::Desc => by_field.reverse(),
    };
    by_field.then(a.id.cmp(&b.id))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl FilmbaseRepository for InMemoryRepository {
    async fn create_actor(&self, actor: Actor) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        tables.next_actor_id += 1;
        let id = tables.next_actor_id;
        tables.actors.insert(id, Actor { id, ..actor });
        Ok(id)
    }

    async fn update_actor(&self, actor: Actor) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        match tables.actors.get_mut(&actor.id) {
            Some(existing) => {
                *existing = actor;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("actor {}", actor.id))),
        }
    }

    async fn delete_actor(&self, actor_id: i64) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.actors.remove(&actor_id).is_none() {
            return Err(RepositoryError::NotFound(format!("actor {actor_id}")));
        }
        tables.links.retain(|(actor, _)| *actor != actor_id);
        Ok(())
    }

    async fn actor_films(&self) -> RepoResult<Vec<ActorFilms>> {
        let tables = self.tables.read().await;
        let rows = tables
            .links
            .iter()
            .filter_map(|(actor_id, film_id)| {
                Some(FilmCredit {
                    actor: tables.actors.get(actor_id)?.clone(),
                    film: tables.films.get(film_id)?.clone(),
                })
            })
            .collect();
        Ok(group_actor_films(rows))
    }

    async fn link_actor_film(&self, actor_id: i64, film_id: i64) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.actors.contains_key(&actor_id) {
            return Err(RepositoryError::NotFound(format!("actor {actor_id}")));
        }
        if !tables.films.contains_key(&film_id) {
            return Err(RepositoryError::NotFound(format!("film {film_id}")));
        }
        if !tables.links.insert((actor_id, film_id)) {
            return Err(RepositoryError::Duplicate(format!(
                "link between actor {actor_id} and film {film_id}"
            )));
        }
        Ok(())
    }

    async fn list_films(&self, sort: FilmSort) -> RepoResult<Vec<Film>> {
        let tables = self.tables.read().await;
        let mut films: Vec<Film> = tables.films.values().cloned().collect();
        films.sort_by(|a, b| compare_films(a, b, sort));
        Ok(films)
    }

    async fn search_films(
        &self,
        film_name: &str,
        actor_name: &str,
        sort: FilmSort,
    ) -> RepoResult<Vec<FilmCredit>> {
        let tables = self.tables.read().await;
        let mut hits: Vec<FilmCredit> = tables
            .links
            .iter()
            .filter_map(|(actor_id, film_id)| {
                let actor = tables.actors.get(actor_id)?;
                let film = tables.films.get(film_id)?;
                (contains_ignore_case(&film.name, film_name)
                    && contains_ignore_case(&actor.name, actor_name))
                .then(|| FilmCredit {
                    actor: actor.clone(),
                    film: film.clone(),
                })
            })
            .collect();
        hits.sort_by(|a, b| compare_films(&a.film, &b.film, sort).then(a.actor.id.cmp(&b.actor.id)));
        Ok(hits)
    }

    async fn create_film(&self, film: Film) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        tables.next_film_id += 1;
        let id = tables.next_film_id;
        tables.films.insert(id, Film { id, ..film });
        Ok(id)
    }

    async fn update_film(&self, film: Film) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        match tables.films.get_mut(&film.id) {
            Some(existing) => {
                *existing = film;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("film {}", film.id))),
        }
    }

    async fn delete_film(&self, film_id: i64) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.films.remove(&film_id).is_none() {
            return Err(RepositoryError::NotFound(format!("film {film_id}")));
        }
        tables.links.retain(|(_, film)| *film != film_id);
        Ok(())
    }

    async fn find_user(&self, username: &str) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(username).cloned())
    }

    async fn create_user(&self, user: User) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.username) {
            return Err(RepositoryError::Duplicate(format!("user {}", user.username)));
        }
        tables.users.insert(user.username.clone(), user);
        Ok(())
    }
}
