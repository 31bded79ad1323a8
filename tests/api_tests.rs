use filmbase::{
    AppConfig, AppState, Envelope, bootstrap_admin, create_router,
    repository::{InMemoryRepository, RepositoryState},
};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

const ADMIN: (&str, &str) = ("root", "root-password");

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    bootstrap_admin(&repo, ADMIN.0, ADMIN.1)
        .await
        .expect("Failed to provision admin");

    let router = create_router(AppState::new(repo, AppConfig::default()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(format!("{}/login", self.address))
            .basic_auth(username, Some(password))
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), StatusCode::OK);

        let envelope: Envelope<String> = response.json().await.unwrap();
        envelope.body.expect("token in body")
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document_lists_operations() {
    let app = spawn_app().await;
    let doc: serde_json::Value = app
        .client
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();

    for path in ["/actor", "/actor/films", "/film/search", "/login", "/sign"] {
        assert!(doc["paths"].get(path).is_some(), "{path}");
    }
}

#[tokio::test]
async fn test_catalogue_lifecycle() {
    let app = spawn_app().await;
    let admin = app.login(ADMIN.0, ADMIN.1).await;

    // Admin builds the catalogue.
    let actor: Envelope<i64> = app
        .client
        .post(format!("{}/actor", app.address))
        .header("Token", &admin)
        .json(&json!({"name": "Keanu Reeves", "gender": "male", "birthdate": "1964-09-02"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(actor.code, 200);
    let actor_id = actor.body.unwrap();

    let film: Envelope<i64> = app
        .client
        .post(format!("{}/film", app.address))
        .header("Token", &admin)
        .json(&json!({
            "name": "The Matrix",
            "description": "Red pill",
            "release-date": "1999-03-31",
            "rating": 9
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let film_id = film.body.unwrap();

    let link = app
        .client
        .post(format!("{}/actor/{actor_id}/{film_id}", app.address))
        .header("Token", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(link.status(), StatusCode::OK);

    // A freshly signed-up user can read but not write.
    let signup = app
        .client
        .post(format!("{}/sign", app.address))
        .json(&json!({"username": "neo", "password": "follow-the-rabbit"}))
        .send()
        .await
        .unwrap();
    assert_eq!(signup.status(), StatusCode::CREATED);
    let user = app.login("neo", "follow-the-rabbit").await;

    let search = app
        .client
        .get(format!("{}/film/search", app.address))
        .query(&[("filmName", "matrix"), ("actorName", "keanu"), ("sortKey", "asc")])
        .header("Token", &user)
        .send()
        .await
        .unwrap();
    assert_eq!(search.status(), StatusCode::OK);
    let hits: serde_json::Value = search.json().await.unwrap();
    assert_eq!(hits["code"], 200);
    assert_eq!(hits["body"][0]["actor"]["id"], actor_id);
    assert_eq!(hits["body"][0]["film"]["release-date"], "1999-03-31");

    let forbidden = app
        .client
        .delete(format!("{}/film/{film_id}", app.address))
        .header("Token", &user)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    let envelope: Envelope = forbidden.json().await.unwrap();
    assert_eq!(envelope.code, 403);

    // Admin removes the film; the association goes with it.
    let deleted = app
        .client
        .delete(format!("{}/film/{film_id}", app.address))
        .header("Token", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let grouped: serde_json::Value = app
        .client
        .get(format!("{}/actor/films", app.address))
        .header("Token", &user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(grouped["body"], json!([]));
}

#[tokio::test]
async fn test_missing_token_is_unauthorized_envelope() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/film", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let envelope: Envelope = response.json().await.unwrap();
    assert_eq!(envelope.code, 401);
    assert!(envelope.error.is_some());
    assert!(envelope.body.is_none());
}
