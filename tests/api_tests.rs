use std::str::FromStr;
use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;

use cinerec_api::{
    routes::{create_router, AppState},
    services::{artifact::ModelStore, serving::ServingCache},
};

/// Builds a server over an in-memory database and a tempdir-backed model
/// store. The tempdir must outlive the server, so it is returned alongside.
async fn create_test_server() -> (TestServer, TempDir) {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let serving = Arc::new(ServingCache::new(ModelStore::new(dir.path().join("model.bin"))));
    let state = AppState::new(pool, serving);

    (TestServer::new(create_router(state)).unwrap(), dir)
}

fn movie_payload(movie_id: i64, title: &str) -> serde_json::Value {
    json!({
        "movie_id": movie_id,
        "title": title,
        "genre": "Drama",
        "year": 2000,
        "description": "A test movie"
    })
}

async fn add_movie(server: &TestServer, movie_id: i64, title: &str) {
    let response = server
        .post("/movies/")
        .json(&movie_payload(movie_id, title))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
}

async fn add_rating(server: &TestServer, user_id: i64, movie_id: i64, rating: f64) {
    let response = server
        .post("/rate/")
        .json(&json!({ "user_id": user_id, "movie_id": movie_id, "rating": rating }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let (server, _dir) = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_create_and_get_movie() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/movies/")
        .json(&movie_payload(6, "Inception"))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    assert_eq!(created["movie"]["title"], "Inception");
    assert_eq!(created["model"], "ready");

    let response = server.get("/movies/6").await;
    response.assert_status_ok();
    let movie: serde_json::Value = response.json();
    assert_eq!(movie["movie_id"], 6);
    assert_eq!(movie["title"], "Inception");

    let response = server.get("/movies/").await;
    response.assert_status_ok();
    let movies: Vec<serde_json::Value> = response.json();
    assert_eq!(movies.len(), 1);
}

#[tokio::test]
async fn test_movies_listed_in_catalog_order() {
    let (server, _dir) = create_test_server().await;

    add_movie(&server, 3, "C").await;
    add_movie(&server, 1, "A").await;
    add_movie(&server, 2, "B").await;

    let movies: Vec<serde_json::Value> = server.get("/movies/").await.json();
    let ids: Vec<i64> = movies.iter().map(|m| m["movie_id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_get_missing_movie_is_404() {
    let (server, _dir) = create_test_server().await;

    let response = server.get("/movies/99").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn test_duplicate_movie_id_is_conflict() {
    let (server, _dir) = create_test_server().await;

    add_movie(&server, 1, "First").await;
    let response = server
        .post("/movies/")
        .json(&movie_payload(1, "Second"))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_duplicate_title_is_conflict() {
    let (server, _dir) = create_test_server().await;

    add_movie(&server, 1, "Inception").await;
    let response = server
        .post("/movies/")
        .json(&movie_payload(2, "Inception"))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_empty_title_is_rejected() {
    let (server, _dir) = create_test_server().await;

    let response = server.post("/movies/").json(&movie_payload(1, "   ")).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rating_unknown_movie_is_404() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/rate/")
        .json(&json!({ "user_id": 1, "movie_id": 42, "rating": 4.0 }))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rating_out_of_bounds_is_rejected() {
    let (server, _dir) = create_test_server().await;
    add_movie(&server, 1, "A").await;

    let response = server
        .post("/rate/")
        .json(&json!({ "user_id": 1, "movie_id": 1, "rating": 7.5 }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_before_any_training_is_unavailable() {
    let (server, _dir) = create_test_server().await;

    let response = server.get("/recommend/Inception").await;
    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_empty_ratings_yield_empty_recommendations_not_an_error() {
    let (server, _dir) = create_test_server().await;

    // Adding the movie retrains on an empty ratings table
    add_movie(&server, 1, "Inception").await;

    let response = server.get("/recommend/Inception").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["input"], "Inception");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_recommend_scenario_ranks_by_shared_raters() {
    let (server, _dir) = create_test_server().await;

    add_movie(&server, 1, "A").await;
    add_movie(&server, 2, "B").await;
    add_movie(&server, 3, "C").await;

    add_rating(&server, 1, 1, 5.0).await;
    add_rating(&server, 1, 2, 1.0).await;
    add_rating(&server, 2, 1, 4.0).await;
    add_rating(&server, 2, 3, 5.0).await;

    let response = server.get("/recommend/A").await.json::<serde_json::Value>();
    assert_eq!(response["input"], "A");
    let recs = response["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);

    let titles: Vec<&str> = recs.iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert!(titles.contains(&"B"));
    assert!(titles.contains(&"C"));
    assert!(!titles.contains(&"A"));

    // sim(A,B) = 5/sqrt(41) > sim(A,C) = 20/(5*sqrt(41)), so B ranks first
    assert_eq!(titles[0], "B");
    let scores: Vec<f64> = recs.iter().map(|r| r["score"].as_f64().unwrap()).collect();
    assert!(scores[0] >= scores[1]);
}

#[tokio::test]
async fn test_recommend_is_case_insensitive() {
    let (server, _dir) = create_test_server().await;

    add_movie(&server, 1, "Inception").await;
    add_movie(&server, 2, "The Matrix").await;
    add_rating(&server, 1, 1, 5.0).await;
    add_rating(&server, 1, 2, 4.0).await;

    let lower: serde_json::Value = server.get("/recommend/inception").await.json();
    let exact: serde_json::Value = server.get("/recommend/Inception").await.json();
    assert_eq!(lower, exact);
    assert_eq!(lower["input"], "Inception");
}

#[tokio::test]
async fn test_recommend_top_n_caps_results() {
    let (server, _dir) = create_test_server().await;

    for (id, title) in [(1, "A"), (2, "B"), (3, "C"), (4, "D")] {
        add_movie(&server, id, title).await;
        add_rating(&server, 1, id, 4.0).await;
    }

    let response: serde_json::Value = server.get("/recommend/A?top_n=2").await.json();
    assert_eq!(response["recommendations"].as_array().unwrap().len(), 2);

    // Larger than the rest of the catalog returns everything else
    let response: serde_json::Value = server.get("/recommend/A?top_n=100").await.json();
    assert_eq!(response["recommendations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_recommend_unknown_title_is_404() {
    let (server, _dir) = create_test_server().await;
    add_movie(&server, 1, "A").await;

    let response = server.get("/recommend/Unknown").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unrated_movie_still_appears_as_recommendation_candidate() {
    let (server, _dir) = create_test_server().await;

    add_movie(&server, 1, "A").await;
    add_movie(&server, 2, "B").await;
    add_movie(&server, 3, "Unrated").await;
    add_rating(&server, 1, 1, 5.0).await;
    add_rating(&server, 1, 2, 4.0).await;

    // The unrated movie is aligned into the model (score 0), so asking
    // for enough results surfaces it rather than erroring.
    let response: serde_json::Value = server.get("/recommend/A?top_n=5").await.json();
    let recs = response["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);
    let titles: Vec<&str> = recs.iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["B", "Unrated"]);

    // And it can itself be queried, yielding all-zero similarities.
    let response = server.get("/recommend/Unrated").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_delete_cascades_and_drops_movie_from_model() {
    let (server, _dir) = create_test_server().await;

    add_movie(&server, 1, "A").await;
    add_movie(&server, 2, "B").await;
    add_movie(&server, 3, "C").await;
    add_rating(&server, 1, 1, 5.0).await;
    add_rating(&server, 1, 2, 4.0).await;
    add_rating(&server, 2, 2, 5.0).await;
    add_rating(&server, 2, 3, 3.0).await;

    let response = server.delete("/movies/2").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["deleted"]["title"], "B");
    assert_eq!(body["model"], "ready");

    // Gone from the catalog and from the model
    server
        .get("/movies/2")
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
    server
        .get("/recommend/B")
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);

    // Other recommendations no longer mention the deleted title
    let response: serde_json::Value = server.get("/recommend/A?top_n=10").await.json();
    let titles: Vec<&str> = response["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert!(!titles.contains(&"B"));
}

#[tokio::test]
async fn test_delete_missing_movie_is_404() {
    let (server, _dir) = create_test_server().await;

    let response = server.delete("/movies/7").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}
