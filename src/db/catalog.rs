//! Storage collaborator for the movie catalog and its ratings.
//!
//! The trainer reads through `list_movies` and `list_rated_titles` before
//! every retrain; catalog order (ascending movie id) is the column order of
//! every derived matrix, so `list_movies` is the single source of that order.

use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::{Movie, NewMovie, NewRating, RatedTitle, Rating},
};

/// Returns the full catalog in catalog order (ascending movie id)
pub async fn list_movies(pool: &SqlitePool) -> AppResult<Vec<Movie>> {
    let movies = sqlx::query_as::<_, Movie>(
        "SELECT movie_id, title, genre, year, description FROM movies ORDER BY movie_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

/// Fetches a single movie by id
pub async fn get_movie(pool: &SqlitePool, movie_id: i64) -> AppResult<Option<Movie>> {
    let movie = sqlx::query_as::<_, Movie>(
        "SELECT movie_id, title, genre, year, description FROM movies WHERE movie_id = ?",
    )
    .bind(movie_id)
    .fetch_optional(pool)
    .await?;

    Ok(movie)
}

/// Checks whether a title is already taken (titles are unique in the catalog)
pub async fn title_exists(pool: &SqlitePool, title: &str) -> AppResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT movie_id FROM movies WHERE title = ?")
        .bind(title)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// Inserts a movie and returns the stored row
pub async fn insert_movie(pool: &SqlitePool, movie: &NewMovie) -> AppResult<Movie> {
    let stored = sqlx::query_as::<_, Movie>(
        "INSERT INTO movies (movie_id, title, genre, year, description) \
         VALUES (?, ?, ?, ?, ?) \
         RETURNING movie_id, title, genre, year, description",
    )
    .bind(movie.movie_id)
    .bind(&movie.title)
    .bind(&movie.genre)
    .bind(movie.year)
    .bind(&movie.description)
    .fetch_one(pool)
    .await?;

    Ok(stored)
}

/// Deletes a movie by id; its ratings go with it via the FK cascade.
/// Returns the number of movie rows removed (0 or 1).
pub async fn delete_movie(pool: &SqlitePool, movie_id: i64) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM movies WHERE movie_id = ?")
        .bind(movie_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Inserts a rating and returns the stored row with its assigned id
pub async fn insert_rating(pool: &SqlitePool, rating: &NewRating) -> AppResult<Rating> {
    let stored = sqlx::query_as::<_, Rating>(
        "INSERT INTO ratings (user_id, movie_id, rating) \
         VALUES (?, ?, ?) \
         RETURNING rating_id, user_id, movie_id, rating",
    )
    .bind(rating.user_id)
    .bind(rating.movie_id)
    .bind(rating.rating)
    .fetch_one(pool)
    .await?;

    Ok(stored)
}

/// Returns every rating joined with its movie title, in insertion order.
/// The inner join over the FK guarantees each row's title is in the catalog.
pub async fn list_rated_titles(pool: &SqlitePool) -> AppResult<Vec<RatedTitle>> {
    let rows = sqlx::query_as::<_, RatedTitle>(
        "SELECT r.user_id, r.rating, m.title \
         FROM ratings r \
         JOIN movies m ON r.movie_id = m.movie_id \
         ORDER BY r.rating_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
