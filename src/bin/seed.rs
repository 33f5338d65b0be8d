//! Seeds the database with a sample catalog and ratings, then trains the
//! initial model. Run with `cargo run --bin seed`.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cinerec_api::{
    config::Config,
    db::{self, catalog},
    models::{NewMovie, NewRating},
    services::{artifact::ModelStore, serving::ServingCache, trainer},
};

fn sample_movies() -> Vec<NewMovie> {
    let rows: [(i64, &str, &str, i64, &str); 10] = [
        (1, "The Shawshank Redemption", "Drama", 1994, "Two imprisoned men bond over a number of years."),
        (2, "The Godfather", "Crime,Drama", 1972, "The aging patriarch of a crime dynasty transfers control to his son."),
        (3, "The Dark Knight", "Action,Crime,Drama", 2008, "Batman faces the Joker's reign of chaos over Gotham."),
        (4, "Pulp Fiction", "Crime,Drama", 1994, "The lives of two hitmen, a boxer and a pair of bandits intertwine."),
        (5, "Forrest Gump", "Drama,Romance", 1994, "Decades of American history seen through one man's eyes."),
        (6, "Inception", "Action,Adventure,Sci-Fi", 2010, "A thief who steals corporate secrets through dream-sharing."),
        (7, "The Matrix", "Action,Sci-Fi", 1999, "A hacker discovers reality is a simulation."),
        (8, "Interstellar", "Adventure,Drama,Sci-Fi", 2014, "Explorers travel through a wormhole to save humanity."),
        (9, "Fight Club", "Drama", 1999, "An insomniac office worker forms an underground fight club."),
        (10, "The Lord of the Rings: The Fellowship of the Ring", "Adventure,Fantasy", 2001, "A hobbit sets out to destroy a powerful ring."),
    ];

    rows.into_iter()
        .map(|(movie_id, title, genre, year, description)| NewMovie {
            movie_id,
            title: title.to_string(),
            genre: genre.to_string(),
            year,
            description: description.to_string(),
        })
        .collect()
}

fn sample_ratings() -> Vec<NewRating> {
    let rows: [(i64, i64, f64); 15] = [
        (1, 1, 5.0), (1, 2, 4.5), (1, 3, 5.0),
        (2, 2, 5.0), (2, 4, 4.0), (2, 5, 4.5),
        (3, 1, 4.0), (3, 6, 5.0), (3, 7, 4.5),
        (4, 3, 5.0), (4, 8, 5.0), (4, 9, 4.5),
        (5, 5, 4.0), (5, 10, 5.0), (5, 6, 4.5),
    ];

    rows.into_iter()
        .map(|(user_id, movie_id, rating)| NewRating {
            user_id,
            movie_id,
            rating,
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let mut inserted = 0;
    for movie in sample_movies() {
        if catalog::get_movie(&pool, movie.movie_id).await?.is_none() {
            catalog::insert_movie(&pool, &movie).await?;
            inserted += 1;
        }
    }
    tracing::info!(inserted, "sample movies seeded");

    for rating in sample_ratings() {
        catalog::insert_rating(&pool, &rating).await?;
    }
    tracing::info!(count = sample_ratings().len(), "sample ratings seeded");

    let serving = Arc::new(ServingCache::new(ModelStore::new(&config.model_path)));
    trainer::retrain_and_reload(&pool, &serving).await?;
    tracing::info!(path = %config.model_path, "initial model trained");

    Ok(())
}
