use serde::{Deserialize, Serialize};

/// A movie in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub movie_id: i64,
    pub title: String,
    pub genre: String,
    pub year: i64,
    pub description: String,
}

/// Payload for creating a movie; the client supplies the id
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub movie_id: i64,
    pub title: String,
    pub genre: String,
    pub year: i64,
    pub description: String,
}

/// A stored rating; users are bare integer ids with no User entity behind them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Rating {
    pub rating_id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: f64,
}

/// Payload for submitting a rating
#[derive(Debug, Clone, Deserialize)]
pub struct NewRating {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: f64,
}

/// A rating row joined with its movie title, the trainer's input shape
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RatedTitle {
    pub user_id: i64,
    pub rating: f64,
    pub title: String,
}

/// Whether the serving model was refreshed by the mutation that just ran
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Ready,
    Degraded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_serde_round_trip() {
        let movie = Movie {
            movie_id: 6,
            title: "Inception".to_string(),
            genre: "Action,Adventure,Sci-Fi".to_string(),
            year: 2010,
            description: "A thief who steals corporate secrets".to_string(),
        };

        let json = serde_json::to_string(&movie).unwrap();
        let deserialized: Movie = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, movie);
    }

    #[test]
    fn test_new_rating_deserializes_from_api_shape() {
        let payload: NewRating =
            serde_json::from_str(r#"{"user_id": 3, "movie_id": 6, "rating": 4.5}"#).unwrap();
        assert_eq!(payload.user_id, 3);
        assert_eq!(payload.movie_id, 6);
        assert_eq!(payload.rating, 4.5);
    }

    #[test]
    fn test_model_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ModelStatus::Ready).unwrap(), r#""ready""#);
        assert_eq!(
            serde_json::to_string(&ModelStatus::Degraded).unwrap(),
            r#""degraded""#
        );
    }
}
