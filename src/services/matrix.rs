//! Builds the user x movie rating matrix the similarity engine consumes.
//!
//! Columns are the full catalog in catalog order, including movies nobody
//! has rated; every downstream consumer indexes by column position, so the
//! column set must always equal the catalog exactly.

use std::collections::HashMap;

use ndarray::Array2;

use crate::models::RatedTitle;

/// A dense user x movie rating matrix with its axis labels
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    /// Distinct user ids, ascending; one row per entry
    pub user_ids: Vec<i64>,
    /// Catalog titles in catalog order; one column per entry
    pub titles: Vec<String>,
    /// Cell (u, m) = mean rating of user u for movie m, 0.0 where unrated
    pub values: Array2<f64>,
}

/// Builds the rating matrix from joined rating rows and the full catalog.
///
/// Duplicate (user, movie) ratings are averaged. A rating whose title is
/// not in the catalog cannot occur when rows come from the FK-joined query;
/// it is a defect, asserted in debug builds and skipped with a warning in
/// release builds rather than silently shifting columns.
///
/// With no ratings at all the result is a 0 x |catalog| matrix, keeping the
/// column invariant intact for the degenerate artifact.
pub fn build_rating_matrix(rows: &[RatedTitle], catalog: &[String]) -> RatingMatrix {
    let col_index: HashMap<&str, usize> = catalog
        .iter()
        .enumerate()
        .map(|(i, title)| (title.as_str(), i))
        .collect();

    let mut user_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let row_index: HashMap<i64, usize> = user_ids
        .iter()
        .enumerate()
        .map(|(i, &user_id)| (user_id, i))
        .collect();

    let mut sums = Array2::<f64>::zeros((user_ids.len(), catalog.len()));
    let mut counts = Array2::<f64>::zeros((user_ids.len(), catalog.len()));

    for rated in rows {
        let Some(&col) = col_index.get(rated.title.as_str()) else {
            debug_assert!(false, "rating for title not in catalog: {}", rated.title);
            tracing::warn!(title = %rated.title, "rating references a title missing from the catalog, skipping");
            continue;
        };
        let row = row_index[&rated.user_id];
        sums[[row, col]] += rated.rating;
        counts[[row, col]] += 1.0;
    }

    let values = ndarray::Zip::from(&sums)
        .and(&counts)
        .map_collect(|&sum, &count| if count > 0.0 { sum / count } else { 0.0 });

    RatingMatrix {
        user_ids,
        titles: catalog.to_vec(),
        values,
    }
}
