//! Item-item cosine similarity over rating columns.

use ndarray::Array2;

/// Computes the M x M cosine similarity matrix between the columns of a
/// user x movie rating matrix.
///
/// Conventions, fixed so the output is always well-defined:
/// - any pairing involving an all-zero column is 0.0 (undefined cosine);
/// - the diagonal is exactly 1.0 for columns with at least one non-zero
///   rating, 0.0 otherwise;
/// - a matrix with no user rows produces a 0 x 0 result, the degenerate
///   model for an unrated catalog.
///
/// Each off-diagonal pair is computed once and mirrored, so the result is
/// symmetric by construction, and the fixed iteration order makes reruns on
/// identical input bit-identical.
pub fn item_similarity(ratings: &Array2<f64>) -> Array2<f64> {
    let movies = ratings.ncols();
    if ratings.nrows() == 0 {
        return Array2::zeros((0, 0));
    }

    let norms: Vec<f64> = (0..movies)
        .map(|i| ratings.column(i).dot(&ratings.column(i)).sqrt())
        .collect();

    let mut similarity = Array2::<f64>::zeros((movies, movies));
    for i in 0..movies {
        if norms[i] > 0.0 {
            similarity[[i, i]] = 1.0;
        }
        for j in (i + 1)..movies {
            if norms[i] == 0.0 || norms[j] == 0.0 {
                continue;
            }
            let value = ratings.column(i).dot(&ratings.column(j)) / (norms[i] * norms[j]);
            similarity[[i, j]] = value;
            similarity[[j, i]] = value;
        }
    }

    similarity
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identical_columns_have_similarity_one() {
        let ratings = array![[5.0, 5.0], [3.0, 3.0]];
        let sim = item_similarity(&ratings);
        assert!((sim[[0, 1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orthogonal_columns_have_similarity_zero() {
        let ratings = array![[5.0, 0.0], [0.0, 4.0]];
        let sim = item_similarity(&ratings);
        assert_eq!(sim[[0, 1]], 0.0);
    }

    #[test]
    fn test_symmetric_with_unit_diagonal() {
        let ratings = array![[5.0, 1.0, 0.0], [4.0, 0.0, 5.0]];
        let sim = item_similarity(&ratings);

        assert_eq!(sim.dim(), (3, 3));
        for i in 0..3 {
            assert_eq!(sim[[i, i]], 1.0);
            for j in 0..3 {
                assert_eq!(sim[[i, j]], sim[[j, i]]);
            }
        }
    }

    #[test]
    fn test_zero_column_pairs_and_diagonal_are_zero() {
        let ratings = array![[5.0, 0.0], [4.0, 0.0]];
        let sim = item_similarity(&ratings);

        assert_eq!(sim[[1, 1]], 0.0);
        assert_eq!(sim[[0, 1]], 0.0);
        assert_eq!(sim[[1, 0]], 0.0);
        assert_eq!(sim[[0, 0]], 1.0);
    }

    #[test]
    fn test_no_users_yields_empty_similarity() {
        let ratings = Array2::<f64>::zeros((0, 4));
        let sim = item_similarity(&ratings);
        assert_eq!(sim.dim(), (0, 0));
    }

    #[test]
    fn test_deterministic_across_reruns() {
        let ratings = array![[5.0, 1.0, 0.0], [4.0, 0.0, 5.0], [0.0, 2.0, 3.0]];

        let first = item_similarity(&ratings);
        let second = item_similarity(&ratings);

        assert_eq!(first.as_slice().unwrap(), second.as_slice().unwrap());
    }
}
