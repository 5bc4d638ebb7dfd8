//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dimension mismatch at row {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Query vector is empty")]
    EmptyQuery,

    #[error("Catalog has no entries with an embedding")]
    NoCandidates,

    #[error("Invalid embedding at row {index}: {reason}")]
    InvalidEmbedding { index: usize, reason: String },

    #[error("Catalog row {index} is not an object")]
    InvalidRecord { index: usize },

    #[error("Similarity for row {index} is not a number")]
    NonFiniteScore { index: usize },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_dimension_mismatch() {
        let error = Error::DimensionMismatch {
            index: 3,
            expected: 2048,
            found: 1000,
        };
        assert_eq!(
            format!("{}", error),
            "Dimension mismatch at row 3: expected 2048, found 1000"
        );
    }

    #[test]
    fn test_error_display_no_candidates() {
        let display = format!("{}", Error::NoCandidates);
        assert!(display.contains("no entries"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
