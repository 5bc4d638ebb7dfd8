//! Style Finder Common Library
//!
//! カタログの型定義と、コサイン類似度による最近傍照合。
//! I/Oを持たない純粋なロジックのみを置く。

pub mod types;
pub mod error;
pub mod catalog;
pub mod similarity;
pub mod matcher;

pub use types::{Catalog, CatalogEntry, EmbeddingVector, Match};
pub use error::{Error, Result};
pub use catalog::EMBEDDING_FIELD;
pub use similarity::cosine_similarity;
pub use matcher::{find_closest, rank, try_find_closest};
