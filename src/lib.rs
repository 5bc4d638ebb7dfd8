//! 写真の類似画像検索
//!
//! 画像を特徴ベクトルに変換し、事前計算済みカタログと
//! コサイン類似度で照合する。

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod finder;
pub mod scanner;

pub use encoder::{Encoder, EncoderConfig, Encoding, FeatureExtractor, ImageSource, OnnxExtractor};
pub use error::{Result, StyleFinderError};
pub use finder::{BatchItem, BatchOptions, BatchOutcome, MatchReport, RankedMatch, StyleFinder};
pub use style_finder_common::{Catalog, CatalogEntry, Match};
