//! エンコーダとカタログを束ねた照合処理

use crate::cache::{content_hash, EmbeddingCache};
use crate::catalog::SharedCatalog;
use crate::encoder::{Encoder, ImageSource};
use crate::error::{Result, StyleFinderError};
use crate::scanner;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use style_finder_common::{rank, try_find_closest, Catalog, Match};

/// 1枚の照合結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub source: String,
    pub index: usize,
    pub score: f32,
    pub metadata: Map<String, Value>,
    /// 入力画像（JPEG）のBase64
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base64: String,
}

/// 上位候補の1件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub index: usize,
    pub score: f32,
    pub metadata: Map<String, Value>,
}

impl From<Match<'_>> for RankedMatch {
    fn from(m: Match<'_>) -> Self {
        Self {
            index: m.index,
            score: m.score,
            metadata: m.entry.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BatchOutcome {
    Matched {
        index: usize,
        score: f32,
        metadata: Map<String, Value>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub file_name: String,
    pub path: PathBuf,
    pub outcome: BatchOutcome,
}

impl BatchItem {
    pub fn is_matched(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Matched { .. })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub recursive: bool,
    pub use_cache: bool,
    pub progress: bool,
}

pub struct StyleFinder {
    encoder: Encoder,
    catalog: SharedCatalog,
}

impl StyleFinder {
    pub fn new(encoder: Encoder, catalog: Catalog) -> Self {
        Self {
            encoder,
            catalog: SharedCatalog::new(catalog),
        }
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    /// カタログファイルを読み直して差し替える
    ///
    /// 読み込みに失敗した場合は現在のカタログのまま照合を続けられる。
    pub fn reload_catalog(&self, path: &Path) -> Result<()> {
        self.catalog.reload(path)?;
        tracing::info!(path = %path.display(), "catalog replaced");
        Ok(())
    }

    pub fn try_match_source(&self, source: &ImageSource) -> Result<MatchReport> {
        let encoding = self.encoder.try_encode(source)?;
        let catalog = self.catalog.snapshot();
        let found = try_find_closest(&encoding.vector, &catalog)?;

        Ok(MatchReport {
            source: source.to_string(),
            index: found.index,
            score: found.score,
            metadata: found.entry.metadata.clone(),
            base64: encoding.base64,
        })
    }

    /// 画像を照合（失敗時は `None`）
    pub fn match_source(&self, source: &ImageSource) -> Option<MatchReport> {
        match self.try_match_source(source) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(source = %source, error = %e, "style match failed");
                None
            }
        }
    }

    /// 類似度上位k件
    pub fn try_rank_source(&self, source: &ImageSource, k: usize) -> Result<Vec<RankedMatch>> {
        let encoding = self.encoder.try_encode(source)?;
        let catalog = self.catalog.snapshot();
        let ranked = rank(&encoding.vector, &catalog, k)?;
        Ok(ranked.into_iter().map(RankedMatch::from).collect())
    }

    /// フォルダ内の全画像を照合
    ///
    /// 1枚ごとの失敗は `BatchOutcome::Failed` として記録し、処理は続ける。
    pub fn match_folder(&self, folder: &Path, options: BatchOptions) -> Result<Vec<BatchItem>> {
        let images = scanner::scan_folder(folder, options.recursive)?;
        let catalog = self.catalog.snapshot();
        let fingerprint = self.encoder.fingerprint();

        let mut cache = if options.use_cache {
            EmbeddingCache::load(folder, &fingerprint)
        } else {
            EmbeddingCache::new(fingerprint)
        };

        let progress = if options.progress {
            let bar = ProgressBar::new(images.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut items = Vec::with_capacity(images.len());
        let mut hits = 0usize;

        for image in images {
            progress.set_message(image.file_name.clone());

            let vector = std::fs::read(&image.path)
                .map_err(|source| StyleFinderError::FileOpen {
                    path: image.path.display().to_string(),
                    source,
                })
                .and_then(|bytes| {
                    let hash = content_hash(&bytes);
                    if let Some(vector) = cache.get(&hash) {
                        hits += 1;
                        return Ok(vector.to_vec());
                    }
                    let vector = self.encoder.embed_bytes(&bytes)?;
                    cache.insert(hash, image.file_name.clone(), vector.clone());
                    Ok(vector)
                });

            let outcome = match vector.and_then(|v| Ok(RankedMatch::from(try_find_closest(&v, &catalog)?))) {
                Ok(RankedMatch { index, score, metadata }) => BatchOutcome::Matched {
                    index,
                    score,
                    metadata,
                },
                Err(e) => {
                    tracing::error!(path = %image.path.display(), error = %e, "batch item failed");
                    BatchOutcome::Failed { error: e.to_string() }
                }
            };

            items.push(BatchItem {
                file_name: image.file_name,
                path: image.path,
                outcome,
            });
            progress.inc(1);
        }

        progress.finish_and_clear();
        tracing::debug!(total = items.len(), cache_hits = hits, "batch finished");

        if options.use_cache {
            cache.save(folder)?;
        }

        Ok(items)
    }
}
