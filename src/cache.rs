//! ベクトルキャッシュモジュール
//!
//! 画像のSHA-256をキーにして特徴ベクトルをキャッシュし、
//! 同じ画像の再推論をスキップする。
//! エンコーダ設定のフィンガープリントが異なるキャッシュは使わない。

use crate::error::{Result, StyleFinderError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".style-finder-cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingCache {
    /// バージョン（互換性チェック用）
    version: u32,
    /// エンコーダ設定のフィンガープリント
    fingerprint: String,
    /// 画像ハッシュ → エントリ
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub file_name: String,
    pub vector: Vec<f32>,
}

impl EmbeddingCache {
    const CURRENT_VERSION: u32 = 1;

    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            fingerprint: fingerprint.into(),
            entries: HashMap::new(),
        }
    }

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルをそのまま読み込む（互換性チェックなし）
    pub fn read(folder: &Path) -> Result<Self> {
        let file = File::open(Self::cache_path(folder))?;
        let cache = serde_json::from_reader(BufReader::new(file))?;
        Ok(cache)
    }

    /// キャッシュファイルを読み込み
    ///
    /// ファイルがない・壊れている・バージョンやフィンガープリントが
    /// 一致しない場合は空のキャッシュを返す。
    pub fn load(folder: &Path, fingerprint: &str) -> Self {
        let cache_path = Self::cache_path(folder);
        match Self::read(folder) {
            Ok(cache) if cache.version != Self::CURRENT_VERSION => {
                tracing::warn!(path = %cache_path.display(), version = cache.version, "cache version mismatch");
                Self::new(fingerprint)
            }
            Ok(cache) if cache.fingerprint != fingerprint => {
                tracing::warn!(path = %cache_path.display(), "cache built with other encoder settings");
                Self::new(fingerprint)
            }
            Ok(cache) => cache,
            Err(StyleFinderError::Io(e)) if e.kind() == ErrorKind::NotFound => Self::new(fingerprint),
            Err(e) => {
                tracing::warn!(path = %cache_path.display(), error = %e, "cache file unreadable");
                Self::new(fingerprint)
            }
        }
    }

    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（削除したら `true`）
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn get(&self, hash: &str) -> Option<&[f32]> {
        self.entries.get(hash).map(|e| e.vector.as_slice())
    }

    pub fn insert(&mut self, hash: String, file_name: String, vector: Vec<f32>) {
        self.entries.insert(hash, CacheEntry { file_name, vector });
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 画像バイト列のハッシュ（SHA-256, hex）
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = EmbeddingCache::new("fp");
        cache.insert("h1".into(), "a.jpg".into(), vec![0.5, 0.25]);

        assert_eq!(cache.get("h1"), Some(&[0.5, 0.25][..]));
        assert_eq!(cache.get("h2"), None);
        assert_eq!(cache.len(), 1);
    }
}
