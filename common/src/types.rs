//! カタログ関連の共通型定義

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 埋め込みベクトル（モデル最終層の出力）
pub type EmbeddingVector = Vec<f32>;

/// カタログの1行（メタデータ + 事前計算済みベクトル）
///
/// `embedding` が `None` の行は照合対象から除外される。
/// ゼロベクトルとして扱ってはならない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// 任意のメタデータ（商品名、画像URLなど）
    pub metadata: Map<String, Value>,
    /// 事前計算済みベクトル（欠損可）
    pub embedding: Option<EmbeddingVector>,
}

impl CatalogEntry {
    pub fn new(metadata: Map<String, Value>, embedding: Option<EmbeddingVector>) -> Self {
        Self { metadata, embedding }
    }

    /// メタデータのフィールドを取得
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// 参照画像カタログ
///
/// 読み込み後は不変。差し替える場合は新しいカタログを丸ごと作り直す。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// ベクトルを持つ行の数
    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.has_embedding()).count()
    }

    /// 最初にベクトルを持つ行の次元数
    pub fn dimension(&self) -> Option<usize> {
        self.entries
            .iter()
            .find_map(|e| e.embedding.as_ref().map(Vec::len))
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// 照合結果（最も類似したカタログ行とそのスコア）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    /// カタログ内の位置
    pub index: usize,
    pub entry: &'a CatalogEntry,
    /// コサイン類似度 [-1, 1]
    pub score: f32,
}
