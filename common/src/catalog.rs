//! カタログJSONパーサー
//!
//! 事前計算済みベクトルを含むJSON配列をカタログに変換する。
//! 各行はオブジェクトで、`"Embedding"` フィールドだけが固定の契約を持つ。
//! それ以外のフィールドはメタデータとしてそのまま保持する。

use crate::error::{Error, Result};
use crate::types::{Catalog, CatalogEntry, EmbeddingVector};
use serde_json::Value;

/// ベクトルを格納するフィールド名
pub const EMBEDDING_FIELD: &str = "Embedding";

impl Catalog {
    /// JSON文字列からカタログを読み込む
    ///
    /// # Examples
    /// ```
    /// use style_finder_common::Catalog;
    ///
    /// let json = r#"[{"id": "A", "Embedding": [1.0, 0.0]}, {"id": "B", "Embedding": null}]"#;
    /// let catalog = Catalog::from_json_str(json).unwrap();
    /// assert_eq!(catalog.len(), 2);
    /// assert_eq!(catalog.present_count(), 1);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<Value> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    /// JSONオブジェクトの配列からカタログを構築
    pub fn from_records(records: Vec<Value>) -> Result<Self> {
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| parse_record(index, record))
            .collect::<Result<Vec<_>>>()
            .map(Catalog::new)
    }
}

fn parse_record(index: usize, record: Value) -> Result<CatalogEntry> {
    let Value::Object(mut metadata) = record else {
        return Err(Error::InvalidRecord { index });
    };

    let embedding = match metadata.remove(EMBEDDING_FIELD) {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_embedding(index, &value)?),
    };

    Ok(CatalogEntry::new(metadata, embedding))
}

fn parse_embedding(index: usize, value: &Value) -> Result<EmbeddingVector> {
    let items = value.as_array().ok_or_else(|| Error::InvalidEmbedding {
        index,
        reason: format!("expected an array, got {}", value),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(pos, item)| {
            item.as_f64()
                .map(|v| v as f32)
                .filter(|v| v.is_finite())
                .ok_or_else(|| Error::InvalidEmbedding {
                    index,
                    reason: format!("element {} is not a finite number: {}", pos, item),
                })
        })
        .collect()
}
