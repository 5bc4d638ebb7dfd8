//! カタログの読み込みと差し替え
//!
//! 照合中のカタログは不変のスナップショットとして扱い、
//! 更新時は新しいカタログを丸ごと差し替える。

use crate::error::{Result, StyleFinderError};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use style_finder_common::Catalog;

/// カタログJSONファイルを読み込む
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path).map_err(|source| StyleFinderError::FileOpen {
        path: path.display().to_string(),
        source,
    })?;
    let catalog = Catalog::from_json_str(&content)?;

    tracing::info!(
        path = %path.display(),
        rows = catalog.len(),
        with_embedding = catalog.present_count(),
        dims = ?catalog.dimension(),
        "catalog loaded"
    );

    Ok(catalog)
}

/// 差し替え可能なカタログ
///
/// `snapshot()` で取得したカタログは差し替え後も変化しない。
#[derive(Debug, Default)]
pub struct SharedCatalog {
    current: RwLock<Arc<Catalog>>,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read())
    }

    /// カタログを差し替え、以前のスナップショットを返す
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        std::mem::replace(&mut *self.current.write(), Arc::new(catalog))
    }

    /// ファイルから再読み込み（失敗時は現在のカタログを維持）
    pub fn reload(&self, path: &Path) -> Result<()> {
        let catalog = load_catalog(path)?;
        self.replace(catalog);
        Ok(())
    }
}
