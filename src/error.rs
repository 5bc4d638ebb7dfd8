use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleFinderError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("画像の取得に失敗: {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("画像の取得に失敗: {url} (HTTP {status})")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("ファイルを開けません: {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("画像デコードエラー: {0}")]
    ImageDecode(String),

    #[error("画像エンコードエラー: {0}")]
    ImageEncode(String),

    #[error("モデルファイルが見つかりません: {0}")]
    ModelNotFound(String),

    #[error("推論エラー: {0}")]
    Inference(String),

    #[error("カタログエラー: {0}")]
    Catalog(#[from] style_finder_common::Error),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl StyleFinderError {
    /// 取得系エラー（リモート・ローカル）かどうか
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::HttpStatus { .. } | Self::FileOpen { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StyleFinderError>;
