//! 画像の取得元（URL / ローカルファイル）

use crate::error::{Result, StyleFinderError};
use reqwest::blocking::Client;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// HTTP(S)で取得する画像
    Remote(String),
    /// ローカルの画像ファイル
    Local(PathBuf),
}

impl ImageSource {
    /// 入力文字列とURLフラグから取得元を作る
    pub fn new(input: impl Into<String>, is_remote: bool) -> Self {
        let input = input.into();
        if is_remote {
            Self::Remote(input)
        } else {
            Self::Local(PathBuf::from(input))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// 画像のバイト列を読み込む
    ///
    /// リモートの場合、HTTPステータスが成功以外なら `HttpStatus` を返す。
    /// リトライはしない。
    pub fn read_bytes(&self, client: &Client) -> Result<Vec<u8>> {
        match self {
            Self::Remote(url) => {
                let response = client.get(url).send().map_err(|source| StyleFinderError::Fetch {
                    url: url.clone(),
                    source,
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(StyleFinderError::HttpStatus {
                        url: url.clone(),
                        status,
                    });
                }

                let bytes = response.bytes().map_err(|source| StyleFinderError::Fetch {
                    url: url.clone(),
                    source,
                })?;
                Ok(bytes.to_vec())
            }
            Self::Local(path) => std::fs::read(path).map_err(|source| StyleFinderError::FileOpen {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
