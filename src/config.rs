use crate::encoder::EncoderConfig;
use crate::error::{Result, StyleFinderError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const MODEL_ENV: &str = "STYLE_FINDER_MODEL";
const CATALOG_ENV: &str = "STYLE_FINDER_CATALOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ONNXモデルファイル
    pub model_path: Option<PathBuf>,
    /// カタログJSONファイル
    pub catalog_path: Option<PathBuf>,
    /// リサイズ後のサイズ [幅, 高さ]
    pub image_size: [u32; 2],
    /// RGB各チャンネルの正規化平均
    pub norm_mean: [f32; 3],
    /// RGB各チャンネルの正規化標準偏差
    pub norm_std: [f32; 3],
    /// Base64用に再エンコードするJPEGの品質
    pub jpeg_quality: u8,
    pub timeout_seconds: u64,
    /// 推論スレッド数
    pub intra_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        let encoder = EncoderConfig::default();
        Self {
            model_path: None,
            catalog_path: None,
            image_size: [encoder.width, encoder.height],
            norm_mean: encoder.mean,
            norm_std: encoder.std,
            jpeg_quality: encoder.jpeg_quality,
            timeout_seconds: 30,
            intra_threads: 4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| StyleFinderError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("style-finder").join("config.json"))
    }

    /// モデルパス（環境変数を優先）
    pub fn model_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var(MODEL_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        self.model_path.clone().ok_or_else(|| {
            StyleFinderError::Config(format!(
                "モデルが設定されていません。`style-finder config --set-model PATH` か {} で指定してください",
                MODEL_ENV
            ))
        })
    }

    /// カタログパス（環境変数を優先）
    pub fn catalog_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CATALOG_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        self.catalog_path.clone().ok_or_else(|| {
            StyleFinderError::Config(format!(
                "カタログが設定されていません。`--catalog PATH` か {} で指定してください",
                CATALOG_ENV
            ))
        })
    }

    pub fn encoder_config(&self) -> Result<EncoderConfig> {
        let config = EncoderConfig {
            width: self.image_size[0],
            height: self.image_size[1],
            mean: self.norm_mean,
            std: self.norm_std,
            jpeg_quality: self.jpeg_quality,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn set_model(&mut self, path: PathBuf) -> Result<()> {
        self.model_path = Some(path);
        self.save()
    }

    pub fn set_catalog(&mut self, path: PathBuf) -> Result<()> {
        self.catalog_path = Some(path);
        self.save()
    }
}
