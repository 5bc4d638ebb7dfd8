//! 画像エンコーダ
//!
//! 画像を (Base64文字列, 特徴ベクトル) に変換する。
//! ベクトルはカタログの事前計算済みベクトルと同じ設定
//! （入力サイズ・正規化定数・モデル重み）で作る必要がある。

mod onnx;
mod preprocess;
mod source;

pub use onnx::OnnxExtractor;
pub use preprocess::preprocess;
pub use source::ImageSource;

use crate::error::{Result, StyleFinderError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use ndarray::Array4;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// 前処理済みテンソルから特徴ベクトルを取り出すモデル
///
/// 推論モード（勾配計算なし、学習時専用の処理なし）で実行し、
/// 同じ入力に対して同じ出力を返すこと。
pub trait FeatureExtractor: Send + Sync {
    /// 表示用のモデル名
    fn name(&self) -> &str;

    /// 重みまで含めたモデルの識別子（キャッシュのキーに使う）
    ///
    /// 出力が異なるモデルは必ず異なる値を返すこと。
    fn identity(&self) -> &str;

    /// (1, 3, H, W) のテンソルを1次元ベクトルに変換
    fn extract(&self, pixels: Array4<f32>) -> Result<Vec<f32>>;
}

/// エンコーダ設定（構築時に固定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub jpeg_quality: u8,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 224,
            height: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            jpeg_quality: 75,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StyleFinderError::Config(format!(
                "画像サイズが不正です: {}x{}",
                self.width, self.height
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(StyleFinderError::Config(format!("正規化平均が不正です: {:?}", self.mean)));
        }
        if self.std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(StyleFinderError::Config(format!(
                "正規化標準偏差が不正です: {:?}",
                self.std
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(StyleFinderError::Config(format!(
                "JPEG品質は1〜100で指定してください: {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// ベクトルの互換性を表すハッシュ
    ///
    /// 入力サイズ・正規化定数・モデル名が同じなら同じ値になる。
    /// JPEG品質はベクトルに影響しないので含めない。
    pub fn fingerprint(&self, model: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        for value in self.mean.iter().chain(self.std.iter()) {
            hasher.update(value.to_bits().to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// エンコード結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    /// RGB変換後にJPEG圧縮した画像のBase64
    pub base64: String,
    pub vector: Vec<f32>,
}

pub struct Encoder {
    config: EncoderConfig,
    extractor: Arc<dyn FeatureExtractor>,
    client: Client,
}

impl Encoder {
    pub fn new(
        config: EncoderConfig,
        extractor: Arc<dyn FeatureExtractor>,
        timeout: Duration,
    ) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StyleFinderError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;

        Ok(Self {
            config,
            extractor,
            client,
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.extractor.name()
    }

    pub fn fingerprint(&self) -> String {
        self.config.fingerprint(self.extractor.identity())
    }

    /// 取得元の画像をエンコード
    pub fn try_encode(&self, source: &ImageSource) -> Result<Encoding> {
        let bytes = source.read_bytes(&self.client)?;
        self.try_encode_bytes(&bytes)
    }

    /// 取得元の画像をエンコード（失敗時は `None`）
    ///
    /// 取得・デコード・推論のいずれかで失敗した場合はログに出力して `None` を返す。
    pub fn encode(&self, source: &ImageSource) -> Option<Encoding> {
        match self.try_encode(source) {
            Ok(encoding) => Some(encoding),
            Err(e) => {
                tracing::error!(source = %source, error = %e, "image encoding failed");
                None
            }
        }
    }

    /// メモリ上の画像（アップロード等）をエンコード
    pub fn try_encode_bytes(&self, bytes: &[u8]) -> Result<Encoding> {
        let rgb = decode_rgb(bytes)?;
        let base64 = jpeg_base64(&rgb, self.config.jpeg_quality)?;
        let vector = self.embed(&rgb)?;
        Ok(Encoding { base64, vector })
    }

    pub fn encode_bytes(&self, bytes: &[u8]) -> Option<Encoding> {
        match self.try_encode_bytes(bytes) {
            Ok(encoding) => Some(encoding),
            Err(e) => {
                tracing::error!(bytes = bytes.len(), error = %e, "image encoding failed");
                None
            }
        }
    }

    /// ベクトルのみを計算（Base64は作らない）
    pub fn embed_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let rgb = decode_rgb(bytes)?;
        self.embed(&rgb)
    }

    fn embed(&self, rgb: &RgbImage) -> Result<Vec<f32>> {
        let pixels = preprocess(rgb, &self.config);
        let vector = self.extractor.extract(pixels)?;

        if vector.is_empty() {
            return Err(StyleFinderError::Inference("モデルの出力が空です".into()));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(StyleFinderError::Inference("モデルの出力に非有限値が含まれています".into()));
        }
        Ok(vector)
    }
}

/// デコードしてRGBに変換（アルファ除去・グレースケール展開）
fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| StyleFinderError::ImageDecode(e.to_string()))?;
    Ok(image.to_rgb8())
}

fn jpeg_base64(rgb: &RgbImage, quality: u8) -> Result<String> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| StyleFinderError::ImageEncode(e.to_string()))?;
    Ok(STANDARD.encode(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// チャンネル平均を返すだけの抽出器
    struct ChannelMean;

    impl FeatureExtractor for ChannelMean {
        fn name(&self) -> &str {
            "channel-mean"
        }

        fn identity(&self) -> &str {
            "channel-mean"
        }

        fn extract(&self, pixels: Array4<f32>) -> Result<Vec<f32>> {
            Ok((0..3)
                .map(|c| pixels.index_axis(ndarray::Axis(1), c).mean().unwrap_or(0.0))
                .collect())
        }
    }

    struct Broken;

    impl FeatureExtractor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn identity(&self) -> &str {
            "broken"
        }

        fn extract(&self, _pixels: Array4<f32>) -> Result<Vec<f32>> {
            Ok(vec![1.0, f32::NAN])
        }
    }

    fn encoder(extractor: Arc<dyn FeatureExtractor>) -> Encoder {
        let config = EncoderConfig {
            width: 16,
            height: 16,
            ..EncoderConfig::default()
        };
        Encoder::new(config, extractor, Duration::from_secs(5)).unwrap()
    }

    fn png_bytes(image: RgbaImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_encode_bytes_rgba_input() {
        let bytes = png_bytes(RgbaImage::from_pixel(40, 30, Rgba([200, 100, 50, 128])));
        let encoding = encoder(Arc::new(ChannelMean)).try_encode_bytes(&bytes).unwrap();

        assert_eq!(encoding.vector.len(), 3);
        // Base64はJPEGとしてデコードできる
        let jpeg = STANDARD.decode(&encoding.base64).unwrap();
        let format = image::guess_format(&jpeg).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn test_encode_bytes_is_deterministic() {
        let bytes = png_bytes(RgbaImage::from_fn(25, 25, |x, y| {
            Rgba([(x * 10) as u8, (y * 10) as u8, 77, 255])
        }));
        let encoder = encoder(Arc::new(ChannelMean));

        let first = encoder.try_encode_bytes(&bytes).unwrap();
        let second = encoder.try_encode_bytes(&bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_bytes_is_decode_error() {
        let encoder = encoder(Arc::new(ChannelMean));
        let err = encoder.try_encode_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, StyleFinderError::ImageDecode(_)));
        assert!(encoder.encode_bytes(b"not an image").is_none());
    }

    #[test]
    fn test_non_finite_output_is_rejected() {
        let bytes = png_bytes(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        let encoder = encoder(Arc::new(Broken));

        let err = encoder.try_encode_bytes(&bytes).unwrap_err();
        assert!(matches!(err, StyleFinderError::Inference(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EncoderConfig {
            width: 0,
            ..EncoderConfig::default()
        };
        let result = Encoder::new(config, Arc::new(ChannelMean), Duration::from_secs(1));
        assert!(matches!(result, Err(StyleFinderError::Config(_))));
    }

    #[test]
    fn test_fingerprint_tracks_vector_settings() {
        let base = EncoderConfig::default();
        let resized = EncoderConfig {
            width: 256,
            ..EncoderConfig::default()
        };
        let requality = EncoderConfig {
            jpeg_quality: 95,
            ..EncoderConfig::default()
        };

        assert_eq!(base.fingerprint("resnet50"), base.fingerprint("resnet50"));
        assert_ne!(base.fingerprint("resnet50"), base.fingerprint("resnet18"));
        assert_ne!(base.fingerprint("resnet50"), resized.fingerprint("resnet50"));
        assert_eq!(base.fingerprint("resnet50"), requality.fingerprint("resnet50"));
    }
}
