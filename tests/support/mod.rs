//! テスト用の特徴抽出器と画像生成

#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use ndarray::{Array4, Axis};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use style_finder::{Encoder, EncoderConfig, FeatureExtractor, Result};

/// チャンネルごとの平均値を3次元ベクトルとして返す
#[derive(Default)]
pub struct ChannelMean {
    calls: AtomicUsize,
}

impl ChannelMean {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeatureExtractor for ChannelMean {
    fn name(&self) -> &str {
        "channel-mean"
    }

    fn identity(&self) -> &str {
        "channel-mean:v1"
    }

    fn extract(&self, pixels: Array4<f32>) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..3)
            .map(|c| pixels.index_axis(Axis(1), c).mean().unwrap_or(0.0))
            .collect())
    }
}

/// ファイル名は同じで重みだけ異なるモデルの代用
pub struct Weights {
    identity: String,
    output: Vec<f32>,
    calls: AtomicUsize,
}

impl Weights {
    pub fn new(identity: &str, output: Vec<f32>) -> Self {
        Self {
            identity: identity.to_string(),
            output,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeatureExtractor for Weights {
    fn name(&self) -> &str {
        "model.onnx"
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    fn extract(&self, _pixels: Array4<f32>) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

pub fn small_config() -> EncoderConfig {
    EncoderConfig {
        width: 32,
        height: 32,
        ..EncoderConfig::default()
    }
}

pub fn encoder_with(extractor: Arc<ChannelMean>) -> Encoder {
    let config = EncoderConfig {
        width: 32,
        height: 32,
        ..EncoderConfig::default()
    };
    Encoder::new(config, extractor, Duration::from_secs(5)).expect("encoder")
}

pub fn encoder() -> Encoder {
    encoder_with(Arc::new(ChannelMean::default()))
}

pub fn solid_png(color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(48, 36, Rgb(color));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).expect("png");
    buffer.into_inner()
}

pub fn write_png(dir: &Path, name: &str, color: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, solid_png(color)).expect("write png");
    path
}
