//! ONNX Runtime による特徴抽出

use super::FeatureExtractor;
use crate::error::{Result, StyleFinderError};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

/// 学習済みモデル（ResNet50等）をONNXで読み込んだ特徴抽出器
///
/// セッションは起動時に1回だけ読み込み、以降は再読み込みしない。
/// 実行には排他アクセスが必要なためMutexで直列化する。
pub struct OnnxExtractor {
    name: String,
    /// ファイル名 + 重みのSHA-256
    identity: String,
    session: Mutex<Session>,
}

fn inference_error(e: impl std::fmt::Display) -> StyleFinderError {
    StyleFinderError::Inference(e.to_string())
}

/// モデルファイルのSHA-256（hex）
///
/// 同じファイル名でも重みが違えば別の値になる。
pub(crate) fn model_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|source| StyleFinderError::FileOpen {
        path: path.display().to_string(),
        source,
    })?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

impl OnnxExtractor {
    pub fn load(path: &Path, intra_threads: usize) -> Result<Self> {
        if !path.is_file() {
            return Err(StyleFinderError::ModelNotFound(path.display().to_string()));
        }

        tracing::debug!(path = %path.display(), "loading ONNX model");

        let session = Session::builder()
            .map_err(inference_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(inference_error)?
            .with_intra_threads(intra_threads.max(1))
            .map_err(inference_error)?
            .commit_from_file(path)
            .map_err(|e| StyleFinderError::Inference(format!("モデルの読み込みに失敗: {}", e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let digest = model_digest(path)?;
        let identity = format!("{}:{}", name, digest);

        tracing::info!(model = %name, sha256 = %digest, "ONNX model loaded");

        Ok(Self {
            name,
            identity,
            session: Mutex::new(session),
        })
    }
}

impl FeatureExtractor for OnnxExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    fn extract(&self, pixels: Array4<f32>) -> Result<Vec<f32>> {
        let input = Tensor::from_array(pixels).map_err(inference_error)?;

        let mut session = self.session.lock();

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".into());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output".into());

        let outputs = session
            .run(ort::inputs![input_name => input])
            .map_err(inference_error)?;

        let output = outputs.get(&output_name).ok_or_else(|| {
            StyleFinderError::Inference(format!("出力 '{}' がありません", output_name))
        })?;

        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?;

        Ok(data.to_vec())
    }
}
