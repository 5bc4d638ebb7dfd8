//! コサイン類似度

use crate::error::{Error, Result};

/// 2つのベクトルのコサイン類似度を計算
///
/// `(a·b) / (‖a‖·‖b‖)`。どちらかのノルムが0の場合は0を返す。
/// 累積はf64で行い、結果は[-1, 1]に丸める。
///
/// # Errors
/// 長さが異なる場合は `Error::DimensionMismatch`（`index` は0）
///
/// # Examples
/// ```
/// use style_finder_common::cosine_similarity;
///
/// let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
/// assert_eq!(score, 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            index: 0,
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(cosine_unchecked(a, b))
}

/// 長さチェック済みのベクトル同士の類似度
pub(crate) fn cosine_unchecked(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    if cos.is_nan() {
        return f32::NAN;
    }
    cos.clamp(-1.0, 1.0) as f32
}
