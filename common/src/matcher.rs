//! 最近傍照合モジュール
//!
//! クエリベクトルとカタログの全ベクトルを総当たりで比較し、
//! コサイン類似度が最大の行を返す。

use crate::error::{Error, Result};
use crate::similarity::cosine_unchecked;
use crate::types::{Catalog, Match};
use rayon::prelude::*;
use std::cmp::Ordering;

/// ベクトルを持つ行だけを (カタログ位置, ベクトル) で集める
///
/// 次元数がクエリと異なる行が1つでもあれば照合全体を失敗させる。
fn candidates<'a>(query: &[f32], catalog: &'a Catalog) -> Result<Vec<(usize, &'a [f32])>> {
    if query.is_empty() {
        return Err(Error::EmptyQuery);
    }

    let mut rows = Vec::with_capacity(catalog.len());
    for (index, entry) in catalog.entries().iter().enumerate() {
        let Some(embedding) = entry.embedding.as_deref() else {
            continue;
        };
        if embedding.len() != query.len() {
            return Err(Error::DimensionMismatch {
                index,
                expected: query.len(),
                found: embedding.len(),
            });
        }
        rows.push((index, embedding));
    }

    if rows.is_empty() {
        return Err(Error::NoCandidates);
    }
    Ok(rows)
}

/// 全候補の類似度を一括計算（カタログ順を保持）
fn score_all(query: &[f32], rows: &[(usize, &[f32])]) -> Result<Vec<(usize, f32)>> {
    let scores: Vec<(usize, f32)> = rows
        .par_iter()
        .map(|&(index, embedding)| (index, cosine_unchecked(query, embedding)))
        .collect();

    if let Some(&(index, _)) = scores.iter().find(|(_, score)| score.is_nan()) {
        return Err(Error::NonFiniteScore { index });
    }
    Ok(scores)
}

/// 最も類似したカタログ行を探す
///
/// 同点の場合はカタログ位置が小さい行を優先する。
///
/// # Errors
/// * `EmptyQuery` - クエリが空
/// * `NoCandidates` - ベクトルを持つ行がない
/// * `DimensionMismatch` - 次元数が一致しない行がある
/// * `NonFiniteScore` - 類似度がNaNになった
pub fn try_find_closest<'a>(query: &[f32], catalog: &'a Catalog) -> Result<Match<'a>> {
    let rows = candidates(query, catalog)?;
    let scores = score_all(query, &rows)?;

    let (mut best_index, mut best_score) = scores[0];
    for &(index, score) in &scores[1..] {
        if score > best_score {
            best_index = index;
            best_score = score;
        }
    }

    Ok(Match {
        index: best_index,
        entry: &catalog.entries()[best_index],
        score: best_score,
    })
}

/// 最も類似したカタログ行を探す（失敗時は `None`）
///
/// エラーはログに出力し、呼び出し側には伝播しない。
/// `None` が「照合結果なし」の完全なシグナルとなる。
pub fn find_closest<'a>(query: &[f32], catalog: &'a Catalog) -> Option<Match<'a>> {
    match try_find_closest(query, catalog) {
        Ok(found) => Some(found),
        Err(e) => {
            tracing::error!(
                error = %e,
                catalog_rows = catalog.len(),
                query_dims = query.len(),
                "closest match lookup failed"
            );
            None
        }
    }
}

/// 類似度の高い順に上位k件を返す
///
/// 同点はカタログ位置の昇順。`k = 0` の場合は空。
pub fn rank<'a>(query: &[f32], catalog: &'a Catalog, k: usize) -> Result<Vec<Match<'a>>> {
    let rows = candidates(query, catalog)?;
    let mut scores = score_all(query, &rows)?;

    scores.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scores.truncate(k);

    Ok(scores
        .into_iter()
        .map(|(index, score)| Match {
            index,
            entry: &catalog.entries()[index],
            score,
        })
        .collect())
}
