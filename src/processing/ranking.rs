//! Pair ranking by confidence and object size, fused with reciprocal rank
//! fusion (RRF)
//!
//! RRF only looks at positions, so the bounded confidence scale and the
//! resolution-dependent area scale never have to be reconciled. Pairs are keyed
//! by their stable id throughout; ties in the fused score fall back to id order.

use crate::core::constants::DEFAULT_RRF_K;
use crate::processing::pairing::ImagePair;
use crate::validation::error::{GeoResult, GeolocationError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fused position of one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPair {
    pub pair_id: usize,
    pub score: f64,
    /// 0-based position in the confidence ranking
    pub confidence_rank: usize,
    /// 0-based position in the size ranking
    pub size_rank: usize,
}

/// Two-signal ranker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankFuser {
    k: f64,
}

impl Default for RankFuser {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K }
    }
}

impl RankFuser {
    pub fn new(k: f64) -> GeoResult<Self> {
        if !(k > 0.0 && k.is_finite()) {
            return Err(GeolocationError::InvalidParameter {
                parameter: "rrf_k".to_string(),
                reason: format!("{} must be positive", k),
            });
        }
        Ok(Self { k })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Pair ids by descending average confidence
    pub fn rank_by_confidence(pairs: &[ImagePair]) -> Vec<usize> {
        let mut sorted: Vec<&ImagePair> = pairs.iter().collect();
        sorted.sort_by(|a, b| b.average_confidence.total_cmp(&a.average_confidence));
        sorted.into_iter().map(|p| p.id).collect()
    }

    /// Pair ids by descending combined box area
    pub fn rank_by_size(pairs: &[ImagePair]) -> Vec<usize> {
        let mut sorted: Vec<&ImagePair> = pairs.iter().collect();
        sorted.sort_by(|a, b| b.combined_box_area.total_cmp(&a.combined_box_area));
        sorted.into_iter().map(|p| p.id).collect()
    }

    /// Fused ordering, best pair first
    pub fn fuse(&self, pairs: &[ImagePair]) -> Vec<RankedPair> {
        let by_confidence = Self::rank_by_confidence(pairs);
        let by_size = Self::rank_by_size(pairs);

        let confidence_rank = positions(&by_confidence);
        let size_rank = positions(&by_size);

        let fused: Vec<RankedPair> = reciprocal_rank_fusion(&[by_confidence, by_size], self.k)
            .into_iter()
            .map(|(pair_id, score)| RankedPair {
                pair_id,
                score,
                confidence_rank: confidence_rank[&pair_id],
                size_rank: size_rank[&pair_id],
            })
            .collect();

        for (rank, entry) in fused.iter().enumerate() {
            debug!(
                "Rank {}: pair {} (score {:.6}, confidence #{}, size #{})",
                rank, entry.pair_id, entry.score, entry.confidence_rank, entry.size_rank
            );
        }
        fused
    }
}

fn positions(ranking: &[usize]) -> BTreeMap<usize, usize> {
    let mut map = BTreeMap::new();
    for (rank, &id) in ranking.iter().enumerate() {
        // duplicate ids keep their best rank
        map.entry(id).or_insert(rank);
    }
    map
}

/// Reciprocal rank fusion over any number of rankings of item ids
///
/// Each item scores `sum(1 / (k + rank))` over the rankings it appears in,
/// with 0-based ranks. Items appearing in no ranking are not returned. Output
/// is sorted by descending score, ties by ascending id.
pub fn reciprocal_rank_fusion(rankings: &[Vec<usize>], k: f64) -> Vec<(usize, f64)> {
    let mut scores: BTreeMap<usize, f64> = BTreeMap::new();
    for ranking in rankings {
        for (id, rank) in positions(ranking) {
            *scores.entry(id).or_insert(0.0) += 1.0 / (k + rank as f64);
        }
    }

    let mut fused: Vec<(usize, f64)> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    fused
}
