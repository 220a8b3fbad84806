//! Directed interaction matrix and target selection

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{ensure_finite, Result, SimError};
use crate::core::math::signed_to_weight01;

/// Total targeting weight below which a row counts as empty
const MIN_ROW_WEIGHT: f64 = 1e-12;

/// Square signed matrix W; `W[i][j]` is i's disposition toward j
///
/// -1 is maximal rivalry, +1 maximal alignment. Values are kept in [-1, 1]
/// and the diagonal is always 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<f64>>", try_from = "Vec<Vec<f64>>")]
pub struct InteractionMatrix {
    size: usize,
    values: Vec<f64>,
}

impl From<InteractionMatrix> for Vec<Vec<f64>> {
    fn from(matrix: InteractionMatrix) -> Self {
        matrix.values.chunks(matrix.size.max(1)).map(<[f64]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for InteractionMatrix {
    type Error = SimError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(&rows, rows.len())
    }
}

impl InteractionMatrix {
    /// All-neutral matrix
    pub fn neutral(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Validate shape and finiteness, clip into [-1, 1] and zero the diagonal
    pub fn new(rows: &[Vec<f64>], size: usize) -> Result<Self> {
        if rows.len() != size {
            return Err(SimError::MatrixShape {
                expected: size,
                rows: rows.len(),
                row: rows.len().min(size),
                len: rows.first().map_or(0, Vec::len),
            });
        }

        let mut values = Vec::with_capacity(size * size);
        let mut adjusted = 0usize;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(SimError::MatrixShape {
                    expected: size,
                    rows: rows.len(),
                    row: i,
                    len: row.len(),
                });
            }
            for (j, &w) in row.iter().enumerate() {
                ensure_finite(&format!("interaction[{i}][{j}]"), w)?;
                let clean = if i == j { 0.0 } else { w.clamp(-1.0, 1.0) };
                if clean != w {
                    adjusted += 1;
                }
                values.push(clean);
            }
        }

        if adjusted > 0 {
            tracing::warn!(adjusted, "interaction matrix clipped into [-1, 1] with zero diagonal");
        }

        Ok(Self { size, values })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// Non-negative targeting weights of row `i`, self excluded
    pub fn targeting_weights(&self, i: usize) -> Vec<f64> {
        self.row(i)
            .iter()
            .enumerate()
            .map(|(j, &w)| if j == i { 0.0 } else { signed_to_weight01(w) })
            .collect()
    }

    /// Draw the target of agent `i` proportionally to its targeting weights
    ///
    /// Falls back to a uniform draw among the other agents when the row has
    /// no weight. Returns `None` only if there is no other agent.
    pub fn pick_target<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> Option<usize> {
        if self.size < 2 || i >= self.size {
            return None;
        }
        let weights = self.targeting_weights(i);
        let total: f64 = weights.iter().sum();
        if total > MIN_ROW_WEIGHT {
            if let Ok(dist) = WeightedIndex::new(&weights) {
                return Some(dist.sample(rng));
            }
        }

        tracing::trace!(agent = i, "empty targeting row, drawing uniformly");
        let k = rng.gen_range(0..self.size - 1);
        Some(if k >= i { k + 1 } else { k })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_clips_and_zeroes_diagonal() {
        let m = InteractionMatrix::new(&[vec![0.7, -3.0], vec![2.0, 0.0]], 2).unwrap();
        assert_eq!(m.get(0, 0), 0.0);
        assert_eq!(m.get(0, 1), -1.0);
        assert_eq!(m.get(1, 0), 1.0);
    }

    #[test]
    fn test_shape_mismatch_is_distinct_error() {
        let err = InteractionMatrix::new(&[vec![0.0, 1.0], vec![0.0]], 2).unwrap_err();
        assert!(matches!(err, SimError::MatrixShape { row: 1, len: 1, .. }));
        let err = InteractionMatrix::new(&[vec![0.0, 1.0]], 2).unwrap_err();
        assert!(matches!(err, SimError::MatrixShape { rows: 1, .. }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = InteractionMatrix::new(&[vec![0.0, f64::NAN], vec![0.0, 0.0]], 2).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn test_targeting_weights() {
        let m = InteractionMatrix::new(&[vec![0.0, -1.0, 1.0], vec![0.0; 3], vec![0.0; 3]], 3).unwrap();
        assert_eq!(m.targeting_weights(0), vec![0.0, 1.0, 0.0]);
        assert_eq!(m.targeting_weights(1), vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_fully_aligned_row_falls_back_to_uniform() {
        let m = InteractionMatrix::new(
            &[
                vec![0.0, 1.0, 1.0, 1.0],
                vec![1.0, 0.0, 1.0, 1.0],
                vec![1.0, 1.0, 0.0, 1.0],
                vec![1.0, 1.0, 1.0, 0.0],
            ],
            4,
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seen = [0usize; 4];
        for i in 0..4 {
            for _ in 0..2000 {
                let j = m.pick_target(i, &mut rng).unwrap();
                assert_ne!(j, i);
                assert!(j < 4);
                seen[j] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c > 0));
    }

    #[test]
    fn test_rival_is_always_targeted() {
        let m = InteractionMatrix::new(&[vec![0.0, -1.0, 1.0], vec![0.0; 3], vec![0.0; 3]], 3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            assert_eq!(m.pick_target(0, &mut rng), Some(1));
        }
    }

    #[test]
    fn test_single_agent_has_no_target() {
        let m = InteractionMatrix::neutral(1);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(m.pick_target(0, &mut rng), None);
    }

    #[test]
    fn test_serializes_as_nested_rows() {
        let m = InteractionMatrix::new(&[vec![0.0, -0.5], vec![0.25, 0.0]], 2).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[0.0,-0.5],[0.25,0.0]]");
        let back: InteractionMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
