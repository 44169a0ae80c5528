use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::model::{Hit, HitPair};

/// One line of a GNN output CSV.
#[derive(Debug, Clone, Copy, Deserialize)]
struct PredictionRow {
    hit_index_1: i64,
    hit_index_2: i64,
    score: f64,
    truth: f64,
}

/// Candidate edges with their predicted score and ground-truth label,
/// aligned index by index.
#[derive(Debug, Clone, Default)]
pub struct PredictionSet {
    pub pairs: Vec<HitPair>,
    pub scores: Vec<f64>,
    pub truth: Vec<f64>,
    /// Rows whose indices did not resolve against the hit table.
    pub dropped: usize,
}

impl PredictionSet {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Keep only the rows at `indices`, preserving alignment.
    pub fn select(&self, indices: &[usize]) -> Self {
        PredictionSet {
            pairs: indices.iter().map(|&i| self.pairs[i]).collect(),
            scores: indices.iter().map(|&i| self.scores[i]).collect(),
            truth: indices.iter().map(|&i| self.truth[i]).collect(),
            dropped: self.dropped,
        }
    }
}

/// Read a CSV with columns `hit_index_1, hit_index_2, score, truth` and join
/// every row against `hits` by position.
pub fn load_predictions(path: &Path, hits: &[Hit]) -> Result<PredictionSet> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening predictions {}", path.display()))?;

    let mut set = PredictionSet::default();
    for (row_no, result) in reader.deserialize::<PredictionRow>().enumerate() {
        let row = result.with_context(|| format!("predictions row {row_no}"))?;
        match HitPair::resolve(hits, row.hit_index_1, row.hit_index_2) {
            Some(pair) => {
                set.pairs.push(pair);
                set.scores.push(row.score);
                set.truth.push(row.truth);
            }
            None => set.dropped += 1,
        }
    }

    if set.dropped > 0 {
        log::warn!(
            "{}: dropped {} prediction rows referencing missing hits",
            path.display(),
            set.dropped
        );
    }
    log::info!("Loaded {} predicted edges from {}", set.len(), path.display());
    Ok(set)
}
