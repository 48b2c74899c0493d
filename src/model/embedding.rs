//! Face embedding vectors and nearest-neighbour matching.
//!
//! Embeddings are produced by a pretrained recognition model on the client;
//! the server only ever sees the numeric vector. Matching is a brute-force
//! linear scan over every stored embedding, which is fine at the scale of a
//! single election but has no indexing structure beyond that.

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Dimensionality of the vectors the recognition model produces.
pub const EMBEDDING_DIM: usize = 128;

/// A face embedding: a fixed-length vector summarising a face image, such
/// that images of the same person land close together under Euclidean
/// distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean distance to another embedding.
    ///
    /// Vectors of different lengths are incomparable and get an infinite
    /// distance, so they can never fall under any matching threshold.
    pub fn distance(&self, other: &Embedding) -> f64 {
        if self.0.len() != other.0.len() {
            return f64::INFINITY;
        }
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Scan a gallery of stored embeddings and return the ID of the closest
    /// one strictly under `threshold`, or `None` if nothing is close enough.
    ///
    /// The whole gallery is always scanned so the global minimum wins, not
    /// merely the first entry under the threshold. Ties keep the first
    /// entry encountered in iteration order.
    pub fn closest_match<'a, I>(&self, gallery: I, threshold: f64) -> Option<Id>
    where
        I: IntoIterator<Item = (Id, &'a Embedding)>,
    {
        let mut best: Option<(Id, f64)> = None;
        for (id, stored) in gallery {
            let dist = self.distance(stored);
            if best.map_or(true, |(_, best_dist)| dist < best_dist) {
                best = Some((id, dist));
            }
        }
        best.filter(|&(_, dist)| dist < threshold).map(|(id, _)| id)
    }
}

impl From<Vec<f64>> for Embedding {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}
