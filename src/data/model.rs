use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

// ---------------------------------------------------------------------------
// RawEvent – the arrays of one serialized record, before any derivation
// ---------------------------------------------------------------------------

/// Arrays exactly as stored in an event record.
///
/// Nothing here is validated; lengths are checked when the tables are built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvent {
    /// Hit identifiers (`hid`).
    pub hit_ids: Vec<i64>,
    /// Cylindrical positions `[r, phi, z]`, one per hit (`x`).
    pub positions: Vec<[f64; 3]>,
    /// Layer index of every hit (`layers`).
    pub layers: Vec<i64>,
    /// Particle that produced every hit (`pid`).
    pub particle_ids: Vec<i64>,
    /// Ground-truth edges as `(index, index)` into the hit arrays.
    pub true_edges: Vec<[i64; 2]>,
}

// ---------------------------------------------------------------------------
// Hit – one row of the hit table
// ---------------------------------------------------------------------------

/// A single detector measurement with its derived coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hit {
    pub evtid: u64,
    pub hit_id: i64,
    pub layer_id: i64,
    pub r: f64,
    pub phi: f64,
    pub z: f64,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub eta: f64,
}

impl Hit {
    /// Build a hit from its cylindrical position `[r, phi, z]`.
    ///
    /// `eta` is not finite on the forward beam axis (theta of 0).
    pub fn from_cylindrical(evtid: u64, hit_id: i64, layer_id: i64, position: [f64; 3]) -> Self {
        let [r, phi, z] = position;
        let theta = r.atan2(z);
        Hit {
            evtid,
            hit_id,
            layer_id,
            r,
            phi,
            z,
            x: r * phi.cos(),
            y: r * phi.sin(),
            theta,
            eta: pseudorapidity(theta),
        }
    }

    pub fn xyz(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// `eta = -ln(tan(theta / 2))`.
pub fn pseudorapidity(theta: f64) -> f64 {
    -(theta / 2.0).tan().ln()
}

// ---------------------------------------------------------------------------
// ParticleLabel – hit → particle lookup row
// ---------------------------------------------------------------------------

/// Particle id is what the tracker tries to recover, so it lives apart from
/// the hit features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParticleLabel {
    pub hit_id: i64,
    pub particle_id: i64,
}

// ---------------------------------------------------------------------------
// HitPair – an edge with both endpoints resolved against the hit table
// ---------------------------------------------------------------------------

/// Two hits joined by positional index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPair {
    pub hit_index_1: usize,
    pub hit_index_2: usize,
    pub hit_1: Hit,
    pub hit_2: Hit,
}

impl HitPair {
    /// Resolve an `(index, index)` edge. `None` when either side is out of range.
    pub fn resolve(hits: &[Hit], index_1: i64, index_2: i64) -> Option<Self> {
        let hit_index_1 = usize::try_from(index_1).ok()?;
        let hit_index_2 = usize::try_from(index_2).ok()?;
        Some(HitPair {
            hit_index_1,
            hit_index_2,
            hit_1: *hits.get(hit_index_1)?,
            hit_2: *hits.get(hit_index_2)?,
        })
    }

    pub fn segment_3d(&self) -> [[f64; 3]; 2] {
        [self.hit_1.xyz(), self.hit_2.xyz()]
    }
}

// ---------------------------------------------------------------------------
// Event – the three tables derived from one record
// ---------------------------------------------------------------------------

/// Hit, particle and true-edge tables of one event.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: u64,
    pub hits: Vec<Hit>,
    pub particles: Vec<ParticleLabel>,
    pub truth: Vec<HitPair>,
    /// Raw true edges that referenced a missing hit and were left out of `truth`.
    pub dropped_edges: usize,
}

impl Event {
    /// Sorted set of layer ids present in the hit table.
    pub fn layers(&self) -> BTreeSet<i64> {
        self.hits.iter().map(|h| h.layer_id).collect()
    }

    /// Number of distinct particles.
    pub fn particle_count(&self) -> usize {
        self.particles
            .iter()
            .map(|p| p.particle_id)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Group hits by layer id, keeping table order inside each layer.
pub fn hits_by_layer(hits: &[Hit]) -> BTreeMap<i64, Vec<&Hit>> {
    let mut groups: BTreeMap<i64, Vec<&Hit>> = BTreeMap::new();
    for hit in hits {
        groups.entry(hit.layer_id).or_default().push(hit);
    }
    groups
}
