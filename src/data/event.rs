use super::loader::LoadError;
use super::model::{Event, Hit, HitPair, ParticleLabel, RawEvent};

// ---------------------------------------------------------------------------
// Table construction
// ---------------------------------------------------------------------------

/// Derive the hit, particle and true-edge tables from one raw record.
pub fn build_event(event_id: u64, raw: &RawEvent) -> Result<Event, LoadError> {
    let hits = construct_hits(event_id, &raw.hit_ids, &raw.layers, &raw.positions)?;
    let particles = construct_particles(&raw.hit_ids, &raw.particle_ids)?;
    let joined = join_edges(&hits, &raw.true_edges);

    if joined.dropped > 0 {
        log::warn!(
            "event {event_id}: dropped {} of {} true edges referencing missing hits",
            joined.dropped,
            raw.true_edges.len()
        );
    }

    Ok(Event {
        id: event_id,
        hits,
        particles,
        truth: joined.pairs,
        dropped_edges: joined.dropped,
    })
}

/// One row per hit with Cartesian and eta-phi coordinates attached.
pub fn construct_hits(
    event_id: u64,
    hit_ids: &[i64],
    layers: &[i64],
    positions: &[[f64; 3]],
) -> Result<Vec<Hit>, LoadError> {
    expect_len("layers", hit_ids.len(), layers.len())?;
    expect_len("positions", hit_ids.len(), positions.len())?;

    Ok(hit_ids
        .iter()
        .zip(layers)
        .zip(positions)
        .map(|((&hit_id, &layer_id), &position)| {
            Hit::from_cylindrical(event_id, hit_id, layer_id, position)
        })
        .collect())
}

/// Hit id → particle id lookup rows.
pub fn construct_particles(
    hit_ids: &[i64],
    particle_ids: &[i64],
) -> Result<Vec<ParticleLabel>, LoadError> {
    expect_len("particle ids", hit_ids.len(), particle_ids.len())?;

    Ok(hit_ids
        .iter()
        .zip(particle_ids)
        .map(|(&hit_id, &particle_id)| ParticleLabel {
            hit_id,
            particle_id,
        })
        .collect())
}

fn expect_len(field: &'static str, expected: usize, actual: usize) -> Result<(), LoadError> {
    if expected != actual {
        return Err(LoadError::Shape {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Edge join
// ---------------------------------------------------------------------------

/// Result of joining raw edges against the hit table.
#[derive(Debug, Clone, Default)]
pub struct EdgeJoin {
    /// Edges whose endpoints both resolved, in input order.
    pub pairs: Vec<HitPair>,
    /// Edges left out because an index was negative or past the last hit.
    pub dropped: usize,
}

/// Inner-join every `(index, index)` edge against `hits` by position.
pub fn join_edges(hits: &[Hit], edges: &[[i64; 2]]) -> EdgeJoin {
    let mut joined = EdgeJoin {
        pairs: Vec::with_capacity(edges.len()),
        dropped: 0,
    };
    for &[a, b] in edges {
        match HitPair::resolve(hits, a, b) {
            Some(pair) => joined.pairs.push(pair),
            None => joined.dropped += 1,
        }
    }
    joined
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn two_hit_event(edges: Vec<[i64; 2]>) -> RawEvent {
        RawEvent {
            hit_ids: vec![100, 101],
            positions: vec![[1.0, 0.0, 1.0], [1.0, FRAC_PI_2, 1.0]],
            layers: vec![0, 1],
            particle_ids: vec![7, 7],
            true_edges: edges,
        }
    }

    #[test]
    fn single_edge_joins_both_endpoints() {
        let event = build_event(540, &two_hit_event(vec![[0, 1]])).unwrap();

        assert_eq!(event.hits.len(), 2);
        assert_eq!(event.truth.len(), 1);
        assert_eq!(event.dropped_edges, 0);

        let pair = &event.truth[0];
        assert_eq!(pair.hit_1.hit_id, 100);
        assert_eq!(pair.hit_2.hit_id, 101);
        assert_eq!(pair.hit_2.layer_id, 1);
        assert_abs_diff_eq!(pair.hit_1.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pair.hit_2.y, 1.0, epsilon = 1e-12);
        assert_eq!(pair.hit_1.evtid, 540);
    }

    #[test]
    fn out_of_range_edge_is_dropped() {
        let event = build_event(1, &two_hit_event(vec![[0, 5]])).unwrap();
        assert!(event.truth.is_empty());
        assert_eq!(event.dropped_edges, 1);
    }

    #[test]
    fn join_never_exceeds_raw_count() {
        let hits = construct_hits(
            0,
            &[1, 2, 3],
            &[0, 1, 2],
            &[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]],
        )
        .unwrap();
        let edges = [[0, 1], [1, 2], [2, 3], [-1, 0], [2, 0], [1, 1]];
        let joined = join_edges(&hits, &edges);

        assert_eq!(joined.pairs.len() + joined.dropped, edges.len());
        assert_eq!(joined.pairs.len(), 4);
        let kept: Vec<(usize, usize)> = joined
            .pairs
            .iter()
            .map(|p| (p.hit_index_1, p.hit_index_2))
            .collect();
        assert_eq!(kept, vec![(0, 1), (1, 2), (2, 0), (1, 1)]);
    }

    #[test]
    fn all_in_range_keeps_every_edge() {
        let raw = two_hit_event(vec![[0, 1], [1, 0], [0, 0]]);
        let event = build_event(2, &raw).unwrap();
        assert_eq!(event.truth.len(), raw.true_edges.len());
    }

    #[test]
    fn particle_table_copies_ids() {
        let particles = construct_particles(&[4, 5, 6], &[9, 9, 12]).unwrap();
        assert_eq!(
            particles,
            vec![
                ParticleLabel { hit_id: 4, particle_id: 9 },
                ParticleLabel { hit_id: 5, particle_id: 9 },
                ParticleLabel { hit_id: 6, particle_id: 12 },
            ]
        );
    }

    #[test]
    fn mismatched_lengths_fail_construction() {
        let mut raw = two_hit_event(vec![]);
        raw.layers.pop();
        let err = build_event(0, &raw).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Shape { field: "layers", expected: 2, actual: 1 }
        ));

        let mut raw = two_hit_event(vec![]);
        raw.particle_ids.push(8);
        assert!(matches!(
            build_event(0, &raw),
            Err(LoadError::Shape { field: "particle ids", .. })
        ));
    }
}
