use std::collections::BTreeSet;

use super::model::{Hit, HitPair};

// ---------------------------------------------------------------------------
// Layer selection
// ---------------------------------------------------------------------------

/// Which detector layers to keep. An empty set means "no filter" (keep all).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSelection {
    layers: BTreeSet<i64>,
}

impl LayerSelection {
    pub fn new(layers: impl IntoIterator<Item = i64>) -> Self {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, layer_id: i64) -> bool {
        self.is_all() || self.layers.contains(&layer_id)
    }

    /// Hits on selected layers, in table order.
    pub fn filter_hits(&self, hits: &[Hit]) -> Vec<Hit> {
        hits.iter()
            .filter(|h| self.contains(h.layer_id))
            .copied()
            .collect()
    }

    /// Pairs whose two endpoints are both on selected layers.
    pub fn filter_pairs(&self, pairs: &[HitPair]) -> Vec<HitPair> {
        pairs
            .iter()
            .filter(|p| self.contains(p.hit_1.layer_id) && self.contains(p.hit_2.layer_id))
            .copied()
            .collect()
    }

    /// Keep the indices `i` of `pairs` whose endpoints are both selected.
    ///
    /// Used to keep per-edge score and truth sequences aligned with a
    /// filtered pair list.
    pub fn kept_pair_indices(&self, pairs: &[HitPair]) -> Vec<usize> {
        pairs
            .iter()
            .enumerate()
            .filter(|(_, p)| self.contains(p.hit_1.layer_id) && self.contains(p.hit_2.layer_id))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits() -> Vec<Hit> {
        [(1, 0), (2, 1), (3, 2), (4, 1)]
            .iter()
            .map(|&(id, layer)| Hit::from_cylindrical(0, id, layer, [layer as f64 + 1.0, 0.0, 0.0]))
            .collect()
    }

    #[test]
    fn empty_selection_keeps_everything() {
        let sel = LayerSelection::new(Vec::new());
        assert!(sel.is_all());
        assert_eq!(sel.filter_hits(&hits()).len(), 4);
    }

    #[test]
    fn filters_hits_by_layer() {
        let sel = LayerSelection::new([1]);
        let ids: Vec<i64> = sel.filter_hits(&hits()).iter().map(|h| h.hit_id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn pairs_need_both_endpoints_selected() {
        let hits = hits();
        let pairs: Vec<HitPair> = [(0, 1), (1, 3), (2, 3)]
            .iter()
            .filter_map(|&(a, b)| HitPair::resolve(&hits, a, b))
            .collect();

        let sel = LayerSelection::new([1, 2]);
        let kept = sel.filter_pairs(&pairs);
        assert_eq!(kept.len(), 2);
        assert_eq!(sel.kept_pair_indices(&pairs), vec![1, 2]);
    }
}
