use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::model::{Event, Hit, HitPair};

const HIT_COLUMNS: [&str; 10] = [
    "evtid", "hit_id", "layer_id", "r", "phi", "z", "x", "y", "theta", "eta",
];

/// Write the hit, particle and true-edge tables of `event` as CSV files in
/// `dir`. Returns the written paths.
pub fn export_event(event: &Event, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let hits_path = dir.join("hits.csv");
    let mut writer = csv::Writer::from_path(&hits_path).context("creating hits.csv")?;
    for hit in &event.hits {
        writer.serialize(hit).context("writing hit row")?;
    }
    writer.flush()?;

    let particles_path = dir.join("particles.csv");
    let mut writer = csv::Writer::from_path(&particles_path).context("creating particles.csv")?;
    for label in &event.particles {
        writer.serialize(label).context("writing particle row")?;
    }
    writer.flush()?;

    let truth_path = dir.join("truth.csv");
    write_pairs(&truth_path, &event.truth)?;

    log::info!("Exported event {} tables to {}", event.id, dir.display());
    Ok(vec![hits_path, particles_path, truth_path])
}

/// Pair rows: both indices, then every hit column suffixed `_1` and `_2`.
fn write_pairs(path: &Path, pairs: &[HitPair]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec!["hit_index_1".to_string(), "hit_index_2".to_string()];
    for suffix in ["_1", "_2"] {
        header.extend(HIT_COLUMNS.iter().map(|c| format!("{c}{suffix}")));
    }
    writer.write_record(&header)?;

    for pair in pairs {
        let mut record = vec![pair.hit_index_1.to_string(), pair.hit_index_2.to_string()];
        record.extend(hit_fields(&pair.hit_1));
        record.extend(hit_fields(&pair.hit_2));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn hit_fields(hit: &Hit) -> [String; 10] {
    [
        hit.evtid.to_string(),
        hit.hit_id.to_string(),
        hit.layer_id.to_string(),
        hit.r.to_string(),
        hit.phi.to_string(),
        hit.z.to_string(),
        hit.x.to_string(),
        hit.y.to_string(),
        hit.theta.to_string(),
        hit.eta.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::data::event::build_event;
    use crate::data::model::RawEvent;

    #[test]
    fn writes_three_tables_with_suffixed_edge_columns() {
        let raw = RawEvent {
            hit_ids: vec![10, 11],
            positions: vec![[1.0, 0.0, 1.0], [2.0, 0.5, 2.0]],
            layers: vec![0, 1],
            particle_ids: vec![3, 3],
            true_edges: vec![[0, 1]],
        };
        let event = build_event(12, &raw).unwrap();
        let dir = tempdir().unwrap();

        let paths = export_event(&event, dir.path()).unwrap();
        assert_eq!(paths.len(), 3);

        let mut hits = csv::Reader::from_path(&paths[0]).unwrap();
        let hit_header: Vec<_> = hits.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(hit_header, HIT_COLUMNS);
        assert_eq!(hits.records().count(), 2);

        let mut truth = csv::Reader::from_path(&paths[2]).unwrap();
        let header = truth.headers().unwrap().clone();
        assert_eq!(header.len(), 2 + 2 * HIT_COLUMNS.len());
        for (i, column) in HIT_COLUMNS.iter().enumerate() {
            assert_eq!(header[2 + i], format!("{column}_1"));
            assert_eq!(header[2 + HIT_COLUMNS.len() + i], format!("{column}_2"));
        }
        let rows: Vec<_> = truth.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "0");
        assert_eq!(&rows[0][1], "1");
    }
}
