use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float32Builder, Int64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Radii of the barrel layers, in mm.
const LAYER_RADII: [f64; 10] = [32.0, 72.0, 116.0, 172.0, 260.0, 360.0, 500.0, 660.0, 820.0, 1020.0];
const EVENTS: [u64; 3] = [540, 1095, 4332];
const OUTPUT_DIR: &str = "sample_dataset";

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Columns of one event record.
#[derive(Default)]
struct SyntheticEvent {
    hid: Vec<i64>,
    r: Vec<f32>,
    phi: Vec<f32>,
    z: Vec<f32>,
    layers: Vec<i64>,
    pid: Vec<i64>,
    edge_src: Vec<i64>,
    edge_dst: Vec<i64>,
}

impl SyntheticEvent {
    fn push_hit(&mut self, layer: usize, r: f64, phi: f64, z: f64, pid: i64) -> i64 {
        let index = self.hid.len() as i64;
        self.hid.push(index + 1);
        self.r.push(r as f32);
        self.phi.push(wrap_angle(phi) as f32);
        self.z.push(z as f32);
        self.layers.push(layer as i64);
        self.pid.push(pid);
        index
    }
}

fn wrap_angle(phi: f64) -> f64 {
    use std::f64::consts::PI;
    (phi + PI).rem_euclid(2.0 * PI) - PI
}

/// Charged tracks curving out from the beam line, plus uniform noise hits
/// with particle id 0. True edges join consecutive layers of each track.
fn generate_event(rng: &mut SimpleRng, n_tracks: usize, n_noise: usize) -> SyntheticEvent {
    let mut event = SyntheticEvent::default();

    for track in 0..n_tracks {
        let pid = track as i64 + 1;
        let phi0 = rng.uniform(-std::f64::consts::PI, std::f64::consts::PI);
        let curvature = rng.gauss(0.0, 2e-4);
        let cot_theta = rng.uniform(-1.5, 1.5);
        let z0 = rng.gauss(0.0, 20.0);
        // Low-momentum tracks loop out before the outer layers.
        let reach = if curvature.abs() > 3e-4 { 6 } else { LAYER_RADII.len() };

        let mut previous = None;
        for (layer, &r) in LAYER_RADII.iter().enumerate().take(reach) {
            let phi = phi0 + curvature * r + rng.gauss(0.0, 1e-3);
            let z = z0 + cot_theta * r + rng.gauss(0.0, 0.5);
            let index = event.push_hit(layer, r, phi, z, pid);
            if let Some(prev) = previous {
                event.edge_src.push(prev);
                event.edge_dst.push(index);
            }
            previous = Some(index);
        }
    }

    for _ in 0..n_noise {
        let layer = (rng.next_u64() % LAYER_RADII.len() as u64) as usize;
        let r = LAYER_RADII[layer];
        let phi = rng.uniform(-std::f64::consts::PI, std::f64::consts::PI);
        let z = rng.uniform(-1000.0, 1000.0);
        event.push_hit(layer, r, phi, z, 0);
    }

    event
}

fn int_list(values: &[i64]) -> ArrayRef {
    let mut builder = ListBuilder::new(Int64Builder::new());
    builder.values().append_slice(values);
    builder.append(true);
    Arc::new(builder.finish())
}

fn float_list(values: &[f32]) -> ArrayRef {
    let mut builder = ListBuilder::new(Float32Builder::new());
    builder.values().append_slice(values);
    builder.append(true);
    Arc::new(builder.finish())
}

fn write_parquet(event: &SyntheticEvent, path: &Path) -> Result<()> {
    let list_of = |item: DataType| DataType::List(Arc::new(Field::new("item", item, true)));
    let columns: Vec<(&str, ArrayRef)> = vec![
        ("hid", int_list(&event.hid)),
        ("r", float_list(&event.r)),
        ("phi", float_list(&event.phi)),
        ("z", float_list(&event.z)),
        ("layers", int_list(&event.layers)),
        ("pid", int_list(&event.pid)),
        ("edge_src", int_list(&event.edge_src)),
        ("edge_dst", int_list(&event.edge_dst)),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| {
                let item = match array.data_type() {
                    DataType::List(field) => field.data_type().clone(),
                    other => other.clone(),
                };
                Field::new(*name, list_of(item), false)
            })
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Scores for every true edge plus an equal number of fake ones, so the
/// prediction plot has all four outcomes.
fn write_predictions(event: &SyntheticEvent, rng: &mut SimpleRng, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["hit_index_1", "hit_index_2", "score", "truth"])?;

    let n_hits = event.hid.len() as u64;
    for (&src, &dst) in event.edge_src.iter().zip(&event.edge_dst) {
        let score = rng.gauss(0.8, 0.2).clamp(0.0, 1.0);
        writer.write_record([src.to_string(), dst.to_string(), format!("{score:.4}"), "1".into()])?;

        let fake = (rng.next_u64() % n_hits) as i64;
        let score = rng.gauss(0.2, 0.2).clamp(0.0, 1.0);
        writer.write_record([src.to_string(), fake.to_string(), format!("{score:.4}"), "0".into()])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let out_dir = Path::new(OUTPUT_DIR);
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {OUTPUT_DIR}"))?;

    for &id in &EVENTS {
        let n_tracks = 40 + (rng.next_u64() % 40) as usize;
        let event = generate_event(&mut rng, n_tracks, 150);

        let path = out_dir.join(format!("{id}.parquet"));
        write_parquet(&event, &path)?;
        let predictions = out_dir.join(format!("{id}_predictions.csv"));
        write_predictions(&event, &mut rng, &predictions)?;

        println!(
            "Wrote {} hits and {} true edges to {}",
            event.hid.len(),
            event.edge_src.len(),
            path.display()
        );
    }
    Ok(())
}
