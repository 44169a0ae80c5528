use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray,
    ListArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::event::build_event;
use super::model::{Event, RawEvent};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("event {event} not found in {}", dataset.display())]
    NotFound { dataset: PathBuf, event: u64 },
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("{field} has {actual} entries but there are {expected} hits")]
    Shape {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// On-disk encoding of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Parquet,
    Json,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load event `event` from the `dataset` directory and derive its tables.
pub fn read_event(dataset: &Path, event: u64) -> Result<Event, LoadError> {
    println!("Reading {}/{event}...", dataset.display());

    let (path, format) = resolve_record(dataset, event)?;
    log::debug!("event {event} resolved to {} ({format:?})", path.display());

    let raw = load_record(&path, format)?;
    let event = build_event(event, &raw)?;
    log::info!(
        "Loaded event {}: {} hits on {} layers, {} particles, {} true edges",
        event.id,
        event.hits.len(),
        event.layers().len(),
        event.particle_count(),
        event.truth.len()
    );
    Ok(event)
}

/// Find the record of `event` inside `dataset`.
///
/// A file named exactly after the event wins and is sniffed for its format;
/// otherwise `{event}.parquet`, `{event}.pq` and `{event}.json` are tried.
pub fn resolve_record(dataset: &Path, event: u64) -> Result<(PathBuf, RecordFormat), LoadError> {
    let bare = dataset.join(event.to_string());
    if bare.is_file() {
        let format = sniff_format(&bare)?;
        return Ok((bare, format));
    }

    let candidates = [
        ("parquet", RecordFormat::Parquet),
        ("pq", RecordFormat::Parquet),
        ("json", RecordFormat::Json),
    ];
    for (ext, format) in candidates {
        let path = dataset.join(format!("{event}.{ext}"));
        if path.is_file() {
            return Ok((path, format));
        }
    }

    Err(LoadError::NotFound {
        dataset: dataset.to_path_buf(),
        event,
    })
}

/// Parquet files start with the `PAR1` magic; anything else is read as JSON.
fn sniff_format(path: &Path) -> Result<RecordFormat, LoadError> {
    let file = File::open(path).map_err(|source| io_error(path, source))?;
    let mut magic = Vec::with_capacity(4);
    file.take(4)
        .read_to_end(&mut magic)
        .map_err(|source| io_error(path, source))?;
    if magic == b"PAR1" {
        Ok(RecordFormat::Parquet)
    } else {
        Ok(RecordFormat::Json)
    }
}

/// Read the raw arrays of a single record.
pub fn load_record(path: &Path, format: RecordFormat) -> Result<RawEvent, LoadError> {
    let decoded = match format {
        RecordFormat::Parquet => {
            let file = File::open(path).map_err(|source| io_error(path, source))?;
            decode_parquet(file)
        }
        RecordFormat::Json => {
            let bytes = std::fs::read(path).map_err(|source| io_error(path, source))?;
            decode_json(&bytes)
        }
    };
    decoded.map_err(|e| LoadError::Decode {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
    })
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// JSON records
// ---------------------------------------------------------------------------

/// Expected JSON layout (field names follow the exported graph data):
///
/// ```json
/// {
///   "hid": [11, 12, ...],
///   "x": [[r, phi, z], ...],
///   "layers": [0, 1, ...],
///   "pid": [4503599644147712, ...],
///   "layerless_true_edges": [[0, 1, ...], [1, 2, ...]]
/// }
/// ```
///
/// The edge array may also be given as a list of `[src, dst]` rows.
fn decode_json(bytes: &[u8]) -> Result<RawEvent> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;
    let obj = root
        .as_object()
        .context("Expected top-level JSON object")?;

    Ok(RawEvent {
        hit_ids: json_i64_array(obj.get("hid"), "hid")?,
        positions: json_positions(obj.get("x"))?,
        layers: json_i64_array(obj.get("layers"), "layers")?,
        particle_ids: json_i64_array(obj.get("pid"), "pid")?,
        true_edges: orient_edges(json_i64_rows(
            obj.get("layerless_true_edges"),
            "layerless_true_edges",
        )?)?,
    })
}

fn json_i64_array(val: Option<&JsonValue>, field: &str) -> Result<Vec<i64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("missing or invalid '{field}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| json_to_i64(v).with_context(|| format!("{field}[{j}]: not an integer")))
        .collect()
}

fn json_to_i64(v: &JsonValue) -> Option<i64> {
    v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn json_i64_rows(val: Option<&JsonValue>, field: &str) -> Result<Vec<Vec<i64>>> {
    let rows = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("missing or invalid '{field}' array"))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| json_i64_array(Some(row), &format!("{field}[{i}]")))
        .collect()
}

fn json_positions(val: Option<&JsonValue>) -> Result<Vec<[f64; 3]>> {
    let rows = val
        .and_then(|v| v.as_array())
        .context("missing or invalid 'x' array")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let cols = row
                .as_array()
                .with_context(|| format!("x[{i}]: expected [r, phi, z]"))?;
            if cols.len() != 3 {
                bail!("x[{i}]: expected 3 columns, got {}", cols.len());
            }
            let mut position = [0.0; 3];
            for (slot, v) in position.iter_mut().zip(cols) {
                *slot = v
                    .as_f64()
                    .with_context(|| format!("x[{i}]: not a number"))?;
            }
            Ok(position)
        })
        .collect()
}

/// Edges are stored `2 x N`; a list of `[src, dst]` rows is accepted too.
fn orient_edges(rows: Vec<Vec<i64>>) -> Result<Vec<[i64; 2]>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    if rows.len() == 2 && rows[0].len() == rows[1].len() {
        return Ok(rows[0]
            .iter()
            .zip(&rows[1])
            .map(|(&a, &b)| [a, b])
            .collect());
    }
    if rows.iter().all(|r| r.len() == 2) {
        return Ok(rows.iter().map(|r| [r[0], r[1]]).collect());
    }
    bail!(
        "edge array must be 2 x N or N x 2, got {} rows of lengths {:?}",
        rows.len(),
        rows.iter().map(Vec::len).collect::<Vec<_>>()
    )
}

// ---------------------------------------------------------------------------
// Parquet records
// ---------------------------------------------------------------------------

/// Load an event stored as a single Parquet row of list columns.
///
/// Expected schema:
/// - `hid`, `layers`, `pid`: List<Int64 | Int32>
/// - `r`, `phi`, `z`: List<Float32 | Float64>
/// - `edge_src`, `edge_dst`: List<Int64 | Int32>
fn decode_parquet(file: File) -> Result<RawEvent> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut batches = Vec::new();
    for batch_result in reader {
        batches.push(batch_result.context("reading parquet record batch")?);
    }

    let n_rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
    if n_rows != 1 {
        bail!("expected exactly one event record, found {n_rows} rows");
    }
    let batch = batches
        .iter()
        .find(|b| b.num_rows() == 1)
        .context("record batch with the event row")?;

    let r = extract_f64_list(list_column(batch, "r")?, 0).context("reading 'r'")?;
    let phi = extract_f64_list(list_column(batch, "phi")?, 0).context("reading 'phi'")?;
    let z = extract_f64_list(list_column(batch, "z")?, 0).context("reading 'z'")?;
    if r.len() != phi.len() || r.len() != z.len() {
        bail!(
            "position columns differ in length: r={}, phi={}, z={}",
            r.len(),
            phi.len(),
            z.len()
        );
    }

    let src = extract_i64_list(list_column(batch, "edge_src")?, 0).context("reading 'edge_src'")?;
    let dst = extract_i64_list(list_column(batch, "edge_dst")?, 0).context("reading 'edge_dst'")?;
    if src.len() != dst.len() {
        bail!("edge_src has {} entries but edge_dst has {}", src.len(), dst.len());
    }

    Ok(RawEvent {
        hit_ids: extract_i64_list(list_column(batch, "hid")?, 0).context("reading 'hid'")?,
        positions: r
            .into_iter()
            .zip(phi)
            .zip(z)
            .map(|((r, phi), z)| [r, phi, z])
            .collect(),
        layers: extract_i64_list(list_column(batch, "layers")?, 0).context("reading 'layers'")?,
        particle_ids: extract_i64_list(list_column(batch, "pid")?, 0).context("reading 'pid'")?,
        true_edges: src.into_iter().zip(dst).map(|(a, b)| [a, b]).collect(),
    })
}

// -- Parquet / Arrow helpers --

fn list_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

/// Values of a List or LargeList column at the given row.
fn list_values(col: &ArrayRef, row: usize) -> Result<ArrayRef> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            Ok(list_arr.value(row))
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            Ok(list_arr.value(row))
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    }
}

/// Extract a `Vec<f64>` from a list column; nulls become NaN.
fn extract_f64_list(col: &ArrayRef, row: usize) -> Result<Vec<f64>> {
    let values_array = list_values(col, row)?;

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Extract a `Vec<i64>` from a list column; nulls are rejected.
fn extract_i64_list(col: &ArrayRef, row: usize) -> Result<Vec<i64>> {
    let values_array = list_values(col, row)?;

    let values: Vec<Option<i64>> =
        if let Some(i64_arr) = values_array.as_any().downcast_ref::<Int64Array>() {
            i64_arr.iter().collect()
        } else if let Some(i32_arr) = values_array.as_any().downcast_ref::<Int32Array>() {
            i32_arr.iter().map(|v| v.map(i64::from)).collect()
        } else {
            bail!(
                "List inner type is {:?}, expected Int64 or Int32",
                values_array.data_type()
            )
        };

    values
        .into_iter()
        .enumerate()
        .map(|(j, v)| v.with_context(|| format!("null integer at position {j}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float32Builder, Int64Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    use super::*;

    const EVENT_JSON: &str = r#"{
        "hid": [11, 12, 13],
        "x": [[1.0, 0.0, 1.0], [2.0, 1.5707963267948966, 2.0], [3.0, 3.0, -1.0]],
        "layers": [0, 1, 2],
        "pid": [5, 5, 6],
        "layerless_true_edges": [[0, 1, 1], [1, 2, 9]]
    }"#;

    fn i64_list(values: &[i64]) -> ArrayRef {
        let mut builder = ListBuilder::new(Int64Builder::new());
        builder.values().append_slice(values);
        builder.append(true);
        Arc::new(builder.finish())
    }

    fn f32_list(values: &[f32]) -> ArrayRef {
        let mut builder = ListBuilder::new(Float32Builder::new());
        builder.values().append_slice(values);
        builder.append(true);
        Arc::new(builder.finish())
    }

    fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, arr)| Field::new(*name, arr.data_type().clone(), false))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let batch =
            RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, a)| a).collect())
                .unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    fn sample_columns() -> Vec<(&'static str, ArrayRef)> {
        vec![
            ("hid", i64_list(&[1, 2, 3, 4])),
            ("r", f32_list(&[30.0, 70.0, 115.0, 170.0])),
            ("phi", f32_list(&[0.1, 0.11, 0.12, 0.13])),
            ("z", f32_list(&[10.0, 23.0, 38.0, 56.0])),
            ("layers", i64_list(&[0, 1, 2, 3])),
            ("pid", i64_list(&[42, 42, 42, 42])),
            ("edge_src", i64_list(&[0, 1, 2])),
            ("edge_dst", i64_list(&[1, 2, 3])),
        ]
    }

    #[test]
    fn reads_json_record_with_two_by_n_edges() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("540.json"), EVENT_JSON).unwrap();

        let event = read_event(dir.path(), 540).unwrap();
        assert_eq!(event.id, 540);
        assert_eq!(event.hits.len(), 3);
        assert_eq!(event.particles.len(), 3);
        assert_eq!(event.truth.len(), 2);
        assert_eq!(event.dropped_edges, 1);
        assert_eq!(event.truth[1].hit_2.hit_id, 13);
    }

    #[test]
    fn reads_extensionless_record_by_sniffing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("1095"), EVENT_JSON).unwrap();
        let (path, format) = resolve_record(dir.path(), 1095).unwrap();
        assert_eq!(format, RecordFormat::Json);
        assert_eq!(path, dir.path().join("1095"));

        write_parquet(&dir.path().join("4332"), sample_columns());
        let (_, format) = resolve_record(dir.path(), 4332).unwrap();
        assert_eq!(format, RecordFormat::Parquet);
    }

    #[test]
    fn sniffing_needs_the_full_magic() {
        let dir = tempdir().unwrap();
        let short = dir.path().join("short");
        std::fs::write(&short, b"PAR").unwrap();
        assert_eq!(sniff_format(&short).unwrap(), RecordFormat::Json);

        let magic = dir.path().join("magic");
        std::fs::write(&magic, b"PAR1\x15\x04").unwrap();
        assert_eq!(sniff_format(&magic).unwrap(), RecordFormat::Parquet);
    }

    #[test]
    fn accepts_row_oriented_edges() {
        let rows = vec![vec![0, 1], vec![1, 2], vec![2, 0]];
        let edges = orient_edges(rows).unwrap();
        assert_eq!(edges, vec![[0, 1], [1, 2], [2, 0]]);

        let columns = vec![vec![0, 1], vec![1, 2]];
        assert_eq!(orient_edges(columns).unwrap(), vec![[0, 1], [1, 2]]);

        assert!(orient_edges(vec![vec![0, 1, 2], vec![1]]).is_err());
    }

    #[test]
    fn reads_parquet_record() {
        let dir = tempdir().unwrap();
        write_parquet(&dir.path().join("7.parquet"), sample_columns());

        let event = read_event(dir.path(), 7).unwrap();
        assert_eq!(event.hits.len(), 4);
        assert_eq!(event.truth.len(), 3);
        assert_eq!(event.particle_count(), 1);
        assert!((event.hits[1].r - 70.0).abs() < 1e-6);
        assert_eq!(event.layers().into_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn parquet_missing_column_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let mut columns = sample_columns();
        columns.retain(|(name, _)| *name != "pid");
        write_parquet(&dir.path().join("8.parquet"), columns);

        let err = read_event(dir.path(), 8).unwrap_err();
        match err {
            LoadError::Decode { message, .. } => assert!(message.contains("pid")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_event_is_not_found() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_event(dir.path(), 99),
            Err(LoadError::NotFound { event: 99, .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("3.json"), r#"{"hid": [1], "x": [[1.0, 2.0]]}"#).unwrap();
        assert!(matches!(read_event(dir.path(), 3), Err(LoadError::Decode { .. })));
    }

    #[test]
    fn mismatched_json_arrays_are_a_shape_error() {
        let dir = tempdir().unwrap();
        let json = r#"{
            "hid": [1, 2],
            "x": [[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            "layers": [0],
            "pid": [1, 1],
            "layerless_true_edges": [[], []]
        }"#;
        std::fs::write(dir.path().join("4.json"), json).unwrap();
        assert!(matches!(
            read_event(dir.path(), 4),
            Err(LoadError::Shape { field: "layers", .. })
        ));
    }
}
