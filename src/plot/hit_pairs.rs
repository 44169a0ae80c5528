use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Deserialize;

use crate::color::Rgba;
use crate::data::model::{Hit, HitPair};

use super::PlotError;
use super::confusion::{ColorScheme, ConfusionCategory, ConfusionSummary, category_styles};
use super::figure::Figure;
use super::hit_positions::{add_hit_backdrop, planar};

/// Marker area of hits drawn under edges, in points².
const BACKDROP_MARKER_SIZE: f64 = 2.0;
/// Default 3D view for edge overlays.
const PAIR_VIEW_ELEV: f64 = 30.0;
const PAIR_VIEW_AZIM: f64 = -60.0;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Style of plain edge overlays.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PairPlotOptions {
    pub color: Rgba,
    /// Points.
    pub line_width: f64,
}

impl Default for PairPlotOptions {
    fn default() -> Self {
        Self {
            color: Rgba::new(0.0, 0.0, 1.0, 0.6),
            line_width: 0.1,
        }
    }
}

/// Knobs of the prediction overlay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PredictionPlotOptions {
    /// Scores above this count as predicted edges.
    pub threshold: f64,
    pub color_scheme: ColorScheme,
    /// Points.
    pub line_width: f64,
}

impl Default for PredictionPlotOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            color_scheme: ColorScheme::default(),
            line_width: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Edge overlays
// ---------------------------------------------------------------------------

/// One segment layer per group of pairs, over a blue x/y hit scatter.
pub fn hit_pair_plot_2d<K: Display>(
    hits: &[Hit],
    groups: &BTreeMap<K, Vec<HitPair>>,
    options: &PairPlotOptions,
) -> Figure {
    let mut figure = Figure::planar(true).with_axis_labels("x", "y", None);
    for (key, pairs) in groups {
        figure.add_segments(
            Some(key.to_string()),
            pairs
                .iter()
                .map(|p| [planar(&p.hit_1), planar(&p.hit_2)])
                .collect(),
            options.line_width,
            options.color,
        );
    }
    add_hit_backdrop(&mut figure, hits, BACKDROP_MARKER_SIZE, true, planar);
    figure
}

/// 3D variant of [`hit_pair_plot_2d`].
pub fn hit_pair_plot_3d<K: Display>(
    hits: &[Hit],
    groups: &BTreeMap<K, Vec<HitPair>>,
    options: &PairPlotOptions,
) -> Figure {
    let mut figure =
        Figure::spatial(PAIR_VIEW_ELEV, PAIR_VIEW_AZIM).with_axis_labels("x", "y", Some("z"));
    for (key, pairs) in groups {
        figure.add_segments(
            Some(key.to_string()),
            pairs.iter().map(HitPair::segment_3d).collect(),
            options.line_width,
            options.color,
        );
    }
    add_hit_backdrop(&mut figure, hits, BACKDROP_MARKER_SIZE, true, Hit::xyz);
    figure
}

/// Colour every pair by how its prediction compares with the truth.
///
/// `predictions[i]` and `truth[i]` belong to `pairs[i]`. Prints the
/// per-category summary and returns it with the figure.
pub fn hit_pair_gnn_prediction_plot_2d(
    hits: &[Hit],
    pairs: &[HitPair],
    predictions: &[f64],
    truth: &[f64],
    options: &PredictionPlotOptions,
) -> Result<(Figure, ConfusionSummary), PlotError> {
    if predictions.len() != pairs.len() {
        return Err(PlotError::LengthMismatch {
            what: "predictions",
            expected: pairs.len(),
            actual: predictions.len(),
        });
    }
    if truth.len() != pairs.len() {
        return Err(PlotError::LengthMismatch {
            what: "truth labels",
            expected: pairs.len(),
            actual: truth.len(),
        });
    }

    let mut figure = Figure::planar(true)
        .with_axis_labels("x", "y", None)
        .with_legend(true);
    add_hit_backdrop(&mut figure, hits, BACKDROP_MARKER_SIZE, false, planar);

    let mut summary = ConfusionSummary::default();
    let mut segments: BTreeMap<ConfusionCategory, Vec<[[f64; 3]; 2]>> = BTreeMap::new();
    for ((pair, &prediction), &label) in pairs.iter().zip(predictions).zip(truth) {
        let category = ConfusionCategory::classify(prediction, label, options.threshold);
        summary.record(category);
        if let Some(category) = category {
            segments
                .entry(category)
                .or_default()
                .push([planar(&pair.hit_1), planar(&pair.hit_2)]);
        }
    }

    if summary.unclassified > 0 {
        log::warn!(
            "{} edges have a NaN prediction or truth label and were not classified",
            summary.unclassified
        );
    }
    print!("{}", summary_block(&summary));

    for style in category_styles(&options.color_scheme).iter().rev() {
        if !style.color.is_visible() {
            continue;
        }
        figure.add_segments(
            Some(style.label.to_string()),
            segments.remove(&style.category).unwrap_or_default(),
            options.line_width,
            style.color,
        );
    }

    Ok((figure, summary))
}

/// Console form of the summary: the counts followed by two blank lines.
fn summary_block(summary: &ConfusionSummary) -> String {
    format!("{summary}\n\n\n")
}
