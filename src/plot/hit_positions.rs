use crate::color::{Rgba, generate_palette};
use crate::data::model::{Hit, hits_by_layer};

use super::figure::Figure;

/// Marker area of hit-position plots, in points².
const HIT_MARKER_SIZE: f64 = 1.0;
/// 3D hit plots look down onto the transverse plane.
pub const VIEW_ELEV: f64 = 80.0;
pub const VIEW_AZIM: f64 = 45.0;

pub(super) fn planar(hit: &Hit) -> [f64; 3] {
    [hit.x, hit.y, 0.0]
}

/// x/y scatter with one coloured series per layer.
pub fn hit_position_plot_2d(hits: &[Hit]) -> Figure {
    let mut figure = Figure::planar(true).with_legend(true);
    add_layer_series(&mut figure, hits, planar);
    figure
}

/// x/y scatter of every hit as one series.
pub fn hit_position_plot_2d_no_group(hits: &[Hit]) -> Figure {
    let mut figure = Figure::planar(true);
    figure.add_scatter(
        None,
        hits.iter().map(planar).collect(),
        HIT_MARKER_SIZE,
        generate_palette(1)[0],
    );
    figure
}

/// x/y/z scatter with one coloured series per layer.
pub fn hit_position_plot_3d(hits: &[Hit]) -> Figure {
    let mut figure = Figure::spatial(VIEW_ELEV, VIEW_AZIM).with_legend(true);
    add_layer_series(&mut figure, hits, Hit::xyz);
    figure
}

/// x/y/z scatter of every hit as one series.
pub fn hit_position_plot_3d_no_group(hits: &[Hit]) -> Figure {
    let mut figure = Figure::spatial(VIEW_ELEV, VIEW_AZIM);
    figure.add_scatter(
        None,
        hits.iter().map(Hit::xyz).collect(),
        HIT_MARKER_SIZE,
        generate_palette(1)[0],
    );
    figure
}

fn add_layer_series(figure: &mut Figure, hits: &[Hit], position: fn(&Hit) -> [f64; 3]) {
    let groups = hits_by_layer(hits);
    let palette = generate_palette(groups.len());
    for ((layer, hits_on_layer), color) in groups.iter().zip(palette) {
        figure.add_scatter(
            Some(format!("Layer {layer}")),
            hits_on_layer.iter().map(|h| position(h)).collect(),
            HIT_MARKER_SIZE,
            color,
        );
    }
}

/// Opaque blue layer-by-layer scatter drawn under edge overlays.
pub(super) fn add_hit_backdrop(
    figure: &mut Figure,
    hits: &[Hit],
    size: f64,
    labelled: bool,
    position: fn(&Hit) -> [f64; 3],
) {
    for (layer, hits_on_layer) in hits_by_layer(hits) {
        figure.add_scatter(
            labelled.then(|| format!("Layer {layer}")),
            hits_on_layer.iter().map(|h| position(h)).collect(),
            size,
            Rgba::BLUE,
        );
    }
}
