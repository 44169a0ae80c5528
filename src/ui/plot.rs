use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::plot::figure::LayerKind;
use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Figure plot (central panel)
// ---------------------------------------------------------------------------

/// Render the visible layers of the figure in the central panel.
pub fn figure_plot(ui: &mut Ui, state: &ViewerState) {
    let figure = &state.figure;
    if figure.layers.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("The figure has nothing to draw");
        });
        return;
    }

    let mut plot = Plot::new("figure_plot")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if figure.is_equal_aspect() || figure.is_spatial() {
        plot = plot.data_aspect(1.0);
    }
    if figure.legend {
        plot = plot.legend(Legend::default());
    }
    // Spatial figures are drawn pre-projected, so their screen axes carry no units.
    if figure.is_spatial() {
        plot = plot.show_axes(false).show_grid(false);
    } else {
        if let Some(label) = &figure.x_label {
            plot = plot.x_axis_label(label.as_str());
        }
        if let Some(label) = &figure.y_label {
            plot = plot.y_axis_label(label.as_str());
        }
    }

    plot.show(ui, |plot_ui| {
        for (idx, layer) in figure.layers.iter().enumerate() {
            if !state.is_visible(idx) || layer.is_empty() {
                continue;
            }
            let color = layer.color.to_color32();
            let name = layer.label.clone().unwrap_or_default();

            match &layer.kind {
                LayerKind::Scatter { points, size } => {
                    let series: PlotPoints = points
                        .iter()
                        .map(|&p| figure.screen_point(p))
                        .collect();
                    plot_ui.points(
                        Points::new(series)
                            .name(&name)
                            .color(color)
                            .radius(marker_radius(*size)),
                    );
                }
                LayerKind::Segments { segments, width } => {
                    // Lines sharing a name share one legend entry.
                    for [a, b] in segments {
                        let series: PlotPoints =
                            vec![figure.screen_point(*a), figure.screen_point(*b)].into();
                        plot_ui.line(
                            Line::new(series)
                                .name(&name)
                                .color(color)
                                .width((*width as f32).max(0.5)),
                        );
                    }
                }
            }
        }
    });
}

/// On-screen radius for a marker of `size` points².
fn marker_radius(size: f64) -> f32 {
    ((size.max(0.0).sqrt() / 2.0) as f32).max(1.0)
}
