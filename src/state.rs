use std::collections::BTreeSet;
use std::path::Path;

use crate::config::RenderConfig;
use crate::plot::figure::Figure;
use crate::render::save_figure;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// The full viewer state, independent of rendering.
pub struct ViewerState {
    /// Figure as built, with every layer.
    pub figure: Figure,

    /// Rendering options used when saving from the viewer.
    pub config: RenderConfig,

    /// Indices of layers switched off in the side panel.
    pub hidden: BTreeSet<usize>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl ViewerState {
    pub fn new(figure: Figure, config: RenderConfig) -> Self {
        Self {
            figure,
            config,
            hidden: BTreeSet::new(),
            status_message: None,
        }
    }

    pub fn is_visible(&self, layer: usize) -> bool {
        !self.hidden.contains(&layer)
    }

    /// Toggle a single layer on or off.
    pub fn toggle_layer(&mut self, layer: usize) {
        if !self.hidden.remove(&layer) {
            self.hidden.insert(layer);
        }
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn hide_all(&mut self) {
        self.hidden = (0..self.figure.layers.len()).collect();
    }

    /// The figure restricted to the layers currently shown.
    pub fn visible_figure(&self) -> Figure {
        self.figure.retain_layers(|i| self.is_visible(i))
    }

    /// Number of markers and segments currently shown.
    pub fn visible_elements(&self) -> usize {
        self.figure
            .layers
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_visible(*i))
            .map(|(_, l)| l.len())
            .sum()
    }

    /// Write the visible layers to `path`; failures end up in the status line.
    pub fn save_to(&mut self, path: &Path) {
        match save_figure(&self.visible_figure(), path, &self.config) {
            Ok(()) => {
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to save figure: {e:#}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
