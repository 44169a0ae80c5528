use eframe::egui;

use crate::config::RenderConfig;
use crate::plot::figure::Figure;
use crate::render::RenderError;
use crate::state::ViewerState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ViewerApp {
    pub state: ViewerState,
}

impl ViewerApp {
    pub fn new(figure: Figure, config: RenderConfig) -> Self {
        Self {
            state: ViewerState::new(figure, config),
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: layers ----
        egui::SidePanel::left("layer_panel")
            .default_width(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::figure_plot(ui, &self.state);
        });
    }
}

/// Open `figure` in a window and block until it is closed.
pub fn run_viewer(figure: Figure, config: RenderConfig) -> Result<(), RenderError> {
    let title = figure
        .title
        .clone()
        .unwrap_or_else(|| "LRT event viewer".to_string());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width as f32 + 200.0, config.height as f32])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    log::debug!(
        "Opening viewer with {} layers, {} elements",
        figure.layers.len(),
        figure.element_count()
    );
    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(ViewerApp::new(figure, config)))),
    )
    .map_err(|e| RenderError::Window(e.to_string()))
}
