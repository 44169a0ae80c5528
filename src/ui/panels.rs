use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Left side panel – layer toggles
// ---------------------------------------------------------------------------

/// Render the left layer panel.
pub fn side_panel(ui: &mut Ui, state: &mut ViewerState) {
    ui.heading("Layers");
    ui.separator();

    if state.figure.layers.is_empty() {
        ui.label("Nothing to show.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.show_all();
        }
        if ui.small_button("None").clicked() {
            state.hide_all();
        }
    });

    let entries: Vec<(usize, String, Color32, usize)> = state
        .figure
        .layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let label = layer
                .label
                .clone()
                .unwrap_or_else(|| format!("series {i}"));
            (i, label, layer.color.to_color32(), layer.len())
        })
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (idx, label, color, count) in entries {
                let mut checked = state.is_visible(idx);
                let text = RichText::new(format!("{label}  ({count})")).color(color);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_layer(idx);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut ViewerState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Save As…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(title) = &state.figure.title {
            ui.strong(title);
            ui.separator();
        }

        ui.label(format!(
            "{} layers, {} elements shown",
            state.figure.layers.len() - state.hidden.len(),
            state.visible_elements()
        ));

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn save_file_dialog(state: &mut ViewerState) {
    let file = rfd::FileDialog::new()
        .set_title("Save figure")
        .set_file_name("figure.png")
        .add_filter("PNG", &["png"])
        .add_filter("SVG", &["svg"])
        .save_file();

    if let Some(path) = file {
        state.save_to(&path);
    }
}
