use std::borrow::Cow;
use std::path::Path;
use std::sync::OnceLock;

use eframe::egui::{FontDefinitions, FontFamily};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use thiserror::Error;

use crate::config::RenderConfig;
use crate::plot::figure::{Figure, LayerKind, Projection, equal_aspect_ranges};

const MARGIN: u32 = 10;
const X_LABEL_AREA: u32 = 40;
const Y_LABEL_AREA: u32 = 60;
/// Fraction of the data span left empty around the data.
const PADDING: f64 = 0.05;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("drawing error: {0}")]
    Backend(String),
    #[error("font error: {0}")]
    Font(String),
    #[error("encoding {}: {source}", path.display())]
    Encode {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("viewer error: {0}")]
    Window(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

fn backend_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Backend(e.to_string())
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Write `figure` to `save`, or open it in a window when `save` is `None`.
pub fn present(figure: &Figure, save: Option<&Path>, config: &RenderConfig) -> Result<()> {
    match save {
        Some(path) => save_figure(figure, path, config),
        None => crate::app::run_viewer(figure.clone(), config.clone()),
    }
}

/// Render `figure` to an image file. `.svg` is written as vector graphics;
/// every other extension is rasterised and encoded by the image crate.
pub fn save_figure(figure: &Figure, path: &Path, config: &RenderConfig) -> Result<()> {
    ensure_fonts()?;
    let size = (config.width, config.height);
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if is_svg {
        let root = SVGBackend::new(path, size).into_drawing_area();
        draw_figure(&root, figure, config)?;
        root.present().map_err(backend_err)?;
    } else {
        let mut buffer = vec![0u8; config.width as usize * config.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
            draw_figure(&root, figure, config)?;
            root.present().map_err(backend_err)?;
        }
        let image = image::RgbImage::from_raw(config.width, config.height, buffer)
            .ok_or_else(|| RenderError::Backend("bitmap buffer does not match figure size".into()))?;
        image.save(path).map_err(|source| RenderError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    }

    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Text is laid out with the proportional font embedded in egui, registered
/// once as plotters' `sans-serif`.
fn ensure_fonts() -> Result<()> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            let defs = FontDefinitions::default();
            let data = defs
                .families
                .get(&FontFamily::Proportional)
                .and_then(|names| names.first())
                .and_then(|name| defs.font_data.get(name))
                .ok_or_else(|| "no embedded proportional font".to_string())?;
            let bytes: &'static [u8] = match &data.font {
                Cow::Borrowed(bytes) => *bytes,
                Cow::Owned(bytes) => Box::leak(bytes.clone().into_boxed_slice()),
            };
            register_font("sans-serif", FontStyle::Normal, bytes)
                .map_err(|_| "embedded proportional font could not be parsed".to_string())
        })
        .clone()
        .map_err(RenderError::Font)
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    config: &RenderConfig,
) -> Result<()> {
    root.fill(&WHITE).map_err(backend_err)?;
    let area = match &figure.title {
        Some(title) => root
            .titled(title, ("sans-serif", 20))
            .map_err(backend_err)?,
        None => root.clone(),
    };

    match figure.projection {
        Projection::Planar { equal_aspect } => draw_planar(&area, figure, equal_aspect, config),
        Projection::Spatial { elev, azim } => draw_spatial(&area, figure, elev, azim, config),
    }
}

fn draw_planar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &Figure,
    equal_aspect: bool,
    config: &RenderConfig,
) -> Result<()> {
    let bounds = figure.bounds().padded(PADDING);
    let (mut x_range, mut y_range) = (bounds.range(0), bounds.range(1));
    if equal_aspect {
        let (w, h) = area.dim_in_pixel();
        let (plot_w, plot_h) = plot_area_px(w, h);
        (x_range, y_range) = equal_aspect_ranges(x_range, y_range, plot_w, plot_h);
    }

    let mut chart = ChartBuilder::on(area)
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_range, y_range)
        .map_err(backend_err)?;

    {
        let mut mesh = chart.configure_mesh();
        if let Some(label) = &figure.x_label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &figure.y_label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw().map_err(backend_err)?;
    }

    for layer in &figure.layers {
        let color = layer.color.to_plotters();
        match &layer.kind {
            LayerKind::Scatter { points, size } => {
                let style = color.filled();
                let radius = marker_radius_px(*size, config.dpi);
                let anno = chart
                    .draw_series(
                        points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), radius, style)),
                    )
                    .map_err(backend_err)?;
                if let Some(label) = &layer.label {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| Circle::new((x, y), 3, style));
                }
            }
            LayerKind::Segments { segments, width } => {
                let style = color.stroke_width(line_width_px(*width, config.dpi));
                let anno = chart
                    .draw_series(segments.iter().map(|[a, b]| {
                        PathElement::new(vec![(a[0], a[1]), (b[0], b[1])], style)
                    }))
                    .map_err(backend_err)?;
                if let Some(label) = &layer.label {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }
            }
        }
    }

    if figure.legend && figure.layers.iter().any(|l| l.label.is_some()) {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(backend_err)?;
    }
    Ok(())
}

/// plotters' vertical axis is its second one, so data z is passed there.
fn draw_spatial<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &Figure,
    elev: f64,
    azim: f64,
    config: &RenderConfig,
) -> Result<()> {
    let bounds = figure.bounds().padded(PADDING);

    let mut chart = ChartBuilder::on(area)
        .margin(MARGIN)
        .build_cartesian_3d(bounds.range(0), bounds.range(2), bounds.range(1))
        .map_err(backend_err)?;
    chart.with_projection(|mut pb| {
        pb.pitch = elev.to_radians();
        pb.yaw = azim.to_radians();
        pb.scale = 0.8;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.15))
        .max_light_lines(3)
        .draw()
        .map_err(backend_err)?;

    let axis_names = [
        (&figure.x_label, (bounds.max[0], bounds.min[2], bounds.min[1])),
        (&figure.y_label, (bounds.min[0], bounds.min[2], bounds.max[1])),
        (&figure.z_label, (bounds.min[0], bounds.max[2], bounds.min[1])),
    ];
    for (label, at) in axis_names {
        if let Some(label) = label {
            chart
                .draw_series(std::iter::once(Text::new(
                    label.clone(),
                    at,
                    ("sans-serif", 15),
                )))
                .map_err(backend_err)?;
        }
    }

    for layer in &figure.layers {
        let color = layer.color.to_plotters();
        match &layer.kind {
            LayerKind::Scatter { points, size } => {
                let style = color.filled();
                let radius = marker_radius_px(*size, config.dpi);
                let anno = chart
                    .draw_series(
                        points
                            .iter()
                            .map(|p| Circle::new((p[0], p[2], p[1]), radius, style)),
                    )
                    .map_err(backend_err)?;
                if let Some(label) = &layer.label {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| Circle::new((x, y), 3, style));
                }
            }
            LayerKind::Segments { segments, width } => {
                let style = color.stroke_width(line_width_px(*width, config.dpi));
                let anno = chart
                    .draw_series(segments.iter().map(|[a, b]| {
                        PathElement::new(vec![(a[0], a[2], a[1]), (b[0], b[2], b[1])], style)
                    }))
                    .map_err(backend_err)?;
                if let Some(label) = &layer.label {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }
            }
        }
    }

    if figure.legend && figure.layers.iter().any(|l| l.label.is_some()) {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(backend_err)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Size conversions
// ---------------------------------------------------------------------------

/// Pixel size of the 2D plotting area inside a `width` × `height` area.
pub fn plot_area_px(width: u32, height: u32) -> (u32, u32) {
    (
        width.saturating_sub(2 * MARGIN + Y_LABEL_AREA),
        height.saturating_sub(2 * MARGIN + X_LABEL_AREA),
    )
}

/// Marker radius in pixels for a marker of `size` points² (area convention).
pub fn marker_radius_px(size: f64, dpi: f64) -> u32 {
    let radius_pt = size.max(0.0).sqrt() / 2.0;
    (radius_pt * dpi / 72.0).round().max(1.0) as u32
}

/// Stroke width in pixels for a line of `width` points.
pub fn line_width_px(width: f64, dpi: f64) -> u32 {
    (width * dpi / 72.0).round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::color::Rgba;

    #[test]
    fn thin_lines_and_small_markers_stay_visible() {
        assert_eq!(line_width_px(0.1, 100.0), 1);
        assert_eq!(marker_radius_px(1.0, 100.0), 1);
        assert_eq!(marker_radius_px(0.0, 100.0), 1);
    }

    #[test]
    fn sizes_scale_with_dpi() {
        assert_eq!(line_width_px(7.2, 100.0), 10);
        assert_eq!(marker_radius_px(144.0, 72.0), 6);
    }

    #[test]
    fn plot_area_excludes_margins_and_labels() {
        assert_eq!(plot_area_px(800, 800), (720, 740));
        assert_eq!(plot_area_px(10, 10), (0, 0));
    }

    fn sample_figure(spatial: bool) -> Figure {
        let mut fig = if spatial {
            Figure::spatial(80.0, 45.0)
        } else {
            Figure::planar(true)
        };
        fig = fig.with_axis_labels("x", "y", spatial.then_some("z")).with_legend(true);
        fig.add_segments(
            Some("edges".into()),
            vec![[[0.0, 0.0, 0.0], [3.0, 4.0, 5.0]]],
            0.1,
            Rgba::new(0.0, 0.0, 1.0, 0.6),
        );
        fig.add_scatter(
            Some("Layer 0".into()),
            vec![[0.0, 0.0, 0.0], [3.0, 4.0, 5.0]],
            2.0,
            Rgba::BLUE,
        );
        fig
    }

    #[test]
    fn embedded_font_registers_once() {
        ensure_fonts().unwrap();
        ensure_fonts().unwrap();
    }

    #[test]
    fn writes_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hits.svg");
        save_figure(&sample_figure(false), &path, &RenderConfig::default()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn writes_png_at_configured_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hit3D.png");
        let config = RenderConfig {
            width: 320,
            height: 240,
            ..Default::default()
        };
        save_figure(&sample_figure(true).with_title("Event 1"), &path, &config).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }
}
