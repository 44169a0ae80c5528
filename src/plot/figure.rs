use std::ops::Range;

use crate::color::Rgba;

// ---------------------------------------------------------------------------
// Figure – an explicit plot description, drawn later by a backend
// ---------------------------------------------------------------------------

/// How data coordinates map onto the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// x/y axes; `equal_aspect` keeps one data unit the same length on both.
    Planar { equal_aspect: bool },
    /// x/y/z axes seen from `elev` degrees above the x/y plane, rotated
    /// `azim` degrees about z.
    Spatial { elev: f64, azim: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    /// Markers; `size` is the marker area in points².
    Scatter { points: Vec<[f64; 3]>, size: f64 },
    /// Independent line segments; `width` in points.
    Segments {
        segments: Vec<[[f64; 3]; 2]>,
        width: f64,
    },
}

/// One visual series.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub label: Option<String>,
    pub color: Rgba,
    pub kind: LayerKind,
}

impl Layer {
    /// Number of markers or segments.
    pub fn len(&self) -> usize {
        match &self.kind {
            LayerKind::Scatter { points, .. } => points.len(),
            LayerKind::Segments { segments, .. } => segments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn points(&self) -> Box<dyn Iterator<Item = [f64; 3]> + '_> {
        match &self.kind {
            LayerKind::Scatter { points, .. } => Box::new(points.iter().copied()),
            LayerKind::Segments { segments, .. } => {
                Box::new(segments.iter().flat_map(|s| s.iter().copied()))
            }
        }
    }
}

/// Layers are drawn in order, so later layers render on top.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: Option<String>,
    pub projection: Projection,
    pub layers: Vec<Layer>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub z_label: Option<String>,
    pub legend: bool,
}

impl Figure {
    pub fn planar(equal_aspect: bool) -> Self {
        Self::with_projection(Projection::Planar { equal_aspect })
    }

    pub fn spatial(elev: f64, azim: f64) -> Self {
        Self::with_projection(Projection::Spatial { elev, azim })
    }

    fn with_projection(projection: Projection) -> Self {
        Figure {
            title: None,
            projection,
            layers: Vec::new(),
            x_label: None,
            y_label: None,
            z_label: None,
            legend: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_axis_labels(mut self, x: &str, y: &str, z: Option<&str>) -> Self {
        self.x_label = Some(x.to_string());
        self.y_label = Some(y.to_string());
        self.z_label = z.map(str::to_string);
        self
    }

    pub fn with_legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }

    pub fn add_scatter(
        &mut self,
        label: Option<String>,
        points: Vec<[f64; 3]>,
        size: f64,
        color: Rgba,
    ) {
        self.layers.push(Layer {
            label,
            color,
            kind: LayerKind::Scatter { points, size },
        });
    }

    pub fn add_segments(
        &mut self,
        label: Option<String>,
        segments: Vec<[[f64; 3]; 2]>,
        width: f64,
        color: Rgba,
    ) {
        self.layers.push(Layer {
            label,
            color,
            kind: LayerKind::Segments { segments, width },
        });
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self.projection, Projection::Spatial { .. })
    }

    pub fn is_equal_aspect(&self) -> bool {
        matches!(self.projection, Projection::Planar { equal_aspect: true })
    }

    /// Total markers plus segments over all layers.
    pub fn element_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Position of a data point on a flat 2D view.
    pub fn screen_point(&self, p: [f64; 3]) -> [f64; 2] {
        match self.projection {
            Projection::Planar { .. } => [p[0], p[1]],
            Projection::Spatial { elev, azim } => project(p, elev, azim),
        }
    }

    /// Data bounds over every marker and segment endpoint; the unit cube when
    /// the figure holds no finite data.
    pub fn bounds(&self) -> Bounds {
        Bounds::of_points(self.layers.iter().flat_map(Layer::points)).unwrap_or(Bounds {
            min: [0.0; 3],
            max: [1.0; 3],
        })
    }

    /// Copy of the figure with only the layers whose index passes `keep`.
    pub fn retain_layers(&self, keep: impl Fn(usize) -> bool) -> Figure {
        let mut figure = self.clone();
        figure.layers = self
            .layers
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(_, l)| l.clone())
            .collect();
        figure
    }
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Axis-aligned box in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds {
    /// Bounds of the finite points; `None` when there are none.
    pub fn of_points(points: impl IntoIterator<Item = [f64; 3]>) -> Option<Self> {
        let mut bounds: Option<Bounds> = None;
        for p in points {
            if !p.iter().all(|v| v.is_finite()) {
                continue;
            }
            let b = bounds.get_or_insert(Bounds { min: p, max: p });
            for axis in 0..3 {
                b.min[axis] = b.min[axis].min(p[axis]);
                b.max[axis] = b.max[axis].max(p[axis]);
            }
        }
        bounds
    }

    /// Grow every axis by `fraction` of its span on each side; a zero-width
    /// axis becomes `±0.5` around its value.
    pub fn padded(self, fraction: f64) -> Self {
        let mut out = self;
        for axis in 0..3 {
            let span = self.max[axis] - self.min[axis];
            let pad = if span > 0.0 { span * fraction } else { 0.5 };
            out.min[axis] -= pad;
            out.max[axis] += pad;
        }
        out
    }

    pub fn range(&self, axis: usize) -> Range<f64> {
        self.min[axis]..self.max[axis]
    }
}

/// Widen the shorter of `x` / `y` so one data unit covers the same number of
/// pixels on a `width_px` × `height_px` plotting area.
pub fn equal_aspect_ranges(
    x: Range<f64>,
    y: Range<f64>,
    width_px: u32,
    height_px: u32,
) -> (Range<f64>, Range<f64>) {
    let (w, h) = (width_px.max(1) as f64, height_px.max(1) as f64);
    let per_px = ((x.end - x.start) / w).max((y.end - y.start) / h);

    let centered = |r: Range<f64>, px: f64| {
        let mid = (r.start + r.end) / 2.0;
        let half = per_px * px / 2.0;
        (mid - half)..(mid + half)
    };
    (centered(x, w), centered(y, h))
}

/// Orthographic view of `p` from elevation `elev` and azimuth `azim`
/// (degrees); z points up on screen.
pub fn project(p: [f64; 3], elev: f64, azim: f64) -> [f64; 2] {
    let (el, az) = (elev.to_radians(), azim.to_radians());
    let [x, y, z] = p;
    let horizontal = -x * az.sin() + y * az.cos();
    let depth = x * az.cos() + y * az.sin();
    [horizontal, -depth * el.sin() + z * el.cos()]
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn bounds_cover_points_and_segments() {
        let mut fig = Figure::planar(true);
        fig.add_scatter(None, vec![[1.0, 2.0, 0.0], [-1.0, 5.0, 0.0]], 1.0, Rgba::BLUE);
        fig.add_segments(
            None,
            vec![[[0.0, 0.0, 0.0], [4.0, -3.0, 2.0]]],
            0.1,
            Rgba::BLUE,
        );
        let b = fig.bounds();
        assert_eq!(b.min, [-1.0, -3.0, 0.0]);
        assert_eq!(b.max, [4.0, 5.0, 2.0]);
        assert_eq!(fig.element_count(), 3);
    }

    #[test]
    fn bounds_skip_non_finite_points() {
        let b = Bounds::of_points([[f64::NAN, 0.0, 0.0], [1.0, 1.0, f64::INFINITY], [2.0, 3.0, 4.0]])
            .unwrap();
        assert_eq!(b.min, [2.0, 3.0, 4.0]);
        assert!(Bounds::of_points(Vec::new()).is_none());
        assert_eq!(Figure::planar(false).bounds().max, [1.0; 3]);
    }

    #[test]
    fn padding_widens_degenerate_axes() {
        let b = Bounds {
            min: [0.0, 2.0, 0.0],
            max: [10.0, 2.0, 0.0],
        }
        .padded(0.05);
        assert_abs_diff_eq!(b.min[0], -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max[0], 10.5, epsilon = 1e-12);
        assert_abs_diff_eq!(b.min[1], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max[1], 2.5, epsilon = 1e-12);
    }

    #[test]
    fn equal_aspect_matches_units_per_pixel() {
        let (x, y) = equal_aspect_ranges(0.0..10.0, 0.0..2.0, 500, 500);
        assert_abs_diff_eq!(x.end - x.start, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y.end - y.start, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!((y.start + y.end) / 2.0, 1.0, epsilon = 1e-12);

        let (x, y) = equal_aspect_ranges(0.0..1.0, 0.0..1.0, 800, 400);
        assert_abs_diff_eq!((x.end - x.start) / 800.0, (y.end - y.start) / 400.0, epsilon = 1e-12);
    }

    #[test]
    fn top_view_projection_is_planar() {
        let p = project([3.0, -2.0, 7.0], 90.0, -90.0);
        assert_abs_diff_eq!(p[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p[1], -2.0, epsilon = 1e-9);
    }

    #[test]
    fn side_view_shows_height() {
        let p = project([0.0, 0.0, 5.0], 0.0, 0.0);
        assert_abs_diff_eq!(p[1], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn retain_layers_drops_hidden() {
        let mut fig = Figure::spatial(80.0, 45.0);
        fig.add_scatter(Some("a".into()), vec![[0.0; 3]], 1.0, Rgba::BLUE);
        fig.add_scatter(Some("b".into()), vec![[1.0; 3]], 1.0, Rgba::BLUE);
        let kept = fig.retain_layers(|i| i != 0);
        assert_eq!(kept.layers.len(), 1);
        assert_eq!(kept.layers[0].label.as_deref(), Some("b"));
        assert!(kept.is_spatial());
    }
}
