use std::fmt;

use serde::Deserialize;

use crate::color::Rgba;

/// Truth labels above this value count as real edges.
pub const TRUTH_CUT: f64 = 0.5;

// ---------------------------------------------------------------------------
// Confusion categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfusionCategory {
    TruePositive,
    FalsePositive,
    TrueNegative,
    FalseNegative,
}

impl ConfusionCategory {
    /// Canonical order: summary lines are printed in this order and layers
    /// are drawn in reverse, leaving true positives on top.
    pub const ALL: [ConfusionCategory; 4] = [
        ConfusionCategory::TruePositive,
        ConfusionCategory::FalsePositive,
        ConfusionCategory::TrueNegative,
        ConfusionCategory::FalseNegative,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ConfusionCategory::TruePositive => "True Positive",
            ConfusionCategory::FalsePositive => "False Positive",
            ConfusionCategory::TrueNegative => "True Negative",
            ConfusionCategory::FalseNegative => "False Negative",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Whether an edge with `prediction` and `truth` belongs to this category.
    ///
    /// NaN in either input matches no category.
    pub fn matches(self, prediction: f64, truth: f64, threshold: f64) -> bool {
        let (passed, failed) = (prediction > threshold, prediction <= threshold);
        let (real, fake) = (truth > TRUTH_CUT, truth <= TRUTH_CUT);
        match self {
            ConfusionCategory::TruePositive => passed && real,
            ConfusionCategory::TrueNegative => failed && fake,
            ConfusionCategory::FalsePositive => passed && fake,
            ConfusionCategory::FalseNegative => failed && real,
        }
    }

    pub fn classify(prediction: f64, truth: f64, threshold: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.matches(prediction, truth, threshold))
    }
}

// ---------------------------------------------------------------------------
// Colours and draw order
// ---------------------------------------------------------------------------

/// Colour of every category. A category with zero alpha is not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub true_positive: Rgba,
    pub false_positive: Rgba,
    pub true_negative: Rgba,
    pub false_negative: Rgba,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            true_positive: Rgba::new(0.0, 1.0, 0.0, 1.0),
            false_positive: Rgba::new(1.0, 0.0, 0.0, 1.0),
            true_negative: Rgba::new(0.0, 0.0, 0.0, 0.1),
            false_negative: Rgba::new(1.0, 1.0, 0.0, 1.0),
        }
    }
}

impl ColorScheme {
    pub fn color(&self, category: ConfusionCategory) -> Rgba {
        match category {
            ConfusionCategory::TruePositive => self.true_positive,
            ConfusionCategory::FalsePositive => self.false_positive,
            ConfusionCategory::TrueNegative => self.true_negative,
            ConfusionCategory::FalseNegative => self.false_negative,
        }
    }
}

/// A category with its legend label and colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryStyle {
    pub category: ConfusionCategory,
    pub label: &'static str,
    pub color: Rgba,
}

/// Category definitions in canonical order.
pub fn category_styles(scheme: &ColorScheme) -> Vec<CategoryStyle> {
    ConfusionCategory::ALL
        .iter()
        .map(|&category| CategoryStyle {
            category,
            label: category.label(),
            color: scheme.color(category),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Per-category edge counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionSummary {
    counts: [usize; 4],
    /// Edges whose prediction or truth was NaN.
    pub unclassified: usize,
}

impl ConfusionSummary {
    pub fn record(&mut self, category: Option<ConfusionCategory>) {
        match category {
            Some(c) => self.counts[c.index()] += 1,
            None => self.unclassified += 1,
        }
    }

    pub fn count(&self, category: ConfusionCategory) -> usize {
        self.counts[category.index()]
    }

    /// Classified edges.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl fmt::Display for ConfusionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Summary:")?;
        for category in ConfusionCategory::ALL {
            write!(f, "\n{}: {}", category.label(), self.count(category))?;
        }
        if self.unclassified > 0 {
            write!(f, "\nUnclassified: {}", self.unclassified)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confident_real_edge_is_true_positive() {
        assert_eq!(
            ConfusionCategory::classify(0.9, 1.0, 0.5),
            Some(ConfusionCategory::TruePositive)
        );
    }

    #[test]
    fn boundary_values_fall_on_the_negative_side() {
        use ConfusionCategory::*;
        assert_eq!(ConfusionCategory::classify(0.5, 1.0, 0.5), Some(FalseNegative));
        assert_eq!(ConfusionCategory::classify(0.5, 0.5, 0.5), Some(TrueNegative));
        assert_eq!(ConfusionCategory::classify(0.51, 0.5, 0.5), Some(FalsePositive));
    }

    #[test]
    fn partition_is_total_and_exclusive() {
        let values = [-1.0, 0.0, 0.2, 0.5, 0.50001, 0.8, 1.0, 3.0];
        for &threshold in &[0.1, 0.5, 0.9] {
            let mut summary = ConfusionSummary::default();
            let mut n = 0;
            for &p in &values {
                for &t in &values {
                    let matching = ConfusionCategory::ALL
                        .iter()
                        .filter(|c| c.matches(p, t, threshold))
                        .count();
                    assert_eq!(matching, 1, "p={p} t={t} threshold={threshold}");
                    summary.record(ConfusionCategory::classify(p, t, threshold));
                    n += 1;
                }
            }
            assert_eq!(summary.total(), n);
            assert_eq!(summary.unclassified, 0);
        }
    }

    #[test]
    fn nan_is_unclassified() {
        assert_eq!(ConfusionCategory::classify(f64::NAN, 1.0, 0.5), None);
        assert_eq!(ConfusionCategory::classify(0.7, f64::NAN, 0.5), None);
    }

    #[test]
    fn summary_text() {
        let mut summary = ConfusionSummary::default();
        summary.record(Some(ConfusionCategory::TruePositive));
        assert_eq!(
            summary.to_string(),
            "Summary:\nTrue Positive: 1\nFalse Positive: 0\nTrue Negative: 0\nFalse Negative: 0"
        );

        summary.record(None);
        assert!(summary.to_string().ends_with("Unclassified: 1"));
    }

    #[test]
    fn styles_follow_canonical_order() {
        let scheme = ColorScheme::default();
        let styles = category_styles(&scheme);
        let labels: Vec<&str> = styles.iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            ["True Positive", "False Positive", "True Negative", "False Negative"]
        );
        assert_eq!(styles[2].color.a, 0.1);
    }

    #[test]
    fn scheme_deserializes_by_category_name() {
        let scheme: ColorScheme =
            serde_json::from_str(r#"{"true_negative": [0, 0, 0, 0]}"#).unwrap();
        assert!(!scheme.true_negative.is_visible());
        assert_eq!(scheme.true_positive, ColorScheme::default().true_positive);
    }
}
