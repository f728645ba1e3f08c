// Chart payloads for the dashboard pages (rendered client-side by Chart.js)
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

/// Translucent fill colors and their opaque border counterparts, one per entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Palette {
    pub background: Vec<String>,
    pub border: Vec<String>,
}

/// `n` hues spread evenly around the color wheel, offset by half a step.
pub fn hues(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let step = 360.0 / n as f64;
    (0..n).map(|i| step * i as f64 + step / 2.0).collect()
}

pub fn palette(n: usize) -> Palette {
    let hues = hues(n);
    Palette {
        background: hues
            .iter()
            .map(|h| format!("hsla({:.1}, 70%, 55%, 0.2)", h))
            .collect(),
        border: hues
            .iter()
            .map(|h| format!("hsla({:.1}, 70%, 55%, 1)", h))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub label: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub background_color: Vec<String>,
    pub border_color: Vec<String>,
    /// Pie charts need a legend to be readable; the other kinds label their axes instead.
    pub legend: bool,
    pub display_axes: bool,
}

impl Chart {
    /// Builds parallel label/value series from aggregate rows.
    pub fn build<R, L, V>(
        title: &str,
        label: &str,
        kind: ChartKind,
        rows: &[R],
        label_of: L,
        value_of: V,
    ) -> Self
    where
        L: Fn(&R) -> String,
        V: Fn(&R) -> f64,
    {
        let colors = palette(rows.len());
        let is_pie = kind == ChartKind::Pie;
        Self {
            title: title.to_string(),
            label: label.to_string(),
            kind,
            labels: rows.iter().map(&label_of).collect(),
            data: rows.iter().map(&value_of).collect(),
            background_color: colors.background,
            border_color: colors.border,
            legend: is_pie,
            display_axes: !is_pie,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Chart.js configuration object for this chart.
    pub fn to_chartjs(&self) -> Value {
        json!({
            "type": self.kind,
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "label": self.label,
                    "data": self.data,
                    "backgroundColor": self.background_color,
                    "borderColor": self.border_color,
                    "borderWidth": 1
                }]
            },
            "options": {
                "plugins": {
                    "title": { "display": true, "text": self.title },
                    "legend": { "display": self.legend }
                },
                "scales": {
                    "x": { "display": self.display_axes },
                    "y": { "display": self.display_axes, "beginAtZero": true }
                }
            }
        })
    }
}
