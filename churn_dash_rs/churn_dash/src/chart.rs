//! Usage bar chart and risk doughnut. The renderer owns both chart handles for
//! its whole lifetime: a chart is built on the first render and only its data is
//! replaced afterwards.

use serde_json::{json, Value as JsonValue};

use crate::wire::PredictionRequest;

/// Display-scale divisor applied to total charges so the three bars are comparable.
pub const TOTAL_CHARGES_SCALE: f64 = 20.0;

pub const USAGE_LABELS: [&str; 3] = ["Tenure (Mos)", "Monthly ($)", "Total ($/20)"];
pub const USAGE_COLORS: [&str; 3] = ["#d04a02", "#5d4037", "#ff9800"];
pub const RISK_LABELS: [&str; 2] = ["Churn Risk %", "Retention Chance %"];
pub const RISK_COLORS: [&str; 2] = ["#d32f2f", "#28a745"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Usage,
    Risk,
}

impl ChartKind {
    /// Id of the canvas the chart is drawn into.
    pub fn canvas_id(self) -> &'static str {
        match self {
            ChartKind::Usage => "usageChart",
            ChartKind::Risk => "riskChart",
        }
    }

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            ChartKind::Usage => &USAGE_LABELS,
            ChartKind::Risk => &RISK_LABELS,
        }
    }
}

/// `[tenure, monthly, total / 20]`.
pub fn usage_series(request: &PredictionRequest) -> [f64; 3] {
    [
        request.tenure as f64,
        request.monthly_charges,
        request.total_charges / TOTAL_CHARGES_SCALE,
    ]
}

/// `[probability, 100 - probability]`, recomputed from the probability alone.
pub fn risk_split(probability: f64) -> [f64; 2] {
    [probability, 100.0 - probability]
}

/// Everything needed to build a chart the first time.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub data: Vec<f64>,
}

impl ChartSpec {
    pub fn usage(request: &PredictionRequest) -> Self {
        Self {
            kind: ChartKind::Usage,
            data: usage_series(request).to_vec(),
        }
    }

    pub fn risk(probability: f64) -> Self {
        Self {
            kind: ChartKind::Risk,
            data: risk_split(probability).to_vec(),
        }
    }

    /// Chart.js configuration object for this chart.
    pub fn to_chartjs_config(&self) -> JsonValue {
        match self.kind {
            ChartKind::Usage => json!({
                "type": "bar",
                "data": {
                    "labels": USAGE_LABELS,
                    "datasets": [{
                        "label": "Current Customer",
                        "data": self.data,
                        "backgroundColor": USAGE_COLORS,
                        "borderRadius": 4
                    }]
                },
                "options": {
                    "responsive": true,
                    "maintainAspectRatio": false,
                    "plugins": { "legend": { "display": false } },
                    "scales": { "y": { "beginAtZero": true } }
                }
            }),
            ChartKind::Risk => json!({
                "type": "doughnut",
                "data": {
                    "labels": RISK_LABELS,
                    "datasets": [{
                        "data": self.data,
                        "backgroundColor": RISK_COLORS,
                        "borderWidth": 0,
                        "hoverOffset": 4
                    }]
                },
                "options": {
                    "responsive": true,
                    "maintainAspectRatio": false,
                    "cutout": "70%",
                    "plugins": { "legend": { "position": "bottom" } }
                }
            }),
        }
    }
}

/// Drawing backend for the renderer: Chart.js in the browser, text in the CLI.
pub trait ChartSurface {
    type Handle;

    /// Build a chart. `None` means the surface could not create it yet (for
    /// example the canvas is not mounted) and the next render tries again.
    fn create(&mut self, spec: &ChartSpec) -> Option<Self::Handle>;

    /// Replace the data of an existing chart and redraw it.
    fn update(&mut self, handle: &mut Self::Handle, kind: ChartKind, data: &[f64]);
}

pub struct ChartRenderer<S: ChartSurface> {
    surface: S,
    usage: Option<S::Handle>,
    risk: Option<S::Handle>,
}

impl<S: ChartSurface> ChartRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            usage: None,
            risk: None,
        }
    }

    pub fn render(&mut self, request: &PredictionRequest, probability: f64) {
        draw(&mut self.surface, &mut self.usage, ChartSpec::usage(request));
        draw(&mut self.surface, &mut self.risk, ChartSpec::risk(probability));
    }

    pub fn is_initialized(&self) -> bool {
        self.usage.is_some() && self.risk.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

fn draw<S: ChartSurface>(surface: &mut S, slot: &mut Option<S::Handle>, spec: ChartSpec) {
    match slot {
        Some(handle) => surface.update(handle, spec.kind, &spec.data),
        None => *slot = surface.create(&spec),
    }
}
