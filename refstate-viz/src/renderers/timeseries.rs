// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Trajectory Chart Renderer
//!
//! Multi-line Canvas 2D chart of a `SimulationTrajectory`. Each series is
//! normalized to its own range so density (J/m³), w and the attractor
//! potential share one plot; the legend carries the real extremes. A failed
//! run gets a red marker at the step that failed.

use std::fmt::Write;
use std::str::FromStr;

use refstate_engine::{ObservableSample, PredictionSummary, SimulationTrajectory};
use serde_json::{json, Value};

use crate::template::{escape_html, stat_row, HtmlDocument, Theme};

/// Which data series to include in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Density,
    Pressure,
    EquationOfState,
    Potential,
    Speed,
    Amplitude,
}

impl Series {
    pub const DEFAULT: [Series; 4] = [
        Series::Density,
        Series::Pressure,
        Series::EquationOfState,
        Series::Potential,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Density => "Density",
            Self::Pressure => "Pressure",
            Self::EquationOfState => "w",
            Self::Potential => "Potential",
            Self::Speed => "Speed",
            Self::Amplitude => "Amplitude",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Density => "#ff6600",
            Self::Pressure => "#00ff88",
            Self::EquationOfState => "#00e5ff",
            Self::Potential => "#ff00ff",
            Self::Speed => "#ffd700",
            Self::Amplitude => "#ff4444",
        }
    }

    fn value(&self, s: &ObservableSample) -> Option<f64> {
        match self {
            Self::Density => Some(s.density),
            Self::Pressure => Some(s.pressure),
            Self::EquationOfState => s.equation_of_state.value(),
            Self::Potential => s.potential,
            Self::Speed => s.speed(),
            Self::Amplitude => Some(s.state.amplitude),
        }
    }
}

impl FromStr for Series {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "density" => Ok(Self::Density),
            "pressure" => Ok(Self::Pressure),
            "w" | "equation_of_state" => Ok(Self::EquationOfState),
            "potential" => Ok(Self::Potential),
            "speed" => Ok(Self::Speed),
            "amplitude" => Ok(Self::Amplitude),
            other => Err(format!("unknown series '{other}'")),
        }
    }
}

/// x coordinate of a sample: scale factor for temporal runs, index otherwise.
fn x_value(s: &ObservableSample) -> f64 {
    s.scale_factor().unwrap_or(s.step as f64)
}

/// (x, y) points of one series; samples without the value are skipped.
fn series_points(trajectory: &SimulationTrajectory, series: Series) -> Vec<(f64, f64)> {
    trajectory
        .samples()
        .iter()
        .filter_map(|s| Some((x_value(s), series.value(s)?)))
        .collect()
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$e}"))
}

/// Render a trajectory chart.
///
/// `summary`, when given, is listed in the side panel.
pub fn render_trajectory(
    trajectory: &SimulationTrajectory,
    series: &[Series],
    summary: Option<&PredictionSummary>,
    theme: Theme,
) -> String {
    let active: Vec<Series> = if series.is_empty() {
        Series::DEFAULT.to_vec()
    } else {
        series.to_vec()
    };

    let temporal = trajectory.samples().iter().any(|s| s.scale_factor().is_some());
    let x_label = if temporal { "scale factor a" } else { "sample" };

    let series_data: Vec<Value> = active
        .iter()
        .map(|s| {
            let points = series_points(trajectory, *s);
            let (lo, hi) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.1), hi.max(p.1))
            });
            json!({
                "label": s.label(),
                "color": s.color(),
                "points": points.iter().map(|p| [p.0, p.1]).collect::<Vec<_>>(),
                "min": if points.is_empty() { 0.0 } else { lo },
                "max": if points.is_empty() { 0.0 } else { hi },
            })
        })
        .collect();

    // Failure marker sits just after the last good sample
    let failure_x = trajectory.failure().map(|f| {
        trajectory
            .last()
            .map_or(f.step as f64, x_value)
    });

    let mut chart_js = String::new();
    let _ = write!(chart_js, r#"
{{
    const canvas = document.getElementById('trajectory-chart');
    const ctx = canvas.getContext('2d');
    const w = canvas.width, h = canvas.height;
    const pad = {{ top: 30, right: 20, bottom: 50, left: 60 }};
    const plotW = w - pad.left - pad.right;
    const plotH = h - pad.top - pad.bottom;

    ctx.fillStyle = '{bg}';
    ctx.fillRect(0, 0, w, h);

    // Grid
    ctx.strokeStyle = '{text}15';
    ctx.lineWidth = 1;
    for (let i = 0; i <= 5; i++) {{
        const y = pad.top + (plotH / 5) * i;
        ctx.beginPath();
        ctx.moveTo(pad.left, y);
        ctx.lineTo(w - pad.right, y);
        ctx.stroke();
    }}

    let xmin = Infinity, xmax = -Infinity;
    for (const s of SERIES) for (const p of s.points) {{
        xmin = Math.min(xmin, p[0]);
        xmax = Math.max(xmax, p[0]);
    }}
    if (!isFinite(xmin)) {{ xmin = 0; xmax = 1; }}
    if (xmax === xmin) xmax = xmin + 1;
    const px = x => pad.left + (x - xmin) / (xmax - xmin) * plotW;

    SERIES.forEach((s, idx) => {{
        const span = s.max - s.min || 1;
        ctx.strokeStyle = s.color;
        ctx.lineWidth = 2;
        ctx.beginPath();
        s.points.forEach((p, i) => {{
            const x = px(p[0]);
            const y = pad.top + plotH * (1 - (p[1] - s.min) / span);
            if (i === 0) ctx.moveTo(x, y); else ctx.lineTo(x, y);
        }});
        ctx.stroke();

        ctx.fillStyle = s.color;
        ctx.font = '11px monospace';
        ctx.textAlign = 'left';
        ctx.fillText(s.label + ' [' + s.min.toExponential(2) + ', ' + s.max.toExponential(2) + ']',
            pad.left + 5 + (idx % 2) * 330, h - 22 + Math.floor(idx / 2) * 14);
    }});

    if (FAILURE_X !== null) {{
        const x = px(FAILURE_X);
        ctx.strokeStyle = '#ff4444';
        ctx.setLineDash([4, 4]);
        ctx.beginPath();
        ctx.moveTo(x, pad.top);
        ctx.lineTo(x, pad.top + plotH);
        ctx.stroke();
        ctx.setLineDash([]);
        ctx.fillStyle = '#ff4444';
        ctx.font = '10px monospace';
        ctx.fillText('failed', x + 4, pad.top + 12);
    }}

    // Axes
    ctx.fillStyle = '{text}88';
    ctx.font = '10px monospace';
    ctx.textAlign = 'center';
    ctx.fillText(xmin.toPrecision(4), pad.left, h - pad.bottom + 15);
    ctx.fillText(xmax.toPrecision(4), pad.left + plotW, h - pad.bottom + 15);
    ctx.fillText('{x_label}', pad.left + plotW / 2, h - pad.bottom + 15);

    ctx.fillStyle = '{accent}';
    ctx.font = 'bold 12px monospace';
    ctx.textAlign = 'left';
    ctx.fillText('Reference-state trajectory: ' + SAMPLE_COUNT + ' samples', pad.left, 18);
}}
"#,
        bg = theme.panel_bg(),
        text = theme.text_color(),
        accent = theme.accent_color(),
        x_label = x_label,
    );

    let mut stats_html = String::new();
    stats_html.push_str("<h3>Trajectory</h3>");
    stats_html.push_str(&stat_row("Samples", &trajectory.len().to_string()));
    let status = if trajectory.is_complete() {
        "completed"
    } else if trajectory.failure().is_some() {
        "failed"
    } else {
        "running"
    };
    stats_html.push_str(&stat_row("Status", status));
    if let Some(f) = trajectory.failure() {
        let _ = write!(
            stats_html,
            r#"<div class="stat-row failure"><span class="key">Step {}</span><span class="val">{}</span></div>"#,
            f.step,
            escape_html(&f.message)
        );
    }
    if let Some(s) = summary {
        stats_html.push_str("<h3>Predictions</h3>");
        stats_html.push_str(&stat_row("ΔH/H (mean)", &fmt_opt(s.mean_hubble_deviation, 3)));
        if let Some(band) = s.equation_of_state_band {
            stats_html.push_str(&stat_row(
                "w 16/50/84",
                &format!("{:.6} / {:.6} / {:.6}", band.p16, band.p50, band.p84),
            ));
        }
        if let Some(cpl) = s.cpl {
            stats_html.push_str(&stat_row("w0, wa", &format!("{:.6}, {:.3e}", cpl.w0, cpl.wa)));
        }
        stats_html.push_str(&stat_row("mean |v| (m/s)", &fmt_opt(s.mean_speed, 3)));
    }

    let mut doc = HtmlDocument::new("Reference State - Trajectory", theme);
    doc.add_panel("stats-panel", &stats_html, "300px");
    doc.add_chart("trajectory-chart", 860, 420);
    doc.add_data("SERIES", Value::Array(series_data));
    doc.add_data("FAILURE_X", failure_x.map_or(Value::Null, |x| json!(x)));
    doc.add_data("SAMPLE_COUNT", json!(trajectory.len()));
    doc.set_chart_js(&chart_js);

    doc.render()
}
