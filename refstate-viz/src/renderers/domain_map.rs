// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Domain Map Renderer
//!
//! Heatmap of one z-slice of a classified cosmic web: each domain in its own
//! color, filament walls dark, with the raw phase field drawn alongside.

use refstate_field::{CosmicWebModel, MEGAPARSEC};
use serde_json::json;

use crate::color::{cell_color_hex, phase_color, rgb_to_hex};
use crate::template::{stat_row, HtmlDocument, Theme};

const MAP_SIZE: u32 = 480;

/// Render slice `z_index` (clamped to the grid) of a cosmic-web model.
pub fn render_domain_map(web: &CosmicWebModel, z_index: usize, theme: Theme) -> String {
    let domain = web.field().domain();
    let [nx, ny, nz] = domain.dims();
    let k = z_index.min(nz - 1);

    let mut domain_rows = Vec::with_capacity(ny);
    let mut phase_rows = Vec::with_capacity(ny);
    for j in 0..ny {
        let mut cells = Vec::with_capacity(nx);
        let mut phases = Vec::with_capacity(nx);
        for i in 0..nx {
            let idx = domain.index(i, j, k);
            cells.push(cell_color_hex(&web.classify_cell(idx)));
            let (r, g, b) = phase_color(web.field().phase(idx));
            phases.push(rgb_to_hex(r, g, b));
        }
        domain_rows.push(cells);
        phase_rows.push(phases);
    }

    let chart_js = r#"
function drawGrid(id, rows) {
    const canvas = document.getElementById(id);
    const ctx = canvas.getContext('2d');
    const ny = rows.length, nx = rows[0].length;
    const cw = canvas.width / nx, ch = canvas.height / ny;
    // Row 0 is the lowest y; draw it at the bottom
    rows.forEach((row, j) => row.forEach((color, i) => {
        ctx.fillStyle = color;
        ctx.fillRect(i * cw, canvas.height - (j + 1) * ch, Math.ceil(cw), Math.ceil(ch));
    }));
}
drawGrid('domain-map', DOMAINS);
drawGrid('phase-map', PHASES);
"#;

    let radii: Vec<f64> = (0..web.domain_count() as u32)
        .filter_map(|id| web.domain_statistics(id).ok())
        .map(|s| s.equivalent_radius)
        .collect();
    let largest = radii.iter().copied().fold(0.0f64, f64::max);

    let mut stats_html = String::new();
    stats_html.push_str("<h3>Cosmic Web</h3>");
    stats_html.push_str(&stat_row("Grid", &format!("{nx} × {ny} × {nz}")));
    stats_html.push_str(&stat_row("Slice", &format!("z = {k}")));
    stats_html.push_str(&stat_row(
        "Spacing",
        &format!("{:.2} Mpc", domain.spacing() / MEGAPARSEC),
    ));
    stats_html.push_str(&stat_row("Domains", &web.domain_count().to_string()));
    stats_html.push_str(&stat_row(
        "Filament fraction",
        &format!("{:.3}", web.filament_fraction()),
    ));
    stats_html.push_str(&stat_row(
        "Largest radius",
        &format!("{:.2} Mpc", largest / MEGAPARSEC),
    ));
    if let Some(f) = web.filament_statistics() {
        stats_html.push_str(&stat_row(
            "Filament δ",
            &format!("{:+.4}", f.density_contrast),
        ));
    }

    let mut doc = HtmlDocument::new("Reference State - Domain Map", theme);
    doc.add_panel("stats-panel", &stats_html, "260px");
    doc.add_chart("domain-map", MAP_SIZE, MAP_SIZE);
    doc.add_chart("phase-map", MAP_SIZE, MAP_SIZE);
    doc.set_extra_css("canvas { display: inline-block; image-rendering: pixelated; }");
    doc.add_data("DOMAINS", json!(domain_rows));
    doc.add_data("PHASES", json!(phase_rows));
    doc.set_chart_js(chart_js);

    doc.render()
}
