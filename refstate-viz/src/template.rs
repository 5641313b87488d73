// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! HTML document template for reference-state charts.
//!
//! Produces self-contained pages: inline CSS, Canvas 2D drawing code and the
//! plotted data embedded as JSON. No external scripts are loaded.

use std::fmt::Write;

use serde_json::Value;

/// An overlay panel anchored to the top-right corner of the page.
#[derive(Debug, Clone)]
pub struct HudPanel {
    pub id: String,
    pub content_html: String,
    /// CSS width, e.g. "300px"
    pub width: String,
}

/// A 2D canvas element for chart rendering.
#[derive(Debug, Clone)]
pub struct ChartCanvas {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn bg_color(&self) -> &'static str {
        match self {
            Self::Dark => "#0a0a0f",
            Self::Light => "#f0f0f5",
        }
    }

    pub fn text_color(&self) -> &'static str {
        match self {
            Self::Dark => "#e0e0e0",
            Self::Light => "#1a1a2e",
        }
    }

    pub fn panel_bg(&self) -> &'static str {
        match self {
            Self::Dark => "rgba(10, 10, 20, 0.85)",
            Self::Light => "rgba(240, 240, 245, 0.9)",
        }
    }

    pub fn accent_color(&self) -> &'static str {
        match self {
            Self::Dark => "#00e5ff",
            Self::Light => "#0066cc",
        }
    }
}

/// Escape text for HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Builder for self-contained HTML chart documents.
pub struct HtmlDocument {
    title: String,
    theme: Theme,
    panels: Vec<HudPanel>,
    charts: Vec<ChartCanvas>,
    data: Vec<(String, Value)>,
    chart_js: String,
    extra_css: String,
}

impl HtmlDocument {
    pub fn new(title: &str, theme: Theme) -> Self {
        Self {
            title: title.to_string(),
            theme,
            panels: Vec::new(),
            charts: Vec::new(),
            data: Vec::new(),
            chart_js: String::new(),
            extra_css: String::new(),
        }
    }

    pub fn add_panel(&mut self, id: &str, content: &str, width: &str) {
        self.panels.push(HudPanel {
            id: id.to_string(),
            content_html: content.to_string(),
            width: width.to_string(),
        });
    }

    pub fn add_chart(&mut self, id: &str, width: u32, height: u32) {
        self.charts.push(ChartCanvas {
            id: id.to_string(),
            width,
            height,
        });
    }

    /// Embed `value` as a top-level JS constant named `name`.
    pub fn add_data(&mut self, name: &str, value: Value) {
        self.data.push((name.to_string(), value));
    }

    pub fn set_chart_js(&mut self, js: &str) {
        self.chart_js = js.to_string();
    }

    pub fn set_extra_css(&mut self, css: &str) {
        self.extra_css = css.to_string();
    }

    /// Render the complete self-contained HTML document.
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(16384);

        let _ = write!(html, r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
"#, title = escape_html(&self.title));

        let _ = write!(html, r#"<style>
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
body {{
    background: {bg};
    color: {text};
    font-family: 'Segoe UI', 'Helvetica Neue', Arial, sans-serif;
    min-height: 100vh;
}}
.hud-panel {{
    position: absolute;
    background: {panel_bg};
    border: 1px solid {accent}44;
    border-radius: 8px;
    padding: 12px 16px;
    font-size: 13px;
    line-height: 1.5;
    z-index: 10;
    box-shadow: 0 4px 24px rgba(0, 0, 0, 0.4);
}}
.hud-panel h3 {{
    color: {accent};
    font-size: 11px;
    text-transform: uppercase;
    letter-spacing: 1.5px;
    margin-bottom: 6px;
    font-weight: 600;
}}
.stat-row {{
    display: flex;
    justify-content: space-between;
    gap: 12px;
    padding: 2px 0;
}}
.stat-row .key {{ color: {text}88; }}
.stat-row .val {{ color: {accent}; font-weight: 600; font-variant-numeric: tabular-nums; }}
.stat-row.failure .val {{ color: #ff4444; }}
canvas {{
    display: block;
    margin: 40px;
    border: 1px solid {accent}33;
    border-radius: 8px;
}}
{extra_css}
</style>
"#,
            bg = self.theme.bg_color(),
            text = self.theme.text_color(),
            panel_bg = self.theme.panel_bg(),
            accent = self.theme.accent_color(),
            extra_css = self.extra_css,
        );

        html.push_str("</head>\n<body>\n");

        for panel in &self.panels {
            let _ = write!(html, r#"<div id="{id}" class="hud-panel" style="top: 10px; right: 10px; width: {width};">
{content}
</div>
"#,
                id = panel.id,
                width = panel.width,
                content = panel.content_html,
            );
        }

        for chart in &self.charts {
            let _ = write!(html, r#"<canvas id="{id}" width="{w}" height="{h}"></canvas>
"#,
                id = chart.id,
                w = chart.width,
                h = chart.height,
            );
        }

        html.push_str("<script>\n");
        for (name, value) in &self.data {
            // `</` cannot appear inside a script element
            let json = value.to_string().replace("</", "<\\/");
            let _ = writeln!(html, "const {name} = {json};");
        }
        if !self.chart_js.is_empty() {
            html.push_str("\n// === Chart ===\n");
            html.push_str(&self.chart_js);
        }
        html.push_str("\n</script>\n</body>\n</html>");

        html
    }
}

/// One `key: value` row for a stats panel.
pub fn stat_row(key: &str, value: &str) -> String {
    format!(
        r#"<div class="stat-row"><span class="key">{}</span><span class="val">{}</span></div>"#,
        escape_html(key),
        escape_html(value)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_document_renders() {
        let doc = HtmlDocument::new("Test", Theme::Dark);
        let html = doc.render();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("<title>Test</title>"));
        assert!(!html.contains("<script src="));
    }

    #[test]
    fn test_panels_rendered() {
        let mut doc = HtmlDocument::new("Test", Theme::Dark);
        doc.add_panel("stats", "<h3>Stats</h3>", "280px");
        let html = doc.render();
        assert!(html.contains("id=\"stats\""));
        assert!(html.contains("right: 10px; width: 280px;"));
        assert!(html.contains("<h3>Stats</h3>"));
    }

    #[test]
    fn test_data_embedded_as_json() {
        let mut doc = HtmlDocument::new("Test", Theme::Light);
        doc.add_data("POINTS", json!([[1.0, 2.5], [2.0, -0.5]]));
        doc.add_data("LABEL", json!("</script>"));
        let html = doc.render();
        assert!(html.contains("const POINTS = [[1.0,2.5],[2.0,-0.5]];"));
        assert!(html.contains(r#"const LABEL = "<\/script>";"#));
        assert!(html.contains("#f0f0f5"));
    }

    #[test]
    fn test_title_escaped() {
        let html = HtmlDocument::new("a < b", Theme::Dark).render();
        assert!(html.contains("<title>a &lt; b</title>"));
    }
}
