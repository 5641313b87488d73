// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Color mapping for trajectory charts and domain maps.
//!
//! Colors are (r, g, b) tuples in [0.0, 1.0] or "#RRGGBB" strings for
//! direct embedding.

use refstate_field::CellClass;

/// Filament walls on a domain map.
pub const FILAMENT_COLOR: &str = "#1b1b24";

/// Golden-ratio hue step so neighbouring domain ids get distant hues.
const HUE_STEP: f64 = 137.507_764;

/// Distinct color for a domain id.
pub fn domain_color(id: u32) -> (f64, f64, f64) {
    let hue = (id as f64 * HUE_STEP).rem_euclid(360.0);
    let lightness = if id % 2 == 0 { 0.55 } else { 0.45 };
    hsl_to_rgb(hue, 0.7, lightness)
}

pub fn cell_color_hex(class: &CellClass) -> String {
    match class {
        CellClass::Domain(id) => {
            let (r, g, b) = domain_color(*id);
            rgb_to_hex(r, g, b)
        }
        CellClass::Filament => FILAMENT_COLOR.to_string(),
    }
}

/// Map a phase in [0, 2π) to a fully saturated hue.
pub fn phase_color(phase: f64) -> (f64, f64, f64) {
    let hue = (phase / std::f64::consts::TAU).rem_euclid(1.0) * 360.0;
    hsl_to_rgb(hue, 1.0, 0.5)
}

/// Convert (r, g, b) in [0,1] to a CSS hex color string "#RRGGBB".
pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    let ri = (r.clamp(0.0, 1.0) * 255.0).round() as u8;
    let gi = (g.clamp(0.0, 1.0) * 255.0).round() as u8;
    let bi = (b.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", ri, gi, bi)
}

/// HSL to RGB conversion.
/// h: [0, 360), s: [0, 1], l: [0, 1]
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h_norm = h / 360.0;

    (
        hue_to_rgb(p, q, h_norm + 1.0 / 3.0),
        hue_to_rgb(p, q, h_norm),
        hue_to_rgb(p, q, h_norm - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_hex() {
        assert_eq!(rgb_to_hex(1.0, 0.0, 0.0), "#ff0000");
        assert_eq!(rgb_to_hex(0.0, 1.0, 0.0), "#00ff00");
        assert_eq!(rgb_to_hex(0.0, 0.0, 2.0), "#0000ff");
    }

    #[test]
    fn test_hsl_to_rgb_red() {
        let (r, g, b) = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((r - 1.0).abs() < 1e-12);
        assert!(g.abs() < 1e-12);
        assert!(b.abs() < 1e-12);
    }

    #[test]
    fn test_adjacent_domains_differ() {
        for id in 0..20 {
            assert_ne!(
                cell_color_hex(&CellClass::Domain(id)),
                cell_color_hex(&CellClass::Domain(id + 1))
            );
        }
        assert_eq!(cell_color_hex(&CellClass::Filament), FILAMENT_COLOR);
    }

    #[test]
    fn test_phase_color_wraps() {
        let a = phase_color(0.0);
        let b = phase_color(std::f64::consts::TAU);
        assert!((a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9);
    }
}
