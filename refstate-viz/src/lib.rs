// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

pub mod color;
pub mod template;
pub mod renderers;

pub use template::Theme;
pub use renderers::{render_domain_map, render_trajectory, Series};
