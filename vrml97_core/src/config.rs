// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene configuration.

/// Tunables for a [`Scene`](crate::scene::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneConfig {
    /// Maximum number of emissions processed in one cascade. When exceeded,
    /// the remaining queue is discarded and the truncation is traced.
    pub max_cascade_events: u32,
    /// Drop a repeated emission from the same eventOut with the same
    /// timestamp within one cascade.
    pub break_event_loops: bool,
    /// Synthesize `set_bind TRUE` into the first node of each bindable class
    /// during [`Scene::initialize`](crate::scene::Scene::initialize).
    pub bind_first_on_initialize: bool,
    /// Cull grouping nodes against the viewer's view volume while rendering.
    pub cull: bool,
    /// Ask the viewer to draw each grouping node's bounding sphere.
    pub draw_bounding_spheres: bool,
}

impl SceneConfig {
    /// Configuration for an interactive browser.
    #[must_use]
    pub const fn interactive() -> Self {
        Self {
            max_cascade_events: 100_000,
            break_event_loops: true,
            bind_first_on_initialize: true,
            cull: true,
            draw_bounding_spheres: false,
        }
    }

    /// Configuration for offline processing and tests: no culling, a tighter
    /// cascade cap.
    #[must_use]
    pub const fn headless() -> Self {
        Self {
            max_cascade_events: 10_000,
            break_event_loops: true,
            bind_first_on_initialize: true,
            cull: false,
            draw_bounding_spheres: false,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_interactive() {
        assert_eq!(SceneConfig::default(), SceneConfig::interactive());
    }

    #[test]
    fn headless_skips_culling() {
        let c = SceneConfig::headless();
        assert!(!c.cull, "headless does not cull");
        assert!(c.max_cascade_events < SceneConfig::interactive().max_cascade_events);
    }
}
