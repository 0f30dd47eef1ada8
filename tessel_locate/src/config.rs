// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-grid tuning knobs.

use tessel_celltree::BuildConfig;

use crate::polyhedron::PolyhedronEncoding;

/// Settings shared by all grid kinds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocateConfig {
    /// Parameters for the lazily built celltree.
    pub celltree: BuildConfig,
    /// Slack for the half-space test of convex cells, in coordinate units.
    pub convex_tolerance: f32,
    /// Largest distance from a planar cell's plane that still counts as on it.
    pub plane_tolerance: f32,
    /// Face layout of polyhedral cells.
    pub polyhedron_encoding: PolyhedronEncoding,
    /// Run the celltree's validation right after building it.
    ///
    /// Defaults to on in debug builds.
    pub validate_index: bool,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            celltree: BuildConfig::default(),
            convex_tolerance: 1e-5,
            plane_tolerance: 1e-4,
            polyhedron_encoding: PolyhedronEncoding::default(),
            validate_index: cfg!(debug_assertions),
        }
    }
}

impl LocateConfig {
    /// Use `celltree` when building the index.
    #[must_use]
    pub fn with_celltree(mut self, celltree: BuildConfig) -> Self {
        self.celltree = celltree;
        self
    }

    /// Set the convex half-space slack.
    #[must_use]
    pub fn with_convex_tolerance(mut self, tolerance: f32) -> Self {
        self.convex_tolerance = tolerance.max(0.0);
        self
    }

    /// Set the distance tolerance for planar cells.
    #[must_use]
    pub fn with_plane_tolerance(mut self, tolerance: f32) -> Self {
        self.plane_tolerance = tolerance.max(0.0);
        self
    }

    /// Set the face layout of polyhedral cells.
    #[must_use]
    pub fn with_polyhedron_encoding(mut self, encoding: PolyhedronEncoding) -> Self {
        self.polyhedron_encoding = encoding;
        self
    }

    /// Turn post-build validation on or off.
    #[must_use]
    pub fn with_validate_index(mut self, validate: bool) -> Self {
        self.validate_index = validate;
        self
    }
}
