#![forbid(unsafe_code)]

//! Persisted layout state schema.
//!
//! [`LayoutState`] is saved and loaded as one JSON blob. The blob carries
//! [`LAYOUT_SCHEMA_VERSION`]; a loader rejects any other version, along with
//! blobs holding non-finite positions or non-positive scales, and the store
//! falls back to defaults for the whole blob.
//!
//! # Migration
//!
//! Loading is additive. Widgets that no longer exist are dropped, duplicate
//! ids keep their first entry, and widgets missing from the blob are appended
//! with their defaults in declaration order.

use hudkit_core::{Point, WidgetId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::{DescriptorSet, WidgetDescriptor, WidgetKind};
use crate::resolver::DefaultLayout;
use crate::settings::LayoutSettings;

/// Current layout blob schema version.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

/// Grid spacing used until the user picks one.
pub const DEFAULT_GRID_SIZE: f64 = 10.0;

/// Live, persisted configuration of one widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWidgetConfig {
    pub id: WidgetId,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub position: Point,
    pub visible: bool,
    pub scale: f64,
}

impl ResolvedWidgetConfig {
    /// Configuration of a widget placed at its default origin.
    #[must_use]
    pub fn from_default(descriptor: &WidgetDescriptor, position: Point) -> Self {
        Self {
            id: descriptor.id.clone(),
            kind: descriptor.kind,
            position,
            visible: descriptor.default_visible,
            scale: descriptor.default_scale,
        }
    }
}

/// Whole mutable layout state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub widgets: Vec<ResolvedWidgetConfig>,
    /// Session-only.
    #[serde(skip)]
    pub edit_mode: bool,
    #[serde(default)]
    pub snap_to_grid: bool,
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
    #[serde(default)]
    pub settings: LayoutSettings,
    #[serde(default)]
    pub widgets_distributed: bool,
}

fn default_schema_version() -> u16 {
    LAYOUT_SCHEMA_VERSION
}

fn default_grid_size() -> f64 {
    DEFAULT_GRID_SIZE
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            schema_version: LAYOUT_SCHEMA_VERSION,
            widgets: Vec::new(),
            edit_mode: false,
            snap_to_grid: false,
            grid_size: DEFAULT_GRID_SIZE,
            settings: LayoutSettings::default(),
            widgets_distributed: false,
        }
    }
}

/// Reasons a persisted blob is discarded.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("layout blob is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported layout schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error("widget `{id}` has a non-finite position")]
    NonFinitePosition { id: WidgetId },
    #[error("widget `{id}` has invalid scale {scale}")]
    InvalidScale { id: WidgetId, scale: f64 },
    #[error("invalid grid size {0}")]
    InvalidGridSize(f64),
}

/// Widget configs for every descriptor at its resolved default, in
/// declaration order. Widgets missing from `defaults` start at the origin.
#[must_use]
pub fn default_widgets(
    descriptors: &DescriptorSet,
    defaults: &DefaultLayout,
) -> Vec<ResolvedWidgetConfig> {
    descriptors
        .iter()
        .map(|d| {
            let position = defaults.position(d.id.as_str()).unwrap_or(Point::ORIGIN);
            ResolvedWidgetConfig::from_default(d, position)
        })
        .collect()
}

impl LayoutState {
    /// Fresh state with every widget at its default, not yet distributed.
    #[must_use]
    pub fn fresh(descriptors: &DescriptorSet, defaults: &DefaultLayout) -> Self {
        Self {
            widgets: default_widgets(descriptors, defaults),
            ..Self::default()
        }
    }

    /// Parse and validate a persisted blob.
    pub fn from_json(blob: &str) -> Result<Self, StateError> {
        let state: Self = serde_json::from_str(blob)?;
        state.validate()?;
        Ok(state)
    }

    /// Serialize for persistence. Session-only fields are omitted.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Check schema version and numeric sanity.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.schema_version != LAYOUT_SCHEMA_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: self.schema_version,
                expected: LAYOUT_SCHEMA_VERSION,
            });
        }
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(StateError::InvalidGridSize(self.grid_size));
        }
        for widget in &self.widgets {
            if !widget.position.is_finite() {
                return Err(StateError::NonFinitePosition {
                    id: widget.id.clone(),
                });
            }
            if !(widget.scale.is_finite() && widget.scale > 0.0) {
                return Err(StateError::InvalidScale {
                    id: widget.id.clone(),
                    scale: widget.scale,
                });
            }
        }
        Ok(())
    }

    /// Merge persisted widgets with the current descriptor set.
    ///
    /// The result is marked distributed: a user who has a saved layout is
    /// never redistributed.
    #[must_use]
    pub fn merge(mut self, descriptors: &DescriptorSet, defaults: &DefaultLayout) -> Self {
        let mut seen: FxHashSet<WidgetId> = FxHashSet::default();
        let mut widgets = Vec::with_capacity(descriptors.len());

        for mut widget in std::mem::take(&mut self.widgets) {
            let Some(descriptor) = descriptors.get(widget.id.as_str()) else {
                tracing::debug!(widget = %widget.id, "dropping persisted widget with no descriptor");
                continue;
            };
            if !seen.insert(widget.id.clone()) {
                tracing::debug!(widget = %widget.id, "dropping duplicate persisted widget");
                continue;
            }
            widget.kind = descriptor.kind;
            widgets.push(widget);
        }

        for descriptor in descriptors.iter() {
            if !seen.contains(&descriptor.id) {
                let position = defaults
                    .position(descriptor.id.as_str())
                    .unwrap_or(Point::ORIGIN);
                widgets.push(ResolvedWidgetConfig::from_default(descriptor, position));
            }
        }

        self.widgets = widgets;
        self.widgets_distributed = true;
        self
    }

    #[must_use]
    pub fn widget(&self, id: &str) -> Option<&ResolvedWidgetConfig> {
        self.widgets.iter().find(|w| w.id == *id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut ResolvedWidgetConfig> {
        self.widgets.iter_mut().find(|w| w.id == *id)
    }
}
