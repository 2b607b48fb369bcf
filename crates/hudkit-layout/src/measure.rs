#![forbid(unsafe_code)]

//! Measurement capability.
//!
//! The engine never talks to a rendering surface directly. Whatever draws
//! the widgets implements [`Measurer`] so the engine can ask for the current
//! viewport and each widget's rendered size and rectangle.

use hudkit_core::{Rect, Size, Viewport, WidgetId};
use rustc_hash::FxHashMap;

use crate::settings::LayoutSettings;

/// Rendered-geometry lookup provided by the rendering layer.
pub trait Measurer {
    /// The available screen area, read fresh on every clamp.
    fn viewport(&self) -> Viewport;

    /// Rendered size of a mounted widget.
    fn widget_size(&self, id: &str) -> Option<Size>;

    /// Live on-screen rectangle of a mounted widget.
    fn widget_rect(&self, id: &str) -> Option<Rect> {
        let _ = id;
        None
    }

    /// Called after a layout-affecting setting changes, before the store
    /// expects the next measurement pass.
    fn apply_settings(&mut self, settings: &LayoutSettings) {
        let _ = settings;
    }

    /// Called whenever a widget's committed scale changes, including on
    /// load and reset. Sizes reported afterwards must include the scale.
    fn apply_scale(&mut self, id: &str, scale: f64) {
        let _ = (id, scale);
    }
}

/// Map-backed measurer with synthetic geometry.
///
/// Used for headless layouts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticMeasurer {
    viewport: Viewport,
    sizes: FxHashMap<WidgetId, Size>,
    rects: FxHashMap<WidgetId, Rect>,
}

impl StaticMeasurer {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_size(mut self, id: impl Into<WidgetId>, size: Size) -> Self {
        self.set_size(id, size);
        self
    }

    pub fn set_size(&mut self, id: impl Into<WidgetId>, size: Size) {
        self.sizes.insert(id.into(), size);
    }

    /// Pin a live rectangle; its size also answers [`Measurer::widget_size`]
    /// unless an explicit size is set.
    pub fn set_rect(&mut self, id: impl Into<WidgetId>, rect: Rect) {
        self.rects.insert(id.into(), rect);
    }

    /// Forget a widget, as if it were unmounted.
    pub fn unmount(&mut self, id: &str) {
        self.sizes.remove(id);
        self.rects.remove(id);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

impl Measurer for StaticMeasurer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn widget_size(&self, id: &str) -> Option<Size> {
        self.sizes
            .get(id)
            .copied()
            .or_else(|| self.rects.get(id).map(Rect::size))
    }

    fn widget_rect(&self, id: &str) -> Option<Rect> {
        self.rects.get(id).copied()
    }
}
