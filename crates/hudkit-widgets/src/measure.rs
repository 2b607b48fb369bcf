#![forbid(unsafe_code)]

//! Nominal widget sizes.
//!
//! [`CatalogMeasurer`] stands in for the rendering layer: each catalog
//! widget has a fixed size per design setting, multiplied by the widget's
//! scale. The layout store calls [`Measurer::apply_settings`] whenever a
//! layout-affecting setting flips and [`Measurer::apply_scale`] whenever a
//! scale is committed, so the next resolution pass sees the new sizes.

use hudkit_core::{Size, Viewport, WidgetId};
use hudkit_layout::{LayoutSettings, Measurer, MinimapShape, SpeedometerStyle, StatusDesign};
use rustc_hash::FxHashMap;

use crate::catalog::ids;

/// Unscaled size of a catalog widget under `settings`.
///
/// `None` for ids outside the catalog.
#[must_use]
pub fn nominal_size(id: &str, settings: &LayoutSettings) -> Option<Size> {
    let size = match id {
        ids::MINIMAP => match settings.minimap_shape {
            MinimapShape::Square | MinimapShape::Circle => Size::new(220.0, 220.0),
            MinimapShape::Rectangle => Size::new(300.0, 200.0),
        },
        ids::HEALTH | ids::ARMOR | ids::HUNGER | ids::THIRST => match settings.status_design {
            StatusDesign::Circle => Size::new(48.0, 48.0),
            StatusDesign::Bar => Size::new(160.0, 14.0),
            StatusDesign::Minimal => Size::new(100.0, 6.0),
        },
        ids::SPEEDOMETER => match settings.speedometer_style {
            SpeedometerStyle::Analog => Size::new(180.0, 180.0),
            SpeedometerStyle::Digital => Size::new(140.0, 60.0),
        },
        ids::FUEL => Size::new(36.0, 120.0),
        ids::CHAT => Size::new(420.0, 240.0),
        ids::NOTIFICATIONS => Size::new(320.0, 200.0),
        ids::MONEY => Size::new(160.0, 32.0),
        ids::COMPASS => Size::new(300.0, 28.0),
        ids::VOICE => Size::new(120.0, 24.0),
        _ => return None,
    };
    Some(size)
}

/// Headless measurer for the default catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogMeasurer {
    viewport: Viewport,
    settings: LayoutSettings,
    scales: FxHashMap<WidgetId, f64>,
    unmounted: Vec<WidgetId>,
}

impl CatalogMeasurer {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[must_use]
    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Mirror a widget's scale; non-positive or non-finite scales reset to 1.
    pub fn set_scale(&mut self, id: impl Into<WidgetId>, scale: f64) {
        let id = id.into();
        if scale.is_finite() && scale > 0.0 {
            self.scales.insert(id, scale);
        } else {
            self.scales.remove(&id);
        }
    }

    /// Mark a widget as not mounted; it reports no size until remounted.
    pub fn unmount(&mut self, id: impl Into<WidgetId>) {
        let id = id.into();
        if !self.unmounted.contains(&id) {
            self.unmounted.push(id);
        }
    }

    pub fn mount(&mut self, id: &str) {
        self.unmounted.retain(|unmounted| unmounted != id);
    }

    fn scale_of(&self, id: &str) -> f64 {
        self.scales.get(id).copied().unwrap_or(1.0)
    }
}

impl Measurer for CatalogMeasurer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn widget_size(&self, id: &str) -> Option<Size> {
        if self.unmounted.iter().any(|unmounted| unmounted == id) {
            return None;
        }
        nominal_size(id, &self.settings).map(|size| size.scaled(self.scale_of(id)))
    }

    fn apply_settings(&mut self, settings: &LayoutSettings) {
        if self.settings != *settings {
            tracing::debug!(?settings, "catalog measurer picked up new settings");
        }
        self.settings = *settings;
    }

    fn apply_scale(&mut self, id: &str, scale: f64) {
        self.set_scale(id, scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_settings_and_scale() {
        let mut m = CatalogMeasurer::new(Viewport::default());
        assert_eq!(m.widget_size(ids::HEALTH), Some(Size::new(48.0, 48.0)));

        m.apply_settings(&LayoutSettings {
            status_design: StatusDesign::Bar,
            ..LayoutSettings::default()
        });
        assert_eq!(m.widget_size(ids::ARMOR), Some(Size::new(160.0, 14.0)));

        m.set_scale(ids::CHAT, 0.5);
        assert_eq!(m.widget_size(ids::CHAT), Some(Size::new(210.0, 120.0)));
        m.set_scale(ids::CHAT, f64::NAN);
        assert_eq!(m.widget_size(ids::CHAT), Some(Size::new(420.0, 240.0)));
    }

    #[test]
    fn unknown_and_unmounted_widgets_have_no_size() {
        let mut m = CatalogMeasurer::new(Viewport::default());
        assert_eq!(m.widget_size("radar"), None);
        m.unmount(ids::VOICE);
        assert_eq!(m.widget_size(ids::VOICE), None);
        m.mount(ids::VOICE);
        assert!(m.widget_size(ids::VOICE).is_some());
    }
}
