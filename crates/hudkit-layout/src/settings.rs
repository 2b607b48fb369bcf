#![forbid(unsafe_code)]

//! Layout-affecting global settings.
//!
//! Each setting changes the rendered size or shape of every widget of one
//! [`WidgetKind`], which is what makes it a relayout trigger.

use serde::{Deserialize, Serialize};

use crate::descriptor::WidgetKind;

/// Visual design of the status meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDesign {
    #[default]
    Circle,
    Bar,
    Minimal,
}

/// Outline of the minimap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinimapShape {
    #[default]
    Square,
    Circle,
    Rectangle,
}

/// Speedometer presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedometerStyle {
    #[default]
    Analog,
    Digital,
}

/// Persisted layout-affecting settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub status_design: StatusDesign,
    pub minimap_shape: MinimapShape,
    pub speedometer_style: SpeedometerStyle,
}

/// A single layout-affecting setting change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    StatusDesign(StatusDesign),
    MinimapShape(MinimapShape),
    SpeedometerStyle(SpeedometerStyle),
}

impl SettingChange {
    /// Kind of widget whose rendered geometry this change affects.
    #[must_use]
    pub const fn affected_kind(self) -> WidgetKind {
        match self {
            Self::StatusDesign(_) => WidgetKind::StatusMeter,
            Self::MinimapShape(_) => WidgetKind::Minimap,
            Self::SpeedometerStyle(_) => WidgetKind::Speedometer,
        }
    }

    /// Apply to `settings`; returns false when the value was already set.
    pub fn apply(self, settings: &mut LayoutSettings) -> bool {
        match self {
            Self::StatusDesign(v) => replace_if_changed(&mut settings.status_design, v),
            Self::MinimapShape(v) => replace_if_changed(&mut settings.minimap_shape, v),
            Self::SpeedometerStyle(v) => replace_if_changed(&mut settings.speedometer_style, v),
        }
    }

    /// Whether applying this change would alter `settings`.
    #[must_use]
    pub fn changes(self, settings: &LayoutSettings) -> bool {
        let mut probe = *settings;
        self.apply(&mut probe)
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
