#![forbid(unsafe_code)]

//! Static widget descriptors.
//!
//! A [`WidgetDescriptor`] is defined once per widget and never mutated. Its
//! position function computes the widget's *default* origin from the
//! widget's own measured element and a [`Resolver`] through which it may read
//! other widgets' rectangles. The resolver is the only channel for
//! cross-widget reads, which is what lets the dependency extractor discover
//! the graph by dry-running every function.

use std::fmt;
use std::sync::Arc;

use hudkit_core::{Point, Size, WidgetId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, PositionError};
use crate::resolver::Resolver;

/// Visual family of a widget.
///
/// Layout-affecting settings target widgets by kind: switching the status
/// design changes the rendered size of every [`WidgetKind::StatusMeter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    StatusMeter,
    Speedometer,
    Minimap,
    Chat,
    Notifications,
    Info,
    Custom,
}

/// The widget's own element as seen by its position function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasuredElement {
    pub size: Size,
    /// False when the rendering layer has not mounted the widget yet and the
    /// size is synthesized.
    pub mounted: bool,
}

impl MeasuredElement {
    #[must_use]
    pub const fn mounted(size: Size) -> Self {
        Self {
            size,
            mounted: true,
        }
    }

    #[must_use]
    pub const fn synthesized(size: Size) -> Self {
        Self {
            size,
            mounted: false,
        }
    }
}

/// Pure function computing a widget's default origin.
pub type PositionFn = Arc<
    dyn Fn(&WidgetId, &MeasuredElement, &dyn Resolver) -> Result<Point, PositionError>
        + Send
        + Sync,
>;

/// Immutable description of one widget.
#[derive(Clone)]
pub struct WidgetDescriptor {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub default_visible: bool,
    pub default_scale: f64,
    position: PositionFn,
}

impl WidgetDescriptor {
    /// Visible, unscaled widget with the given position function.
    pub fn new<F>(id: impl Into<WidgetId>, kind: WidgetKind, position: F) -> Self
    where
        F: Fn(&WidgetId, &MeasuredElement, &dyn Resolver) -> Result<Point, PositionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            id: id.into(),
            kind,
            default_visible: true,
            default_scale: 1.0,
            position: Arc::new(position),
        }
    }

    #[must_use]
    pub fn hidden_by_default(mut self) -> Self {
        self.default_visible = false;
        self
    }

    #[must_use]
    pub fn with_default_scale(mut self, scale: f64) -> Self {
        self.default_scale = scale;
        self
    }

    /// Run the position function.
    pub fn position(
        &self,
        measured: &MeasuredElement,
        resolver: &dyn Resolver,
    ) -> Result<Point, PositionError> {
        (self.position)(&self.id, measured, resolver)
    }
}

impl fmt::Debug for WidgetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("default_visible", &self.default_visible)
            .field("default_scale", &self.default_scale)
            .finish_non_exhaustive()
    }
}

/// Ordered, id-unique collection of descriptors.
///
/// Declaration order is significant: it is the tie-break for the resolution
/// order and the order of every dependents list.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    descriptors: Vec<WidgetDescriptor>,
    index: FxHashMap<WidgetId, usize>,
}

impl DescriptorSet {
    /// Build a set, rejecting duplicate ids and non-positive scales.
    pub fn new(
        descriptors: impl IntoIterator<Item = WidgetDescriptor>,
    ) -> Result<Self, DescriptorError> {
        let mut set = Self::default();
        for descriptor in descriptors {
            if !(descriptor.default_scale.is_finite() && descriptor.default_scale > 0.0) {
                return Err(DescriptorError::InvalidScale {
                    id: descriptor.id,
                    scale: descriptor.default_scale,
                });
            }
            if set.index.contains_key(&descriptor.id) {
                return Err(DescriptorError::DuplicateId(descriptor.id));
            }
            set.index
                .insert(descriptor.id.clone(), set.descriptors.len());
            set.descriptors.push(descriptor);
        }
        Ok(set)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&WidgetDescriptor> {
        self.index.get(id).map(|&i| &self.descriptors[i])
    }

    /// Declaration index of a widget.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn by_index(&self, index: usize) -> Option<&WidgetDescriptor> {
        self.descriptors.get(index)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &WidgetDescriptor> {
        self.descriptors.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &WidgetId> {
        self.descriptors.iter().map(|d| &d.id)
    }

    /// Ids of every widget of the given kind, in declaration order.
    pub fn ids_of_kind(&self, kind: WidgetKind) -> impl Iterator<Item = &WidgetId> {
        self.descriptors
            .iter()
            .filter(move |d| d.kind == kind)
            .map(|d| &d.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(_: &WidgetId, _: &MeasuredElement, _: &dyn Resolver) -> Result<Point, PositionError> {
        Ok(Point::ORIGIN)
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = DescriptorSet::new([
            WidgetDescriptor::new("chat", WidgetKind::Chat, origin),
            WidgetDescriptor::new("chat", WidgetKind::Chat, origin),
        ])
        .unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateId(WidgetId::from("chat")));
    }

    #[test]
    fn zero_scale_is_rejected() {
        let err = DescriptorSet::new([
            WidgetDescriptor::new("chat", WidgetKind::Chat, origin).with_default_scale(0.0)
        ])
        .unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidScale { .. }));
    }

    #[test]
    fn lookup_preserves_declaration_order() {
        let set = DescriptorSet::new([
            WidgetDescriptor::new("b", WidgetKind::Info, origin),
            WidgetDescriptor::new("a", WidgetKind::StatusMeter, origin),
            WidgetDescriptor::new("c", WidgetKind::StatusMeter, origin).hidden_by_default(),
        ])
        .unwrap();
        assert_eq!(set.index_of("a"), Some(1));
        let ids: Vec<_> = set.ids().map(WidgetId::as_str).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        let meters: Vec<_> = set.ids_of_kind(WidgetKind::StatusMeter).cloned().collect();
        assert_eq!(meters, [WidgetId::from("a"), WidgetId::from("c")]);
        assert!(!set.get("c").unwrap().default_visible);
    }
}
