#![forbid(unsafe_code)]

//! Default-position resolution.
//!
//! [`resolve_defaults`] walks the descriptors in resolution order and calls
//! each position function with a [`LiveResolver`] backed by the rectangles
//! resolved so far. Because the order respects the dependency graph, every
//! anchor a widget reads has already been resolved when the widget runs.
//!
//! # Invariants
//!
//! 1. Every resolved origin is clamped into the viewport.
//! 2. Disabled and not-yet-ready widgets are resolved anyway and flagged, so
//!    dependents keep a stable anchor.
//! 3. Identical inputs produce identical [`DefaultLayout`]s.
//!
//! # Failure Modes
//!
//! A position function that fails (or returns a non-finite point) is logged
//! and falls back to the caller-supplied fallback, or the viewport origin.
//! The other widgets resolve normally. A lookup of an unresolved widget
//! returns `None`; the position function decides what to do with that.

use hudkit_core::{Point, Rect, Size, Viewport, WidgetId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::descriptor::{DescriptorSet, MeasuredElement};
use crate::measure::Measurer;

/// Capability handed to position functions.
///
/// This is the only way a position function may observe other widgets.
pub trait Resolver {
    /// Resolved-so-far default rectangle of a widget.
    fn widget_rect(&self, id: &str) -> Option<Rect>;

    /// Live measured rectangle if the widget is mounted, else its resolved
    /// default rectangle.
    fn widget_current_rect(&self, id: &str) -> Option<Rect>;

    /// Measured size, or the resolved size, or zero.
    fn widget_size(&self, id: &str) -> Size;

    fn screen(&self) -> Viewport;

    fn is_widget_disabled(&self, id: &str) -> bool;

    /// Whether the host has reported its live data as ready.
    fn has_signaled_ready(&self) -> bool;
}

/// One resolved default.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultEntry {
    pub id: WidgetId,
    pub rect: Rect,
    pub disabled: bool,
    /// The position function failed and the fallback origin was used.
    pub fell_back: bool,
}

/// Result of one resolution pass, in resolution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultLayout {
    entries: Vec<DefaultEntry>,
    index: FxHashMap<WidgetId, usize>,
}

impl DefaultLayout {
    fn insert(&mut self, entry: DefaultEntry) {
        if let Some(&slot) = self.index.get(&entry.id) {
            self.entries[slot] = entry;
        } else {
            self.index.insert(entry.id.clone(), self.entries.len());
            self.entries.push(entry);
        }
    }

    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&DefaultEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.entry(id).map(|e| e.rect)
    }

    /// Default origin of a widget.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<Point> {
        self.entry(id).map(|e| e.rect.origin())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefaultEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rectangles of the given widgets only (`capture_default_rects`).
    #[must_use]
    pub fn subset<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a WidgetId>,
    ) -> FxHashMap<WidgetId, Rect> {
        ids.into_iter()
            .filter_map(|id| self.rect(id.as_str()).map(|rect| (id.clone(), rect)))
            .collect()
    }
}

/// Inputs of a resolution pass besides the descriptors.
pub struct ResolveContext<'a> {
    pub measurer: &'a dyn Measurer,
    pub disabled: Option<&'a FxHashSet<WidgetId>>,
    pub ready: bool,
    /// Origins used when a position function fails.
    pub fallbacks: Option<&'a FxHashMap<WidgetId, Point>>,
    /// Previous pass, consulted for the size of unmounted widgets.
    pub previous: Option<&'a DefaultLayout>,
}

impl<'a> ResolveContext<'a> {
    #[must_use]
    pub fn new(measurer: &'a dyn Measurer) -> Self {
        Self {
            measurer,
            disabled: None,
            ready: true,
            fallbacks: None,
            previous: None,
        }
    }

    #[must_use]
    pub fn with_disabled(mut self, disabled: &'a FxHashSet<WidgetId>) -> Self {
        self.disabled = Some(disabled);
        self
    }

    #[must_use]
    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: &'a FxHashMap<WidgetId, Point>) -> Self {
        self.fallbacks = Some(fallbacks);
        self
    }

    #[must_use]
    pub fn with_previous(mut self, previous: &'a DefaultLayout) -> Self {
        self.previous = Some(previous);
        self
    }

    fn is_disabled(&self, id: &str) -> bool {
        self.disabled.is_some_and(|set| set.contains(id))
    }

    fn measure(&self, id: &str) -> MeasuredElement {
        if let Some(size) = self.measurer.widget_size(id) {
            return MeasuredElement::mounted(size);
        }
        let size = self
            .previous
            .and_then(|prev| prev.rect(id))
            .map_or(Size::ZERO, |rect| rect.size());
        MeasuredElement::synthesized(size)
    }
}

/// Resolver backed by the rectangles resolved so far.
pub struct LiveResolver<'a, 'c> {
    resolved: &'a DefaultLayout,
    ctx: &'a ResolveContext<'c>,
}

impl Resolver for LiveResolver<'_, '_> {
    fn widget_rect(&self, id: &str) -> Option<Rect> {
        self.resolved.rect(id)
    }

    fn widget_current_rect(&self, id: &str) -> Option<Rect> {
        self.ctx
            .measurer
            .widget_rect(id)
            .or_else(|| self.resolved.rect(id))
    }

    fn widget_size(&self, id: &str) -> Size {
        self.ctx
            .measurer
            .widget_size(id)
            .or_else(|| self.resolved.rect(id).map(|r| r.size()))
            .unwrap_or(Size::ZERO)
    }

    fn screen(&self) -> Viewport {
        self.ctx.measurer.viewport()
    }

    fn is_widget_disabled(&self, id: &str) -> bool {
        self.ctx.is_disabled(id)
    }

    fn has_signaled_ready(&self) -> bool {
        self.ctx.ready
    }
}

/// Resolve every descriptor's default rectangle.
///
/// `order` lists declaration indices in the order to resolve them; it must
/// place each widget after the widgets it reads. Indices outside the set are
/// ignored.
#[must_use]
pub fn resolve_defaults(
    descriptors: &DescriptorSet,
    order: &[usize],
    ctx: &ResolveContext<'_>,
) -> DefaultLayout {
    let viewport = ctx.measurer.viewport();
    let mut layout = DefaultLayout::default();

    for descriptor in order.iter().filter_map(|&i| descriptors.by_index(i)) {
        let id = &descriptor.id;
        let measured = ctx.measure(id.as_str());
        let outcome = {
            let resolver = LiveResolver {
                resolved: &layout,
                ctx,
            };
            descriptor.position(&measured, &resolver)
        };

        let (origin, fell_back) = match outcome {
            Ok(point) if point.is_finite() => (point, false),
            Ok(point) => {
                tracing::warn!(widget = %id, x = point.x, y = point.y, "position function returned a non-finite point");
                (fallback_origin(ctx, id), true)
            }
            Err(err) => {
                tracing::warn!(widget = %id, error = %err, "position function failed; using fallback");
                (fallback_origin(ctx, id), true)
            }
        };

        let origin = viewport.clamp_origin(origin, measured.size);
        layout.insert(DefaultEntry {
            id: id.clone(),
            rect: Rect::from_origin_size(origin, measured.size),
            disabled: ctx.is_disabled(id.as_str()),
            fell_back,
        });
    }

    layout
}

fn fallback_origin(ctx: &ResolveContext<'_>, id: &WidgetId) -> Point {
    ctx.fallbacks
        .and_then(|map| map.get(id).copied())
        .unwrap_or(Point::ORIGIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{WidgetDescriptor, WidgetKind};
    use crate::error::PositionError;
    use crate::measure::StaticMeasurer;

    fn chain() -> DescriptorSet {
        DescriptorSet::new([
            WidgetDescriptor::new("a", WidgetKind::Minimap, |_, el, r| {
                let screen = r.screen();
                Ok(Point::new(20.0, screen.height - el.size.height - 20.0))
            }),
            WidgetDescriptor::new("b", WidgetKind::StatusMeter, |_, el, r| {
                let a = r.widget_rect("a").ok_or(PositionError::MissingAnchor("a".into()))?;
                Ok(Point::new(a.x, a.y - el.size.height - 8.0))
            }),
            WidgetDescriptor::new("c", WidgetKind::StatusMeter, |_, _, r| {
                Ok(r.widget_rect("b")
                    .map_or(Point::ORIGIN, |b| Point::new(b.right + 4.0, b.y)))
            }),
        ])
        .unwrap()
    }

    fn measurer() -> StaticMeasurer {
        StaticMeasurer::new(Viewport::new(1000.0, 800.0))
            .with_size("a", Size::new(200.0, 200.0))
            .with_size("b", Size::new(40.0, 40.0))
            .with_size("c", Size::new(40.0, 40.0))
    }

    #[test]
    fn anchors_chain_through_resolved_rects() {
        let set = chain();
        let m = measurer();
        let layout = resolve_defaults(&set, &[0, 1, 2], &ResolveContext::new(&m));
        assert_eq!(layout.rect("a"), Some(Rect::new(20.0, 580.0, 200.0, 200.0)));
        assert_eq!(layout.position("b"), Some(Point::new(20.0, 532.0)));
        assert_eq!(layout.position("c"), Some(Point::new(64.0, 532.0)));
    }

    #[test]
    fn subset_keeps_only_requested_rects() {
        let set = chain();
        let m = measurer();
        let layout = resolve_defaults(&set, &[0, 1, 2], &ResolveContext::new(&m));
        let wanted = [WidgetId::from("b"), WidgetId::from("ghost")];
        let subset = layout.subset(&wanted);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.get("b").map(Rect::origin), Some(Point::new(20.0, 532.0)));
    }

    #[test]
    fn resolution_is_idempotent() {
        let set = chain();
        let m = measurer();
        let ctx = ResolveContext::new(&m);
        let first = resolve_defaults(&set, &[0, 1, 2], &ctx);
        let second = resolve_defaults(&set, &[0, 1, 2], &ctx);
        assert_eq!(first, second);
    }

    #[test]
    fn broken_order_lets_position_fn_fall_back() {
        let set = chain();
        let m = measurer();
        let mut fallbacks = FxHashMap::default();
        fallbacks.insert(WidgetId::from("b"), Point::new(300.0, 300.0));
        let ctx = ResolveContext::new(&m).with_fallbacks(&fallbacks);
        // "b" runs before its anchor and errors; "c" handles the miss itself.
        let layout = resolve_defaults(&set, &[1, 2, 0], &ctx);
        let b = layout.entry("b").unwrap();
        assert!(b.fell_back);
        assert_eq!(b.rect.origin(), Point::new(300.0, 300.0));
        let c = layout.entry("c").unwrap();
        assert!(!c.fell_back);
        assert_eq!(c.rect.origin(), Point::new(344.0, 300.0));
    }

    #[test]
    fn results_are_clamped_into_viewport() {
        let set = DescriptorSet::new([WidgetDescriptor::new("far", WidgetKind::Info, |_, _, _| {
            Ok(Point::new(5000.0, -40.0))
        })])
        .unwrap();
        let m = StaticMeasurer::new(Viewport::new(640.0, 480.0)).with_size("far", Size::new(40.0, 10.0));
        let layout = resolve_defaults(&set, &[0], &ResolveContext::new(&m));
        assert_eq!(layout.position("far"), Some(Point::new(600.0, 0.0)));
    }

    #[test]
    fn unmounted_widget_uses_previous_size_then_zero() {
        let set = chain();
        let mut m = measurer();
        let first = resolve_defaults(&set, &[0, 1, 2], &ResolveContext::new(&m));
        m.unmount("b");
        let ctx = ResolveContext::new(&m).with_previous(&first);
        let second = resolve_defaults(&set, &[0, 1, 2], &ctx);
        assert_eq!(second.rect("b").unwrap().size(), Size::new(40.0, 40.0));
        let third = resolve_defaults(&set, &[0, 1, 2], &ResolveContext::new(&m));
        assert_eq!(third.rect("b").unwrap().size(), Size::ZERO);
    }

    #[test]
    fn disabled_widgets_still_resolve_and_are_flagged() {
        let set = chain();
        let m = measurer();
        let mut disabled = FxHashSet::default();
        disabled.insert(WidgetId::from("a"));
        let layout = resolve_defaults(&set, &[0, 1, 2], &ResolveContext::new(&m).with_disabled(&disabled));
        assert!(layout.entry("a").unwrap().disabled);
        assert!(!layout.entry("b").unwrap().disabled);
        assert_eq!(layout.position("b"), Some(Point::new(20.0, 532.0)));
    }
}
