#![forbid(unsafe_code)]

//! The static half of the layout: descriptors, their dependency graph and
//! the resolution order derived from it.
//!
//! A [`LayoutEngine`] is built once and shared (typically behind an `Arc`);
//! everything mutable lives in the store.

use hudkit_core::WidgetId;

use crate::dependency::DependencyGraph;
use crate::descriptor::{DescriptorSet, WidgetKind};
use crate::error::LayoutError;
use crate::resolver::{DefaultLayout, ResolveContext, resolve_defaults};

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    descriptors: DescriptorSet,
    graph: DependencyGraph,
    order: Vec<usize>,
}

impl LayoutEngine {
    /// Extract dependencies and derive the resolution order.
    ///
    /// Fails with [`LayoutError::Cycle`] when position functions read each
    /// other in a loop.
    pub fn new(descriptors: DescriptorSet) -> Result<Self, LayoutError> {
        let graph = DependencyGraph::extract(&descriptors);
        let order = graph.topological_order()?;
        tracing::debug!(
            widgets = descriptors.len(),
            "layout engine built"
        );
        Ok(Self {
            descriptors,
            graph,
            order,
        })
    }

    #[must_use]
    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Declaration indices in resolution order.
    #[must_use]
    pub fn resolution_order(&self) -> &[usize] {
        &self.order
    }

    /// Resolve every widget's default rectangle.
    #[must_use]
    pub fn resolve_defaults(&self, ctx: &ResolveContext<'_>) -> DefaultLayout {
        resolve_defaults(&self.descriptors, &self.order, ctx)
    }

    /// Widgets of `kind` plus everything positioned relative to them.
    #[must_use]
    pub fn affected_by_kind(&self, kind: WidgetKind) -> Vec<WidgetId> {
        self.graph
            .affected_by(self.descriptors.ids_of_kind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::WidgetDescriptor;
    use hudkit_core::Point;

    #[test]
    fn cycle_fails_construction() {
        let set = DescriptorSet::new([
            WidgetDescriptor::new("a", WidgetKind::Info, |_, _, r| {
                Ok(r.widget_rect("b").unwrap_or_default().origin())
            }),
            WidgetDescriptor::new("b", WidgetKind::Info, |_, _, r| {
                Ok(r.widget_rect("a").unwrap_or_default().origin())
            }),
        ])
        .unwrap();
        match LayoutEngine::new(set) {
            Err(LayoutError::Cycle(err)) => {
                let path: Vec<_> = err.path.iter().map(WidgetId::as_str).collect();
                assert_eq!(path, ["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn affected_by_kind_follows_dependents() {
        let set = DescriptorSet::new([
            WidgetDescriptor::new("map", WidgetKind::Minimap, |_, _, _| Ok(Point::ORIGIN)),
            WidgetDescriptor::new("hp", WidgetKind::StatusMeter, |_, _, r| {
                Ok(r.widget_rect("map").unwrap_or_default().origin())
            }),
            WidgetDescriptor::new("voice", WidgetKind::Info, |_, _, r| {
                Ok(r.widget_rect("hp").unwrap_or_default().origin())
            }),
            WidgetDescriptor::new("chat", WidgetKind::Chat, |_, _, _| Ok(Point::ORIGIN)),
        ])
        .unwrap();
        let engine = LayoutEngine::new(set).unwrap();
        let ids: Vec<_> = engine
            .affected_by_kind(WidgetKind::Minimap)
            .into_iter()
            .map(|id| id.as_str().to_owned())
            .collect();
        assert_eq!(ids, ["map", "hp", "voice"]);
        assert_eq!(engine.resolution_order(), &[0, 1, 2, 3]);
    }
}
