#![forbid(unsafe_code)]

//! Built-in widget descriptors.
//!
//! ```text
//! chat                    compass                    notifications
//! voice                                                      money
//!
//! health armor hunger thirst
//! minimap                                       fuel  speedometer
//! ```
//!
//! The status meters chain off the minimap and each other, the fuel gauge
//! hangs off the speedometer, money off the notifications and voice off the
//! chat. Changing the minimap shape therefore re-flows the whole status row.

use std::sync::Arc;

use hudkit_core::{Point, Rect};
use hudkit_layout::{
    DescriptorSet, LayoutEngine, LayoutError, PositionError, Resolver, WidgetDescriptor,
    WidgetKind,
};

/// Widget ids of the default catalog.
pub mod ids {
    pub const MINIMAP: &str = "minimap";
    pub const HEALTH: &str = "health";
    pub const ARMOR: &str = "armor";
    pub const HUNGER: &str = "hunger";
    pub const THIRST: &str = "thirst";
    pub const SPEEDOMETER: &str = "speedometer";
    pub const FUEL: &str = "fuel";
    pub const CHAT: &str = "chat";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const MONEY: &str = "money";
    pub const COMPASS: &str = "compass";
    pub const VOICE: &str = "voice";

    /// Status meters, left to right.
    pub const STATUS_METERS: [&str; 4] = [HEALTH, ARMOR, HUNGER, THIRST];
}

/// Distance kept from the screen edges.
pub const EDGE_MARGIN: f64 = 20.0;
/// Vertical gap between the status row and the minimap.
pub const STATUS_ROW_GAP: f64 = 8.0;
/// Horizontal gap between neighbouring status meters.
pub const METER_SPACING: f64 = 6.0;
/// Gap between a widget and the anchor it hangs off.
pub const ANCHOR_GAP: f64 = 10.0;

fn anchor(resolver: &dyn Resolver, id: &str) -> Result<Rect, PositionError> {
    resolver
        .widget_rect(id)
        .ok_or_else(|| PositionError::MissingAnchor(id.into()))
}

/// Meter placed to the right of the previous one in the row.
fn chained_meter(id: &'static str, previous: &'static str) -> WidgetDescriptor {
    WidgetDescriptor::new(id, WidgetKind::StatusMeter, move |_, _, r| {
        let prev = anchor(r, previous)?;
        Ok(Point::new(prev.right + METER_SPACING, prev.y))
    })
}

/// Descriptors of every built-in widget in declaration order.
///
/// # Errors
///
/// Never fails for the built-in set; the error type is that of
/// [`DescriptorSet::new`].
pub fn default_descriptors() -> Result<DescriptorSet, LayoutError> {
    let set = DescriptorSet::new([
        WidgetDescriptor::new(ids::MINIMAP, WidgetKind::Minimap, |_, el, r| {
            let screen = r.screen();
            Ok(Point::new(
                EDGE_MARGIN,
                screen.height - el.size.height - EDGE_MARGIN,
            ))
        }),
        WidgetDescriptor::new(ids::HEALTH, WidgetKind::StatusMeter, |_, el, r| {
            let minimap = anchor(r, ids::MINIMAP)?;
            Ok(Point::new(
                minimap.x,
                minimap.y - el.size.height - STATUS_ROW_GAP,
            ))
        }),
        chained_meter(ids::ARMOR, ids::HEALTH),
        chained_meter(ids::HUNGER, ids::ARMOR),
        chained_meter(ids::THIRST, ids::HUNGER),
        WidgetDescriptor::new(ids::SPEEDOMETER, WidgetKind::Speedometer, |_, el, r| {
            let screen = r.screen();
            Ok(Point::new(
                screen.width - el.size.width - EDGE_MARGIN,
                screen.height - el.size.height - EDGE_MARGIN,
            ))
        }),
        // Bottom-aligned with the speedometer, on its left.
        WidgetDescriptor::new(ids::FUEL, WidgetKind::Info, |_, el, r| {
            let speedo = anchor(r, ids::SPEEDOMETER)?;
            Ok(Point::new(
                speedo.x - el.size.width - ANCHOR_GAP,
                speedo.bottom - el.size.height,
            ))
        }),
        WidgetDescriptor::new(ids::CHAT, WidgetKind::Chat, |_, _, _| {
            Ok(Point::new(EDGE_MARGIN, EDGE_MARGIN))
        }),
        WidgetDescriptor::new(ids::NOTIFICATIONS, WidgetKind::Notifications, |_, el, r| {
            Ok(Point::new(
                r.screen().width - el.size.width - EDGE_MARGIN,
                EDGE_MARGIN,
            ))
        }),
        WidgetDescriptor::new(ids::MONEY, WidgetKind::Info, |_, el, r| {
            let notifications = anchor(r, ids::NOTIFICATIONS)?;
            Ok(Point::new(
                notifications.right - el.size.width,
                notifications.bottom + ANCHOR_GAP,
            ))
        }),
        WidgetDescriptor::new(ids::COMPASS, WidgetKind::Info, |_, el, r| {
            Ok(Point::new(
                (r.screen().width - el.size.width) / 2.0,
                EDGE_MARGIN,
            ))
        }),
        WidgetDescriptor::new(ids::VOICE, WidgetKind::Info, |_, _, r| {
            let chat = anchor(r, ids::CHAT)?;
            Ok(Point::new(chat.x, chat.bottom + ANCHOR_GAP))
        })
        .hidden_by_default(),
    ])?;
    Ok(set)
}

/// Engine over [`default_descriptors`], ready to share between stores.
///
/// # Errors
///
/// See [`default_descriptors`] and [`LayoutEngine::new`].
pub fn default_engine() -> Result<Arc<LayoutEngine>, LayoutError> {
    let engine = LayoutEngine::new(default_descriptors()?)?;
    tracing::debug!(widgets = engine.descriptors().len(), "default catalog engine built");
    Ok(Arc::new(engine))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_declared_in_order() {
        let set = default_descriptors().unwrap();
        let declared: Vec<_> = set.ids().map(|id| id.as_str()).collect();
        assert_eq!(
            declared,
            [
                ids::MINIMAP,
                ids::HEALTH,
                ids::ARMOR,
                ids::HUNGER,
                ids::THIRST,
                ids::SPEEDOMETER,
                ids::FUEL,
                ids::CHAT,
                ids::NOTIFICATIONS,
                ids::MONEY,
                ids::COMPASS,
                ids::VOICE,
            ]
        );
        assert!(!set.get(ids::VOICE).unwrap().default_visible);
    }

    #[test]
    fn minimap_drives_the_status_row() {
        let engine = default_engine().unwrap();
        let affected = engine.affected_by_kind(WidgetKind::Minimap);
        let affected: Vec<_> = affected.iter().map(|id| id.as_str()).collect();
        assert_eq!(
            affected,
            [ids::MINIMAP, ids::HEALTH, ids::ARMOR, ids::HUNGER, ids::THIRST]
        );
    }

    #[test]
    fn resolution_order_is_declaration_order() {
        let engine = default_engine().unwrap();
        let expected: Vec<usize> = (0..engine.descriptors().len()).collect();
        assert_eq!(engine.resolution_order(), expected.as_slice());
    }

    #[test]
    fn graph_edges_follow_anchors() {
        let engine = default_engine().unwrap();
        let graph = engine.graph();
        let deps: Vec<_> = graph
            .dependencies_of(ids::FUEL)
            .iter()
            .map(|id| id.as_str())
            .collect();
        assert_eq!(deps, [ids::SPEEDOMETER]);
        assert!(graph.dependencies_of(ids::CHAT).is_empty());
    }
}
