#![forbid(unsafe_code)]

//! Snap-to-neighbor geometry.
//!
//! Pure functions over rectangles: nothing here reads or mutates the store.
//!
//! # Rules
//!
//! For each neighbor the moving rectangle is compared per axis. On the X axis:
//!
//! | Moving edge | Target             | Kind   |
//! |-------------|--------------------|--------|
//! | left        | left               | direct |
//! | left        | right              | direct |
//! | right       | left               | direct |
//! | right       | right              | direct |
//! | center      | center             | direct |
//! | left        | right + gap        | gap    |
//! | right       | left - gap         | gap    |
//!
//! Gap rules only apply when the two rectangles are within `proximity` of
//! each other on the perpendicular axis. The Y axis mirrors the table with
//! top/bottom.
//!
//! A correction is `target - moving edge`. Per axis, the smallest correction
//! strictly under `threshold` wins (ties keep the first rule evaluated, in
//! neighbor order then table order), and every correction under threshold
//! produces a guide line.

use std::collections::BTreeSet;

use hudkit_core::{Point, Rect, WidgetId};
use serde::{Deserialize, Serialize};

use crate::config::SnapConfig;

/// Orientation of a guide line. X-axis alignments draw vertical lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A rectangle edge or center line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Left,
    Right,
    CenterX,
    Top,
    Bottom,
    CenterY,
}

impl Edge {
    fn of(self, rect: &Rect) -> f64 {
        match self {
            Self::Left => rect.left(),
            Self::Right => rect.right,
            Self::CenterX => rect.center_x(),
            Self::Top => rect.top(),
            Self::Bottom => rect.bottom,
            Self::CenterY => rect.center_y(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    /// Edges or centers coincide.
    Direct,
    /// Edges sit exactly `gap` apart.
    Gap,
}

/// Guide line shown while a widget is snapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapLine {
    pub orientation: Orientation,
    /// Coordinate of the neighbor edge the line marks.
    pub position: f64,
    /// Edge of the moving widget.
    pub edge: Edge,
    /// Edge of the neighbor.
    pub target_edge: Edge,
    pub source: WidgetId,
    pub target: WidgetId,
    pub kind: SnapKind,
}

/// Result of [`SnapEngine::find_snap_lines`].
#[derive(Debug, Clone, PartialEq)]
pub struct SnapOutcome {
    pub lines: Vec<SnapLine>,
    /// Corrected origin of the moving rectangle.
    pub position: Point,
    pub snapped_x: bool,
    pub snapped_y: bool,
}

impl SnapOutcome {
    /// Correction applied to the candidate origin.
    #[must_use]
    pub fn offset_from(&self, origin: Point) -> Point {
        Point::new(self.position.x - origin.x, self.position.y - origin.y)
    }
}

/// Keyboard jump direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    const fn axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::X,
            Self::Up | Self::Down => Axis::Y,
        }
    }

    const fn sign(self) -> f64 {
        match self {
            Self::Left | Self::Up => -1.0,
            Self::Right | Self::Down => 1.0,
        }
    }

    /// Unit vector in screen coordinates (y grows downward).
    #[must_use]
    pub const fn unit(self) -> Point {
        match self {
            Self::Left => Point::new(-1.0, 0.0),
            Self::Right => Point::new(1.0, 0.0),
            Self::Up => Point::new(0.0, -1.0),
            Self::Down => Point::new(0.0, 1.0),
        }
    }
}

/// Result of a directional jump.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapJump {
    /// New origin of the moving rectangle.
    pub position: Point,
    /// Signed distance travelled along the jump axis.
    pub delta: f64,
    pub line: SnapLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

const X_DIRECT: [(Edge, Edge); 5] = [
    (Edge::Left, Edge::Left),
    (Edge::Left, Edge::Right),
    (Edge::Right, Edge::Left),
    (Edge::Right, Edge::Right),
    (Edge::CenterX, Edge::CenterX),
];

const Y_DIRECT: [(Edge, Edge); 5] = [
    (Edge::Top, Edge::Top),
    (Edge::Top, Edge::Bottom),
    (Edge::Bottom, Edge::Top),
    (Edge::Bottom, Edge::Bottom),
    (Edge::CenterY, Edge::CenterY),
];

#[derive(Debug, Clone, Copy)]
struct Candidate {
    delta: f64,
    edge: Edge,
    target_edge: Edge,
    line_at: f64,
    kind: SnapKind,
}

/// Snap engine parameterized by [`SnapConfig`] and optional grid spacing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapEngine {
    config: SnapConfig,
    grid: Option<f64>,
}

impl SnapEngine {
    #[must_use]
    pub fn new(config: SnapConfig) -> Self {
        Self { config, grid: None }
    }

    /// Round axes without a neighbor snap to multiples of `grid`.
    #[must_use]
    pub fn with_grid(mut self, grid: Option<f64>) -> Self {
        self.grid = grid.filter(|g| g.is_finite() && *g > 0.0);
        self
    }

    #[must_use]
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Snap `rect` (the candidate rectangle of `moving`) to its neighbors.
    ///
    /// `moving` and every id in `exclude` are skipped as targets.
    #[must_use]
    pub fn find_snap_lines(
        &self,
        moving: &WidgetId,
        rect: Rect,
        neighbors: &[(WidgetId, Rect)],
        exclude: &BTreeSet<WidgetId>,
    ) -> SnapOutcome {
        let mut lines = Vec::new();
        let mut best_x: Option<f64> = None;
        let mut best_y: Option<f64> = None;

        for (target, target_rect) in neighbors {
            if target == moving || exclude.contains(target) {
                continue;
            }
            for axis in [Axis::X, Axis::Y] {
                let best = match axis {
                    Axis::X => &mut best_x,
                    Axis::Y => &mut best_y,
                };
                for c in self.candidates(axis, &rect, target_rect) {
                    if c.delta.abs() >= self.config.threshold {
                        continue;
                    }
                    if best.is_none_or(|b| c.delta.abs() < b.abs()) {
                        *best = Some(c.delta);
                    }
                    lines.push(line(axis, c, moving, target));
                }
            }
        }

        let mut position = rect.origin();
        match best_x {
            Some(dx) => position.x += dx,
            None => position.x = self.grid_round(position.x),
        }
        match best_y {
            Some(dy) => position.y += dy,
            None => position.y = self.grid_round(position.y),
        }

        SnapOutcome {
            lines,
            position,
            snapped_x: best_x.is_some(),
            snapped_y: best_y.is_some(),
        }
    }

    /// Closest snap target strictly in `direction`, within
    /// `max_search_distance`.
    #[must_use]
    pub fn find_next_snap_position(
        &self,
        moving: &WidgetId,
        rect: Rect,
        direction: Direction,
        neighbors: &[(WidgetId, Rect)],
        exclude: &BTreeSet<WidgetId>,
    ) -> Option<SnapJump> {
        let axis = direction.axis();
        let sign = direction.sign();
        let mut best: Option<(Candidate, &WidgetId)> = None;

        for (target, target_rect) in neighbors {
            if target == moving || exclude.contains(target) {
                continue;
            }
            for c in self.candidates(axis, &rect, target_rect) {
                let along = c.delta * sign;
                if along <= 0.0 || along > self.config.max_search_distance {
                    continue;
                }
                if best.is_none_or(|(b, _)| c.delta.abs() < b.delta.abs()) {
                    best = Some((c, target));
                }
            }
        }

        let (c, target) = best?;
        let origin = rect.origin();
        let position = match axis {
            Axis::X => origin.offset(c.delta, 0.0),
            Axis::Y => origin.offset(0.0, c.delta),
        };
        Some(SnapJump {
            position,
            delta: c.delta,
            line: line(axis, c, moving, target),
        })
    }

    fn grid_round(&self, value: f64) -> f64 {
        self.grid.map_or(value, |g| snap_to_grid(value, g))
    }

    fn candidates(&self, axis: Axis, m: &Rect, t: &Rect) -> Vec<Candidate> {
        let gap = self.config.gap;
        let prox = self.config.proximity;
        let (direct, near, gap_rules) = match axis {
            Axis::X => (
                &X_DIRECT,
                m.top() < t.bottom + prox && m.bottom > t.top() - prox,
                [
                    (Edge::Left, Edge::Right, t.right + gap),
                    (Edge::Right, Edge::Left, t.left() - gap),
                ],
            ),
            Axis::Y => (
                &Y_DIRECT,
                m.left() < t.right + prox && m.right > t.left() - prox,
                [
                    (Edge::Top, Edge::Bottom, t.bottom + gap),
                    (Edge::Bottom, Edge::Top, t.top() - gap),
                ],
            ),
        };

        let mut out = Vec::with_capacity(direct.len() + gap_rules.len());
        for &(edge, target_edge) in direct {
            let at = target_edge.of(t);
            out.push(Candidate {
                delta: at - edge.of(m),
                edge,
                target_edge,
                line_at: at,
                kind: SnapKind::Direct,
            });
        }
        if near {
            for (edge, target_edge, landing) in gap_rules {
                out.push(Candidate {
                    delta: landing - edge.of(m),
                    edge,
                    target_edge,
                    line_at: target_edge.of(t),
                    kind: SnapKind::Gap,
                });
            }
        }
        out
    }
}

fn line(axis: Axis, c: Candidate, source: &WidgetId, target: &WidgetId) -> SnapLine {
    SnapLine {
        orientation: match axis {
            Axis::X => Orientation::Vertical,
            Axis::Y => Orientation::Horizontal,
        },
        position: c.line_at,
        edge: c.edge,
        target_edge: c.target_edge,
        source: source.clone(),
        target: target.clone(),
        kind: c.kind,
    }
}

/// Round `value` to the nearest multiple of `grid`.
#[must_use]
pub fn snap_to_grid(value: f64, grid: f64) -> f64 {
    if grid > 0.0 && grid.is_finite() {
        (value / grid).round() * grid
    } else {
        value
    }
}
