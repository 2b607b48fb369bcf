#![forbid(unsafe_code)]

//! Multi-selection: marquee hit-testing, synchronized group drag and
//! keyboard nudging.
//!
//! # Group Transforms
//!
//! Every group move follows the same plan:
//!
//! 1. Raw positions are the snapshot taken at gesture start plus the
//!    gesture offset.
//! 2. One snap correction is computed from the primary widget alone against
//!    the non-selected widgets, and applied to every member.
//! 3. One containment offset is computed from the members' combined bounding
//!    box, and applied to every member.
//!
//! The group therefore moves rigidly: members never change their offsets
//! relative to each other, even at the viewport edge.
//!
//! Moves are previews until the gesture ends (pointer release, key-up); only
//! then are positions committed to the store. Cancelling drops the preview.

use std::collections::BTreeSet;

use hudkit_core::{Point, Rect, Viewport, WidgetId};

use crate::error::Result;
use crate::measure::Measurer;
use crate::snap::{Direction, SnapEngine, SnapLine};
use crate::store::LayoutStore;

// ============================================================================
// Selection state
// ============================================================================

/// Selected widgets plus the primary one that drives snapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub primary: Option<WidgetId>,
    pub selected: BTreeSet<WidgetId>,
}

impl SelectionState {
    /// Toggle membership with shift-like additive semantics.
    pub fn shift_toggle(&mut self, id: WidgetId) {
        if self.selected.remove(&id) {
            if self.primary.as_ref() == Some(&id) {
                self.primary = self.selected.iter().next().cloned();
            }
        } else {
            self.selected.insert(id.clone());
            self.primary = Some(id);
        }
    }

    /// Replace the selection with a single widget.
    pub fn select_only(&mut self, id: WidgetId) {
        self.selected.clear();
        self.selected.insert(id.clone());
        self.primary = Some(id);
    }

    /// Replace, or extend when `additive`, with marquee hits.
    pub fn apply_marquee(&mut self, hits: Vec<WidgetId>, additive: bool) {
        if !additive {
            self.clear();
        }
        for id in hits {
            if self.primary.is_none() {
                self.primary = Some(id.clone());
            }
            self.selected.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.primary = None;
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn as_sorted_vec(&self) -> Vec<WidgetId> {
        self.selected.iter().cloned().collect()
    }

    /// Primary widget, falling back to the first selected one.
    #[must_use]
    pub fn effective_primary(&self) -> Option<&WidgetId> {
        self.primary
            .as_ref()
            .filter(|p| self.selected.contains(*p))
            .or_else(|| self.selected.iter().next())
    }
}

// ============================================================================
// Marquee
// ============================================================================

/// Rubber-band selection in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    pub origin: Point,
    pub current: Point,
    pub additive: bool,
}

impl Marquee {
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.origin, self.current)
    }
}

/// Widgets whose rectangle overlaps `area` (open interval: touching edges do
/// not count).
#[must_use]
pub fn marquee_hits(area: &Rect, rendered: &[(WidgetId, Rect)]) -> Vec<WidgetId> {
    rendered
        .iter()
        .filter(|(_, rect)| rect.intersects(area))
        .map(|(id, _)| id.clone())
        .collect()
}

// ============================================================================
// Group transform planning
// ============================================================================

/// Planned positions for a group move.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMovePlan {
    pub positions: Vec<(WidgetId, Point)>,
    pub snap_lines: Vec<SnapLine>,
    /// Total offset applied to the snapshot.
    pub offset: Point,
}

impl GroupMovePlan {
    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<Point> {
        self.positions
            .iter()
            .find(|(member, _)| *member == *id)
            .map(|(_, p)| *p)
    }
}

fn finish_plan(
    snapshot: &[(WidgetId, Rect)],
    offset: Point,
    snap_lines: Vec<SnapLine>,
    viewport: Viewport,
) -> GroupMovePlan {
    let moved: Vec<Rect> = snapshot
        .iter()
        .map(|(_, r)| r.translate(offset.x, offset.y))
        .collect();
    let clamp = Rect::bounding(&moved).map_or(Point::ORIGIN, |b| viewport.containment_offset(&b));
    let offset = offset.offset(clamp.x, clamp.y);
    GroupMovePlan {
        positions: snapshot
            .iter()
            .map(|(id, r)| (id.clone(), r.origin().offset(offset.x, offset.y)))
            .collect(),
        snap_lines,
        offset,
    }
}

/// Drag plan: snapshot + pointer delta, primary-driven snap, group clamp.
#[must_use]
pub fn plan_group_move(
    snapshot: &[(WidgetId, Rect)],
    primary: &WidgetId,
    delta: Point,
    snap: &SnapEngine,
    neighbors: &[(WidgetId, Rect)],
    viewport: Viewport,
) -> GroupMovePlan {
    let members: BTreeSet<WidgetId> = snapshot.iter().map(|(id, _)| id.clone()).collect();
    let primary_rect = snapshot
        .iter()
        .find(|(id, _)| id == primary)
        .map(|(_, r)| r.translate(delta.x, delta.y));

    let (offset, lines) = match primary_rect {
        Some(raw) => {
            let outcome = snap.find_snap_lines(primary, raw, neighbors, &members);
            let correction = outcome.offset_from(raw.origin());
            (delta.offset(correction.x, correction.y), outcome.lines)
        }
        None => (delta, Vec::new()),
    };
    finish_plan(snapshot, offset, lines, viewport)
}

/// Plain offset with group clamp and no snapping.
#[must_use]
pub fn plan_group_nudge(snapshot: &[(WidgetId, Rect)], delta: Point, viewport: Viewport) -> GroupMovePlan {
    finish_plan(snapshot, delta, Vec::new(), viewport)
}

/// Directional jump of the primary, applied to the group. `None` when the
/// primary has nothing to jump to.
#[must_use]
pub fn plan_group_jump(
    snapshot: &[(WidgetId, Rect)],
    primary: &WidgetId,
    direction: Direction,
    snap: &SnapEngine,
    neighbors: &[(WidgetId, Rect)],
    viewport: Viewport,
) -> Option<GroupMovePlan> {
    let members: BTreeSet<WidgetId> = snapshot.iter().map(|(id, _)| id.clone()).collect();
    let (_, rect) = snapshot.iter().find(|(id, _)| id == primary)?;
    let jump = snap.find_next_snap_position(primary, *rect, direction, neighbors, &members)?;
    let offset = Point::new(jump.position.x - rect.x, jump.position.y - rect.y);
    Some(finish_plan(snapshot, offset, vec![jump.line], viewport))
}

// ============================================================================
// Controller
// ============================================================================

/// Keyboard nudge granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeKind {
    Step,
    Coarse,
    /// Jump to the next snap target in the direction.
    Jump,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NudgeOutcome {
    /// Preview moved; `offset` is the total since key-down began.
    Moved { offset: Point },
    /// Directional jump found no target; nothing changed.
    Blocked,
    /// Nothing selected or not in edit mode.
    Ignored,
}

/// What a pointer release did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRelease {
    /// A drag committed this many widget positions.
    Committed(usize),
    /// A marquee finished; the selection now has this many widgets.
    Selected(usize),
    Idle,
}

#[derive(Debug, Clone)]
struct GroupGesture {
    snapshot: Vec<(WidgetId, Rect)>,
    primary: WidgetId,
    pointer_origin: Point,
    preview: Option<GroupMovePlan>,
}

#[derive(Debug, Clone, Default)]
enum Interaction {
    #[default]
    Idle,
    Marquee(Marquee),
    Drag(GroupGesture),
    Nudge(GroupGesture),
}

/// Pointer and keyboard interaction over a [`LayoutStore`].
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selection: SelectionState,
    interaction: Interaction,
}

impl SelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    /// Marquee in progress, for drawing.
    #[must_use]
    pub fn marquee(&self) -> Option<&Marquee> {
        match &self.interaction {
            Interaction::Marquee(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.interaction, Interaction::Drag(_))
    }

    fn preview(&self) -> Option<&GroupMovePlan> {
        match &self.interaction {
            Interaction::Drag(g) | Interaction::Nudge(g) => g.preview.as_ref(),
            _ => None,
        }
    }

    /// Transient position of a widget during a drag or nudge.
    #[must_use]
    pub fn preview_position(&self, id: &str) -> Option<Point> {
        self.preview().and_then(|p| p.position_of(id))
    }

    /// Guide lines of the current preview.
    #[must_use]
    pub fn snap_lines(&self) -> &[SnapLine] {
        self.preview().map_or(&[][..], |p| p.snap_lines.as_slice())
    }

    /// Begin a click, drag or marquee. Ignored outside edit mode.
    pub fn pointer_down<M: Measurer>(&mut self, store: &LayoutStore<M>, point: Point, modifier: bool) {
        if !store.state().edit_mode {
            return;
        }
        self.commitless_reset();

        let rendered = store.rendered_rects();
        let hit = rendered
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(point))
            .map(|(id, _)| id.clone());

        let Some(id) = hit else {
            self.interaction = Interaction::Marquee(Marquee {
                origin: point,
                current: point,
                additive: modifier,
            });
            return;
        };

        if modifier {
            self.selection.shift_toggle(id.clone());
        } else if !self.selection.contains(id.as_str()) {
            self.selection.select_only(id.clone());
        } else {
            self.selection.primary = Some(id.clone());
        }

        if self.selection.contains(id.as_str()) {
            self.interaction = Interaction::Drag(GroupGesture {
                snapshot: self.snapshot(store),
                primary: id,
                pointer_origin: point,
                preview: None,
            });
        }
    }

    /// Update the marquee or drag preview.
    pub fn pointer_move<M: Measurer>(&mut self, store: &LayoutStore<M>, point: Point) {
        match &mut self.interaction {
            Interaction::Marquee(m) => m.current = point,
            Interaction::Drag(gesture) => {
                let delta = Point::new(point.x - gesture.pointer_origin.x, point.y - gesture.pointer_origin.y);
                let neighbors = neighbors(store, &self.selection);
                gesture.preview = Some(plan_group_move(
                    &gesture.snapshot,
                    &gesture.primary,
                    delta,
                    &store.snap_engine(),
                    &neighbors,
                    store.viewport(),
                ));
            }
            Interaction::Idle | Interaction::Nudge(_) => {}
        }
    }

    /// Finish the gesture: commit a drag or apply a marquee.
    pub fn pointer_up<M: Measurer>(&mut self, store: &mut LayoutStore<M>, point: Point) -> Result<PointerRelease> {
        self.pointer_move(store, point);
        match std::mem::take(&mut self.interaction) {
            Interaction::Drag(gesture) => match gesture.preview {
                Some(plan) => {
                    store.commit_positions(&plan.positions)?;
                    Ok(PointerRelease::Committed(plan.positions.len()))
                }
                None => Ok(PointerRelease::Idle),
            },
            Interaction::Marquee(marquee) => {
                let hits = marquee_hits(&marquee.rect(), &store.rendered_rects());
                self.selection.apply_marquee(hits, marquee.additive);
                Ok(PointerRelease::Selected(self.selection.len()))
            }
            other => {
                self.interaction = other;
                Ok(PointerRelease::Idle)
            }
        }
    }

    /// Abort the current gesture without committing.
    pub fn cancel(&mut self) {
        self.interaction = Interaction::Idle;
    }

    fn commitless_reset(&mut self) {
        if !matches!(self.interaction, Interaction::Idle) {
            tracing::debug!("discarding unfinished gesture");
        }
        self.interaction = Interaction::Idle;
    }

    /// Arrow key pressed (or auto-repeated).
    pub fn key_down<M: Measurer>(
        &mut self,
        store: &LayoutStore<M>,
        direction: Direction,
        kind: NudgeKind,
    ) -> NudgeOutcome {
        if !store.state().edit_mode || self.selection.is_empty() || self.is_dragging() {
            return NudgeOutcome::Ignored;
        }
        let Some(primary) = self.selection.effective_primary().cloned() else {
            return NudgeOutcome::Ignored;
        };
        if !matches!(self.interaction, Interaction::Nudge(_)) {
            self.interaction = Interaction::Nudge(GroupGesture {
                snapshot: self.snapshot(store),
                primary,
                pointer_origin: Point::ORIGIN,
                preview: None,
            });
        }
        let neighbors = neighbors(store, &self.selection);
        let Interaction::Nudge(gesture) = &mut self.interaction else {
            return NudgeOutcome::Ignored;
        };

        let so_far = gesture.preview.as_ref().map_or(Point::ORIGIN, |p| p.offset);
        let viewport = store.viewport();
        let plan = match kind {
            NudgeKind::Step | NudgeKind::Coarse => {
                let nudge = store.config().nudge;
                let step = if kind == NudgeKind::Step { nudge.step } else { nudge.coarse_step };
                let unit = direction.unit();
                let delta = so_far.offset(unit.x * step, unit.y * step);
                plan_group_nudge(&gesture.snapshot, delta, viewport)
            }
            NudgeKind::Jump => {
                let current: Vec<(WidgetId, Rect)> = gesture
                    .snapshot
                    .iter()
                    .map(|(id, r)| (id.clone(), r.translate(so_far.x, so_far.y)))
                    .collect();
                let Some(jump) = plan_group_jump(
                    &current,
                    &gesture.primary,
                    direction,
                    &store.snap_engine(),
                    &neighbors,
                    viewport,
                ) else {
                    return NudgeOutcome::Blocked;
                };
                let total = so_far.offset(jump.offset.x, jump.offset.y);
                GroupMovePlan {
                    offset: total,
                    ..jump
                }
            }
        };

        let offset = plan.offset;
        gesture.preview = Some(plan);
        NudgeOutcome::Moved { offset }
    }

    /// Arrow key released: commit the nudge. Returns whether anything was
    /// committed.
    pub fn key_up<M: Measurer>(&mut self, store: &mut LayoutStore<M>) -> Result<bool> {
        if !matches!(self.interaction, Interaction::Nudge(_)) {
            return Ok(false);
        }
        let Interaction::Nudge(gesture) = std::mem::take(&mut self.interaction) else {
            return Ok(false);
        };
        match gesture.preview {
            Some(plan) => {
                store.commit_positions(&plan.positions)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn snapshot<M: Measurer>(&self, store: &LayoutStore<M>) -> Vec<(WidgetId, Rect)> {
        self.selection
            .selected
            .iter()
            .filter_map(|id| store.widget_rect(id.as_str()).map(|r| (id.clone(), r)))
            .collect()
    }
}

fn neighbors<M: Measurer>(store: &LayoutStore<M>, selection: &SelectionState) -> Vec<(WidgetId, Rect)> {
    store
        .rendered_rects()
        .into_iter()
        .filter(|(id, _)| !selection.contains(id.as_str()))
        .collect()
}
