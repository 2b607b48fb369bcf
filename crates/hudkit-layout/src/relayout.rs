#![forbid(unsafe_code)]

//! Auto-relayout after a layout-affecting setting change.
//!
//! When a setting changes the rendered size of some widgets, the widgets
//! that were still sitting at their default should follow the new default;
//! widgets the user placed by hand must not move.
//!
//! # Protocol
//!
//! 1. [`LayoutStore::start_auto_relayout`] resolves the current defaults of
//!    the affected widgets and their dependents. Widgets within tolerance of
//!    that default become candidates and are hidden.
//! 2. The caller applies the setting change.
//! 3. After the host's next measurement pass, [`LayoutStore::run_auto_relayout`]
//!    resolves the new defaults and moves each candidate that is still at
//!    its captured old default. All candidates are un-hidden.
//!
//! A candidate the user moves between steps 1 and 3 is skipped. Starting a
//! second window while one is pending merges into it, keeping the earliest
//! capture per widget.

use hudkit_core::{Point, WidgetId};
use rustc_hash::FxHashSet;

use crate::measure::Measurer;
use crate::store::LayoutStore;

/// Pending relayout: candidates with their captured old default origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RelayoutWindow {
    candidates: Vec<(WidgetId, Point)>,
}

impl RelayoutWindow {
    fn contains(&self, id: &WidgetId) -> bool {
        self.candidates.iter().any(|(c, _)| c == id)
    }
}

/// Outcome of [`LayoutStore::run_auto_relayout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayoutReport {
    /// Candidates moved to their new default, in declaration order.
    pub moved: Vec<WidgetId>,
    /// Candidates left alone because they moved during the window.
    pub skipped: Vec<WidgetId>,
}

impl<M: Measurer> LayoutStore<M> {
    /// Open (or extend) a relayout window for `affected` and its dependents.
    pub fn start_auto_relayout(&mut self, affected: &[WidgetId]) {
        let ids = self.engine().graph().affected_by(affected);
        let defaults = self.refresh_defaults().subset(&ids);
        let mut window = self.relayout.take().unwrap_or_default();

        for id in ids {
            if window.contains(&id) {
                continue;
            }
            let (Some(widget), Some(old)) = (self.widget(id.as_str()), defaults.get(&id)) else {
                continue;
            };
            let old = old.origin();
            if self.within_tolerance(widget.position, old) {
                self.hidden.insert(id.clone());
                window.candidates.push((id, old));
            }
        }

        tracing::debug!(
            candidates = window.candidates.len(),
            "auto-relayout window open"
        );
        self.relayout = Some(window);
    }

    #[must_use]
    pub fn has_pending_relayout(&self) -> bool {
        self.relayout.is_some()
    }

    /// Hidden while waiting for relayout.
    #[must_use]
    pub fn is_relayout_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    /// Finish the pending relayout. `None` when no window is open.
    pub fn run_auto_relayout(&mut self) -> Option<RelayoutReport> {
        let window = self.relayout.take()?;
        let following: FxHashSet<WidgetId> = window
            .candidates
            .iter()
            .filter(|(id, old)| self.still_at(id, *old))
            .map(|(id, _)| id.clone())
            .collect();
        let defaults = self.resolve_defaults_following(Some(&following));
        self.set_defaults(defaults.clone());
        let mut report = RelayoutReport::default();

        for (id, _) in window.candidates {
            match defaults.position(id.as_str()) {
                Some(new) if following.contains(&id) => {
                    self.set_position_unchecked(id.as_str(), new);
                    report.moved.push(id);
                }
                _ => report.skipped.push(id),
            }
        }
        self.hidden.clear();

        let order = self.engine().descriptors();
        report
            .moved
            .sort_by_key(|id| order.index_of(id.as_str()).unwrap_or(usize::MAX));
        report
            .skipped
            .sort_by_key(|id| order.index_of(id.as_str()).unwrap_or(usize::MAX));

        tracing::debug!(
            moved = report.moved.len(),
            skipped = report.skipped.len(),
            "auto-relayout finished"
        );
        if !report.moved.is_empty() {
            self.commit();
        }
        Some(report)
    }

    fn still_at(&self, id: &WidgetId, old: Point) -> bool {
        self.widget(id.as_str())
            .is_some_and(|w| self.within_tolerance(w.position, old))
    }
}
