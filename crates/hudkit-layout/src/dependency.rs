#![forbid(unsafe_code)]

//! Widget dependency graph discovered from position functions.
//!
//! # Design
//!
//! Position functions are opaque closures, so the graph is not declared; it
//! is *observed*. [`DependencyGraph::extract`] calls every position function
//! once with a [`RecordingResolver`] that answers every rectangle query with
//! a fixed dummy rectangle and writes the queried id to a trace. The trace,
//! minus self-references, is the widget's direct dependency set.
//!
//! Edges are stored as per-widget adjacency lists indexed by declaration
//! position, in both directions:
//!
//! | List         | Meaning                                          |
//! |--------------|--------------------------------------------------|
//! | `forward`    | widgets this widget reads (direct)               |
//! | `dependents` | widgets that read this one, directly or through  |
//! |              | a chain (reverse transitive closure)             |
//!
//! Every list is sorted by declaration index, so iteration order is stable
//! regardless of the order in which position functions happen to query.
//!
//! # Cycle Detection
//!
//! Cycles are contract violations. [`DependencyGraph::topological_order`]
//! runs Kahn's algorithm with declaration-order tie-breaking; when it stalls
//! a DFS over forward edges recovers one concrete cycle for the error.
//!
//! # Failure Modes
//!
//! A position function that fails during the dry run gets no dependencies.
//! The failure is logged and extraction continues with the next widget.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;

use hudkit_core::{Rect, Size, Viewport, WidgetId};
use rustc_hash::FxHashMap;

use crate::descriptor::{DescriptorSet, MeasuredElement};
use crate::resolver::Resolver;

/// Rectangle handed out during the dry run. Only lets functions complete.
const DUMMY_RECT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 100.0,
    height: 100.0,
    right: 100.0,
    bottom: 100.0,
};

// ============================================================================
// RecordingResolver
// ============================================================================

/// Resolver that records every widget a position function asks about.
///
/// Rectangle and size queries are recorded; the answers are placeholders.
#[derive(Debug, Default)]
pub struct RecordingResolver {
    viewport: Viewport,
    trace: RefCell<Vec<WidgetId>>,
}

impl RecordingResolver {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            trace: RefCell::new(Vec::new()),
        }
    }

    fn record(&self, id: &str) {
        self.trace.borrow_mut().push(WidgetId::from(id));
    }

    /// Take the recorded trace, leaving it empty.
    pub fn take_trace(&self) -> Vec<WidgetId> {
        self.trace.take()
    }
}

impl Resolver for RecordingResolver {
    fn widget_rect(&self, id: &str) -> Option<Rect> {
        self.record(id);
        Some(DUMMY_RECT)
    }

    fn widget_current_rect(&self, id: &str) -> Option<Rect> {
        self.record(id);
        Some(DUMMY_RECT)
    }

    fn widget_size(&self, id: &str) -> Size {
        self.record(id);
        DUMMY_RECT.size()
    }

    fn screen(&self) -> Viewport {
        self.viewport
    }

    fn is_widget_disabled(&self, _id: &str) -> bool {
        false
    }

    fn has_signaled_ready(&self) -> bool {
        true
    }
}

// ============================================================================
// CycleError
// ============================================================================

/// A dependency cycle among position functions.
///
/// `path` starts and ends with the same widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    pub path: Vec<WidgetId>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget dependency cycle detected: ")?;
        for (i, id) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, " → ")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CycleError {}

// ============================================================================
// DependencyGraph
// ============================================================================

/// Direct and reverse-transitive widget dependencies.
///
/// # Examples
///
/// ```
/// use hudkit_layout::dependency::DependencyGraph;
/// use hudkit_core::WidgetId;
///
/// // "meter" reads "minimap"; "voice" reads "meter".
/// let graph = DependencyGraph::from_direct([
///     ("minimap", vec![]),
///     ("meter", vec!["minimap"]),
///     ("voice", vec!["meter"]),
/// ]);
/// let dependents: Vec<&str> = graph.dependents_of("minimap").map(WidgetId::as_str).collect();
/// assert_eq!(dependents, ["meter", "voice"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    ids: Vec<WidgetId>,
    index: FxHashMap<WidgetId, usize>,
    /// Direct reads as recorded, including ids outside the set.
    direct: Vec<Vec<WidgetId>>,
    /// Direct reads restricted to known widgets, sorted by declaration index.
    forward: Vec<Vec<usize>>,
    /// Reverse transitive closure, sorted by declaration index.
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Dry-run every position function and build the graph.
    #[must_use]
    pub fn extract(descriptors: &DescriptorSet) -> Self {
        let recorder = RecordingResolver::default();
        let measured = MeasuredElement::synthesized(DUMMY_RECT.size());
        let mut direct = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors.iter() {
            let outcome = descriptor.position(&measured, &recorder);
            let trace = recorder.take_trace();
            let reads = match outcome {
                Ok(_) => trace,
                Err(err) => {
                    tracing::warn!(
                        widget = %descriptor.id,
                        error = %err,
                        "position function failed during dependency extraction; assuming no dependencies"
                    );
                    Vec::new()
                }
            };
            direct.push((descriptor.id.clone(), reads));
        }

        Self::build(direct)
    }

    /// Build a graph from explicit direct dependencies, in declaration order.
    #[must_use]
    pub fn from_direct<I, D, S>(direct: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        D: IntoIterator<Item = S>,
        S: Into<WidgetId>,
    {
        Self::build(
            direct
                .into_iter()
                .map(|(id, deps)| (id.into(), deps.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    fn build(direct: Vec<(WidgetId, Vec<WidgetId>)>) -> Self {
        let mut graph = Self::default();
        for (i, (id, _)) in direct.iter().enumerate() {
            graph.index.entry(id.clone()).or_insert(i);
            graph.ids.push(id.clone());
        }

        for (id, reads) in direct {
            let mut seen = BTreeSet::new();
            let mut kept = Vec::new();
            let mut forward = BTreeSet::new();
            for read in reads {
                if read == id || !seen.insert(read.clone()) {
                    continue;
                }
                match graph.index.get(&read) {
                    Some(&target) => {
                        forward.insert(target);
                    }
                    None => {
                        tracing::debug!(widget = %id, read = %read, "position function reads an unknown widget");
                    }
                }
                kept.push(read);
            }
            graph.direct.push(kept);
            graph.forward.push(forward.into_iter().collect());
        }

        graph.dependents = reverse_closure(&graph.forward);
        graph
    }

    /// Number of widgets in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Widgets `id` reads directly, in the order first read.
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> &[WidgetId] {
        self.index
            .get(id)
            .map_or(&[][..], |&i| self.direct[i].as_slice())
    }

    /// Widgets whose defaults may change when `id`'s rectangle changes,
    /// in declaration order.
    pub fn dependents_of(&self, id: &str) -> impl Iterator<Item = &WidgetId> + '_ {
        let list = self
            .index
            .get(id)
            .map_or(&[][..], |&i| self.dependents[i].as_slice());
        list.iter().map(|&i| &self.ids[i])
    }

    /// The given widgets plus all their dependents, deduplicated, in
    /// declaration order. Unknown ids are ignored.
    #[must_use]
    pub fn affected_by<'a>(&self, ids: impl IntoIterator<Item = &'a WidgetId>) -> Vec<WidgetId> {
        let mut set = BTreeSet::new();
        for id in ids {
            if let Some(&i) = self.index.get(id) {
                set.insert(i);
                set.extend(self.dependents[i].iter().copied());
            }
        }
        set.into_iter().map(|i| self.ids[i].clone()).collect()
    }

    /// Declaration indices in an order that resolves every widget after the
    /// widgets it reads.
    ///
    /// Equals declaration order whenever declaration order is already valid.
    pub fn topological_order(&self) -> Result<Vec<usize>, CycleError> {
        let n = self.ids.len();
        let mut in_degree: Vec<usize> = self.forward.iter().map(Vec::len).collect();
        let mut readers: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, deps) in self.forward.iter().enumerate() {
            for &d in deps {
                readers[d].push(i);
            }
        }

        // Ordered ready set: always emit the lowest declaration index.
        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &r in &readers[i] {
                in_degree[r] -= 1;
                if in_degree[r] == 0 {
                    ready.insert(r);
                }
            }
        }

        if order.len() < n {
            let path = self.find_cycle().unwrap_or_default();
            return Err(CycleError { path });
        }
        Ok(order)
    }

    /// First cycle reachable when walking widgets in declaration order.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<WidgetId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let n = self.ids.len();
        let mut marks = vec![Mark::Unvisited; n];

        for root in 0..n {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // Iterative DFS: (node, next edge to try).
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::OnStack;
            while let Some(top) = stack.last_mut() {
                let node = top.0;
                if let Some(&next) = self.forward[node].get(top.1) {
                    top.1 += 1;
                    match marks[next] {
                        Mark::Unvisited => {
                            marks[next] = Mark::OnStack;
                            stack.push((next, 0));
                        }
                        Mark::OnStack => {
                            let start = stack
                                .iter()
                                .position(|&(i, _)| i == next)
                                .unwrap_or(0);
                            let mut path: Vec<WidgetId> =
                                stack[start..].iter().map(|&(i, _)| self.ids[i].clone()).collect();
                            path.push(self.ids[next].clone());
                            return Some(path);
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
        None
    }
}

/// Invert the forward lists and propagate until no new edge appears.
fn reverse_closure(forward: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = forward.len();
    let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for (reader, reads) in forward.iter().enumerate() {
        for &anchor in reads {
            dependents[anchor].insert(reader);
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for anchor in 0..n {
            let extra: Vec<usize> = dependents[anchor]
                .iter()
                .flat_map(|&d| dependents[d].iter().copied())
                .filter(|c| !dependents[anchor].contains(c))
                .collect();
            if !extra.is_empty() {
                dependents[anchor].extend(extra);
                changed = true;
            }
        }
    }

    dependents
        .into_iter()
        .map(|set| set.into_iter().collect())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{WidgetDescriptor, WidgetKind};
    use crate::error::PositionError;
    use hudkit_core::Point;

    fn ids(list: &[WidgetId]) -> Vec<&str> {
        list.iter().map(WidgetId::as_str).collect()
    }

    #[test]
    fn extraction_records_reads_minus_self() {
        let set = DescriptorSet::new([
            WidgetDescriptor::new("map", WidgetKind::Minimap, |_, _, _| Ok(Point::ORIGIN)),
            WidgetDescriptor::new("hp", WidgetKind::StatusMeter, |id, _, r| {
                let _ = r.widget_rect(id.as_str());
                let map = r.widget_rect("map").unwrap_or_default();
                Ok(Point::new(map.x, map.y - 10.0))
            }),
            WidgetDescriptor::new("chat", WidgetKind::Chat, |_, _, r| {
                let hp = r.widget_current_rect("hp").unwrap_or_default();
                let _ = r.widget_rect("map");
                let _ = r.widget_rect("hp");
                Ok(hp.origin())
            }),
        ])
        .unwrap();

        let graph = DependencyGraph::extract(&set);
        assert!(graph.dependencies_of("map").is_empty());
        assert_eq!(ids(graph.dependencies_of("hp")), ["map"]);
        assert_eq!(ids(graph.dependencies_of("chat")), ["hp", "map"]);
    }

    #[test]
    fn failing_position_fn_has_no_dependencies() {
        let set = DescriptorSet::new([
            WidgetDescriptor::new("a", WidgetKind::Info, |_, _, _| Ok(Point::ORIGIN)),
            WidgetDescriptor::new("broken", WidgetKind::Info, |_, _, r| {
                let _ = r.widget_rect("a");
                Err(PositionError::Invalid("malformed".into()))
            }),
            WidgetDescriptor::new("c", WidgetKind::Info, |_, _, r| {
                Ok(r.widget_rect("a").unwrap_or_default().origin())
            }),
        ])
        .unwrap();

        let graph = DependencyGraph::extract(&set);
        assert!(graph.dependencies_of("broken").is_empty());
        assert_eq!(ids(graph.dependencies_of("c")), ["a"]);
        let dependents: Vec<_> = graph.dependents_of("a").map(WidgetId::as_str).collect();
        assert_eq!(dependents, ["c"]);
    }

    #[test]
    fn reverse_closure_is_transitive_and_declaration_ordered() {
        // d reads c, c reads b, b reads a; e reads a.
        let graph = DependencyGraph::from_direct([
            ("a", vec![]),
            ("e", vec!["a"]),
            ("d", vec!["c"]),
            ("b", vec!["a"]),
            ("c", vec!["b"]),
        ]);
        let dependents: Vec<_> = graph.dependents_of("a").map(WidgetId::as_str).collect();
        assert_eq!(dependents, ["e", "d", "b", "c"]);
        let dependents: Vec<_> = graph.dependents_of("c").map(WidgetId::as_str).collect();
        assert_eq!(dependents, ["d"]);
        assert_eq!(graph.dependents_of("d").count(), 0);
    }

    #[test]
    fn affected_by_includes_roots_and_dependents() {
        let graph = DependencyGraph::from_direct([
            ("a", vec![]),
            ("b", vec!["a"]),
            ("x", vec![]),
            ("c", vec!["b"]),
        ]);
        let affected = graph.affected_by([&WidgetId::from("b"), &WidgetId::from("ghost")]);
        assert_eq!(ids(&affected), ["b", "c"]);
    }

    #[test]
    fn topological_order_matches_valid_declaration_order() {
        let graph = DependencyGraph::from_direct([
            ("a", vec![]),
            ("b", vec!["a"]),
            ("c", vec!["b", "a"]),
        ]);
        assert_eq!(graph.topological_order().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn topological_order_repairs_bad_declaration_order() {
        let graph = DependencyGraph::from_direct([
            ("below", vec!["anchor"]),
            ("free", vec![]),
            ("anchor", vec![]),
        ]);
        // "free" keeps its slot relative to the stalled "below".
        assert_eq!(graph.topological_order().unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn released_widget_jumps_ahead_of_later_ready_ones() {
        let graph = DependencyGraph::from_direct([
            ("below", vec!["anchor"]),
            ("free", vec![]),
            ("anchor", vec![]),
            ("tail", vec![]),
        ]);
        // Once "anchor" is emitted, "below" has the lowest ready index.
        assert_eq!(graph.topological_order().unwrap(), vec![1, 2, 0, 3]);
    }

    #[test]
    fn unknown_reads_do_not_block_ordering() {
        let graph = DependencyGraph::from_direct([("a", vec!["removed_widget"]), ("b", vec!["a"])]);
        assert_eq!(ids(graph.dependencies_of("a")), ["removed_widget"]);
        assert_eq!(graph.topological_order().unwrap(), vec![0, 1]);
    }

    #[test]
    fn two_node_cycle_detected() {
        let graph = DependencyGraph::from_direct([("a", vec!["b"]), ("b", vec!["a"])]);
        let err = graph.topological_order().unwrap_err();
        assert_eq!(ids(&err.path), ["a", "b", "a"]);
        assert_eq!(
            err.to_string(),
            "widget dependency cycle detected: a → b → a"
        );
    }

    #[test]
    fn three_node_cycle_detected_behind_acyclic_prefix() {
        let graph = DependencyGraph::from_direct([
            ("root", vec![]),
            ("a", vec!["root", "c"]),
            ("b", vec!["a"]),
            ("c", vec!["b"]),
        ]);
        let cycle = graph.find_cycle().unwrap();
        assert_eq!(ids(&cycle), ["a", "c", "b", "a"]);
        assert!(graph.topological_order().is_err());
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let graph = DependencyGraph::from_direct([
            ("a", vec![]),
            ("b", vec!["a"]),
            ("c", vec!["a"]),
            ("d", vec!["b", "c"]),
        ]);
        assert_eq!(graph.find_cycle(), None);
        let dependents: Vec<_> = graph.dependents_of("a").map(WidgetId::as_str).collect();
        assert_eq!(dependents, ["b", "c", "d"]);
    }
}
