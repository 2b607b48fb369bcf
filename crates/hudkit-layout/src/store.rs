#![forbid(unsafe_code)]

//! Mutable, persisted layout state and the operations that edit it.
//!
//! # Invariants
//!
//! 1. Every committed position keeps the widget's measured rectangle inside
//!    the viewport when it fits (see [`Viewport::clamp_origin`]).
//! 2. Every committed scale lies in the configured scale range.
//! 3. Operations on unknown ids fail without touching state.
//! 4. Every committed change is saved and reported to the observer; a save
//!    failure is logged and never surfaces as an error.
//!
//! # Failure Modes
//!
//! A blob that fails to load or validate is discarded as a whole and the
//! store starts from defaults. Nothing a user does through the store can
//! fail except naming a widget that does not exist.

use std::sync::Arc;

use hudkit_core::{Point, Rect, Size, Viewport, WidgetId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::LayoutConfig;
use crate::descriptor::WidgetDescriptor;
use crate::engine::LayoutEngine;
use crate::error::{LayoutError, Result};
use crate::measure::Measurer;
use crate::persist::LayoutStorage;
use crate::relayout::RelayoutWindow;
use crate::resolver::{DefaultLayout, ResolveContext};
use crate::settings::{LayoutSettings, MinimapShape, SettingChange, SpeedometerStyle, StatusDesign};
use crate::snap::SnapEngine;
use crate::state::{DEFAULT_GRID_SIZE, LayoutState, ResolvedWidgetConfig, default_widgets};

/// Host notification hook.
pub trait LayoutObserver {
    /// Called after every committed change.
    fn layout_committed(&mut self, state: &LayoutState);
}

/// Owner of the live widget configuration.
pub struct LayoutStore<M: Measurer> {
    engine: Arc<LayoutEngine>,
    measurer: M,
    config: LayoutConfig,
    state: LayoutState,
    storage: Box<dyn LayoutStorage>,
    observer: Option<Box<dyn LayoutObserver>>,
    disabled: FxHashSet<WidgetId>,
    ready: bool,
    /// Last resolved defaults; supplies sizes of unmounted widgets.
    defaults: DefaultLayout,
    pub(crate) hidden: FxHashSet<WidgetId>,
    pub(crate) relayout: Option<RelayoutWindow>,
}

/// Measurer seen by position functions: live rectangles come from the
/// committed position and the measured size.
///
/// Widgets in `following` are about to move to their new default, so they
/// report no live rectangle and readers see the rectangle resolved in the
/// same pass.
struct StoreView<'a, M: Measurer> {
    measurer: &'a M,
    state: &'a LayoutState,
    following: Option<&'a FxHashSet<WidgetId>>,
}

impl<M: Measurer> Measurer for StoreView<'_, M> {
    fn viewport(&self) -> Viewport {
        self.measurer.viewport()
    }

    fn widget_size(&self, id: &str) -> Option<Size> {
        self.measurer.widget_size(id)
    }

    fn widget_rect(&self, id: &str) -> Option<Rect> {
        if self.following.is_some_and(|set| set.contains(id)) {
            return None;
        }
        self.measurer.widget_rect(id).or_else(|| {
            let size = self.measurer.widget_size(id)?;
            let widget = self.state.widget(id)?;
            Some(Rect::from_origin_size(widget.position, size))
        })
    }
}

impl<M: Measurer> LayoutStore<M> {
    /// Load persisted state (or start fresh) and clamp it to the viewport.
    pub fn new(
        engine: Arc<LayoutEngine>,
        measurer: M,
        storage: impl LayoutStorage + 'static,
        config: LayoutConfig,
    ) -> Self {
        let mut store = Self {
            engine,
            measurer,
            config,
            state: LayoutState::default(),
            storage: Box::new(storage),
            observer: None,
            disabled: FxHashSet::default(),
            ready: false,
            defaults: DefaultLayout::default(),
            hidden: FxHashSet::default(),
            relayout: None,
        };
        let persisted = store.load_persisted();
        if let Some(state) = &persisted {
            store.measurer.apply_settings(&state.settings);
        }
        for descriptor in store.engine.descriptors().iter() {
            let scale = persisted
                .as_ref()
                .and_then(|state| state.widget(descriptor.id.as_str()))
                .map_or(descriptor.default_scale, |w| w.scale);
            store
                .measurer
                .apply_scale(descriptor.id.as_str(), store.config.scale.clamp(scale));
        }
        store.defaults = store.resolve_defaults();
        let descriptors = store.engine.descriptors();
        store.state = match persisted {
            Some(state) => state.merge(descriptors, &store.defaults),
            None => LayoutState::fresh(descriptors, &store.defaults),
        };
        store.clamp_all();
        store
    }

    /// Persisted state, or `None` when absent or unusable.
    fn load_persisted(&self) -> Option<LayoutState> {
        let blob = match self.storage.load() {
            Ok(blob) => blob?,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read layout storage; using defaults");
                return None;
            }
        };
        match LayoutState::from_json(&blob) {
            Ok(state) => {
                tracing::debug!(widgets = state.widgets.len(), "loaded persisted layout");
                Some(state)
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding corrupt layout blob; using defaults");
                None
            }
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl LayoutObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<LayoutEngine> {
        &self.engine
    }

    #[must_use]
    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// Mutable access for the host's measurement pass. Call
    /// [`clamp_to_viewport`](Self::clamp_to_viewport) after resizing.
    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.measurer
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.measurer.viewport()
    }

    #[must_use]
    pub fn widget(&self, id: &str) -> Option<&ResolvedWidgetConfig> {
        self.state.widget(id)
    }

    /// Committed rectangle: position plus measured size.
    #[must_use]
    pub fn widget_rect(&self, id: &str) -> Option<Rect> {
        let widget = self.state.widget(id)?;
        Some(Rect::from_origin_size(widget.position, self.measured_size(id)))
    }

    /// Visible, enabled and not hidden by a pending relayout.
    #[must_use]
    pub fn is_widget_rendered(&self, id: &str) -> bool {
        self.state.widget(id).is_some_and(|w| w.visible)
            && !self.disabled.contains(id)
            && !self.hidden.contains(id)
    }

    /// Rectangles of every rendered widget, in state order.
    #[must_use]
    pub fn rendered_rects(&self) -> Vec<(WidgetId, Rect)> {
        self.state
            .widgets
            .iter()
            .filter(|w| self.is_widget_rendered(w.id.as_str()))
            .map(|w| {
                let rect = Rect::from_origin_size(w.position, self.measured_size(w.id.as_str()));
                (w.id.clone(), rect)
            })
            .collect()
    }

    #[must_use]
    pub fn is_widget_disabled(&self, id: &str) -> bool {
        self.disabled.contains(id)
    }

    #[must_use]
    pub fn has_signaled_ready(&self) -> bool {
        self.ready
    }

    /// Whether the widget sits within tolerance of its current default.
    pub fn is_at_default(&self, id: &str) -> Result<bool> {
        let widget = self.require(id)?;
        let defaults = self.resolve_defaults();
        Ok(defaults
            .position(id)
            .is_some_and(|d| self.within_tolerance(widget.position, d)))
    }

    /// Snap engine configured with the current grid setting.
    #[must_use]
    pub fn snap_engine(&self) -> SnapEngine {
        let grid = self.state.snap_to_grid.then_some(self.state.grid_size);
        SnapEngine::new(self.config.snap).with_grid(grid)
    }

    /// Resolve defaults against the current measurements and state.
    #[must_use]
    pub fn resolve_defaults(&self) -> DefaultLayout {
        self.resolve_defaults_following(None)
    }

    /// Like [`resolve_defaults`](Self::resolve_defaults), but widgets in
    /// `following` are read at their freshly resolved default instead of
    /// their committed position.
    pub(crate) fn resolve_defaults_following(
        &self,
        following: Option<&FxHashSet<WidgetId>>,
    ) -> DefaultLayout {
        let view = StoreView {
            measurer: &self.measurer,
            state: &self.state,
            following,
        };
        let fallbacks: FxHashMap<WidgetId, Point> = self
            .state
            .widgets
            .iter()
            .map(|w| (w.id.clone(), w.position))
            .collect();
        let ctx = ResolveContext::new(&view)
            .with_disabled(&self.disabled)
            .with_ready(self.ready)
            .with_fallbacks(&fallbacks)
            .with_previous(&self.defaults);
        self.engine.resolve_defaults(&ctx)
    }

    pub(crate) fn refresh_defaults(&mut self) -> &DefaultLayout {
        self.defaults = self.resolve_defaults();
        &self.defaults
    }

    pub(crate) fn set_defaults(&mut self, defaults: DefaultLayout) {
        self.defaults = defaults;
    }

    // ------------------------------------------------------------------
    // Widget edits
    // ------------------------------------------------------------------

    /// Move a widget; returns the clamped position actually committed.
    pub fn update_widget_position(&mut self, id: &str, position: Point) -> Result<Point> {
        self.require(id)?;
        let clamped = self.clamp_position(id, position);
        if let Some(widget) = self.state.widget_mut(id) {
            widget.position = clamped;
        }
        self.commit();
        Ok(clamped)
    }

    /// Move several widgets at once with a single commit.
    pub fn commit_positions(&mut self, positions: &[(WidgetId, Point)]) -> Result<()> {
        for (id, _) in positions {
            self.require(id.as_str())?;
        }
        for (id, position) in positions {
            let clamped = self.clamp_position(id.as_str(), *position);
            if let Some(widget) = self.state.widget_mut(id.as_str()) {
                widget.position = clamped;
            }
        }
        if !positions.is_empty() {
            self.commit();
        }
        Ok(())
    }

    /// Returns the clamped scale actually committed.
    pub fn update_widget_scale(&mut self, id: &str, scale: f64) -> Result<f64> {
        self.require(id)?;
        let scale = self.config.scale.clamp(scale);
        self.measurer.apply_scale(id, scale);
        let position = self.clamp_position(id, self.require(id)?.position);
        if let Some(widget) = self.state.widget_mut(id) {
            widget.scale = scale;
            widget.position = position;
        }
        self.commit();
        Ok(scale)
    }

    /// Flip visibility; returns the new value.
    pub fn toggle_widget_visibility(&mut self, id: &str) -> Result<bool> {
        self.require(id)?;
        let mut visible = false;
        if let Some(widget) = self.state.widget_mut(id) {
            widget.visible = !widget.visible;
            visible = widget.visible;
        }
        self.commit();
        Ok(visible)
    }

    /// Restore one widget's default position, scale and visibility.
    pub fn reset_widget(&mut self, id: &str) -> Result<()> {
        let descriptor = self.descriptor(id)?.clone();
        self.measurer.apply_scale(id, descriptor.default_scale);
        let defaults = self.refresh_defaults();
        let position = defaults.position(id).unwrap_or(Point::ORIGIN);
        self.hidden.remove(id);
        if let Some(widget) = self.state.widget_mut(id) {
            *widget = ResolvedWidgetConfig::from_default(&descriptor, position);
        }
        self.commit();
        Ok(())
    }

    /// Rebuild every widget at its default.
    ///
    /// `force` also restores default settings and grid settings and clears
    /// disabled flags.
    pub fn reset_layout(&mut self, force: bool) {
        if force {
            self.state.settings = LayoutSettings::default();
            self.state.snap_to_grid = false;
            self.state.grid_size = DEFAULT_GRID_SIZE;
            self.disabled.clear();
            let settings = self.state.settings;
            self.measurer.apply_settings(&settings);
        }
        self.relayout = None;
        self.hidden.clear();
        for descriptor in self.engine.descriptors().iter() {
            self.measurer
                .apply_scale(descriptor.id.as_str(), descriptor.default_scale);
        }
        self.refresh_defaults();
        self.state.widgets = default_widgets(self.engine.descriptors(), &self.defaults);
        self.state.widgets_distributed = true;
        tracing::debug!(force, "layout reset");
        self.commit();
    }

    /// First-run placement: put every widget at its default once.
    ///
    /// Returns false when the layout was already distributed.
    pub fn distribute_widgets(&mut self) -> bool {
        if self.state.widgets_distributed {
            return false;
        }
        self.refresh_defaults();
        for widget in &mut self.state.widgets {
            if let Some(position) = self.defaults.position(widget.id.as_str()) {
                widget.position = position;
            }
        }
        self.state.widgets_distributed = true;
        tracing::debug!(widgets = self.state.widgets.len(), "widgets distributed");
        self.commit();
        true
    }

    /// Re-clamp every widget, e.g. after the viewport shrank.
    pub fn clamp_to_viewport(&mut self) {
        if self.clamp_all() {
            self.commit();
        }
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn set_status_design(&mut self, design: StatusDesign) -> bool {
        self.apply_setting(SettingChange::StatusDesign(design))
    }

    pub fn set_minimap_shape(&mut self, shape: MinimapShape) -> bool {
        self.apply_setting(SettingChange::MinimapShape(shape))
    }

    pub fn set_speedometer_style(&mut self, style: SpeedometerStyle) -> bool {
        self.apply_setting(SettingChange::SpeedometerStyle(style))
    }

    /// Apply a layout-affecting setting and open a relayout window.
    ///
    /// Returns false, without opening a window, when the value is unchanged.
    /// The host calls [`run_auto_relayout`](Self::run_auto_relayout) after
    /// its next measurement pass.
    pub fn apply_setting(&mut self, change: SettingChange) -> bool {
        if !change.changes(&self.state.settings) {
            return false;
        }
        let affected = self.engine.affected_by_kind(change.affected_kind());
        self.start_auto_relayout(&affected);
        change.apply(&mut self.state.settings);
        let settings = self.state.settings;
        self.measurer.apply_settings(&settings);
        self.commit();
        true
    }

    /// Session-only; never persisted.
    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.state.edit_mode = enabled;
    }

    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        if self.state.snap_to_grid != enabled {
            self.state.snap_to_grid = enabled;
            self.commit();
        }
    }

    pub fn set_grid_size(&mut self, size: f64) -> Result<()> {
        if !(size.is_finite() && size > 0.0) {
            return Err(LayoutError::InvalidGridSize(size));
        }
        self.state.grid_size = size;
        self.commit();
        Ok(())
    }

    /// Host-driven flag; disabled widgets still resolve so dependents keep
    /// their anchor.
    pub fn set_widget_disabled(&mut self, id: &str, disabled: bool) -> Result<()> {
        self.require(id)?;
        if disabled {
            self.disabled.insert(WidgetId::from(id));
        } else {
            self.disabled.remove(id);
        }
        Ok(())
    }

    /// The host's live data is available.
    pub fn signal_ready(&mut self) {
        self.ready = true;
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require(&self, id: &str) -> Result<&ResolvedWidgetConfig> {
        self.state
            .widget(id)
            .ok_or_else(|| LayoutError::UnknownWidget(WidgetId::from(id)))
    }

    fn descriptor(&self, id: &str) -> Result<&WidgetDescriptor> {
        self.engine
            .descriptors()
            .get(id)
            .ok_or_else(|| LayoutError::UnknownWidget(WidgetId::from(id)))
    }

    pub(crate) fn measured_size(&self, id: &str) -> Size {
        self.measurer
            .widget_size(id)
            .or_else(|| self.defaults.rect(id).map(|r| r.size()))
            .unwrap_or(Size::ZERO)
    }

    pub(crate) fn clamp_position(&self, id: &str, position: Point) -> Point {
        self.measurer
            .viewport()
            .clamp_origin(position, self.measured_size(id))
    }

    pub(crate) fn within_tolerance(&self, a: Point, b: Point) -> bool {
        a.max_axis_distance(b) <= self.config.relayout.tolerance_px
    }

    pub(crate) fn set_position_unchecked(&mut self, id: &str, position: Point) {
        let clamped = self.clamp_position(id, position);
        if let Some(widget) = self.state.widget_mut(id) {
            widget.position = clamped;
        }
    }

    /// Clamp positions and scales in place; true when anything changed.
    fn clamp_all(&mut self) -> bool {
        let viewport = self.measurer.viewport();
        let scale = self.config.scale;
        let sizes: Vec<Size> = self
            .state
            .widgets
            .iter()
            .map(|w| self.measured_size(w.id.as_str()))
            .collect();
        let mut changed = false;
        for (widget, size) in self.state.widgets.iter_mut().zip(sizes) {
            let position = viewport.clamp_origin(widget.position, size);
            let clamped_scale = scale.clamp(widget.scale);
            if position != widget.position || clamped_scale != widget.scale {
                widget.position = position;
                widget.scale = clamped_scale;
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn commit(&mut self) {
        match self.state.to_json() {
            Ok(blob) => {
                if let Err(err) = self.storage.save(&blob) {
                    tracing::warn!(error = %err, "failed to save layout");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to serialize layout"),
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.layout_committed(&self.state);
        }
    }
}
