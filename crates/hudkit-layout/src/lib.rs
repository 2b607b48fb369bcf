#![forbid(unsafe_code)]

//! Dependency-aware widget layout for the hudkit overlay.
//!
//! # Role in hudkit
//! Widgets declare *where they go by default* as position functions that may
//! read other widgets' rectangles. This crate discovers the resulting
//! dependency graph ([`dependency`]), resolves defaults in dependency order
//! ([`resolver`]), owns the live persisted state ([`store`]), re-flows
//! widgets still at their default when a size-changing setting flips
//! ([`relayout`]), and provides the snapping ([`snap`]) and multi-selection
//! ([`selection`]) math used while editing.
//!
//! Rendering is not done here. The host supplies geometry through
//! [`Measurer`] and persistence through [`LayoutStorage`].

pub mod config;
pub mod dependency;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod measure;
pub mod persist;
pub mod relayout;
pub mod resolver;
pub mod selection;
pub mod settings;
pub mod snap;
pub mod state;
pub mod store;

pub use config::{ConfigError, LayoutConfig, NudgeConfig, RelayoutConfig, ScaleConfig, SnapConfig};
pub use dependency::{CycleError, DependencyGraph, RecordingResolver};
pub use descriptor::{DescriptorSet, MeasuredElement, PositionFn, WidgetDescriptor, WidgetKind};
pub use engine::LayoutEngine;
pub use error::{DescriptorError, LayoutError, PositionError, Result};
pub use measure::{Measurer, StaticMeasurer};
pub use persist::{JsonFileStorage, LayoutStorage, MemoryStorage, StorageError};
pub use relayout::RelayoutReport;
pub use resolver::{DefaultEntry, DefaultLayout, ResolveContext, Resolver, resolve_defaults};
pub use selection::{
    GroupMovePlan, Marquee, NudgeKind, NudgeOutcome, PointerRelease, SelectionController,
    SelectionState, marquee_hits, plan_group_jump, plan_group_move, plan_group_nudge,
};
pub use settings::{LayoutSettings, MinimapShape, SettingChange, SpeedometerStyle, StatusDesign};
pub use snap::{
    Direction, Edge, Orientation, SnapEngine, SnapJump, SnapKind, SnapLine, SnapOutcome,
    snap_to_grid,
};
pub use state::{LAYOUT_SCHEMA_VERSION, LayoutState, ResolvedWidgetConfig, StateError};
pub use store::{LayoutObserver, LayoutStore};

pub use hudkit_core::{Point, Rect, Size, Viewport, WidgetId};
