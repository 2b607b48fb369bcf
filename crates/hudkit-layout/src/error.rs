#![forbid(unsafe_code)]

//! Error types surfaced by the layout engine.

use hudkit_core::WidgetId;
use thiserror::Error;

use crate::dependency::CycleError;

/// Unified result type for store operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors surfaced by the layout engine and store.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("widget `{0}` is not part of the descriptor set")]
    UnknownWidget(WidgetId),
    #[error("invalid grid size {0}")]
    InvalidGridSize(f64),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// Problems with a static descriptor set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    #[error("duplicate widget id `{0}`")]
    DuplicateId(WidgetId),
    #[error("widget `{id}` has invalid default scale {scale}")]
    InvalidScale { id: WidgetId, scale: f64 },
}

/// Failure reported by a widget position function.
///
/// Position functions are expected to supply their own fallback when an
/// anchor is missing; returning an error makes the resolver fall back to the
/// widget's previous position instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("anchor widget `{0}` has no resolved rectangle")]
    MissingAnchor(WidgetId),
    #[error("{0}")]
    Invalid(String),
}
