#![forbid(unsafe_code)]

//! Core primitives for the hudkit overlay layout.
//!
//! # Role in hudkit
//! `hudkit-core` holds the vocabulary every other crate speaks: viewport
//! geometry ([`Point`], [`Size`], [`Rect`], [`Viewport`]) and the opaque
//! [`WidgetId`]. It has no knowledge of widgets, snapping or persistence;
//! those live in `hudkit-layout` and `hudkit-widgets`.

pub mod geometry;
pub mod id;

pub use geometry::{Point, Rect, Size, Viewport};
pub use id::WidgetId;
