#![forbid(unsafe_code)]

//! The overlay's default widget set.
//!
//! [`catalog::default_descriptors`] declares every built-in widget with its
//! anchored position function; [`measure::CatalogMeasurer`] answers sizes
//! from nominal dimensions when no rendering layer is attached.

pub mod catalog;
pub mod measure;

pub use catalog::{default_descriptors, default_engine, ids};
pub use measure::{CatalogMeasurer, nominal_size};
