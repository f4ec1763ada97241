//! Viewer-facing glue: navigation, lookahead preloading and hotspot projection.

pub mod controller;

pub use controller::{project, ProjectedHotspot, ViewerController, ViewerOptions};
