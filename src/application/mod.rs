//! Conversion pipeline: pattern expansion, styling, rendering and printing.

pub mod batch;
pub mod context;
pub mod error;
pub mod paths;
pub mod pdf;
pub mod render;
pub mod styles;
