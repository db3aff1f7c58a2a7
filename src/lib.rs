//! ViBe background subtraction for live video
//!
//! The [`segmentation`] module holds the per-pixel sample model. [`capture`]
//! and [`output`] are the seams the frame loop uses to feed it frames and
//! hand its segmentation on.

pub mod capture;
pub mod output;
pub mod segmentation;
