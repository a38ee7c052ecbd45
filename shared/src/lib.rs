//! Shared components and utilities for the deblur workspace.

pub mod image_proc;
pub mod image_size;
pub mod timing;

pub use image_size::ImageSize;
