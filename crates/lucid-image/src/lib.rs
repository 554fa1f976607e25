#![deny(missing_docs)]
//! Image types and errors shared by the lucid restoration crates.

/// image representation for restoration purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
