//! Image quality and similarity metrics.
//!
//! These compare a restored image against a reference, for reporting how well a
//! deconvolution recovered the original signal.
//!
//! # Available Metrics
//!
//! - **MSE** (Mean Squared Error): Average squared difference between pixels
//! - **NMSE** (Normalized Mean Squared Error): MSE divided by the reference energy

mod mse;
mod nmse;

pub use mse::mse;
pub use nmse::nmse;
