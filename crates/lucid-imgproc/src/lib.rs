#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Richardson-Lucy deconvolution module.
pub mod deconvolution;

/// image filtering and convolution module.
pub mod filter;

/// image flipping module.
pub mod flip;

/// image processing metrics module.
pub mod metrics;

/// noise simulation module.
pub mod noise;

/// boundary handling for out-of-range pixel access.
pub mod padding;
