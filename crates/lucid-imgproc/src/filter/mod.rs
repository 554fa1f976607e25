//! Filter operations
//!
//! This module provides the convolution primitive used by the deconvolution module and
//! the kernels it is usually fed with.
//!
//! Two convolvers implement the [`Convolver`] trait:
//!
//! - [`FftConvolver`]: frequency-domain convolution backed by `rustfft`. This is the default.
//! - [`DirectConvolver`]: spatial-domain convolution, exact and slow. Useful as a reference.
//!
//! Both compute a true convolution with the kernel centred at `(height / 2, width / 2)`,
//! resolve out-of-range pixels with a [`crate::padding::BoundaryMode`] and never crop: the
//! output always has the shape of the input.

/// Filter kernels
pub mod kernels;

mod convolve;
pub use convolve::*;

mod direct;
pub use direct::*;

mod fft;
pub use fft::*;
