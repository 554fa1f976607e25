//! Richardson-Lucy deconvolution.
//!
//! Restores an image blurred by a known point-spread function (PSF) with the
//! multiplicative fixed-point update
//!
//! $ u_{k+1} = u_k \cdot \left( \frac{d}{u_k * P} * P^\star \right) $
//!
//! where `d` is the observation, `P` the PSF, `P*` the PSF rotated by 180 degrees and `*`
//! a convolution. The update maximizes the likelihood of `d` under Poisson noise; it runs
//! for a fixed number of iterations and does not check for convergence.
//!
//! # Example
//!
//! ```
//! use lucid_image::Image;
//! use lucid_imgproc::deconvolution::richardson_lucy;
//! use lucid_imgproc::filter::{convolve, kernels, ConvolveOptions};
//!
//! let mut truth = Image::<f32, 1>::from_size_val([16, 16].into(), 0.1).unwrap();
//! truth.as_slice_mut()[8 * 16 + 8] = 10.0;
//!
//! let psf = kernels::gaussian_kernel_2d((5, 5), (1.0, 1.0)).unwrap();
//! let observed = convolve(&truth, &psf, ConvolveOptions::default()).unwrap();
//!
//! let restored = richardson_lucy(&observed, &psf, 30).unwrap();
//! assert_eq!(restored.size(), observed.size());
//! ```

use lucid_image::{Image, ImageError};
use rayon::prelude::*;

use crate::filter::{check_shapes, Convolver, FftConvolver};
use crate::flip;

/// How the ratio `observed / blurred` treats small denominators.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DivisionPolicy {
    /// Plain IEEE division. A zero in the re-blurred estimate yields `inf` or `NaN` that
    /// propagates into the following iterations.
    #[default]
    Propagate,

    /// Add a constant to every denominator: `observed / (blurred + eps)`.
    Epsilon(f32),

    /// The ratio is 0 wherever `blurred < eps`, plain division elsewhere.
    Threshold(f32),
}

impl DivisionPolicy {
    #[inline]
    fn ratio(&self, observed: f32, blurred: f32) -> f32 {
        match *self {
            DivisionPolicy::Propagate => observed / blurred,
            DivisionPolicy::Epsilon(eps) => observed / (blurred + eps),
            DivisionPolicy::Threshold(eps) => {
                if blurred < eps {
                    0.0
                } else {
                    observed / blurred
                }
            }
        }
    }
}

/// Configuration of a [`RichardsonLucy`] run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RichardsonLucyConfig {
    /// Number of updates to apply. Zero returns the initial estimate.
    pub iterations: usize,
    /// Value every element of the initial estimate is set to.
    pub initial_value: f32,
    /// Denominator policy for the observation ratio.
    pub division: DivisionPolicy,
    /// Range the estimate is clamped to after each update, if any.
    pub clip: Option<(f32, f32)>,
}

impl Default for RichardsonLucyConfig {
    fn default() -> Self {
        Self {
            iterations: 30,
            initial_value: 0.5,
            division: DivisionPolicy::Propagate,
            clip: None,
        }
    }
}

impl RichardsonLucyConfig {
    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the initial estimate value.
    pub fn with_initial_value(mut self, value: f32) -> Self {
        self.initial_value = value;
        self
    }

    /// Set the division policy.
    pub fn with_division(mut self, division: DivisionPolicy) -> Self {
        self.division = division;
        self
    }

    /// Clamp the estimate to `[min, max]` after every update.
    ///
    /// The range is validated when the deconvolution runs: `min > max` or a NaN bound
    /// fails with [`ImageError::InvalidClipRange`].
    pub fn with_clip(mut self, min: f32, max: f32) -> Self {
        self.clip = Some((min, max));
        self
    }
}

/// Richardson-Lucy deconvolution driven by a pluggable [`Convolver`].
///
/// The convolver is owned by the deconvolver so that its caches (FFT plans, kernel
/// spectra) survive across iterations and across runs.
pub struct RichardsonLucy<V: Convolver = FftConvolver> {
    config: RichardsonLucyConfig,
    convolver: V,
}

impl RichardsonLucy<FftConvolver> {
    /// Create a deconvolver backed by an [`FftConvolver`] with wrap boundary.
    pub fn new(config: RichardsonLucyConfig) -> Self {
        Self::with_convolver(config, FftConvolver::default())
    }
}

impl<V: Convolver> RichardsonLucy<V> {
    /// Create a deconvolver backed by the given convolver.
    pub fn with_convolver(config: RichardsonLucyConfig, convolver: V) -> Self {
        Self { config, convolver }
    }

    /// The configuration of this deconvolver.
    pub fn config(&self) -> &RichardsonLucyConfig {
        &self.config
    }

    /// The convolver this deconvolver applies the kernel with.
    pub fn convolver(&self) -> &V {
        &self.convolver
    }

    /// Restore `observed`, blurred by `kernel`.
    ///
    /// Every channel is restored independently with the same kernel.
    ///
    /// # Arguments
    ///
    /// * `observed` - The blurred observation with shape (H, W, C).
    /// * `kernel` - The point-spread function, no larger than the observation.
    ///
    /// # Returns
    ///
    /// The estimate after `config.iterations` updates, with the shape of `observed`.
    ///
    /// # Errors
    ///
    /// Shape errors from the convolver and [`ImageError::InvalidClipRange`] for an
    /// invalid clip range. Numeric degeneracies are not errors; see [`DivisionPolicy`].
    pub fn run<const C: usize>(
        &mut self,
        observed: &Image<f32, C>,
        kernel: &Image<f32, 1>,
    ) -> Result<Image<f32, C>, ImageError> {
        self.run_with_callback(observed, kernel, |_, _| {})
    }

    /// Same as [`RichardsonLucy::run`], calling `callback(iteration, estimate)` after every
    /// update. Iterations are numbered from 0.
    pub fn run_with_callback<const C: usize>(
        &mut self,
        observed: &Image<f32, C>,
        kernel: &Image<f32, 1>,
        mut callback: impl FnMut(usize, &Image<f32, C>),
    ) -> Result<Image<f32, C>, ImageError> {
        check_shapes(
            observed.size(),
            kernel.size(),
            observed.size(),
            self.convolver.options().boundary,
        )?;

        let config = self.config;
        if let Some((min, max)) = config.clip {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(ImageError::InvalidClipRange(min, max));
            }
        }

        log::debug!(
            "richardson-lucy: {} iterations on {} with {}x{} kernel",
            config.iterations,
            observed.size(),
            kernel.width(),
            kernel.height()
        );

        let mut estimate: Image<f32, C> =
            Image::from_size_val(observed.size(), config.initial_value)?;
        let kernel_flipped = flip::rotate_180(kernel)?;

        let mut blurred: Image<f32, C> = Image::from_size_val(observed.size(), 0.0)?;
        let mut ratio: Image<f32, C> = Image::from_size_val(observed.size(), 0.0)?;
        let mut correction: Image<f32, C> = Image::from_size_val(observed.size(), 0.0)?;

        for iteration in 0..config.iterations {
            self.convolver.convolve(&estimate, kernel, &mut blurred)?;

            ratio
                .as_slice_mut()
                .par_iter_mut()
                .zip(observed.as_slice().par_iter())
                .zip(blurred.as_slice().par_iter())
                .for_each(|((r, &o), &b)| *r = config.division.ratio(o, b));

            self.convolver
                .convolve(&ratio, &kernel_flipped, &mut correction)?;

            estimate
                .as_slice_mut()
                .par_iter_mut()
                .zip(correction.as_slice().par_iter())
                .for_each(|(e, &c)| {
                    *e *= c;
                    if let Some((min, max)) = config.clip {
                        *e = e.clamp(min, max);
                    }
                });

            log::trace!("richardson-lucy: iteration {} done", iteration);
            callback(iteration, &estimate);
        }

        Ok(estimate)
    }
}

/// Restore `observed`, blurred by `kernel`, with `iterations` Richardson-Lucy updates.
///
/// Uses the default configuration otherwise: initial estimate 0.5, unguarded division,
/// no clipping, FFT convolution with wrap boundary and no kernel normalization.
pub fn richardson_lucy<const C: usize>(
    observed: &Image<f32, C>,
    kernel: &Image<f32, 1>,
    iterations: usize,
) -> Result<Image<f32, C>, ImageError> {
    let config = RichardsonLucyConfig::default().with_iterations(iterations);
    RichardsonLucy::new(config).run(observed, kernel)
}
