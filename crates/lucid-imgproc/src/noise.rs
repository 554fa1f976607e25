//! Seeded noise models for simulating observations.
//!
//! A blurred image is turned into a synthetic observation by drawing photon counts
//! ([`poisson_noise`]) and, optionally, adding read noise ([`gaussian_noise`]). Both take
//! an explicit seed so that simulations and tests are reproducible.

use lucid_image::{Image, ImageError};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};

/// Replace every pixel by a Poisson draw whose mean is the pixel value.
///
/// Pixels that are not strictly positive (including NaN) have no photons to draw and
/// become 0.
///
/// # Arguments
///
/// * `src` - The mean photon count of each pixel.
/// * `seed` - Random seed for deterministic output.
///
/// # Errors
///
/// Fails with [`ImageError::InvalidNoiseParameter`] when a mean is too large or infinite
/// for the Poisson sampler.
///
/// # Example
///
/// ```
/// use lucid_image::Image;
/// use lucid_imgproc::noise::poisson_noise;
///
/// let image = Image::<f32, 1>::from_size_val([16, 16].into(), 100.0).unwrap();
/// let noisy = poisson_noise(&image, 42).unwrap();
///
/// assert_eq!(noisy, poisson_noise(&image, 42).unwrap());
/// assert!(noisy.as_slice().iter().all(|v| v.fract() == 0.0));
/// ```
pub fn poisson_noise<const C: usize>(
    src: &Image<f32, C>,
    seed: u64,
) -> Result<Image<f32, C>, ImageError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let data = src
        .as_slice()
        .iter()
        .map(|&lambda| {
            if lambda.is_nan() || lambda <= 0.0 {
                return Ok(0.0);
            }
            let poisson = Poisson::new(lambda as f64)
                .map_err(|e| ImageError::InvalidNoiseParameter(format!("{e} (mean {lambda})")))?;
            Ok(poisson.sample(&mut rng) as f32)
        })
        .collect::<Result<Vec<f32>, ImageError>>()?;

    Image::new(src.size(), data)
}

/// Add zero-mean gaussian noise with the given standard deviation to every pixel.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `std_dev` - Standard deviation of the additive noise.
/// * `seed` - Random seed for deterministic output.
///
/// # Errors
///
/// Fails with [`ImageError::InvalidNoiseParameter`] when `std_dev` is negative or not finite.
pub fn gaussian_noise<const C: usize>(
    src: &Image<f32, C>,
    std_dev: f32,
    seed: u64,
) -> Result<Image<f32, C>, ImageError> {
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(ImageError::InvalidNoiseParameter(format!(
            "std_dev must be finite and non-negative, got {std_dev}"
        )));
    }

    let normal = Normal::new(0.0f32, std_dev)
        .map_err(|e| ImageError::InvalidNoiseParameter(format!("{e} (std_dev {std_dev})")))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let data = src
        .as_slice()
        .iter()
        .map(|&v| v + normal.sample(&mut rng))
        .collect();

    Image::new(src.size(), data)
}
