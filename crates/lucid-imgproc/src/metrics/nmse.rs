use lucid_image::{Image, ImageError};

/// Compute the normalized mean squared error (NMSE) of an estimate against a reference.
///
/// The NMSE is defined as:
///
/// $ NMSE = \frac{\sum_{i} (R_i - E_i)^2}{\sum_{i} R_i^2} $
///
/// which equals `mean((R - E)^2) / mean(R^2)`. A reference with zero energy yields 0 when
/// the estimate is identical to it and infinity otherwise.
///
/// # Arguments
///
/// * `reference` - The ground truth image with shape (H, W, C).
/// * `estimate` - The image to score with shape (H, W, C).
///
/// # Example
///
/// ```
/// use lucid_image::Image;
/// use lucid_imgproc::metrics::nmse;
///
/// let reference = Image::<f32, 1>::new([2, 1].into(), vec![1.0, 1.0]).unwrap();
/// let estimate = Image::<f32, 1>::new([2, 1].into(), vec![1.0, 0.0]).unwrap();
///
/// assert_eq!(nmse(&reference, &estimate).unwrap(), 0.5);
/// ```
///
/// # Errors
///
/// Fails if the two images have different sizes.
pub fn nmse<const C: usize>(
    reference: &Image<f32, C>,
    estimate: &Image<f32, C>,
) -> Result<f32, ImageError> {
    if reference.size() != estimate.size() {
        return Err(ImageError::InvalidImageSize(
            reference.width(),
            reference.height(),
            estimate.width(),
            estimate.height(),
        ));
    }

    let (error, energy) = reference
        .as_slice()
        .iter()
        .zip(estimate.as_slice().iter())
        .fold((0f64, 0f64), |(error, energy), (&r, &e)| {
            let (r, e) = (r as f64, e as f64);
            (error + (r - e).powi(2), energy + r * r)
        });

    if energy == 0.0 {
        return Ok(if error == 0.0 { 0.0 } else { f32::INFINITY });
    }

    Ok((error / energy) as f32)
}
