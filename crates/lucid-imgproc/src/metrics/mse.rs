use lucid_image::{Image, ImageError};

/// Compute the mean squared error (MSE) between two images.
///
/// The MSE is defined as:
///
/// $ MSE = \frac{1}{n} \sum_{i=1}^{n} (I_1 - I_2)^2 $
///
/// where `I_1` and `I_2` are the two images and `n` is the number of elements.
///
/// # Arguments
///
/// * `image1` - The first input image with shape (H, W, C).
/// * `image2` - The second input image with shape (H, W, C).
///
/// # Returns
///
/// The mean squared error between the two images.
///
/// # Example
///
/// ```
/// use lucid_image::{Image, ImageSize};
/// use lucid_imgproc::metrics::mse;
///
/// let image1 = Image::<f32, 1>::new(
///    ImageSize {
///      width: 2,
///      height: 3,
///    },
///    vec![0f32, 1f32, 2f32, 3f32, 4f32, 5f32],
/// )
/// .unwrap();
///
/// let mse = mse(&image1, &image1).unwrap();
/// assert_eq!(mse, 0f32);
/// ```
///
/// # Errors
///
/// Fails if the two images have different sizes.
pub fn mse<const C: usize>(
    image1: &Image<f32, C>,
    image2: &Image<f32, C>,
) -> Result<f32, ImageError> {
    if image1.size() != image2.size() {
        return Err(ImageError::InvalidImageSize(
            image1.width(),
            image1.height(),
            image2.width(),
            image2.height(),
        ));
    }

    let sum = image1
        .as_slice()
        .iter()
        .zip(image2.as_slice().iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f32>();

    Ok(sum / (image1.numel() as f32))
}
