use lucid_image::{Image, ImageError};

/// Rotate the input image by 180 degrees, i.e. reverse it along both axes.
///
/// This is the flip applied to a point-spread function to obtain its adjoint under
/// convolution.
///
/// # Example
///
/// ```
/// use lucid_image::Image;
/// use lucid_imgproc::flip::rotate_180;
///
/// let kernel = Image::<f32, 1>::new([3, 1].into(), vec![1.0, 2.0, 3.0]).unwrap();
/// let flipped = rotate_180(&kernel).unwrap();
///
/// assert_eq!(flipped.as_slice(), &[3.0, 2.0, 1.0]);
/// ```
pub fn rotate_180<T, const C: usize>(src: &Image<T, C>) -> Result<Image<T, C>, ImageError>
where
    T: Clone,
{
    if C == 0 {
        return Ok(src.clone());
    }

    let data = src
        .as_slice()
        .chunks_exact(C)
        .rev()
        .flat_map(|pixel| pixel.iter().cloned())
        .collect();

    Image::new(src.size(), data)
}
