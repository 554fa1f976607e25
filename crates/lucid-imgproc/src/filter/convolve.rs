use lucid_image::{Image, ImageError, ImageSize};

use crate::padding::BoundaryMode;

/// Options shared by every [`Convolver`] implementation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvolveOptions {
    /// How pixels outside of the source image are resolved.
    pub boundary: BoundaryMode,
    /// Value substituted for NaN pixels in the source image before convolving.
    pub nan_fill_value: f32,
    /// Divide the kernel by its sum before convolving.
    pub normalize_kernel: bool,
}

impl Default for ConvolveOptions {
    fn default() -> Self {
        Self {
            boundary: BoundaryMode::Wrap,
            nan_fill_value: 0.0,
            normalize_kernel: false,
        }
    }
}

impl ConvolveOptions {
    /// Set the boundary mode.
    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the value that replaces NaN pixels.
    pub fn with_nan_fill_value(mut self, value: f32) -> Self {
        self.nan_fill_value = value;
        self
    }

    /// Enable or disable kernel normalization.
    pub fn with_normalize_kernel(mut self, normalize: bool) -> Self {
        self.normalize_kernel = normalize;
        self
    }
}

/// A 2D convolution primitive.
///
/// Implementors only provide [`Convolver::convolve_plane`], which works on a single
/// channel plane whose NaNs have already been replaced. The provided
/// [`Convolver::convolve`] validates shapes, applies the kernel normalization and NaN
/// policy of [`Convolver::options`] and convolves every channel independently.
pub trait Convolver {
    /// The options this convolver applies.
    fn options(&self) -> &ConvolveOptions;

    /// Convolve a single plane of `size` with a kernel of `kernel_size`, writing into `dst`.
    ///
    /// PRECONDITION: `src` and `dst` hold `size.area()` elements, `kernel` holds
    /// `kernel_size.area()` elements and the shapes have passed [`check_shapes`].
    fn convolve_plane(
        &mut self,
        src: &[f32],
        size: ImageSize,
        kernel: &[f32],
        kernel_size: ImageSize,
        dst: &mut [f32],
    ) -> Result<(), ImageError>;

    /// Convolve every channel of `src` with `kernel` and write the result into `dst`.
    ///
    /// # Arguments
    ///
    /// * `src` - The source image with shape (H, W, C).
    /// * `kernel` - The single channel kernel with shape (kh, kw).
    /// * `dst` - The destination image with shape (H, W, C).
    ///
    /// # Errors
    ///
    /// Fails when `src` and `dst` differ in size, when the kernel is empty or does not fit
    /// the image under [`BoundaryMode::Wrap`], or when a zero-sum kernel must be normalized.
    fn convolve<const C: usize>(
        &mut self,
        src: &Image<f32, C>,
        kernel: &Image<f32, 1>,
        dst: &mut Image<f32, C>,
    ) -> Result<(), ImageError> {
        let options = *self.options();
        check_shapes(src.size(), kernel.size(), dst.size(), options.boundary)?;

        if src.numel() == 0 {
            return Ok(());
        }

        let kernel_data = prepare_kernel(kernel.as_slice(), options.normalize_kernel)?;

        if C == 1 {
            let mut plane = src.as_slice().to_vec();
            fill_nans(&mut plane, options.nan_fill_value);
            return self.convolve_plane(
                &plane,
                src.size(),
                &kernel_data,
                kernel.size(),
                dst.as_slice_mut(),
            );
        }

        let num_pixels = src.size().area();
        let mut plane = vec![0.0; num_pixels];
        let mut out = vec![0.0; num_pixels];
        for c in 0..C {
            plane
                .iter_mut()
                .zip(src.as_slice().iter().skip(c).step_by(C))
                .for_each(|(p, &s)| *p = s);
            fill_nans(&mut plane, options.nan_fill_value);

            self.convolve_plane(&plane, src.size(), &kernel_data, kernel.size(), &mut out)?;

            dst.as_slice_mut()
                .iter_mut()
                .skip(c)
                .step_by(C)
                .zip(out.iter())
                .for_each(|(d, &o)| *d = o);
        }

        Ok(())
    }
}

/// Validate the shapes involved in a convolution.
///
/// # Errors
///
/// * [`ImageError::InvalidImageSize`] when `size` and `dst_size` differ.
/// * [`ImageError::InvalidKernelSize`] when the kernel has a zero dimension.
/// * [`ImageError::KernelTooLarge`] when the kernel exceeds the image under
///   [`BoundaryMode::Wrap`].
pub fn check_shapes(
    size: ImageSize,
    kernel_size: ImageSize,
    dst_size: ImageSize,
    boundary: BoundaryMode,
) -> Result<(), ImageError> {
    if size != dst_size {
        return Err(ImageError::InvalidImageSize(
            size.width,
            size.height,
            dst_size.width,
            dst_size.height,
        ));
    }

    if kernel_size.width == 0 || kernel_size.height == 0 {
        return Err(ImageError::InvalidKernelSize(
            kernel_size.width,
            kernel_size.height,
        ));
    }

    if matches!(boundary, BoundaryMode::Wrap)
        && (kernel_size.width > size.width || kernel_size.height > size.height)
    {
        return Err(ImageError::KernelTooLarge(
            kernel_size.width,
            kernel_size.height,
            size.width,
            size.height,
        ));
    }

    Ok(())
}

/// Copy the kernel, dividing it by its sum when `normalize` is set.
fn prepare_kernel(kernel: &[f32], normalize: bool) -> Result<Vec<f32>, ImageError> {
    if !normalize {
        return Ok(kernel.to_vec());
    }

    let sum = kernel.iter().sum::<f32>();
    if sum == 0.0 || !sum.is_finite() {
        return Err(ImageError::KernelSumZero);
    }

    Ok(kernel.iter().map(|&k| k / sum).collect())
}

fn fill_nans(plane: &mut [f32], value: f32) {
    plane
        .iter_mut()
        .filter(|v| v.is_nan())
        .for_each(|v| *v = value);
}

/// Convolve an image with a kernel using the default [`crate::filter::FftConvolver`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `kernel` - The single channel kernel.
/// * `options` - The boundary, NaN and normalization policy.
///
/// # Returns
///
/// A new image with the shape of `src`.
///
/// # Example
///
/// ```
/// use lucid_image::Image;
/// use lucid_imgproc::filter::{convolve, kernels, ConvolveOptions};
///
/// let image = Image::<f32, 1>::from_size_val([8, 8].into(), 2.0).unwrap();
/// let kernel = kernels::box_kernel_2d((3, 3)).unwrap();
///
/// let blurred = convolve(&image, &kernel, ConvolveOptions::default()).unwrap();
///
/// assert!(blurred.as_slice().iter().all(|v| (v - 2.0).abs() < 1e-5));
/// ```
pub fn convolve<const C: usize>(
    src: &Image<f32, C>,
    kernel: &Image<f32, 1>,
    options: ConvolveOptions,
) -> Result<Image<f32, C>, ImageError> {
    let mut dst = Image::from_size_val(src.size(), 0.0)?;
    super::FftConvolver::new(options).convolve(src, kernel, &mut dst)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_shapes() {
        let size = ImageSize {
            width: 4,
            height: 3,
        };

        assert!(check_shapes(size, [4, 3].into(), size, BoundaryMode::Wrap).is_ok());
        assert_eq!(
            check_shapes(size, [3, 3].into(), [4, 4].into(), BoundaryMode::Wrap),
            Err(ImageError::InvalidImageSize(4, 3, 4, 4))
        );
        assert_eq!(
            check_shapes(size, [0, 3].into(), size, BoundaryMode::Wrap),
            Err(ImageError::InvalidKernelSize(0, 3))
        );
        assert_eq!(
            check_shapes(size, [5, 3].into(), size, BoundaryMode::Wrap),
            Err(ImageError::KernelTooLarge(5, 3, 4, 3))
        );
        assert!(check_shapes(size, [5, 5].into(), size, BoundaryMode::Fill(0.0)).is_ok());
    }

    #[test]
    fn test_prepare_kernel() -> Result<(), ImageError> {
        assert_eq!(prepare_kernel(&[1.0, 3.0], false)?, vec![1.0, 3.0]);
        assert_eq!(prepare_kernel(&[1.0, 3.0], true)?, vec![0.25, 0.75]);
        assert_eq!(
            prepare_kernel(&[1.0, -1.0], true),
            Err(ImageError::KernelSumZero)
        );
        Ok(())
    }

    #[test]
    fn test_fill_nans() {
        let mut plane = vec![1.0, f32::NAN, 3.0];
        fill_nans(&mut plane, -2.0);
        assert_eq!(plane, vec![1.0, -2.0, 3.0]);
    }

    #[test]
    fn test_options_builder() {
        let options = ConvolveOptions::default()
            .with_boundary(BoundaryMode::Fill(1.0))
            .with_nan_fill_value(5.0)
            .with_normalize_kernel(true);
        assert_eq!(options.boundary, BoundaryMode::Fill(1.0));
        assert_eq!(options.nan_fill_value, 5.0);
        assert!(options.normalize_kernel);
    }
}
