use lucid_image::{Image, ImageError, ImageSize};

/// Create a box blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn box_blur_kernel_1d(kernel_size: usize) -> Vec<f32> {
    vec![1.0 / kernel_size as f32; kernel_size]
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel, normalized to sum 1. The sigma must be finite and positive,
/// otherwise the kernel is NaN.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = (kernel_size as f32 - 1.0) / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f32 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Outer product of a vertical and a horizontal 1D kernel.
fn outer(kernel_y: &[f32], kernel_x: &[f32]) -> Result<Image<f32, 1>, ImageError> {
    let size = ImageSize {
        width: kernel_x.len(),
        height: kernel_y.len(),
    };
    Image::from_size_fn(size, |y, x, _| kernel_y[y] * kernel_x[x])
}

fn check_kernel_size(kernel_size: (usize, usize)) -> Result<(), ImageError> {
    if kernel_size.0 == 0 || kernel_size.1 == 0 {
        return Err(ImageError::InvalidKernelSize(kernel_size.0, kernel_size.1));
    }
    Ok(())
}

/// Create a 2D gaussian point-spread function.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel (width, height).
/// * `sigma` - The sigma of the gaussian along x and y.
///
/// # Returns
///
/// A single channel kernel normalized to sum 1.
///
/// # Errors
///
/// [`ImageError::InvalidKernelSize`] for a zero dimension and
/// [`ImageError::InvalidKernelSigma`] when either sigma is not finite and positive.
///
/// # Example
///
/// ```
/// use lucid_imgproc::filter::kernels::gaussian_kernel_2d;
///
/// let psf = gaussian_kernel_2d((5, 5), (1.0, 1.0)).unwrap();
/// let sum = psf.as_slice().iter().sum::<f32>();
///
/// assert!((sum - 1.0).abs() < 1e-5);
/// assert_eq!(psf.get([2, 2, 0]), psf.as_slice().iter().max_by(|a, b| a.total_cmp(b)));
/// ```
pub fn gaussian_kernel_2d(
    kernel_size: (usize, usize),
    sigma: (f32, f32),
) -> Result<Image<f32, 1>, ImageError> {
    check_kernel_size(kernel_size)?;
    let valid = |s: f32| s.is_finite() && s > 0.0;
    if !valid(sigma.0) || !valid(sigma.1) {
        return Err(ImageError::InvalidKernelSigma(sigma.0, sigma.1));
    }

    let kernel_x = gaussian_kernel_1d(kernel_size.0, sigma.0);
    let kernel_y = gaussian_kernel_1d(kernel_size.1, sigma.1);
    outer(&kernel_y, &kernel_x)
}

/// Create a 2D box (averaging) kernel of the given (width, height), normalized to sum 1.
pub fn box_kernel_2d(kernel_size: (usize, usize)) -> Result<Image<f32, 1>, ImageError> {
    check_kernel_size(kernel_size)?;
    let kernel_x = box_blur_kernel_1d(kernel_size.0);
    let kernel_y = box_blur_kernel_1d(kernel_size.1);
    outer(&kernel_y, &kernel_x)
}

/// Create a delta kernel of the given (width, height): a single 1 at the kernel centre.
///
/// Convolving with this kernel is the identity.
pub fn delta_kernel(kernel_size: (usize, usize)) -> Result<Image<f32, 1>, ImageError> {
    check_kernel_size(kernel_size)?;
    let (cx, cy) = (kernel_size.0 / 2, kernel_size.1 / 2);
    let size = ImageSize {
        width: kernel_size.0,
        height: kernel_size.1,
    };
    Image::from_size_fn(size, |y, x, _| {
        if y == cy && x == cx {
            1.0
        } else {
            0.0
        }
    })
}
