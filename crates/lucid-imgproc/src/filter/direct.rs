use lucid_image::{ImageError, ImageSize};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use super::{ConvolveOptions, Convolver};

/// Spatial-domain convolution.
///
/// Every output pixel is the explicit weighted sum over the kernel support, so the cost is
/// `O(H * W * kh * kw)`. Exact up to floating point summation order, which makes it the
/// reference the [`super::FftConvolver`] is checked against.
#[derive(Debug, Clone, Default)]
pub struct DirectConvolver {
    options: ConvolveOptions,
}

impl DirectConvolver {
    /// Create a new direct convolver with the given options.
    pub fn new(options: ConvolveOptions) -> Self {
        Self { options }
    }
}

impl Convolver for DirectConvolver {
    fn options(&self) -> &ConvolveOptions {
        &self.options
    }

    fn convolve_plane(
        &mut self,
        src: &[f32],
        size: ImageSize,
        kernel: &[f32],
        kernel_size: ImageSize,
        dst: &mut [f32],
    ) -> Result<(), ImageError> {
        let boundary = self.options.boundary;
        let fill_value = boundary.fill_value();
        let cy = (kernel_size.height / 2) as isize;
        let cx = (kernel_size.width / 2) as isize;

        dst.par_chunks_exact_mut(size.width)
            .enumerate()
            .for_each(|(y, dst_row)| {
                for (x, out) in dst_row.iter_mut().enumerate() {
                    let mut sum = 0.0;
                    for ky in 0..kernel_size.height {
                        let sy = boundary.map_index(y as isize - (ky as isize - cy), size.height);
                        let kernel_row = &kernel[ky * kernel_size.width..][..kernel_size.width];
                        for (kx, &k) in kernel_row.iter().enumerate() {
                            let sx =
                                boundary.map_index(x as isize - (kx as isize - cx), size.width);
                            let val = match (sy, sx) {
                                (Some(sy), Some(sx)) => src[sy * size.width + sx],
                                _ => fill_value,
                            };
                            sum += k * val;
                        }
                    }
                    *out = sum;
                }
            });

        Ok(())
    }
}
