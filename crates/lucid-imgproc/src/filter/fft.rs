use std::sync::Arc;

use lucid_image::{ImageError, ImageSize};
use rayon::{iter::ParallelIterator, slice::ParallelSliceMut};
use rustfft::{num_complex::Complex, Fft, FftDirection, FftPlanner};

use super::{ConvolveOptions, Convolver};
use crate::padding::BoundaryMode;

const MAX_CACHED_SPECTRA: usize = 4;

/// The forward transform of a kernel embedded in a plane of `fft_size`.
struct KernelSpectrum {
    kernel: Vec<f32>,
    kernel_size: ImageSize,
    fft_size: ImageSize,
    spectrum: Vec<Complex<f32>>,
}

impl KernelSpectrum {
    fn matches(&self, kernel: &[f32], kernel_size: ImageSize, fft_size: ImageSize) -> bool {
        self.kernel_size == kernel_size
            && self.fft_size == fft_size
            && self.kernel.len() == kernel.len()
            && self
                .kernel
                .iter()
                .zip(kernel.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Frequency-domain convolution backed by `rustfft`.
///
/// The plane and the kernel are transformed with a 2D FFT (row pass then column pass),
/// multiplied pointwise and transformed back. Under [`BoundaryMode::Wrap`] the transform
/// runs at the image size, which is exactly a periodic convolution. Under
/// [`BoundaryMode::Fill`] the plane is padded with the fill value to `(H + kh, W + kw)` so
/// that no wrap-around reaches the image, and the result is cropped back.
///
/// FFT plans and the spectra of the last few kernels are cached, so convolving repeatedly
/// with the same kernel only pays for the transforms of the image.
pub struct FftConvolver {
    options: ConvolveOptions,
    planner: FftPlanner<f32>,
    spectra: Vec<KernelSpectrum>,
}

impl Default for FftConvolver {
    fn default() -> Self {
        Self::new(ConvolveOptions::default())
    }
}

impl FftConvolver {
    /// Create a new FFT convolver with the given options.
    pub fn new(options: ConvolveOptions) -> Self {
        Self {
            options,
            planner: FftPlanner::new(),
            spectra: Vec::new(),
        }
    }

    /// Number of kernel spectra currently cached.
    pub fn cached_spectra(&self) -> usize {
        self.spectra.len()
    }

    fn plans(
        &mut self,
        fft_size: ImageSize,
        direction: FftDirection,
    ) -> (Arc<dyn Fft<f32>>, Arc<dyn Fft<f32>>) {
        let row_fft = self.planner.plan_fft(fft_size.width, direction);
        let col_fft = self.planner.plan_fft(fft_size.height, direction);
        (row_fft, col_fft)
    }

    /// Index of the cached spectrum for `kernel`, computing it on a miss.
    fn kernel_spectrum(
        &mut self,
        kernel: &[f32],
        kernel_size: ImageSize,
        fft_size: ImageSize,
    ) -> usize {
        if let Some(idx) = self
            .spectra
            .iter()
            .position(|s| s.matches(kernel, kernel_size, fft_size))
        {
            return idx;
        }

        log::trace!(
            "computing spectrum for {}x{} kernel at {}x{}",
            kernel_size.width,
            kernel_size.height,
            fft_size.width,
            fft_size.height
        );

        // move the kernel centre to the origin of the periodic plane
        let mut spectrum = vec![Complex::new(0.0, 0.0); fft_size.area()];
        let cy = kernel_size.height / 2;
        let cx = kernel_size.width / 2;
        for ky in 0..kernel_size.height {
            let y = (ky + fft_size.height - cy) % fft_size.height;
            for kx in 0..kernel_size.width {
                let x = (kx + fft_size.width - cx) % fft_size.width;
                spectrum[y * fft_size.width + x].re += kernel[ky * kernel_size.width + kx];
            }
        }

        let (row_fft, col_fft) = self.plans(fft_size, FftDirection::Forward);
        fft_2d(&mut spectrum, fft_size, &*row_fft, &*col_fft);

        if self.spectra.len() == MAX_CACHED_SPECTRA {
            self.spectra.remove(0);
        }
        self.spectra.push(KernelSpectrum {
            kernel: kernel.to_vec(),
            kernel_size,
            fft_size,
            spectrum,
        });

        self.spectra.len() - 1
    }
}

impl Convolver for FftConvolver {
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
        let fft_size = match self.options.boundary {
            BoundaryMode::Wrap => size,
            BoundaryMode::Fill(_) => ImageSize {
                width: size.width + kernel_size.width,
                height: size.height + kernel_size.height,
            },
        };

        // embed the source in the top-left corner of the (possibly) padded plane
        let fill = Complex::new(self.options.boundary.fill_value(), 0.0);
        let mut data = vec![fill; fft_size.area()];
        for (dst_row, src_row) in data
            .chunks_exact_mut(fft_size.width)
            .zip(src.chunks_exact(size.width))
        {
            dst_row
                .iter_mut()
                .zip(src_row.iter())
                .for_each(|(d, &s)| *d = Complex::new(s, 0.0));
        }

        let (row_fft, col_fft) = self.plans(fft_size, FftDirection::Forward);
        fft_2d(&mut data, fft_size, &*row_fft, &*col_fft);

        let idx = self.kernel_spectrum(kernel, kernel_size, fft_size);
        data.iter_mut()
            .zip(self.spectra[idx].spectrum.iter())
            .for_each(|(d, &k)| *d *= k);

        let (row_ifft, col_ifft) = self.plans(fft_size, FftDirection::Inverse);
        fft_2d(&mut data, fft_size, &*row_ifft, &*col_ifft);

        // rustfft does not normalize the inverse transform
        let norm = 1.0 / fft_size.area() as f32;
        for (dst_row, data_row) in dst
            .chunks_exact_mut(size.width)
            .zip(data.chunks_exact(fft_size.width))
        {
            dst_row
                .iter_mut()
                .zip(data_row.iter())
                .for_each(|(d, c)| *d = c.re * norm);
        }

        Ok(())
    }
}

/// In-place 2D transform of a row-major plane: rows first, then columns through a transpose.
fn fft_2d(
    data: &mut [Complex<f32>],
    size: ImageSize,
    row_fft: &dyn Fft<f32>,
    col_fft: &dyn Fft<f32>,
) {
    data.par_chunks_exact_mut(size.width)
        .for_each(|row| row_fft.process(row));

    let mut transposed = transpose(data, size.width, size.height);
    transposed
        .par_chunks_exact_mut(size.height)
        .for_each(|col| col_fft.process(col));

    let back = transpose(&transposed, size.height, size.width);
    data.copy_from_slice(&back);
}

/// Transpose a `height` x `width` row-major buffer into a `width` x `height` one.
fn transpose(data: &[Complex<f32>], width: usize, height: usize) -> Vec<Complex<f32>> {
    let mut out = vec![Complex::new(0.0, 0.0); data.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = data[y * width + x];
        }
    }
    out
}
