/// An error type for the image and image processing crates.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images that must share a size do not.
    #[error("Image size mismatch: {0}x{1} vs {2}x{3}")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index {0} is out of bounds for {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when the kernel extends past the image in either dimension.
    #[error("Kernel of size {0}x{1} does not fit in an image of size {2}x{3}")]
    KernelTooLarge(usize, usize, usize, usize),

    /// Error when the kernel has a zero dimension.
    #[error("Invalid kernel size {0}x{1}")]
    InvalidKernelSize(usize, usize),

    /// Error when a gaussian kernel sigma is not finite and positive.
    #[error("Invalid kernel sigma ({0}, {1}), must be finite and positive")]
    InvalidKernelSigma(f32, f32),

    /// Error when a clip range has `min > max` or a NaN bound.
    #[error("Invalid clip range [{0}, {1}]")]
    InvalidClipRange(f32, f32),

    /// Error when a kernel must be normalized but sums to zero.
    #[error("Kernel sums to zero and cannot be normalized")]
    KernelSumZero,

    /// Error when a noise model parameter is out of its valid range.
    #[error("Invalid noise parameter: {0}")]
    InvalidNoiseParameter(String),
}
