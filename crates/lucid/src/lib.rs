//! Richardson-Lucy image restoration.
//!
//! Re-exports the image container and the image processing crates under one name.

#[doc(inline)]
pub use lucid_image as image;

#[doc(inline)]
pub use lucid_imgproc as imgproc;
