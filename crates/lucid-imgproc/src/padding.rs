/// How pixels outside of the image are resolved by a convolution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BoundaryMode {
    /// Treat the image as periodic: content wraps around from the opposite side.
    ///
    /// Example: ...d c b a | w x y z...
    #[default]
    Wrap,

    /// Treat every pixel outside of the image as the given constant value.
    ///
    /// Example: ...v v v v | w x y z...
    Fill(f32),
}

impl BoundaryMode {
    #[inline]
    fn wrap(i: isize, len: usize) -> usize {
        let len = len as isize;
        ((i % len + len) % len) as usize
    }

    /// Maps a possibly out-of-range index `i` along a dimension of length `len`.
    ///
    /// Returns `None` when the index falls outside the image and the mode resolves it to
    /// the fill value instead of a pixel.
    ///
    /// # Example
    ///
    /// ```
    /// use lucid_imgproc::padding::BoundaryMode;
    ///
    /// assert_eq!(BoundaryMode::Wrap.map_index(-1, 4), Some(3));
    /// assert_eq!(BoundaryMode::Wrap.map_index(5, 4), Some(1));
    /// assert_eq!(BoundaryMode::Fill(0.0).map_index(-1, 4), None);
    /// assert_eq!(BoundaryMode::Fill(0.0).map_index(2, 4), Some(2));
    /// ```
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match self {
            BoundaryMode::Wrap => Some(Self::wrap(i, len)),
            BoundaryMode::Fill(_) => (i >= 0 && (i as usize) < len).then_some(i as usize),
        }
    }

    /// The value used for pixels that [`BoundaryMode::map_index`] resolves to `None`.
    pub fn fill_value(&self) -> f32 {
        match self {
            BoundaryMode::Wrap => 0.0,
            BoundaryMode::Fill(v) => *v,
        }
    }
}
