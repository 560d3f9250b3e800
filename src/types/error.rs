use core::{error, fmt};

/// The error returned when the inputs to a quantization or conversion are invalid.
///
/// All of these are detected before any processing begins. Once a raster pass has started it
/// always runs to completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// The palette passed to a conversion contained no colors.
    InvalidPalette,
    /// The image has a zero width or height.
    InvalidDimensions {
        /// The width of the image.
        width: u32,
        /// The height of the image.
        height: u32,
    },
    /// The dither amount was not in the range `0.0..=1.0`.
    InvalidDitherAmount(f32),
    /// The number of significant bits was not in the range `1..=8`.
    UnsupportedSignificantBits(u8),
    /// The target number of palette colors was zero.
    InvalidTargetColors,
}

impl Error {
    /// Returns an [`Error::InvalidDimensions`] if the given dimensions contain a zero.
    #[inline]
    pub(crate) const fn check_dimensions(width: u32, height: u32) -> Result<(), Self> {
        if width == 0 || height == 0 {
            Err(Self::InvalidDimensions { width, height })
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::InvalidPalette => f.write_str("the palette must contain at least one color"),
            Self::InvalidDimensions { width, height } => write!(
                f,
                "image dimensions of ({width}, {height}) must both be non-zero",
            ),
            Self::InvalidDitherAmount(amount) => write!(
                f,
                "got a dither amount of {amount} which is not in the supported range of 0.0..=1.0",
            ),
            Self::UnsupportedSignificantBits(bits) => write!(
                f,
                "got {bits} significant bits which is not in the supported range of 1..=8",
            ),
            Self::InvalidTargetColors => f.write_str("the target number of colors must be non-zero"),
        }
    }
}

impl error::Error for Error {}
