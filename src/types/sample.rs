use bytemuck::{Pod, Zeroable};

/// An RGBA color sample.
///
/// The red, green, and blue channels are regular 8-bit values. The alpha channel uses a 7-bit
/// convention where [`Sample::ALPHA_OPAQUE`] (`0`) is fully opaque and
/// [`Sample::ALPHA_TRANSPARENT`] (`127`) is fully transparent. Note that this is the reverse of
/// the common "0 is transparent" convention.
///
/// # Examples
///
/// ```
/// # use alphaquant::Sample;
/// let red = Sample::opaque(255, 0, 0);
/// assert_eq!(red, Sample::new(255, 0, 0, 0));
/// assert_eq!(red.to_array(), [255, 0, 0, 0]);
///
/// // Nearly transparent samples collapse into one bucket.
/// assert_eq!(Sample::new(12, 34, 56, 120).normalized(), Sample::TRANSPARENT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Sample {
    /// The red channel.
    pub red: u8,
    /// The green channel.
    pub green: u8,
    /// The blue channel.
    pub blue: u8,
    /// The alpha channel, where `0` is opaque and `127` is transparent.
    pub alpha: u8,
}

impl Sample {
    /// The alpha value of a fully opaque sample.
    pub const ALPHA_OPAQUE: u8 = 0;

    /// The alpha value of a fully transparent sample.
    pub const ALPHA_TRANSPARENT: u8 = 127;

    /// Samples with an alpha above this value are treated as fully transparent.
    pub const TRANSPARENCY_THRESHOLD: u8 = 110;

    /// Pure transparent black, which all transparent-flagged samples normalize to.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, Self::ALPHA_TRANSPARENT);

    /// Create a new [`Sample`] from its four channels.
    #[inline]
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Create a new, fully opaque [`Sample`].
    #[inline]
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, Self::ALPHA_OPAQUE)
    }

    /// Returns the channels as an `[red, green, blue, alpha]` array.
    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }

    /// Returns the channels as an array of `f32`.
    #[inline]
    pub fn to_f32(self) -> [f32; 4] {
        self.to_array().map(f32::from)
    }

    /// Returns whether the alpha is above [`Sample::TRANSPARENCY_THRESHOLD`].
    #[inline]
    pub const fn is_transparent(self) -> bool {
        self.alpha > Self::TRANSPARENCY_THRESHOLD
    }

    /// Collapse a nearly transparent sample into [`Sample::TRANSPARENT`].
    ///
    /// Samples that are not transparent are returned unchanged.
    #[must_use]
    #[inline]
    pub const fn normalized(self) -> Self {
        if self.is_transparent() {
            Self::TRANSPARENT
        } else {
            self
        }
    }

    /// Convert straight 8-bit alpha (`255` is opaque) to a [`Sample`].
    #[inline]
    pub const fn from_straight_alpha([red, green, blue, alpha]: [u8; 4]) -> Self {
        Self::new(red, green, blue, Self::ALPHA_TRANSPARENT - (alpha >> 1))
    }

    /// Convert a [`Sample`] to straight 8-bit alpha (`255` is opaque).
    ///
    /// Alpha values above [`Sample::ALPHA_TRANSPARENT`] are treated as fully transparent.
    #[inline]
    pub const fn to_straight_alpha(self) -> [u8; 4] {
        let alpha = if self.alpha >= Self::ALPHA_TRANSPARENT {
            0
        } else {
            u8::MAX - 2 * self.alpha
        };
        [self.red, self.green, self.blue, alpha]
    }
}

impl From<[u8; 4]> for Sample {
    #[inline]
    fn from([red, green, blue, alpha]: [u8; 4]) -> Self {
        Self::new(red, green, blue, alpha)
    }
}

impl From<[u8; 3]> for Sample {
    #[inline]
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::opaque(red, green, blue)
    }
}

impl From<Sample> for [u8; 4] {
    #[inline]
    fn from(sample: Sample) -> Self {
        sample.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_threshold() {
        assert_eq!(Sample::new(1, 2, 3, 110).normalized(), Sample::new(1, 2, 3, 110));
        assert_eq!(Sample::new(1, 2, 3, 111).normalized(), Sample::TRANSPARENT);
        assert_eq!(Sample::new(255, 255, 255, 127).normalized(), Sample::TRANSPARENT);
    }

    #[test]
    fn rgb_palette_colors_are_opaque() {
        assert_eq!(Sample::from([10, 20, 30]), Sample::new(10, 20, 30, 0));
    }

    #[test]
    fn straight_alpha_polarity() {
        assert_eq!(Sample::from_straight_alpha([0, 0, 0, 255]).alpha, 0);
        assert_eq!(Sample::from_straight_alpha([0, 0, 0, 0]).alpha, 127);
        assert_eq!(Sample::opaque(1, 2, 3).to_straight_alpha(), [1, 2, 3, 255]);
        assert_eq!(Sample::TRANSPARENT.to_straight_alpha(), [0, 0, 0, 0]);
        assert_eq!(Sample::new(0, 0, 0, 200).to_straight_alpha()[3], 0);
    }
}
