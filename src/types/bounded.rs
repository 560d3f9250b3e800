use crate::Error;
use core::{fmt, num::NonZeroU8};
use ordered_float::OrderedFloat;

/// The number of most significant bits of each channel considered by the quantization tree.
///
/// This is a simple new type wrapper around [`NonZeroU8`] with the invariant that it must be in
/// the range `1..=8` specified by [`SignificantBits::MIN`] and [`SignificantBits::MAX`].
/// Fewer bits means a shallower tree and a faster, coarser quantization.
///
/// # Examples
///
/// ```
/// # use alphaquant::{Error, SignificantBits};
/// # fn main() -> Result<(), Error> {
/// let bits = SignificantBits::try_from(4)?;
/// assert_eq!(bits.get(), 4);
/// assert_eq!(SignificantBits::default(), SignificantBits::DEFAULT);
/// assert!(SignificantBits::try_from(9).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SignificantBits(NonZeroU8);

impl SignificantBits {
    /// The smallest supported number of bits, which is `1`.
    pub const MIN: Self = Self(NonZeroU8::MIN);

    /// The largest supported number of bits, which is `8`.
    pub const MAX: Self = Self(NonZeroU8::new(8).unwrap());

    /// The default number of bits, which is `5`.
    pub const DEFAULT: Self = Self(NonZeroU8::new(5).unwrap());

    /// Create a [`SignificantBits`], returning `None` if `bits` is not in the range `1..=8`.
    #[must_use]
    #[inline]
    pub const fn new(bits: u8) -> Option<Self> {
        match NonZeroU8::new(bits) {
            Some(bits) if bits.get() <= Self::MAX.get() => Some(Self(bits)),
            _ => None,
        }
    }

    /// Returns the number of bits as a `u8`.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0.get()
    }

    /// Returns the number of low bits of each channel that the tree discards.
    #[inline]
    pub const fn discarded(self) -> u8 {
        8 - self.get()
    }
}

impl Default for SignificantBits {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for SignificantBits {
    type Error = Error;

    #[inline]
    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::new(bits).ok_or(Error::UnsupportedSignificantBits(bits))
    }
}

impl From<SignificantBits> for u8 {
    #[inline]
    fn from(bits: SignificantBits) -> Self {
        bits.get()
    }
}

impl fmt::Display for SignificantBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The strength of the error diffusion applied while dithering.
///
/// A value of `0.0` disables diffusion entirely (plain nearest color mapping) and `1.0` diffuses
/// the full quantization error like classical Floyd–Steinberg dithering.
///
/// # Examples
///
/// ```
/// # use alphaquant::DitherAmount;
/// assert_eq!(DitherAmount::default().get(), 0.75);
/// assert_eq!(DitherAmount::new_clamped(1.5), DitherAmount::FULL);
/// assert_eq!(DitherAmount::new_clamped(-0.5), DitherAmount::NONE);
/// assert!(DitherAmount::try_new(2.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DitherAmount(OrderedFloat<f32>);

impl DitherAmount {
    /// No error diffusion.
    pub const NONE: Self = Self(OrderedFloat(0.0));

    /// Full error diffusion.
    pub const FULL: Self = Self(OrderedFloat(1.0));

    /// The default dither amount of `0.75`.
    pub const DEFAULT: Self = Self(OrderedFloat(0.75));

    /// Create a new [`DitherAmount`], returning an error if `amount` is not in `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDitherAmount`] if `amount` is NaN or out of range.
    #[inline]
    pub fn try_new(amount: f32) -> Result<Self, Error> {
        if (0.0..=1.0).contains(&amount) {
            Ok(Self(OrderedFloat(amount)))
        } else {
            Err(Error::InvalidDitherAmount(amount))
        }
    }

    /// Create a new [`DitherAmount`], clamping `amount` to `0.0..=1.0`.
    ///
    /// NaN is treated as `0.0`.
    #[must_use]
    #[inline]
    pub fn new_clamped(amount: f32) -> Self {
        if amount.is_nan() {
            Self::NONE
        } else {
            Self(OrderedFloat(amount.clamp(0.0, 1.0)))
        }
    }

    /// Returns the dither amount as an `f32`.
    #[inline]
    pub const fn get(self) -> f32 {
        self.0.0
    }

    /// Returns whether this amount disables error diffusion.
    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl Default for DitherAmount {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f32> for DitherAmount {
    type Error = Error;

    #[inline]
    fn try_from(amount: f32) -> Result<Self, Self::Error> {
        Self::try_new(amount)
    }
}
