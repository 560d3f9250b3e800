use crate::{Error, Sample, color_space::rgba_to_lab};
use alloc::vec::Vec;
use core::ops::Deref;
use palette::Laba;

/// A single color of a [`Palette`].
///
/// The CIE Lab representation of the color is computed eagerly so that the
/// [`Lab`](crate::color_map::DistanceMode::Lab) distance mode does not need to convert the palette
/// on every conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    /// The color as an RGBA [`Sample`].
    pub rgba: Sample,
    /// The color in CIE Lab with the alpha scaled to `0.0..=1.0`.
    pub lab: Laba,
}

impl PaletteEntry {
    /// Create a new [`PaletteEntry`] from a [`Sample`].
    #[inline]
    pub fn new(rgba: Sample) -> Self {
        Self { rgba, lab: rgba_to_lab(rgba) }
    }
}

impl From<Sample> for PaletteEntry {
    #[inline]
    fn from(rgba: Sample) -> Self {
        Self::new(rgba)
    }
}

/// A non-empty, ordered list of palette colors.
///
/// The position of an entry in the list is its palette index.
///
/// # Examples
///
/// ```
/// # use alphaquant::{Error, Palette, Sample};
/// # fn main() -> Result<(), Error> {
/// let palette = Palette::new(vec![Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)])?;
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette[1].rgba, Sample::opaque(255, 255, 255));
/// assert_eq!(Palette::new(Vec::new()), Err(Error::InvalidPalette));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// The palette entries, never empty.
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Create a new [`Palette`] from a list of colors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPalette`] if `colors` is empty.
    pub fn new(colors: impl IntoIterator<Item = Sample>) -> Result<Self, Error> {
        let entries = colors.into_iter().map(PaletteEntry::new).collect::<Vec<_>>();
        if entries.is_empty() {
            Err(Error::InvalidPalette)
        } else {
            Ok(Self { entries })
        }
    }

    /// Returns the palette entries as a slice.
    #[inline]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Returns an iterator over the RGBA colors of the palette.
    #[inline]
    pub fn colors(&self) -> impl Iterator<Item = Sample> + '_ {
        self.entries.iter().map(|entry| entry.rgba)
    }

    /// Returns the RGBA colors of the palette as a new [`Vec`].
    #[must_use]
    #[inline]
    pub fn to_colors(&self) -> Vec<Sample> {
        self.colors().collect()
    }
}

impl Deref for Palette {
    type Target = [PaletteEntry];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.entries()
    }
}

impl TryFrom<Vec<Sample>> for Palette {
    type Error = Error;

    #[inline]
    fn try_from(colors: Vec<Sample>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl TryFrom<&[Sample]> for Palette {
    type Error = Error;

    #[inline]
    fn try_from(colors: &[Sample]) -> Result<Self, Self::Error> {
        Self::new(colors.iter().copied())
    }
}
