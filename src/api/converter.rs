use crate::{
    ConvertedImage, DitherAmount, Error, LOOKUP_CACHE_CAPACITY, Palette, Sample, SampleSource,
    color_map::{DistanceMode, LookupStats, Resolver},
    dither::FloydSteinberg,
    quantize::Quantizer,
};
use core::num::NonZeroUsize;
use log::debug;

/// A builder struct to convert images to a palette with dithering.
///
/// A [`Converter`] remembers the lookup counts of its most recent conversion, see
/// [`lookup_stats`](Converter::lookup_stats) and [`lookup_hit_rate`](Converter::lookup_hit_rate).
/// Every conversion starts with an empty lookup cache.
///
/// # Examples
///
/// First, specify any options you want:
/// ```
/// # use alphaquant::{Converter, DitherAmount, color_map::DistanceMode};
/// # use core::num::NonZeroUsize;
/// let converter = Converter::new()
///     .dither_amount(DitherAmount::FULL)
///     .distance_mode(DistanceMode::Lab)
///     .cache_capacity(NonZeroUsize::MIN);
/// ```
///
/// Then, convert images:
/// ```
/// # use alphaquant::{Converter, Error, ImageBuf, Palette, Sample};
/// # fn main() -> Result<(), Error> {
/// let image = ImageBuf::from_pixel(8, 8, Sample::opaque(10, 10, 10))
///     .ok_or(Error::InvalidDimensions { width: 8, height: 8 })?;
/// let palette = Palette::new([Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)])?;
///
/// let mut converter = Converter::new();
/// let converted = converter.convert(&image, &palette)?;
///
/// assert_eq!(converted.dimensions(), (8, 8));
/// assert!(converter.lookup_hit_rate().is_some());
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Converter {
    /// The ditherer to use.
    ditherer: FloydSteinberg,
    /// The space in which nearest colors are found.
    distance_mode: DistanceMode,
    /// The maximum number of cached lookups.
    cache_capacity: NonZeroUsize,
    /// The lookup counts of the most recent conversion.
    stats: LookupStats,
}

impl Converter {
    /// Create a new [`Converter`] with default options.
    pub fn new() -> Self {
        Self {
            ditherer: FloydSteinberg::default(),
            distance_mode: DistanceMode::default(),
            cache_capacity: LOOKUP_CACHE_CAPACITY,
            stats: LookupStats::default(),
        }
    }

    /// Sets the amount of error to diffuse to neighboring pixels.
    ///
    /// The default dither amount is [`DitherAmount::DEFAULT`].
    #[inline]
    pub fn dither_amount(mut self, amount: DitherAmount) -> Self {
        self.ditherer = FloydSteinberg::new(amount);
        self
    }

    /// Sets the space in which nearest palette colors are found.
    ///
    /// The default distance mode is [`DistanceMode::Rgba`].
    #[inline]
    pub fn distance_mode(mut self, mode: DistanceMode) -> Self {
        self.distance_mode = mode;
        self
    }

    /// Sets the maximum number of resolved colors cached during a conversion.
    ///
    /// The default capacity is [`LOOKUP_CACHE_CAPACITY`].
    #[inline]
    pub fn cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Returns the lookup counts of the most recent conversion.
    #[inline]
    pub fn lookup_stats(&self) -> LookupStats {
        self.stats
    }

    /// Returns the fraction of lookups of the most recent conversion answered from the cache,
    /// or `None` if no lookups have occurred.
    #[inline]
    pub fn lookup_hit_rate(&self) -> Option<f32> {
        self.stats.hit_rate()
    }

    /// Convert `image` to the colors of `palette`.
    ///
    /// See [`FloydSteinberg::render`] for which kind of [`ConvertedImage`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `image` has a zero width or height.
    pub fn convert(
        &mut self,
        image: &impl SampleSource,
        palette: &Palette,
    ) -> Result<ConvertedImage, Error> {
        let (width, height) = image.dimensions();
        Error::check_dimensions(width, height)?;

        let mut resolver = Resolver::with_capacity(palette, self.distance_mode, self.cache_capacity);
        let converted = self.ditherer.render(image, palette, &mut resolver);
        self.stats = resolver.stats();

        debug!(
            "converted {width}x{height} image with {} of {} lookups cached",
            self.stats.hits, self.stats.lookups,
        );

        converted
    }

    /// Generate a palette for `image` with `quantizer` and then convert `image` to that palette.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `image` has a zero width or height.
    pub fn quantize_and_convert(
        &mut self,
        image: &impl SampleSource,
        quantizer: &Quantizer,
    ) -> Result<ConvertedImage, Error> {
        let palette = Palette::new(quantizer.quantize(image)?)?;
        self.convert(image, &palette)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert `image` to the colors of `palette`, diffusing the given amount of error.
///
/// `dither_amount` is clamped to `0.0..=1.0`. Use a [`Converter`] for more options and to
/// retrieve lookup statistics.
///
/// # Errors
///
/// Returns [`Error::InvalidPalette`] if `palette` is empty and [`Error::InvalidDimensions`] if
/// `image` has a zero width or height.
///
/// # Examples
///
/// ```
/// # use alphaquant::{Error, ImageBuf, Sample, convert_to_indexed};
/// # fn main() -> Result<(), Error> {
/// let black = Sample::opaque(0, 0, 0);
/// let white = Sample::opaque(255, 255, 255);
/// let image = ImageBuf::new(2, 2, vec![black, white, white, black])
///     .map_err(|_| Error::InvalidDimensions { width: 2, height: 2 })?;
///
/// let converted = convert_to_indexed(&image, &[black, white], 0.75)?;
/// assert_eq!(converted.into_image(), image);
/// # Ok(())
/// # }
/// ```
pub fn convert_to_indexed(
    image: &impl SampleSource,
    palette: &[Sample],
    dither_amount: f32,
) -> Result<ConvertedImage, Error> {
    let palette = Palette::try_from(palette)?;
    Converter::new()
        .dither_amount(DitherAmount::new_clamped(dither_amount))
        .convert(image, &palette)
}
