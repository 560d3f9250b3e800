//! Floyd–Steinberg error diffusion dithering.
//!
//! Pixels are visited in raster order. Each pixel is resolved to its nearest palette color and the
//! difference between the pending color and the palette color, scaled by the dither amount, is
//! spread over the unvisited neighbors:
//!
//! ```text
//!          *    7/16
//! 3/16   5/16   1/16
//! ```
//!
//! Pending colors are kept for the current and the next row only. Both rows are seeded from the
//! normalized source samples, so diffused error never touches the source image.

use crate::{
    ConvertedImage, DitherAmount, Error, ImageBuf, IndexedImage, MAX_INDEXED_COLORS,
    OutputSurface, Palette, Sample, SampleSource, color_map::Resolver,
};
use alloc::{vec, vec::Vec};
use core::array;
use log::debug;

/// Calculates `y = ax + y`
#[inline]
fn saxpy<const N: usize>(y: &mut [f32; N], a: f32, x: [f32; N]) {
    for i in 0..N {
        y[i] += a * x[i];
    }
}

/// The pending colors of the current and the next row of pixels.
struct PendingRows {
    /// The pending colors of the row being dithered.
    this_row: Vec<[f32; 4]>,
    /// The pending colors of the row below.
    next_row: Vec<[f32; 4]>,
}

impl PendingRows {
    /// Create new [`PendingRows`] for rows of `width` pixels.
    fn new(width: usize) -> Self {
        Self {
            this_row: vec![[0.0; 4]; width],
            next_row: vec![[0.0; 4]; width],
        }
    }

    /// Fill `row` with the normalized samples of row `y` of `image`.
    #[inline]
    fn seed(row: &mut [[f32; 4]], image: &impl SampleSource, y: u32) {
        for (x, pending) in (0..).zip(row) {
            *pending = image.normalized_sample(x, y).to_f32();
        }
    }

    /// Spread the error of pixel `x` to its unvisited neighbors.
    #[inline]
    fn propagate(&mut self, x: usize, err: [f32; 4], has_next_row: bool) {
        let width = self.this_row.len();
        if x + 1 < width {
            saxpy(&mut self.this_row[x + 1], 7.0 / 16.0, err);
        }
        if has_next_row {
            if x > 0 {
                saxpy(&mut self.next_row[x - 1], 3.0 / 16.0, err);
            }
            saxpy(&mut self.next_row[x], 5.0 / 16.0, err);
            if x + 1 < width {
                saxpy(&mut self.next_row[x + 1], 1.0 / 16.0, err);
            }
        }
    }

    /// Move on to the next row of pixels.
    #[inline]
    fn next_row(&mut self) {
        core::mem::swap(&mut self.this_row, &mut self.next_row);
    }
}

/// Floyd–Steinberg dithering with an adjustable amount of error diffusion.
///
/// A [`DitherAmount`] of `0.0` diffuses no error, so each pixel is simply mapped to its nearest
/// palette color. An amount of `1.0` diffuses all of the error.
///
/// # Examples
///
/// ```
/// # use alphaquant::{DitherAmount, Error, ImageBuf, Palette, Sample};
/// # use alphaquant::{color_map::{DistanceMode, Resolver}, dither::FloydSteinberg};
/// # fn main() -> Result<(), Error> {
/// let gray = Sample::opaque(128, 128, 128);
/// let image = ImageBuf::from_pixel(4, 4, gray).ok_or(Error::InvalidDimensions { width: 4, height: 4 })?;
/// let palette = Palette::new([Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)])?;
/// let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
///
/// let dithered = FloydSteinberg::new(DitherAmount::FULL).render(&image, &palette, &mut resolver)?;
/// let indexed = dithered.into_indexed().ok_or(Error::InvalidPalette)?;
/// assert!(indexed.indices().contains(&0));
/// assert!(indexed.indices().contains(&1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloydSteinberg(DitherAmount);

impl FloydSteinberg {
    /// Create a new [`FloydSteinberg`] diffusing the given amount of error.
    #[must_use]
    #[inline]
    pub const fn new(amount: DitherAmount) -> Self {
        Self(amount)
    }

    /// Returns the dither amount of a [`FloydSteinberg`].
    #[inline]
    pub const fn amount(&self) -> DitherAmount {
        self.0
    }

    /// Dither `image` in raster order, calling `emit` with the coordinates and palette index of
    /// each pixel.
    ///
    /// `resolver` must have been created for `palette`.
    pub fn dither(
        &self,
        image: &impl SampleSource,
        palette: &Palette,
        resolver: &mut Resolver,
        mut emit: impl FnMut(u32, u32, usize),
    ) {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let amount = self.0.get();
        let diffuse = !self.0.is_none();
        let mut rows = PendingRows::new(width as usize);
        PendingRows::seed(&mut rows.this_row, image, 0);

        for y in 0..height {
            let has_next_row = y + 1 < height;
            if has_next_row {
                PendingRows::seed(&mut rows.next_row, image, y + 1);
            }

            for (x, i) in (0..width).zip(0..) {
                let pending = rows.this_row[i];
                let index = resolver.resolve(pending);
                emit(x, y, index);

                if diffuse {
                    let chosen = palette[index].rgba.to_f32();
                    let err = array::from_fn(|c| amount * (pending[c] - chosen[c]));
                    rows.propagate(i, err, has_next_row);
                }
            }

            rows.next_row();
        }
    }

    /// Dither `image` onto `surface`, allocating each chosen palette color once.
    ///
    /// `resolver` must have been created for `palette`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `surface` and `image` do not have the same
    /// dimensions or either has a zero width or height.
    pub fn dither_to_surface<O: OutputSurface>(
        &self,
        image: &impl SampleSource,
        palette: &Palette,
        resolver: &mut Resolver,
        surface: &mut O,
    ) -> Result<(), Error> {
        let (width, height) = image.dimensions();
        Error::check_dimensions(width, height)?;
        if surface.dimensions() != (width, height) {
            let (width, height) = surface.dimensions();
            return Err(Error::InvalidDimensions { width, height });
        }

        let mut handles = vec![None; palette.len()];
        self.dither(image, palette, resolver, |x, y, index| {
            let handle = *handles[index].get_or_insert_with(|| surface.allocate(palette[index].rgba));
            surface.set_pixel(x, y, handle);
        });

        Ok(())
    }

    /// Dither `image` to an [`IndexedImage`] using `palette` as is.
    ///
    /// `resolver` must have been created for `palette`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `image` has a zero width or height and
    /// [`Error::InvalidPalette`] if `palette` has more than [`MAX_INDEXED_COLORS`] colors.
    pub fn dither_to_indexed(
        &self,
        image: &impl SampleSource,
        palette: &Palette,
        resolver: &mut Resolver,
    ) -> Result<IndexedImage, Error> {
        let (width, height) = image.dimensions();
        Error::check_dimensions(width, height)?;
        if palette.len() > MAX_INDEXED_COLORS {
            return Err(Error::InvalidPalette);
        }

        let mut indexed = IndexedImage::blank(width, height, palette.to_colors());
        self.dither(image, palette, resolver, |x, y, index| {
            #[allow(clippy::cast_possible_truncation)]
            indexed.set_index(x, y, index as u8);
        });

        Ok(indexed)
    }

    /// Dither `image` to the surface that fits `palette`.
    ///
    /// Palettes of at most [`MAX_INDEXED_COLORS`] colors give a [`ConvertedImage::Indexed`]
    /// with the palette registered in order. Larger palettes give a
    /// [`ConvertedImage::TrueColor`].
    ///
    /// `resolver` must have been created for `palette`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `image` has a zero width or height.
    pub fn render(
        &self,
        image: &impl SampleSource,
        palette: &Palette,
        resolver: &mut Resolver,
    ) -> Result<ConvertedImage, Error> {
        let (width, height) = image.dimensions();
        if palette.len() <= MAX_INDEXED_COLORS {
            debug!("dithering {width}x{height} image to {} indexed colors", palette.len());
            self.dither_to_indexed(image, palette, resolver)
                .map(ConvertedImage::Indexed)
        } else {
            debug!("dithering {width}x{height} image to true color with {} colors", palette.len());
            Error::check_dimensions(width, height)?;
            let mut surface = ImageBuf::from_pixel(width, height, Sample::TRANSPARENT)
                .ok_or(Error::InvalidDimensions { width, height })?;
            self.dither_to_surface(image, palette, resolver, &mut surface)?;
            Ok(ConvertedImage::TrueColor(surface))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color_map::DistanceMode, tests::*};

    fn render(image: &ImageBuf, palette: &Palette, amount: DitherAmount) -> ConvertedImage {
        let mut resolver = Resolver::new(palette, DistanceMode::Rgba);
        FloydSteinberg::new(amount).render(image, palette, &mut resolver).unwrap()
    }

    #[test]
    fn empty_inputs() {
        let palette = test_palette(4);
        let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
        let dither = FloydSteinberg::default();
        assert_eq!(
            dither.render(&ImageBuf::default(), &palette, &mut resolver),
            Err(Error::InvalidDimensions { width: 0, height: 0 }),
        );

        let mut calls = 0;
        dither.dither(&ImageBuf::default(), &palette, &mut resolver, |_, _, _| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(resolver.stats().lookups, 0);
    }

    #[test]
    fn zero_amount_matches_nearest_color() {
        let image = test_image();
        let palette = test_palette(16);
        let dithered = render(&image, &palette, DitherAmount::NONE);
        let indexed = dithered.as_indexed().unwrap();

        let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
        for y in 0..image.height() {
            for x in 0..image.width() {
                let expected = resolver.resolve(image.normalized_sample(x, y).to_f32());
                assert_eq!(indexed.index(x, y), Some(u8::try_from(expected).unwrap()));
            }
        }
    }

    #[test]
    fn exact_match_image_unaffected() {
        let palette = test_palette(16);
        let image = ImageBuf::from_fn(9, 7, |x, y| palette[((x + y * 9) % 16) as usize].rgba).unwrap();
        for amount in [DitherAmount::NONE, DitherAmount::DEFAULT, DitherAmount::FULL] {
            let dithered = render(&image, &palette, amount);
            assert_eq!(dithered.clone().into_image(), image);
            assert_eq!(dithered.as_indexed().unwrap().palette(), palette.to_colors());
        }
    }

    #[test]
    fn error_diffusion_mixes_colors() {
        let image = ImageBuf::from_pixel(8, 8, Sample::opaque(128, 128, 128)).unwrap();
        let palette = Palette::new([Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)]).unwrap();

        let plain = render(&image, &palette, DitherAmount::NONE).into_indexed().unwrap();
        assert!(plain.indices().iter().all(|&i| i == 1));

        let full = render(&image, &palette, DitherAmount::FULL).into_indexed().unwrap();
        let black = full.indices().iter().filter(|&&i| i == 0).count();
        assert!((24..=40).contains(&black), "{black} black pixels");
    }

    #[test]
    fn dither_amount_scales_error() {
        let image = ImageBuf::from_pixel(4, 1, Sample::opaque(160, 160, 160)).unwrap();
        let palette = Palette::new([Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)]).unwrap();

        // 160, 139.2, 134.7, 133.7 all stay above the midpoint
        let half = render(&image, &palette, DitherAmount::new_clamped(0.5)).into_indexed().unwrap();
        assert_eq!(half.indices(), [1, 1, 1, 1]);

        // 160, 118.4, 211.8, 141.1
        let full = render(&image, &palette, DitherAmount::FULL).into_indexed().unwrap();
        assert_eq!(full.indices(), [1, 0, 1, 1]);
    }

    #[test]
    fn error_spread_to_neighbors() {
        let mut rows = PendingRows::new(3);
        let err = [16.0, 32.0, -48.0, 64.0];

        rows.propagate(0, err, true);
        assert_eq!(rows.this_row, [[0.0; 4], [7.0, 14.0, -21.0, 28.0], [0.0; 4]]);
        assert_eq!(rows.next_row, [[5.0, 10.0, -15.0, 20.0], [1.0, 2.0, -3.0, 4.0], [0.0; 4]]);

        rows.propagate(2, err, true);
        assert_eq!(rows.this_row[2], [0.0; 4]);
        assert_eq!(rows.next_row, [[5.0, 10.0, -15.0, 20.0], [4.0, 8.0, -12.0, 16.0], [5.0, 10.0, -15.0, 20.0]]);

        let mut last = PendingRows::new(3);
        last.propagate(1, err, false);
        assert_eq!(last.this_row, [[0.0; 4], [0.0; 4], [7.0, 14.0, -21.0, 28.0]]);
        assert_eq!(last.next_row, [[0.0; 4]; 3]);
    }

    #[test]
    fn error_reaches_next_row() {
        let image = ImageBuf::from_pixel(3, 2, Sample::opaque(160, 160, 160)).unwrap();
        let palette = Palette::new([Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)]).unwrap();
        let full = render(&image, &palette, DitherAmount::FULL).into_indexed().unwrap();
        // the second row starts at 152.5, 183.0, 153.9 before its own diffusion
        assert_eq!(full.indices(), [1, 0, 1, 1, 1, 0]);
    }

    #[test]
    fn first_pixel_never_receives_error() {
        let image = test_image();
        let palette = test_palette(8);
        let plain = render(&image, &palette, DitherAmount::NONE).into_indexed().unwrap();
        let full = render(&image, &palette, DitherAmount::FULL).into_indexed().unwrap();
        assert_eq!(plain.index(0, 0), full.index(0, 0));
    }

    #[test]
    fn transparent_pixels_resolve_as_transparent() {
        let palette = Palette::new([Sample::opaque(200, 10, 10), Sample::TRANSPARENT]).unwrap();
        let image = ImageBuf::new(
            2,
            1,
            vec![Sample::new(200, 10, 10, 120), Sample::new(200, 10, 10, 100)],
        )
        .unwrap();
        let indexed = render(&image, &palette, DitherAmount::NONE).into_indexed().unwrap();
        assert_eq!(indexed.indices(), [1, 0]);
    }

    #[test]
    fn large_palettes_give_true_color() {
        let palette = test_palette(300);
        let image = test_image();
        let dithered = render(&image, &palette, DitherAmount::NONE);
        let ConvertedImage::TrueColor(output) = &dithered else {
            panic!("expected a true color image");
        };

        let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
        for y in 0..image.height() {
            for x in 0..image.width() {
                let index = resolver.resolve(image.normalized_sample(x, y).to_f32());
                assert_eq!(output.sample(x, y), palette[index].rgba);
            }
        }
    }

    #[test]
    fn surface_colors_allocated_once() {
        struct CountingSurface {
            allocated: Vec<Sample>,
            pixels: Vec<Option<usize>>,
        }

        impl OutputSurface for CountingSurface {
            type Handle = usize;

            fn dimensions(&self) -> (u32, u32) {
                (6, 5)
            }

            fn allocate(&mut self, color: Sample) -> usize {
                self.allocated.push(color);
                self.allocated.len() - 1
            }

            fn set_pixel(&mut self, x: u32, y: u32, handle: usize) {
                self.pixels[(y * 6 + x) as usize] = Some(handle);
            }
        }

        let palette = test_palette(5);
        let image = ImageBuf::from_fn(6, 5, |x, y| palette[((x * y) % 5) as usize].rgba).unwrap();
        let mut surface = CountingSurface { allocated: Vec::new(), pixels: vec![None; 30] };
        let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
        FloydSteinberg::new(DitherAmount::FULL)
            .dither_to_surface(&image, &palette, &mut resolver, &mut surface)
            .unwrap();

        let mut allocated = surface.allocated.clone();
        allocated.sort_unstable();
        allocated.dedup();
        assert_eq!(allocated.len(), surface.allocated.len());
        for y in 0..5 {
            for x in 0..6 {
                let handle = surface.pixels[(y * 6 + x) as usize].unwrap();
                assert_eq!(surface.allocated[handle], image.sample(x, y));
            }
        }

        let mut small = ImageBuf::from_pixel(2, 2, Sample::default()).unwrap();
        assert_eq!(
            FloydSteinberg::default().dither_to_surface(&image, &palette, &mut resolver, &mut small),
            Err(Error::InvalidDimensions { width: 2, height: 2 }),
        );
    }
}
