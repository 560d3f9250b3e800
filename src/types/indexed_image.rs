use crate::{ImageBuf, MAX_INDEXED_COLORS, Sample, SampleSource};
use alloc::vec::Vec;
use core::{error::Error, fmt};

/// A destination for dithered pixels whose colors are allocated on demand.
///
/// This mirrors a true color surface: every time the ditherer picks a palette color for a pixel it
/// first allocates (or looks up) a handle for that color and then writes the handle to the pixel.
pub trait OutputSurface {
    /// A stable handle to an allocated color.
    type Handle: Copy;

    /// Returns the width and height of the surface.
    fn dimensions(&self) -> (u32, u32);

    /// Allocate `color`, returning a handle that may be reused for later pixels.
    fn allocate(&mut self, color: Sample) -> Self::Handle;

    /// Set the pixel at `(x, y)` to a previously allocated color.
    fn set_pixel(&mut self, x: u32, y: u32, handle: Self::Handle);
}

/// A true color [`ImageBuf`] stores samples directly, so a handle is the sample itself.
impl OutputSurface for ImageBuf {
    type Handle = Sample;

    #[inline]
    fn dimensions(&self) -> (u32, u32) {
        ImageBuf::dimensions(self)
    }

    #[inline]
    fn allocate(&mut self, color: Sample) -> Self::Handle {
        color
    }

    #[inline]
    fn set_pixel(&mut self, x: u32, y: u32, handle: Self::Handle) {
        let width = self.width() as usize;
        self.as_mut_slice()[y as usize * width + x as usize] = handle;
    }
}

/// The error returned when an [`IndexedImage`] failed to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndexedImageError {
    /// The provided image width.
    width: u32,
    /// The provided image height.
    height: u32,
    /// The provided palette length.
    palette_len: usize,
    /// The provided indices length.
    indices_len: usize,
}

impl fmt::Display for CreateIndexedImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { width, height, palette_len, indices_len } = *self;
        if palette_len > MAX_INDEXED_COLORS {
            write!(
                f,
                "a palette of {palette_len} colors is above the maximum of {MAX_INDEXED_COLORS}"
            )
        } else if width.checked_mul(height).map(|len| len as usize) != Some(indices_len) {
            write!(
                f,
                "image dimensions of ({width}, {height}) do not match the indices length of {indices_len}"
            )
        } else {
            write!(f, "an index is out of bounds for a palette of {palette_len} colors")
        }
    }
}

impl Error for CreateIndexedImageError {}

/// An image represented as a palette of at most 256 colors and one `u8` index per pixel.
///
/// The indices are stored in row-major order and their count always equals `width * height`.
/// Every index is guaranteed to be in bounds of the palette.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IndexedImage {
    /// The width of the image.
    width: u32,
    /// The height of the image.
    height: u32,
    /// The palette of the image.
    palette: Vec<Sample>,
    /// The palette index of each pixel.
    indices: Vec<u8>,
}

impl IndexedImage {
    /// Create a new [`IndexedImage`] without validating invariants.
    pub(crate) fn new_unchecked(
        width: u32,
        height: u32,
        palette: Vec<Sample>,
        indices: Vec<u8>,
    ) -> Self {
        debug_assert!(palette.len() <= MAX_INDEXED_COLORS);
        debug_assert_eq!(
            width.checked_mul(height).map(|len| len as usize),
            Some(indices.len()),
        );
        debug_assert!(indices.iter().all(|&i| usize::from(i) < palette.len()));
        Self { width, height, palette, indices }
    }

    /// Create an [`IndexedImage`] with every pixel set to index `0` of a pre-registered palette.
    pub(crate) fn blank(width: u32, height: u32, palette: Vec<Sample>) -> Self {
        let indices = bytemuck::zeroed_vec(width as usize * height as usize);
        Self::new_unchecked(width, height, palette, indices)
    }

    /// Create a new [`IndexedImage`] from a `palette` and `indices` into the `palette`.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the following are true:
    /// - The palette has more than [`MAX_INDEXED_COLORS`] colors.
    /// - The length of `indices` and `width * height` do not match.
    /// - An index is not less than the length of the palette.
    pub fn new(
        width: u32,
        height: u32,
        palette: Vec<Sample>,
        indices: Vec<u8>,
    ) -> Result<Self, CreateIndexedImageError> {
        let valid = palette.len() <= MAX_INDEXED_COLORS
            && width.checked_mul(height).map(|len| len as usize) == Some(indices.len())
            && indices.iter().all(|&i| usize::from(i) < palette.len());

        if valid {
            Ok(Self::new_unchecked(width, height, palette, indices))
        } else {
            Err(CreateIndexedImageError {
                width,
                height,
                palette_len: palette.len(),
                indices_len: indices.len(),
            })
        }
    }

    /// Returns the width and height of the [`IndexedImage`].
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns whether the [`IndexedImage`] has zero pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the palette of the [`IndexedImage`].
    #[inline]
    pub fn palette(&self) -> &[Sample] {
        &self.palette
    }

    /// Returns the palette indices of the [`IndexedImage`].
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Returns the palette index of the pixel at `(x, y)` or `None` if it is out of bounds.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.indices[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Set the pixel at `(x, y)` to the pre-registered palette color at `index`.
    #[inline]
    pub(crate) fn set_index(&mut self, x: u32, y: u32, index: u8) {
        debug_assert!(usize::from(index) < self.palette.len());
        self.indices[y as usize * self.width as usize + x as usize] = index;
    }

    /// Consume the [`IndexedImage`] and return its palette and indices.
    #[must_use]
    #[inline]
    pub fn into_parts(self) -> (Vec<Sample>, Vec<u8>) {
        let Self { palette, indices, .. } = self;
        (palette, indices)
    }

    /// Convert the [`IndexedImage`] to a true color [`ImageBuf`].
    #[must_use]
    pub fn to_image(&self) -> ImageBuf {
        let pixels = self
            .indices
            .iter()
            .map(|&i| self.palette[usize::from(i)])
            .collect();
        ImageBuf::new_unchecked(self.width, self.height, pixels)
    }
}

impl SampleSource for IndexedImage {
    #[inline]
    fn dimensions(&self) -> (u32, u32) {
        IndexedImage::dimensions(self)
    }

    #[inline]
    fn sample(&self, x: u32, y: u32) -> Sample {
        let i = self.indices[y as usize * self.width as usize + x as usize];
        self.palette[usize::from(i)]
    }
}

/// The output of a conversion.
///
/// Palettes with at most [`MAX_INDEXED_COLORS`] colors produce an [`IndexedImage`]. Larger
/// palettes cannot be indexed with a `u8` and produce a true color [`ImageBuf`] instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConvertedImage {
    /// An image with pre-registered palette indices.
    Indexed(IndexedImage),
    /// A true color image with colors allocated on demand.
    TrueColor(ImageBuf),
}

impl ConvertedImage {
    /// Returns the width and height of the image.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Indexed(image) => image.dimensions(),
            Self::TrueColor(image) => image.dimensions(),
        }
    }

    /// Returns the [`IndexedImage`] if this is an indexed image.
    #[inline]
    pub fn as_indexed(&self) -> Option<&IndexedImage> {
        match self {
            Self::Indexed(image) => Some(image),
            Self::TrueColor(_) => None,
        }
    }

    /// Returns the [`IndexedImage`] if this is an indexed image.
    #[inline]
    pub fn into_indexed(self) -> Option<IndexedImage> {
        match self {
            Self::Indexed(image) => Some(image),
            Self::TrueColor(_) => None,
        }
    }

    /// Convert the image to a true color [`ImageBuf`].
    #[must_use]
    pub fn into_image(self) -> ImageBuf {
        match self {
            Self::Indexed(image) => image.to_image(),
            Self::TrueColor(image) => image,
        }
    }
}

impl SampleSource for ConvertedImage {
    #[inline]
    fn dimensions(&self) -> (u32, u32) {
        ConvertedImage::dimensions(self)
    }

    #[inline]
    fn sample(&self, x: u32, y: u32) -> Sample {
        match self {
            Self::Indexed(image) => image.sample(x, y),
            Self::TrueColor(image) => image.sample(x, y),
        }
    }
}

#[cfg(feature = "image")]
mod image_integration {
    use super::{ConvertedImage, IndexedImage};
    use image::{Rgba, RgbaImage};

    impl IndexedImage {
        /// Convert the [`IndexedImage`] to an [`RgbaImage`] with straight 8-bit alpha.
        #[must_use]
        pub fn to_rgba_image(&self) -> RgbaImage {
            let (width, height) = self.dimensions();
            let palette = self
                .palette
                .iter()
                .map(|color| Rgba(color.to_straight_alpha()))
                .collect::<Vec<_>>();

            RgbaImage::from_fn(width, height, |x, y| {
                let i = self.indices[y as usize * width as usize + x as usize];
                palette[usize::from(i)]
            })
        }
    }

    impl From<ConvertedImage> for RgbaImage {
        fn from(image: ConvertedImage) -> Self {
            match image {
                ConvertedImage::Indexed(indexed) => indexed.to_rgba_image(),
                ConvertedImage::TrueColor(buf) => buf.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn black_and_white() -> Vec<Sample> {
        vec![Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)]
    }

    #[test]
    fn invalid_indexed_images_rejected() {
        assert!(IndexedImage::new(2, 1, black_and_white(), vec![0]).is_err());
        assert!(IndexedImage::new(2, 1, black_and_white(), vec![0, 2]).is_err());
        assert!(IndexedImage::new(1, 1, vec![Sample::default(); 257], vec![0]).is_err());
        assert!(IndexedImage::new(2, 1, black_and_white(), vec![1, 0]).is_ok());
    }

    #[test]
    fn indexed_to_image() {
        let indexed = IndexedImage::new(2, 1, black_and_white(), vec![1, 0]).unwrap();
        let image = indexed.to_image();
        assert_eq!(image.as_slice(), &[Sample::opaque(255, 255, 255), Sample::opaque(0, 0, 0)]);
        assert_eq!(indexed.sample(0, 0), image.sample(0, 0));
        assert_eq!(indexed.index(1, 0), Some(0));
        assert_eq!(indexed.index(2, 0), None);
    }

    #[test]
    fn true_color_surface_allocates_on_demand() {
        let mut surface = ImageBuf::from_pixel(2, 2, Sample::default()).unwrap();
        let handle = OutputSurface::allocate(&mut surface, Sample::opaque(1, 2, 3));
        surface.set_pixel(1, 1, handle);
        assert_eq!(surface.sample(1, 1), Sample::opaque(1, 2, 3));
        assert_eq!(surface.sample(0, 1), Sample::default());
    }
}
