use crate::Sample;
use alloc::{vec, vec::Vec};
use core::{error::Error, fmt};

/// A source of RGBA samples laid out on a 2D grid.
///
/// This is the only view of an input image the quantizer and the ditherer need. Implement this
/// trait for your own image type to avoid copying pixels into an [`ImageBuf`].
pub trait SampleSource {
    /// Returns the width and height of the image.
    fn dimensions(&self) -> (u32, u32);

    /// Returns the sample at column `x` and row `y`.
    ///
    /// Callers guarantee that `x < width` and `y < height`.
    fn sample(&self, x: u32, y: u32) -> Sample;

    /// Returns the sample at `(x, y)` with transparent samples collapsed into
    /// [`Sample::TRANSPARENT`].
    #[inline]
    fn normalized_sample(&self, x: u32, y: u32) -> Sample {
        self.sample(x, y).normalized()
    }
}

impl<T: SampleSource + ?Sized> SampleSource for &T {
    #[inline]
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    #[inline]
    fn sample(&self, x: u32, y: u32) -> Sample {
        (**self).sample(x, y)
    }
}

/// The error returned when an [`Image`] failed to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateImageError {
    /// The provided image width.
    width: u32,
    /// The provided image height.
    height: u32,
    /// The length of the pixel buffer.
    length: usize,
}

impl fmt::Display for CreateImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { width, height, length } = *self;
        if width.checked_mul(height).is_some() {
            write!(
                f,
                "image dimensions of ({width}, {height}) do not match the buffer length of {length}"
            )
        } else {
            write!(
                f,
                "image dimensions of ({width}, {height}) are above the maximum number of pixels of {}",
                u32::MAX,
            )
        }
    }
}

impl Error for CreateImageError {}

/// An image of [`Sample`]s parameterized by the type of the container.
///
/// Typically you want to use one of the aliases with a defined container:
/// - [`ImageBuf`]: an owned image backed by a [`Vec`].
/// - [`ImageRef`]: a borrowed image backed by an immutable slice reference.
///
/// The pixels are stored in row-major order and their count always equals `width * height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Image<Container> {
    /// The width of the image.
    width: u32,
    /// The height of the image.
    height: u32,
    /// The pixel buffer or slice.
    pixels: Container,
}

/// An owned image buffer backed by a [`Vec`].
///
/// # Examples
///
/// ```
/// # use alphaquant::{ImageBuf, Sample};
/// let image = ImageBuf::new(2, 1, vec![Sample::opaque(0, 0, 0), Sample::TRANSPARENT]).unwrap();
/// assert_eq!(image.dimensions(), (2, 1));
/// assert_eq!(image.get(1, 0), Some(Sample::TRANSPARENT));
/// ```
pub type ImageBuf = Image<Vec<Sample>>;

/// A borrowed image backed by a reference to a slice.
pub type ImageRef<'a> = Image<&'a [Sample]>;

impl<Container> Image<Container> {
    /// Returns the width and height of the [`Image`].
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the width of the [`Image`].
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the [`Image`].
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns whether the [`Image`] has zero pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the underlying pixel container.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> Container {
        self.pixels
    }
}

impl<Container: AsRef<[Sample]>> Image<Container> {
    /// Create a new [`Image`] without validating invariants.
    #[inline]
    pub(crate) fn new_unchecked(width: u32, height: u32, pixels: Container) -> Self {
        debug_assert_eq!(
            width.checked_mul(height).map(|len| len as usize),
            Some(pixels.as_ref().len())
        );
        Self { width, height, pixels }
    }

    /// Create a new [`Image`] from a width, a height, and a `Container` of pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the length of `pixels` and `width * height` do not match or if
    /// `width * height` overflows a `u32`.
    #[inline]
    pub fn new(width: u32, height: u32, pixels: Container) -> Result<Self, CreateImageError> {
        let length = pixels.as_ref().len();
        if width.checked_mul(height).map(|len| len as usize) == Some(length) {
            Ok(Self::new_unchecked(width, height, pixels))
        } else {
            Err(CreateImageError { width, height, length })
        }
    }

    /// Returns a reference to the underlying pixels as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Sample] {
        self.pixels.as_ref()
    }

    /// Convert an [`Image`] to an [`ImageRef`].
    #[inline]
    pub fn as_ref(&self) -> ImageRef<'_> {
        Image::new_unchecked(self.width, self.height, self.as_slice())
    }

    /// Returns the sample at `(x, y)` or `None` if it is out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<Sample> {
        if x < self.width && y < self.height {
            self.as_slice().get(y as usize * self.width as usize + x as usize).copied()
        } else {
            None
        }
    }

    /// Returns an iterator over the rows of the image.
    #[inline]
    pub fn rows(&self) -> impl Iterator<Item = &[Sample]> + '_ {
        self.as_slice().chunks_exact(self.width.max(1) as usize)
    }
}

impl<Container: AsMut<[Sample]>> Image<Container> {
    /// Returns a mutable reference to the underlying pixels as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Sample] {
        self.pixels.as_mut()
    }
}

impl<'a> ImageRef<'a> {
    /// Create an [`ImageRef`] from packed `[red, green, blue, alpha]` bytes.
    ///
    /// The alpha bytes must already use the `0` = opaque, `127` = transparent convention.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length is not `4 * width * height`.
    pub fn from_raw(width: u32, height: u32, bytes: &'a [u8]) -> Result<Self, CreateImageError> {
        match bytemuck::try_cast_slice(bytes) {
            Ok(pixels) => Self::new(width, height, pixels),
            Err(_) => Err(CreateImageError { width, height, length: bytes.len() }),
        }
    }
}

impl ImageBuf {
    /// Create a new [`ImageBuf`] filled with a single sample.
    ///
    /// Returns `None` if `width * height` overflows a `u32`.
    #[must_use]
    #[inline]
    pub fn from_pixel(width: u32, height: u32, pixel: Sample) -> Option<Self> {
        let len = width.checked_mul(height)?;
        Some(Self::new_unchecked(width, height, vec![pixel; len as usize]))
    }

    /// Create a new [`ImageBuf`] by calling `f` for every `(x, y)` coordinate.
    ///
    /// Returns `None` if `width * height` overflows a `u32`.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Sample) -> Option<Self> {
        let len = width.checked_mul(height)?;
        let mut pixels = Vec::with_capacity(len as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Some(Self::new_unchecked(width, height, pixels))
    }

    /// Read any [`SampleSource`] into a new [`ImageBuf`].
    #[must_use]
    pub fn from_source(source: &impl SampleSource) -> Self {
        let (width, height) = source.dimensions();
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| source.sample(x, y))
            .collect();
        Self::new_unchecked(width, height, pixels)
    }
}

impl Default for ImageBuf {
    #[inline]
    fn default() -> Self {
        Self::new_unchecked(0, 0, Vec::new())
    }
}

impl Default for ImageRef<'_> {
    #[inline]
    fn default() -> Self {
        Self::new_unchecked(0, 0, &[])
    }
}

impl<Container: AsRef<[Sample]>> SampleSource for Image<Container> {
    #[inline]
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn sample(&self, x: u32, y: u32) -> Sample {
        self.as_slice()[y as usize * self.width as usize + x as usize]
    }
}

#[cfg(feature = "image")]
mod image_integration {
    use super::{CreateImageError, ImageBuf, SampleSource};
    use crate::Sample;
    use image::RgbaImage;

    /// Samples are read with the 8-bit straight alpha converted to the 7-bit convention.
    impl SampleSource for RgbaImage {
        #[inline]
        fn dimensions(&self) -> (u32, u32) {
            RgbaImage::dimensions(self)
        }

        #[inline]
        fn sample(&self, x: u32, y: u32) -> Sample {
            Sample::from_straight_alpha(self.get_pixel(x, y).0)
        }
    }

    impl TryFrom<&RgbaImage> for ImageBuf {
        type Error = CreateImageError;

        fn try_from(image: &RgbaImage) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            let pixels = image
                .pixels()
                .map(|pixel| Sample::from_straight_alpha(pixel.0))
                .collect();
            Self::new(width, height, pixels)
        }
    }

    impl From<ImageBuf> for RgbaImage {
        fn from(buf: ImageBuf) -> Self {
            let (width, height) = buf.dimensions();
            RgbaImage::from_fn(width, height, |x, y| {
                image::Rgba(buf.sample(x, y).to_straight_alpha())
            })
        }
    }
}
