//! Palette generation by frequency weighted pruning of a bit plane tree.
//!
//! Every sample of the source image is inserted into a [`QuantTree`] whose leaves are buckets of
//! colors sharing their most significant bits. If there are more leaves than the requested number
//! of colors, leaves are merged into their nearest neighbors, least frequent first, until the
//! target is reached. Each remaining leaf becomes one palette color.
//!
//! The easiest way to generate a palette is the [`quantize`] function. For more control or to
//! build the tree in parallel, see [`Quantizer`].

mod tree;

pub use tree::*;

use crate::{Error, MAX_PARENTAGE, Sample, SampleSource, SignificantBits};
use alloc::vec::Vec;
use core::num::NonZeroUsize;
use log::{debug, trace};

/// Reduce the leaves of `tree` to at most `target` leaves and return them in branch key order.
///
/// Each pass walks the leaves sorted by ascending count and merges each one into its nearest
/// neighbor below an ancestor one level higher than the previous pass. Merging stops as soon as
/// the target is reached.
fn reduce(tree: &mut QuantTree, target: NonZeroUsize) -> Vec<NodeId> {
    let target = target.get();
    let mut leaves = tree.leaves();
    if leaves.len() <= target {
        return leaves;
    }

    let mut remaining = leaves.len();
    'passes: for parentage in 0..MAX_PARENTAGE {
        leaves.sort_by_key(|&leaf| tree.count(leaf));
        let before = remaining;
        for leaf in &leaves {
            if tree.prune(*leaf, parentage) {
                remaining -= 1;
                if remaining <= target {
                    break 'passes;
                }
            }
        }
        leaves.retain(|&leaf| !tree.is_ignored(leaf));
        trace!("pruning pass {parentage} merged {} leaves", before - remaining);
    }

    tree.leaves()
}

/// Adjust a reconstructed leaf color to form the final palette color.
///
/// Mostly transparent colors become fully transparent and grays close to white become white.
#[inline]
fn finish_color(color: Sample) -> Sample {
    let mut color = color;
    if color.alpha > Sample::TRANSPARENCY_THRESHOLD {
        color.alpha = Sample::ALPHA_TRANSPARENT;
    }
    if color.red > 248 && color.red == color.green && color.green == color.blue {
        color.red = u8::MAX;
        color.green = u8::MAX;
        color.blue = u8::MAX;
    }
    color
}

/// A builder struct to generate a palette from an image.
///
/// # Examples
///
/// ```
/// # use alphaquant::{Error, ImageBuf, Sample, SignificantBits, quantize::Quantizer};
/// # fn main() -> Result<(), Error> {
/// let image = ImageBuf::from_fn(16, 16, |x, y| Sample::opaque((x * 16) as u8, (y * 16) as u8, 0))
///     .ok_or(Error::InvalidDimensions { width: 16, height: 16 })?;
///
/// let palette = Quantizer::new(8)?
///     .significant_bits(SignificantBits::new(4).ok_or(Error::UnsupportedSignificantBits(4))?)
///     .quantize(&image)?;
///
/// assert!(palette.len() <= 8);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantizer {
    /// The maximum number of palette colors.
    target_colors: NonZeroUsize,
    /// The depth of the tree.
    significant_bits: SignificantBits,
}

impl Quantizer {
    /// Create a new [`Quantizer`] which generates at most `target_colors` colors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTargetColors`] if `target_colors` is zero.
    pub fn new(target_colors: usize) -> Result<Self, Error> {
        let target_colors = NonZeroUsize::new(target_colors).ok_or(Error::InvalidTargetColors)?;
        Ok(Self {
            target_colors,
            significant_bits: SignificantBits::DEFAULT,
        })
    }

    /// Set the number of significant bits of each channel used to bucket colors.
    ///
    /// Fewer bits give coarser buckets and a faster reduction.
    /// The default value is [`SignificantBits::DEFAULT`].
    #[inline]
    pub fn significant_bits(mut self, significant_bits: SignificantBits) -> Self {
        self.significant_bits = significant_bits;
        self
    }

    /// Returns the maximum number of palette colors.
    #[inline]
    pub fn target_colors(&self) -> NonZeroUsize {
        self.target_colors
    }

    /// Build a [`QuantTree`] from every normalized sample of `image`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `image` has a zero width or height.
    pub fn build_tree(&self, image: &impl SampleSource) -> Result<QuantTree, Error> {
        let (width, height) = image.dimensions();
        Error::check_dimensions(width, height)?;

        let mut tree = QuantTree::new(self.significant_bits);
        for y in 0..height {
            for x in 0..width {
                tree.add(image.normalized_sample(x, y));
            }
        }
        Ok(tree)
    }

    /// Reduce a freshly built tree and return the palette colors.
    fn palette_from_tree(&self, mut tree: QuantTree) -> Vec<Sample> {
        let natural = tree.leaves().len();
        let leaves = reduce(&mut tree, self.target_colors);
        debug!(
            "reduced {natural} leaves to {} colors ({} samples, {} significant bits)",
            leaves.len(),
            tree.total_count(),
            self.significant_bits,
        );
        leaves
            .into_iter()
            .map(|leaf| finish_color(tree.to_rgba(leaf)))
            .collect()
    }

    /// Generate a palette of at most the target number of colors from `image`.
    ///
    /// If the image has no more distinct buckets than the target, every bucket becomes a color
    /// and no merging occurs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `image` has a zero width or height.
    pub fn quantize(&self, image: &impl SampleSource) -> Result<Vec<Sample>, Error> {
        let tree = self.build_tree(image)?;
        Ok(self.palette_from_tree(tree))
    }
}

/// Generate a palette of at most `target_colors` colors from `image`.
///
/// This is a shorthand for [`Quantizer`] with the given number of significant bits.
///
/// # Errors
///
/// Returns an error if `target_colors` is zero, `significant_bits` is not in `1..=8`,
/// or `image` has a zero width or height.
///
/// # Examples
///
/// ```
/// # use alphaquant::{Error, ImageBuf, Sample, quantize};
/// # fn main() -> Result<(), Error> {
/// let black = Sample::opaque(0, 0, 0);
/// let white = Sample::opaque(255, 255, 255);
/// let image = ImageBuf::new(2, 2, vec![black, white, white, black])
///     .map_err(|_| Error::InvalidDimensions { width: 2, height: 2 })?;
///
/// let palette = quantize(&image, 2, 8)?;
/// assert_eq!(palette, [black, white]);
/// # Ok(())
/// # }
/// ```
pub fn quantize(
    image: &impl SampleSource,
    target_colors: usize,
    significant_bits: u8,
) -> Result<Vec<Sample>, Error> {
    let significant_bits = SignificantBits::try_from(significant_bits)?;
    Quantizer::new(target_colors)?
        .significant_bits(significant_bits)
        .quantize(image)
}

#[cfg(feature = "threads")]
/// Module for code gated behind the `threads` feature.
mod parallel {
    use super::{QuantTree, Quantizer};
    use crate::{Error, Sample, SampleSource};
    use alloc::vec::Vec;
    use rayon::prelude::*;

    impl Quantizer {
        /// Build a [`QuantTree`] in parallel from every normalized sample of `image`.
        ///
        /// Rows are inserted into partial trees which are then merged. The resulting tree has the
        /// same leaves in the same order as one built by [`Quantizer::build_tree`].
        ///
        /// # Errors
        ///
        /// Returns [`Error::InvalidDimensions`] if `image` has a zero width or height.
        pub fn build_tree_par<S>(&self, image: &S) -> Result<QuantTree, Error>
        where
            S: SampleSource + Sync,
        {
            let (width, height) = image.dimensions();
            Error::check_dimensions(width, height)?;

            let bits = self.significant_bits;
            let tree = (0..height)
                .into_par_iter()
                .fold(
                    || QuantTree::new(bits),
                    |mut tree, y| {
                        for x in 0..width {
                            tree.add(image.normalized_sample(x, y));
                        }
                        tree
                    },
                )
                .reduce(
                    || QuantTree::new(bits),
                    |mut a, b| {
                        if a.num_nodes() < b.num_nodes() {
                            let mut b = b;
                            b.merge(&a);
                            b
                        } else {
                            a.merge(&b);
                            a
                        }
                    },
                );

            Ok(tree)
        }

        /// Generate a palette of at most the target number of colors from `image`, building the
        /// tree in parallel.
        ///
        /// This gives the same palette as [`Quantizer::quantize`].
        ///
        /// # Errors
        ///
        /// Returns [`Error::InvalidDimensions`] if `image` has a zero width or height.
        pub fn quantize_par<S>(&self, image: &S) -> Result<Vec<Sample>, Error>
        where
            S: SampleSource + Sync,
        {
            let tree = self.build_tree_par(image)?;
            Ok(self.palette_from_tree(tree))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImageBuf, tests::*};
    use alloc::vec;

    fn bits(bits: u8) -> SignificantBits {
        SignificantBits::new(bits).unwrap()
    }

    #[test]
    fn zero_target_rejected() {
        assert_eq!(Quantizer::new(0), Err(Error::InvalidTargetColors));
        let image = test_image();
        assert_eq!(quantize(&image, 0, 5), Err(Error::InvalidTargetColors));
        assert_eq!(quantize(&image, 4, 9), Err(Error::UnsupportedSignificantBits(9)));
        assert_eq!(quantize(&image, 4, 0), Err(Error::UnsupportedSignificantBits(0)));
    }

    #[test]
    fn empty_image_rejected() {
        let image = ImageBuf::default();
        assert_eq!(
            quantize(&image, 4, 5),
            Err(Error::InvalidDimensions { width: 0, height: 0 }),
        );
    }

    #[test]
    fn at_most_target_colors() {
        let image = test_image();
        for bits in [1, 3, 5, 8] {
            let natural = Quantizer::new(usize::MAX)
                .unwrap()
                .significant_bits(self::bits(bits))
                .build_tree(&image)
                .unwrap()
                .leaves()
                .len();

            for target in [1, 2, 7, 16, 64, 256, natural, natural + 1] {
                let palette = quantize(&image, target, bits).unwrap();
                assert!(palette.len() <= target, "bits {bits} target {target}");
                if natural <= target {
                    assert_eq!(palette.len(), natural, "bits {bits} target {target}");
                }
            }
        }
    }

    #[test]
    fn reaches_target_when_over() {
        let image = test_image();
        for target in [1, 2, 16, 100] {
            assert_eq!(quantize(&image, target, 5).unwrap().len(), target);
        }
    }

    #[test]
    fn counts_conserved_by_reduction() {
        let image = test_image();
        let quantizer = Quantizer::new(12).unwrap();
        let mut tree = quantizer.build_tree(&image).unwrap();
        let total = tree.total_count();
        assert_eq!(total, u64::from(image.width() * image.height()));

        let leaves = reduce(&mut tree, quantizer.target_colors());
        assert_eq!(leaves.len(), 12);
        assert_eq!(leaves.iter().map(|&leaf| tree.count(leaf)).sum::<u64>(), total);
        assert_eq!(tree.leaves(), leaves);
    }

    #[test]
    fn least_frequent_leaf_merged_first() {
        let black = Sample::opaque(0, 0, 0);
        let red = Sample::opaque(1, 0, 0);
        let green = Sample::opaque(0, 1, 0);

        let mut tree = QuantTree::new(SignificantBits::MAX);
        for (sample, count) in [(black, 5), (red, 1), (green, 3)] {
            for _ in 0..count {
                tree.add(sample);
            }
        }

        // red goes first and joins black, its nearest sibling
        let leaves = reduce(&mut tree, NonZeroUsize::new(2).unwrap());
        let colors = leaves
            .iter()
            .map(|&leaf| (tree.to_rgba(leaf), tree.count(leaf)))
            .collect::<Vec<_>>();
        assert_eq!(colors, [(black, 6), (green, 3)]);
    }

    #[test]
    fn palette_colors_keep_significant_bits() {
        let image = test_image();
        for bits in 1..=5 {
            let step = 1u8 << (8 - bits);
            for color in quantize(&image, 32, bits).unwrap() {
                for channel in color.to_array() {
                    assert!(channel % step == 0 || channel == Sample::ALPHA_TRANSPARENT);
                }
            }
        }
    }

    #[test]
    fn transparent_samples_share_one_color() {
        let image = ImageBuf::new(
            4,
            1,
            vec![
                Sample::new(255, 0, 0, 111),
                Sample::new(0, 255, 0, 127),
                Sample::new(0, 0, 255, 120),
                Sample::new(0, 0, 255, 110),
            ],
        )
        .unwrap();

        let palette = quantize(&image, 16, 8).unwrap();
        assert_eq!(palette, [Sample::TRANSPARENT, Sample::new(0, 0, 255, 110)]);
    }

    #[test]
    fn mostly_transparent_leaves_become_transparent() {
        assert_eq!(finish_color(Sample::new(8, 8, 8, 112)), Sample::new(8, 8, 8, 127));
        assert_eq!(finish_color(Sample::new(8, 8, 8, 110)), Sample::new(8, 8, 8, 110));
    }

    #[test]
    fn near_white_collapses_to_white() {
        assert_eq!(finish_color(Sample::opaque(252, 252, 252)), Sample::opaque(255, 255, 255));
        assert_eq!(finish_color(Sample::new(254, 254, 254, 3)), Sample::new(255, 255, 255, 3));
        assert_eq!(finish_color(Sample::opaque(248, 248, 248)), Sample::opaque(248, 248, 248));
        assert_eq!(finish_color(Sample::opaque(252, 252, 248)), Sample::opaque(252, 252, 248));

        let image = ImageBuf::from_pixel(2, 2, Sample::opaque(253, 253, 253)).unwrap();
        assert_eq!(quantize(&image, 4, 6).unwrap(), [Sample::opaque(255, 255, 255)]);
    }

    #[test]
    fn black_and_white_exact() {
        let palette = quantize(&black_and_white_image(), 2, 8).unwrap();
        assert_eq!(palette, [Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)]);
    }

    #[test]
    fn deterministic() {
        let image = test_image();
        assert_eq!(quantize(&image, 24, 5).unwrap(), quantize(&image, 24, 5).unwrap());
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_serial() {
        let image = test_image();
        for target in [3, 24, 256] {
            let quantizer = Quantizer::new(target).unwrap();
            assert_eq!(
                quantizer.quantize_par(&image).unwrap(),
                quantizer.quantize(&image).unwrap(),
            );
        }
    }
}
