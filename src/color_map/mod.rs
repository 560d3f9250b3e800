//! Map colors to their nearest palette color.
//!
//! Nearest colors are found with an alpha-aware distance: for each of red, green, and blue the
//! penalty is the larger of the squared channel difference and the squared difference once the
//! alpha difference is subtracted from it. Alpha is never compared as a channel of its own.
//! Colors that differ in alpha are therefore pushed further apart, approximating how blending
//! with a background shifts the perceived color.
//!
//! The metric is not a proper norm, so the palette is searched with a full linear scan
//! (see [`NearestNeighborColorMap`]). A [`Resolver`] puts a bounded lookup cache in front of it.

mod cache;
mod nearest_neighbor;
mod resolver;

pub use cache::*;
pub use nearest_neighbor::*;
pub use resolver::*;

use crate::{PaletteEntry, color_space::components_to_lab};

/// The scale applied to alpha in [`DistanceMode::Lab`] so that a full alpha difference spans the
/// same range as lightness.
const LAB_ALPHA_SCALE: f32 = 100.0;

/// The color space in which distances between colors are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistanceMode {
    /// Compare the red, green, blue, and alpha components directly.
    #[default]
    Rgba,
    /// Compare the CIE Lab lightness and chroma components along with alpha.
    ///
    /// Each color to resolve is converted to CIE Lab first, which makes resolving slower.
    Lab,
}

impl DistanceMode {
    /// Returns the components of a fractional RGBA color as measured by this mode.
    #[inline]
    pub fn components(self, color: [f32; 4]) -> [f32; 4] {
        match self {
            Self::Rgba => color,
            Self::Lab => {
                let lab = components_to_lab(color);
                [lab.l, lab.a, lab.b, lab.alpha * LAB_ALPHA_SCALE]
            }
        }
    }

    /// Returns the components of a palette entry as measured by this mode.
    #[inline]
    pub fn entry_components(self, entry: &PaletteEntry) -> [f32; 4] {
        match self {
            Self::Rgba => entry.rgba.to_f32(),
            Self::Lab => {
                let lab = entry.lab;
                [lab.l, lab.a, lab.b, lab.alpha * LAB_ALPHA_SCALE]
            }
        }
    }
}

/// The alpha-aware distance between two colors given as `[c0, c1, c2, alpha]` components.
///
/// # Examples
///
/// ```
/// # use alphaquant::color_map::distance;
/// let a = [10.0, 20.0, 30.0, 0.0];
/// assert_eq!(distance(a, a), 0.0);
/// assert_eq!(distance(a, [11.0, 20.0, 30.0, 0.0]), 1.0);
/// // an alpha difference penalizes every channel
/// assert_eq!(distance(a, [10.0, 20.0, 30.0, 2.0]), 12.0);
/// ```
#[inline]
pub fn distance(x: [f32; 4], y: [f32; 4]) -> f32 {
    let da = x[3] - y[3];
    let mut dist = 0.0;
    for c in 0..3 {
        let d = x[c] - y[c];
        let e = d - da;
        dist += (d * d).max(e * e);
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sample;

    #[test]
    #[allow(clippy::float_cmp)]
    fn zero_distance_to_self() {
        for sample in crate::tests::test_samples() {
            let x = sample.to_f32();
            assert_eq!(distance(x, x), 0.0);
            let lab = DistanceMode::Lab.components(x);
            assert_eq!(distance(lab, lab), 0.0);
        }
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn alpha_folds_into_channels() {
        let opaque = Sample::opaque(100, 100, 100).to_f32();
        let faded = Sample::new(100, 100, 100, 10).to_f32();
        assert_eq!(distance(opaque, faded), 300.0);

        // a channel difference in the same direction as alpha is partly cancelled
        let x = [20.0, 0.0, 0.0, 5.0];
        let y = [10.0, 0.0, 0.0, 0.0];
        assert_eq!(distance(x, y), 100.0 + 25.0 + 25.0);
        assert_eq!(distance(y, x), distance(x, y));
    }

    #[test]
    fn lab_components_of_entries_match_colors() {
        let sample = Sample::new(30, 160, 220, 40);
        let entry = PaletteEntry::new(sample);
        let from_entry = DistanceMode::Lab.entry_components(&entry);
        let from_color = DistanceMode::Lab.components(sample.to_f32());
        for (a, b) in from_entry.into_iter().zip(from_color) {
            assert!((a - b).abs() < 1e-4);
        }
        assert_eq!(DistanceMode::Rgba.entry_components(&entry), sample.to_f32());
    }
}
