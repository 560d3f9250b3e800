use super::DistanceMode;
use crate::Palette;
use alloc::vec::Vec;
use wide::{CmpLt as _, f32x8, u32x8};

/// The component value of padding lanes, far enough away to never be the nearest color.
const FAR: f32 = 1.0e9;

/// A lookup structure that maps colors to the index of their nearest palette color according to
/// the alpha-aware [`distance`].
///
/// The palette components are laid out in chunks of 8 colors so that 8 distances are computed at
/// once. Ties resolve to the lowest palette index.
#[derive(Clone, Debug)]
pub struct NearestNeighborColorMap {
    /// The number of palette colors.
    len: usize,
    /// The palette components laid out in AoSoA format.
    pub(crate) data: Vec<[f32x8; 4]>,
}

impl NearestNeighborColorMap {
    /// Create a new [`NearestNeighborColorMap`] from colors given as components.
    #[must_use]
    pub fn from_components(components: &[[f32; 4]]) -> Self {
        let data = components
            .chunks(8)
            .map(|chunk| {
                let mut arr = [[FAR; 8]; 4];
                for (i, color) in chunk.iter().enumerate() {
                    for (arr, &c) in arr.iter_mut().zip(color) {
                        arr[i] = c;
                    }
                }
                arr.map(f32x8::new)
            })
            .collect();

        Self { len: components.len(), data }
    }

    /// Create a new [`NearestNeighborColorMap`] for a [`Palette`] using the given [`DistanceMode`].
    #[must_use]
    pub fn new(palette: &Palette, mode: DistanceMode) -> Self {
        let components = palette
            .iter()
            .map(|entry| mode.entry_components(entry))
            .collect::<Vec<_>>();

        Self::from_components(&components)
    }

    /// Returns the number of palette colors.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether there are no palette colors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the index of the nearest palette color to `color`.
    ///
    /// `color` must be given as components in the same mode the map was created with.
    #[inline]
    pub fn nearest(&self, color: [f32; 4]) -> usize {
        simd_argmin_min_distance(&self.data, color).0
    }
}

/// Compute the palette index of, and the distance to, the nearest palette color to `color`.
///
/// A later palette color only replaces the current best on a strictly smaller distance.
#[inline]
pub(crate) fn simd_argmin_min_distance(data: &[[f32x8; 4]], color: [f32; 4]) -> (usize, f32) {
    let incr = u32x8::ONE;
    let mut cur_chunk = u32x8::ZERO;
    let mut min_chunk = cur_chunk;
    let mut min_distance = f32x8::splat(f32::INFINITY);

    let [c0, c1, c2, alpha] = color.map(f32x8::splat);

    for &[p0, p1, p2, palpha] in data {
        let da = alpha - palpha;
        let penalty = |c: f32x8, p: f32x8| {
            let d = c - p;
            let e = d - da;
            (d * d).max(e * e)
        };
        let distance = penalty(c0, p0) + penalty(c1, p1) + penalty(c2, p2);

        let mask: u32x8 = bytemuck::cast(distance.simd_lt(min_distance));
        min_chunk = mask.blend(cur_chunk, min_chunk);
        min_distance = min_distance.fast_min(distance);
        cur_chunk += incr;
    }

    let min_chunk = min_chunk.as_array();
    let mut min_index = usize::MAX;
    let mut min_dist = f32::INFINITY;
    #[allow(clippy::float_cmp)]
    for (lane, dist) in min_distance.to_array().into_iter().enumerate() {
        let index = min_chunk[lane] as usize * 8 + lane;
        if dist < min_dist || (dist == min_dist && index < min_index) {
            min_dist = dist;
            min_index = index;
        }
    }

    (min_index, min_dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sample, color_map::distance, tests::*};

    fn scalar_argmin_min_distance(palette: &[[f32; 4]], color: [f32; 4]) -> (usize, f32) {
        let mut min_index = 0;
        let mut min_dist = f32::INFINITY;
        for (i, &entry) in palette.iter().enumerate() {
            let dist = distance(color, entry);
            if dist < min_dist {
                min_dist = dist;
                min_index = i;
            }
        }
        (min_index, min_dist)
    }

    #[test]
    fn naive_nearest_neighbor_oracle() {
        // use a non-multiple of 8 to test remainder handling
        let palette = test_palette(61);
        for mode in [DistanceMode::Rgba, DistanceMode::Lab] {
            let components = palette
                .iter()
                .map(|entry| mode.entry_components(entry))
                .collect::<Vec<_>>();

            let nearest = NearestNeighborColorMap::new(&palette, mode);
            assert_eq!(nearest.len(), 61);

            for sample in test_samples() {
                let color = mode.components(sample.to_f32());
                let (expected_index, expected) = scalar_argmin_min_distance(&components, color);
                let (index, actual) = simd_argmin_min_distance(&nearest.data, color);

                #[allow(clippy::float_cmp)]
                {
                    assert_eq!(expected, actual);
                    assert_eq!(expected, distance(color, components[index]));
                }
                assert_eq!(expected_index, index);
                assert_eq!(nearest.nearest(color), index);
            }
        }
    }

    #[test]
    fn ties_resolve_to_first() {
        let mut colors = vec![[50.0, 50.0, 50.0, 0.0]; 20];
        colors[3] = [0.0, 0.0, 0.0, 0.0];
        colors[11] = [0.0, 0.0, 0.0, 0.0];
        colors[19] = [0.0, 0.0, 0.0, 0.0];
        let nearest = NearestNeighborColorMap::from_components(&colors);
        assert_eq!(nearest.nearest([1.0, 1.0, 1.0, 0.0]), 3);
        assert_eq!(nearest.nearest([50.0, 50.0, 50.0, 0.0]), 0);

        // equidistant colors in different lanes of the same chunk
        let colors = [[0.0, 0.0, 0.0, 0.0], [10.0, 0.0, 0.0, 0.0], [20.0, 0.0, 0.0, 0.0]];
        let nearest = NearestNeighborColorMap::from_components(&colors);
        assert_eq!(nearest.nearest([15.0, 0.0, 0.0, 0.0]), 1);
        assert_eq!(nearest.nearest([5.0, 0.0, 0.0, 0.0]), 0);
    }

    #[test]
    fn padding_never_selected() {
        let palette = Palette::new([Sample::opaque(255, 255, 255)]).unwrap();
        let nearest = NearestNeighborColorMap::new(&palette, DistanceMode::Rgba);
        assert_eq!(nearest.nearest([0.0, 0.0, 0.0, 127.0]), 0);
        assert_eq!(nearest.nearest([-300.0, -300.0, -300.0, 300.0]), 0);
    }
}
