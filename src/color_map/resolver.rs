use super::{DistanceMode, LookupCache, LookupStats, NearestNeighborColorMap, cache_key};
use crate::{LOOKUP_CACHE_CAPACITY, Palette};
use core::num::NonZeroUsize;

/// Resolves colors with fractional components to the index of their nearest palette color.
///
/// Results are memoized in a [`LookupCache`] keyed by the floored color, so colors that only
/// differ in their fractional parts resolve to the same palette index.
///
/// # Examples
///
/// ```
/// # use alphaquant::{Error, Palette, Sample, color_map::{DistanceMode, Resolver}};
/// # fn main() -> Result<(), Error> {
/// let palette = Palette::new([Sample::opaque(0, 0, 0), Sample::opaque(255, 255, 255)])?;
/// let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
///
/// assert_eq!(resolver.resolve([200.5, 190.0, 230.25, 0.0]), 1);
/// assert_eq!(resolver.resolve([200.9, 190.1, 230.0, 0.0]), 1);
/// assert_eq!(resolver.stats().hit_rate(), Some(0.5));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Resolver {
    /// The palette lookup structure.
    color_map: NearestNeighborColorMap,
    /// The distance mode used by `color_map`.
    mode: DistanceMode,
    /// Previously resolved colors.
    cache: LookupCache,
    /// Lookup counts since creation or the last reset.
    stats: LookupStats,
}

impl Resolver {
    /// Create a new [`Resolver`] for `palette` with the default cache capacity.
    #[must_use]
    pub fn new(palette: &Palette, mode: DistanceMode) -> Self {
        Self::with_capacity(palette, mode, LOOKUP_CACHE_CAPACITY)
    }

    /// Create a new [`Resolver`] for `palette` caching at most `capacity` colors.
    #[must_use]
    pub fn with_capacity(palette: &Palette, mode: DistanceMode, capacity: NonZeroUsize) -> Self {
        Self {
            color_map: NearestNeighborColorMap::new(palette, mode),
            mode,
            cache: LookupCache::new(capacity),
            stats: LookupStats::default(),
        }
    }

    /// Returns the [`DistanceMode`] of this resolver.
    #[inline]
    pub fn mode(&self) -> DistanceMode {
        self.mode
    }

    /// Returns the lookup counts since creation or the last [`reset`](Resolver::reset).
    #[inline]
    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    /// Clear the cache and the lookup counts.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.stats = LookupStats::default();
    }

    /// Returns the palette index of the nearest palette color to `color`, given as fractional
    /// `[red, green, blue, alpha]` components.
    pub fn resolve(&mut self, color: [f32; 4]) -> usize {
        let key = cache_key(color);
        self.stats.lookups += 1;
        if let Some(index) = self.cache.get(&key) {
            self.stats.hits += 1;
            index
        } else {
            let index = self.color_map.nearest(self.mode.components(color));
            self.cache.insert(key, index);
            index
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sample, tests::*};

    #[test]
    fn cached_result_matches_scan() {
        let palette = test_palette(37);
        let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
        let samples = test_samples();
        let first = samples
            .iter()
            .map(|sample| resolver.resolve(sample.to_f32()))
            .collect::<Vec<_>>();
        let lookups = resolver.stats().lookups;

        let second = samples
            .iter()
            .map(|sample| resolver.resolve(sample.to_f32()))
            .collect::<Vec<_>>();

        assert_eq!(first, second);
        assert_eq!(resolver.stats().lookups, 2 * lookups);
        assert!(resolver.stats().hits >= lookups);
    }

    #[test]
    fn distinct_colors_never_hit() {
        let palette = test_palette(16);
        let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
        for i in 0..100u8 {
            resolver.resolve(Sample::opaque(i, 255 - i, 7).to_f32());
        }
        assert_eq!(resolver.stats(), LookupStats { hits: 0, lookups: 100 });
        assert_eq!(resolver.stats().hit_rate(), Some(0.0));
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn repeated_color_hits() {
        let palette = test_palette(16);
        let mut resolver = Resolver::new(&palette, DistanceMode::Lab);
        let n = 50;
        for _ in 0..n {
            resolver.resolve([12.5, 80.0, 3.0, 0.0]);
        }
        assert_eq!(resolver.stats().hit_rate(), Some((n - 1) as f32 / n as f32));
    }

    #[test]
    fn evicted_colors_are_rescanned() {
        let palette = test_palette(16);
        let mut resolver =
            Resolver::with_capacity(&palette, DistanceMode::Rgba, NonZeroUsize::new(2).unwrap());
        resolver.resolve([1.0, 0.0, 0.0, 0.0]);
        resolver.resolve([2.0, 0.0, 0.0, 0.0]);
        resolver.resolve([3.0, 0.0, 0.0, 0.0]);
        resolver.resolve([1.0, 0.0, 0.0, 0.0]);
        assert_eq!(resolver.stats().hits, 0);
        resolver.resolve([3.0, 0.0, 0.0, 0.0]);
        assert_eq!(resolver.stats().hits, 1);
    }

    #[test]
    fn reset_clears_stats() {
        let palette = test_palette(4);
        let mut resolver = Resolver::new(&palette, DistanceMode::Rgba);
        resolver.resolve([0.0; 4]);
        resolver.resolve([0.0; 4]);
        resolver.reset();
        assert_eq!(resolver.stats().hit_rate(), None);
        resolver.resolve([0.0; 4]);
        assert_eq!(resolver.stats(), LookupStats { hits: 0, lookups: 1 });
    }

    #[test]
    fn modes_agree_on_exact_colors() {
        let palette = test_palette(32);
        for mode in [DistanceMode::Rgba, DistanceMode::Lab] {
            let mut resolver = Resolver::new(&palette, mode);
            for (i, entry) in palette.iter().enumerate() {
                let index = resolver.resolve(entry.rgba.to_f32());
                assert_eq!(palette[index].rgba, palette[i].rgba);
            }
        }
    }
}
