//! Alpha-aware palette quantization and Floyd–Steinberg dithering.
//!
//! `alphaquant` reduces a full color RGBA image to a small palette and renders the image with that
//! palette using error diffusion dithering. Alpha is treated as a fourth color dimension
//! throughout: it takes part in palette generation, it penalizes nearest color matches, and its
//! error is diffused like any other channel.
//!
//! Alpha uses a 7-bit convention where `0` is fully opaque and `127` is fully transparent. Samples
//! with an alpha above [`Sample::TRANSPARENCY_THRESHOLD`] are treated as fully transparent black.
//! See [`Sample`] for converting from and to the usual 8-bit straight alpha.
//!
//! # Overview
//!
//! - [`quantize`] generates a palette of at most a given number of colors from an image by
//!   pruning a frequency weighted tree over the bit planes of each channel
//!   (see the [`quantize`](mod@quantize) module).
//! - [`convert_to_indexed`] dithers an image to a palette, producing an [`IndexedImage`] for
//!   palettes of at most [`MAX_INDEXED_COLORS`] colors (see [`Converter`] for more options).
//! - The [`color_map`] module contains the nearest color search and its lookup cache.
//! - The [`color_space`] module converts samples to CIE Lab for the
//!   [`Lab`](color_map::DistanceMode::Lab) distance mode.
//!
//! # Examples
//!
//! ```
//! # use alphaquant::{Converter, Error, ImageBuf, Palette, Sample, quantize};
//! # fn main() -> Result<(), Error> {
//! let image = ImageBuf::from_fn(32, 32, |x, y| Sample::new((x * 8) as u8, (y * 8) as u8, 96, (x + y) as u8))
//!     .ok_or(Error::InvalidDimensions { width: 32, height: 32 })?;
//!
//! let palette = Palette::new(quantize(&image, 16, 5)?)?;
//! let mut converter = Converter::new();
//! let indexed = converter.convert(&image, &palette)?.into_indexed().ok_or(Error::InvalidPalette)?;
//!
//! assert!(indexed.palette().len() <= 16);
//! assert_eq!(indexed.dimensions(), (32, 32));
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `threads`: adds parallel tree building via [`rayon`](https://docs.rs/rayon), see
//!   `Quantizer::quantize_par`.
//! - `image`: adds conversions between the image types of this crate and
//!   [`image::RgbaImage`](https://docs.rs/image/latest/image/type.RgbaImage.html).
//!
//! Both features are enabled by default.

#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports,
    clippy::doc_markdown
)]

extern crate alloc;

mod api;
mod types;

pub mod color_map;
pub mod color_space;
pub mod dither;
pub mod quantize;

pub use api::*;
pub use quantize::quantize;
pub use types::*;

use core::num::NonZeroUsize;

/// The maximum number of palette colors an [`IndexedImage`] can have.
pub const MAX_INDEXED_COLORS: usize = u8::MAX as usize + 1;

/// The default capacity of the lookup cache used during a conversion.
pub const LOOKUP_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(4096).unwrap();

/// The number of pruning passes, each merging leaves below an ancestor one level higher.
pub(crate) const MAX_PARENTAGE: u8 = 8;
