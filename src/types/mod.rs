mod bounded;
mod error;
mod image;
mod indexed_image;
mod palette;
mod sample;

pub use bounded::*;
pub use error::*;
pub use image::*;
pub use indexed_image::*;
pub use palette::*;
pub use sample::*;
