mod converter;

pub use converter::{Converter, convert_to_indexed};
