//! Conversion of RGBA samples to CIE Lab.
//!
//! The conversion assumes sRGB input, the D65 illuminant, and the 2° standard observer.
//! Alpha is passed through unchanged apart from being scaled to `0.0..=1.0`, so `0.0` is still
//! opaque and `1.0` is still transparent.

use crate::Sample;
use palette::{Lab, LinSrgb, Srgb, Xyz, white_point::D65};

pub use palette::Laba;

// http://www.easyrgb.com/en/math.php

/// The reference white of D65 with a 2° observer.
const REFERENCE_WHITE: [f32; 3] = [0.95047, 1.0, 1.08883];

/// Below this value the Lab transfer function is linear instead of a cube root.
const LAB_EPSILON: f32 = 0.008856;

/// Slope of the linear section of the Lab transfer function.
const LAB_SLOPE: f32 = 7.787;

/// Convert gamma encoded sRGB components in `0.0..=255.0` to CIE XYZ.
#[inline]
fn srgb_to_xyz(red: f32, green: f32, blue: f32) -> Xyz<D65, f32> {
    let linear: LinSrgb<f32> = Srgb::new(red / 255.0, green / 255.0, blue / 255.0).into_linear();
    let (r, g, b) = (linear.red, linear.green, linear.blue);

    Xyz::new(
        r * 0.4124 + g * 0.3576 + b * 0.1805,
        r * 0.2126 + g * 0.7152 + b * 0.0722,
        r * 0.0193 + g * 0.1192 + b * 0.9505,
    )
}

/// The CIE Lab transfer function.
#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        LAB_SLOPE * t + 16.0 / 116.0
    }
}

/// Convert CIE XYZ to CIE Lab.
#[inline]
fn xyz_to_lab(xyz: Xyz<D65, f32>) -> Lab<D65, f32> {
    let [xw, yw, zw] = REFERENCE_WHITE;
    let x = lab_f(xyz.x / xw);
    let y = lab_f(xyz.y / yw);
    let z = lab_f(xyz.z / zw);
    Lab::new(116.0 * y - 16.0, 500.0 * (x - y), 200.0 * (y - z))
}

/// Convert fractional `[red, green, blue, alpha]` components to CIE Lab.
///
/// The components do not need to be in range, which allows converting colors that carry
/// diffused dither error.
#[inline]
pub fn components_to_lab([red, green, blue, alpha]: [f32; 4]) -> Laba {
    let lab = xyz_to_lab(srgb_to_xyz(red, green, blue));
    Laba::new(
        lab.l,
        lab.a,
        lab.b,
        alpha / f32::from(Sample::ALPHA_TRANSPARENT),
    )
}

/// Convert a [`Sample`] to CIE Lab.
///
/// # Examples
///
/// ```
/// # use alphaquant::{Sample, color_space::rgba_to_lab};
/// let white = rgba_to_lab(Sample::opaque(255, 255, 255));
/// assert!((white.l - 100.0).abs() < 0.01);
/// assert_eq!(white.alpha, 0.0);
/// ```
#[inline]
pub fn rgba_to_lab(sample: Sample) -> Laba {
    components_to_lab(sample.to_f32())
}
