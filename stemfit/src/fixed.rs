//! Fixed point helpers.
//!
//! Scale factors are 16.16 values and scaled coordinates are 26.6 pixel
//! units, matching the conventions of FreeType's `MulFix` and `DivFix`.

use skrifa::raw::types::Fixed;

/// Multiplies a value by a 16.16 factor with rounding.
pub fn fixed_mul(a: i32, b: i32) -> i32 {
    (Fixed::from_bits(a) * Fixed::from_bits(b)).to_bits()
}

/// Divides two values, producing a 16.16 result with rounding.
pub fn fixed_div(a: i32, b: i32) -> i32 {
    (Fixed::from_bits(a) / Fixed::from_bits(b)).to_bits()
}

/// Computes `a * b / c` with a 64-bit intermediate, rounding to nearest.
///
/// As with FreeType's `FT_MulDiv`, a zero divisor saturates to the maximum
/// magnitude with the sign of the product. Callers that can produce an empty
/// span check for it first.
pub fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    let negative = (a < 0) ^ (b < 0) ^ (c < 0);
    let a = (a as i64).abs();
    let b = (b as i64).abs();
    let c = (c as i64).abs();
    let result = if c == 0 {
        i32::MAX as i64
    } else {
        ((a * b + (c >> 1)) / c).min(i32::MAX as i64)
    };
    let result = result as i32;
    if negative {
        -result
    } else {
        result
    }
}

/// Fits a scaled height to the pixel grid.
///
/// Rounds up to the next pixel when the fractional part lies in the top
/// two thirds of a pixel and down otherwise.
pub fn fit_height(scaled: i32) -> i32 {
    (scaled + 43) & !63
}

/// Value in font units for a constant defined against a 2048 unit em.
pub(crate) fn derived_constant(units_per_em: i32, value: i32) -> i32 {
    value * units_per_em / 2048
}
