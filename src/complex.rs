// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An immutable complex number.  Every operation hands back a new
//! value; nothing is ever modified in place.
//!
//! The arithmetic is `num::Complex<f64>`'s.  What this wrapper adds is
//! approximate equality (see [`EQUALS_LIMIT`]), division, powers and
//! roots that refuse degenerate input instead of producing NaN, and the
//! literal syntax used at the console.

use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use num::{One, Zero};

use crate::errors::{Error, Result};

/// Two parts closer than this compare as equal.
pub const EQUALS_LIMIT: f64 = 1e-6;

/// Squared divisor magnitudes below this are treated as zero.
pub const ZERO_LIMIT: f64 = 1e-20;

/// An imaginary part this close to one prints as a bare `i`.
pub const IMAG_UNIT_LIMIT: f64 = 1e-20;

/// Decimal places used by `Display` when no precision is requested.
pub const DEFAULT_DECIMALS: usize = 3;

/// A complex number `re + im·i`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Complex(num::Complex<f64>);

impl Complex {
    /// `0`
    pub const ZERO: Complex = Complex::new(0.0, 0.0);
    /// `1`
    pub const ONE: Complex = Complex::new(1.0, 0.0);
    /// `-1`
    pub const ONE_NEG: Complex = Complex::new(-1.0, 0.0);
    /// `i`
    pub const IM: Complex = Complex::new(0.0, 1.0);
    /// `-i`
    pub const IM_NEG: Complex = Complex::new(0.0, -1.0);

    /// Builds a complex number out of its real and imaginary parts.
    pub const fn new(re: f64, im: f64) -> Self {
        Complex(num::Complex { re, im })
    }

    /// Builds a complex number out of its polar form.
    pub fn from_polar(magnitude: f64, angle: f64) -> Self {
        Complex(num::Complex::from_polar(&magnitude, &angle))
    }

    /// The real part.
    pub fn re(&self) -> f64 {
        self.0.re
    }

    /// The imaginary part.
    pub fn im(&self) -> f64 {
        self.0.im
    }

    /// The absolute value, `sqrt(re² + im²)`.
    pub fn modulus(&self) -> f64 {
        self.0.norm()
    }

    /// The angle of the polar form, in `(-π, π]`.
    pub fn arg(&self) -> f64 {
        self.0.arg()
    }

    /// The complex conjugate.
    pub fn conjugate(&self) -> Self {
        Complex(self.0.conj())
    }

    /// The distance between this point and `other` on the complex plane.
    pub fn distance(&self, other: Complex) -> f64 {
        (self.0 - other.0).norm()
    }

    /// Divides this number by `divisor`.  Fails rather than producing
    /// infinities when the divisor is (nearly) zero.
    pub fn divide(&self, divisor: Complex) -> Result<Complex> {
        if divisor.0.norm_sqr() < ZERO_LIMIT {
            return Err(Error::DivisionByZero { divisor });
        }
        Ok(Complex(self.0 / divisor.0))
    }

    /// Raises this number to the `n`th power through its polar form.
    pub fn power(&self, n: i32) -> Result<Complex> {
        if n < 0 {
            return Err(Error::NegativeExponent(n));
        }
        let magnitude = self.modulus().powi(n);
        Ok(Complex::from_polar(magnitude, f64::from(n) * self.arg()))
    }

    /// All `n` of the `n`th roots of this number, starting at the
    /// principal root and walking counter-clockwise.
    pub fn roots(&self, n: i32) -> Result<Vec<Complex>> {
        if n <= 0 {
            return Err(Error::InvalidRootDegree(n));
        }
        let n = f64::from(n);
        let magnitude = self.modulus().powf(1.0 / n);
        let angle = self.arg();
        Ok((0..n as usize)
            .map(|k| Complex::from_polar(magnitude, (angle + 2.0 * (k as f64) * PI) / n))
            .collect())
    }

    /// Read-only access to the underlying `num` value.
    pub fn as_num(&self) -> &num::Complex<f64> {
        &self.0
    }

    /// Parses text like `"3.51"`, `"-i"`, `"i2"`, `"2 - 3i"` or
    /// `"2,5+i"`.  Whitespace is ignored and a comma may stand in for
    /// the decimal point.  Exactly one `+` or `-` may separate two terms.
    pub fn parse(s: &str) -> Result<Complex> {
        if s.trim().is_empty() {
            return Err(Error::EmptyInput);
        }

        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        let separator = cleaned
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '+' || c == '-');

        match separator {
            Some((at, sign)) => {
                let first = parse_term(&cleaned[..at], s)?;
                let second = parse_term(&cleaned[at + 1..], s)?;
                Ok(if sign == '-' {
                    first - second
                } else {
                    first + second
                })
            }
            None => parse_term(&cleaned, s),
        }
    }

    /// Renders the number with at most `decimals` decimal places.
    /// Parts smaller than the last printed place are left out
    /// entirely, so `0.0001 + 2i` prints as `2i` at three places.
    pub fn to_string_with(&self, decimals: usize) -> String {
        let limit = 10f64.powi(-(decimals as i32));

        if self.im().abs() < limit {
            return format_part(self.re(), decimals);
        }
        if self.re().abs() < limit {
            return format_imaginary(self.im(), decimals);
        }
        if self.im() < 0.0 {
            format!(
                "{} - {}",
                format_part(self.re(), decimals),
                format_imaginary(-self.im(), decimals)
            )
        } else {
            format!(
                "{} + {}",
                format_part(self.re(), decimals),
                format_imaginary(self.im(), decimals)
            )
        }
    }
}

/// One term of a complex literal: `i`, `-i`, `2i`, `i2`, `+i2` or `3.5`.
fn parse_term(term: &str, original: &str) -> Result<Complex> {
    let format_error = || Error::Format(original.to_string());
    match term {
        "i" | "+i" => Ok(Complex::IM),
        "-i" => Ok(Complex::IM_NEG),
        t if t.starts_with('i') || t.ends_with('i') || t.starts_with("+i") || t.starts_with("-i") => {
            parse_number(&t.replacen('i', "", 1))
                .map(|im| Complex::new(0.0, im))
                .ok_or_else(format_error)
        }
        t => parse_number(t)
            .map(|re| Complex::new(re, 0.0))
            .ok_or_else(format_error),
    }
}

/// A plain decimal number.  `f64::from_str` alone would also take
/// words like `inf` and `nan`, which are not complex literals.
fn parse_number(s: &str) -> Option<f64> {
    let plain = s
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '+' || c == '-' || c == 'e' || c == 'E');
    if !plain {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_part(value: f64, decimals: usize) -> String {
    let mut text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}

fn format_imaginary(im: f64, decimals: usize) -> String {
    if (im.abs() - 1.0).abs() < IMAG_UNIT_LIMIT {
        let unit = if im < 0.0 { "-i" } else { "i" };
        unit.to_string()
    } else {
        format!("{}i", format_part(im, decimals))
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let decimals = f.precision().unwrap_or(DEFAULT_DECIMALS);
        f.write_str(&self.to_string_with(decimals))
    }
}

impl FromStr for Complex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Complex> {
        Complex::parse(s)
    }
}

impl From<num::Complex<f64>> for Complex {
    fn from(value: num::Complex<f64>) -> Self {
        Complex(value)
    }
}

impl From<Complex> for num::Complex<f64> {
    fn from(value: Complex) -> Self {
        value.0
    }
}

impl PartialEq for Complex {
    fn eq(&self, other: &Complex) -> bool {
        (self.re() - other.re()).abs() <= EQUALS_LIMIT
            && (self.im() - other.im()).abs() <= EQUALS_LIMIT
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, other: Complex) -> Complex {
        Complex(self.0 + other.0)
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, other: Complex) -> Complex {
        Complex(self.0 - other.0)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, other: Complex) -> Complex {
        Complex(self.0 * other.0)
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        Complex(-self.0)
    }
}

impl Zero for Complex {
    fn zero() -> Self {
        Complex::ZERO
    }

    fn is_zero(&self) -> bool {
        *self == Complex::ZERO
    }
}

impl One for Complex {
    fn one() -> Self {
        Complex::ONE
    }
}
