// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Polynomials over the complex numbers in coefficient form,
//! `c₀ + c₁z + c₂z² + ...`.

use std::fmt;

use num::Zero;

use crate::complex::Complex;
use crate::errors::{Error, Result};

/// Either part of a coefficient smaller than this does not count when
/// deciding whether the coefficient needs parentheses.
const BRACKET_LIMIT: f64 = 1e-3;

/// An immutable complex polynomial.  Index `i` of the coefficient list
/// belongs to `zⁱ`.  Vanishing high-degree coefficients are dropped at
/// construction, but the constant term always survives, so a
/// polynomial is never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexPolynomial {
    coefficients: Vec<Complex>,
}

impl ComplexPolynomial {
    /// Builds a polynomial from its coefficients, lowest degree first.
    pub fn new(coefficients: Vec<Complex>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(Error::NoCoefficients);
        }
        Ok(ComplexPolynomial::canonical(coefficients))
    }

    /// The polynomial `0`.
    pub fn zero() -> Self {
        ComplexPolynomial::constant(Complex::ZERO)
    }

    /// The constant polynomial `value`.
    pub fn constant(value: Complex) -> Self {
        ComplexPolynomial {
            coefficients: vec![value],
        }
    }

    /// The monic linear factor `z - root`.
    pub fn linear_factor(root: Complex) -> Self {
        ComplexPolynomial {
            coefficients: vec![-root, Complex::ONE],
        }
    }

    // Callers guarantee at least one coefficient.
    fn canonical(mut coefficients: Vec<Complex>) -> Self {
        while coefficients.len() > 1 && coefficients.last().map_or(false, Zero::is_zero) {
            coefficients.pop();
        }
        ComplexPolynomial { coefficients }
    }

    /// The coefficients, lowest degree first.
    pub fn coefficients(&self) -> &[Complex] {
        &self.coefficients
    }

    /// The highest degree with a non-zero coefficient (zero for constants).
    pub fn order(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// The product of two polynomials, by convolving their coefficients.
    pub fn multiply(&self, other: &ComplexPolynomial) -> ComplexPolynomial {
        let mut product = vec![Complex::ZERO; self.order() + other.order() + 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in other.coefficients.iter().enumerate() {
                product[i + j] = product[i + j] + *a * *b;
            }
        }
        ComplexPolynomial::canonical(product)
    }

    /// The first derivative.  Constants derive to the zero polynomial.
    pub fn derive(&self) -> ComplexPolynomial {
        if self.coefficients.len() == 1 {
            return ComplexPolynomial::zero();
        }
        let derived = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(degree, c)| *c * Complex::new(degree as f64, 0.0))
            .collect();
        ComplexPolynomial::canonical(derived)
    }

    /// Evaluates the polynomial at `z` (Horner's scheme).
    pub fn apply(&self, z: Complex) -> Complex {
        self.coefficients
            .iter()
            .rev()
            .fold(Complex::ZERO, |acc, c| acc * z + *c)
    }
}

/// One monomial, with a leading `-` if the coefficient reads as negative.
fn term(coefficient: Complex, degree: usize) -> String {
    if degree == 0 {
        return coefficient.to_string();
    }
    let factor = if coefficient == Complex::ONE {
        String::new()
    } else if coefficient == Complex::ONE_NEG {
        "-".to_string()
    } else {
        bracketed(coefficient)
    };
    match degree {
        1 => format!("{}z", factor),
        _ => format!("{}z^{}", factor, degree),
    }
}

fn bracketed(coefficient: Complex) -> String {
    if coefficient.re().abs() >= BRACKET_LIMIT && coefficient.im().abs() >= BRACKET_LIMIT {
        if coefficient.re() < 0.0 && coefficient.im() < 0.0 {
            format!("-({})", -coefficient)
        } else {
            format!("({})", coefficient)
        }
    } else {
        coefficient.to_string()
    }
}

impl fmt::Display for ComplexPolynomial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let terms: Vec<String> = self
            .coefficients
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, c)| !c.is_zero())
            .map(|(degree, c)| term(*c, degree))
            .collect();

        if terms.is_empty() {
            return f.write_str("0");
        }

        for (i, t) in terms.iter().enumerate() {
            let (negative, body) = match t.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, t.as_str()),
            };
            match (i, negative) {
                (0, true) => write!(f, "-{}", body)?,
                (0, false) => f.write_str(body)?,
                (_, true) => write!(f, " - {}", body)?,
                (_, false) => write!(f, " + {}", body)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(coefficients: &[&str]) -> ComplexPolynomial {
        ComplexPolynomial::new(
            coefficients
                .iter()
                .map(|s| Complex::parse(s).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn refuses_no_coefficients() {
        assert!(ComplexPolynomial::new(vec![]).is_err());
    }

    #[test]
    fn order_ignores_vanishing_high_terms() {
        assert_eq!(poly(&["1", "2", "-3i", "-4i"]).order(), 3);
        assert_eq!(poly(&["1"]).order(), 0);
        assert_eq!(poly(&["5", "2", "0", "0"]).order(), 1);
        assert_eq!(poly(&["0", "0", "0"]).order(), 0);
    }

    #[test]
    fn derives() {
        assert_eq!(
            poly(&["1", "5", "2", "7+2i"]).derive(),
            poly(&["5", "4", "21+6i"])
        );
    }

    #[test]
    fn constants_derive_to_zero_and_stay_there() {
        let derived = poly(&["1"]).derive();
        assert_eq!(derived, ComplexPolynomial::zero());
        assert_eq!(derived.derive(), ComplexPolynomial::zero());
        assert_eq!(derived.order(), 0);
    }

    #[test]
    fn multiplies() {
        let product = poly(&["1", "2", "4"]).multiply(&poly(&["0", "-1", "1"]));
        assert_eq!(product, poly(&["0", "-1", "-1", "-2", "4"]));
        assert_eq!(product.order(), 4);
    }

    #[test]
    fn applies() {
        let p = poly(&["0", "-1", "2-3i", "0", "4+i"]);
        assert_eq!(p.apply(Complex::ZERO), Complex::ZERO);
        assert_eq!(p.apply(Complex::new(-2.0, 5.0)), Complex::new(-776.0, 3419.0));
    }

    #[test]
    fn horner_agrees_with_powers() {
        let p = poly(&["1-i", "2", "-3i", "0.5+0.25i"]);
        let z = Complex::new(0.7, -1.3);
        let by_powers = p
            .coefficients()
            .iter()
            .enumerate()
            .fold(Complex::ZERO, |acc, (i, c)| {
                acc + *c * z.power(i as i32).unwrap()
            });
        assert_eq!(p.apply(z), by_powers);
    }

    #[test]
    fn prints_highest_degree_first() {
        assert_eq!(poly(&["5", "2", "1"]).to_string(), "z^2 + 2z + 5");
        assert_eq!(poly(&["5", "-2i", "1-i"]).to_string(), "(1 - i)z^2 - 2iz + 5");
        assert_eq!(
            poly(&["-i", "0", "-2", "-1-i", "1+i"]).to_string(),
            "(1 + i)z^4 - (1 + i)z^3 - 2z^2 - i"
        );
        assert_eq!(
            poly(&["0", "1", "i", "-1", "-i"]).to_string(),
            "-iz^4 - z^3 + iz^2 + z"
        );
        assert_eq!(ComplexPolynomial::zero().to_string(), "0");
    }
}
