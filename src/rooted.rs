// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Polynomials written as a product of roots, `(z - r₀)(z - r₁)...`.
//! This is the form the user hands us, and the form used to decide
//! which root a Newton iteration landed on.

use std::fmt;

use itertools::Itertools;

use crate::complex::Complex;
use crate::errors::{Error, Result};
use crate::polynomial::ComplexPolynomial;

/// An immutable polynomial in product-of-roots form.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexRootedPolynomial {
    roots: Vec<Complex>,
}

impl ComplexRootedPolynomial {
    /// Requires at least one root.
    pub fn new(roots: Vec<Complex>) -> Result<Self> {
        if roots.is_empty() {
            return Err(Error::NoRoots);
        }
        Ok(ComplexRootedPolynomial { roots })
    }

    /// The roots, in the order they were given.
    pub fn roots(&self) -> &[Complex] {
        &self.roots
    }

    /// Evaluates the product of `(z - root)` at `z`.
    pub fn apply(&self, z: Complex) -> Complex {
        self.roots
            .iter()
            .fold(Complex::ONE, |acc, root| acc * (z - *root))
    }

    /// Multiplies the factors out into coefficient form.
    pub fn to_complex_polynomial(&self) -> ComplexPolynomial {
        self.roots
            .iter()
            .fold(ComplexPolynomial::constant(Complex::ONE), |acc, root| {
                acc.multiply(&ComplexPolynomial::linear_factor(*root))
            })
    }

    /// The index of the root nearest to `z`, or `None` when even the
    /// nearest one is further away than `threshold`.  On a tie the
    /// root that comes first wins.
    pub fn index_of_closest_root_for(&self, z: Complex, threshold: f64) -> Option<usize> {
        let (index, distance) = self
            .roots
            .iter()
            .map(|root| z.distance(*root))
            .enumerate()
            .fold((0, std::f64::INFINITY), |best, (i, d)| {
                if d < best.1 {
                    (i, d)
                } else {
                    best
                }
            });
        if distance > threshold {
            None
        } else {
            Some(index)
        }
    }
}

impl fmt::Display for ComplexRootedPolynomial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let factors = self
            .roots
            .iter()
            .map(|root| {
                let negated = (-*root).to_string();
                match negated.strip_prefix('-') {
                    Some(rest) => format!("(z - {})", rest),
                    None => format!("(z + {})", negated),
                }
            })
            .join("");
        f.write_str(&factors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn rooted(roots: &[&str]) -> ComplexRootedPolynomial {
        ComplexRootedPolynomial::new(roots.iter().map(|s| Complex::parse(s).unwrap()).collect())
            .unwrap()
    }

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
    fn refuses_no_roots() {
        assert!(ComplexRootedPolynomial::new(vec![]).is_err());
    }

    #[test]
    fn applies() {
        assert_eq!(rooted(&["1", "-1", "i", "-i"]).apply(Complex::ZERO), Complex::ONE_NEG);
        assert_eq!(
            rooted(&["1", "-1", "2+i", "-2-i"]).apply(Complex::new(1.0, -1.0)),
            Complex::new(-9.0, 12.0)
        );
    }

    #[test]
    fn closest_root_within_threshold() {
        let crp = rooted(&["2+2i", "-2+2i", "-2-2i", "1+i"]);
        assert_eq!(crp.index_of_closest_root_for(Complex::ZERO, 3.0), Some(3));
    }

    #[test]
    fn closest_root_ties_go_to_the_first() {
        let crp = rooted(&["1", "-1", "i", "-i"]);
        assert_eq!(crp.index_of_closest_root_for(Complex::ZERO, 1.0), Some(0));
    }

    #[test]
    fn closest_root_too_far_away() {
        let crp = rooted(&["1+i", "1-i", "-1+i", "-1-i"]);
        assert_eq!(crp.index_of_closest_root_for(Complex::IM, 0.5), None);
        assert_eq!(crp.index_of_closest_root_for(Complex::IM, 1.0), Some(0));
    }

    #[test]
    fn converts_to_coefficient_form() {
        let expected = ComplexPolynomial::new(vec![
            Complex::ONE_NEG,
            Complex::ZERO,
            Complex::ZERO,
            Complex::ZERO,
            Complex::ONE,
        ])
        .unwrap();
        assert_eq!(rooted(&["1", "-1", "i", "-i"]).to_complex_polynomial(), expected);
        assert_eq!(
            rooted(&["1", "-1", "2+i", "-2-i"]).to_complex_polynomial(),
            poly(&["3+4i", "0", "-4-4i", "0", "1"])
        );
    }

    #[test]
    fn both_forms_agree_everywhere() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let roots: Vec<Complex> = (0..rng.gen_range(1..7))
                .map(|_| Complex::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0)))
                .collect();
            let crp = ComplexRootedPolynomial::new(roots).unwrap();
            let cp = crp.to_complex_polynomial();
            assert_eq!(cp.order(), crp.roots().len());
            for _ in 0..20 {
                let z = Complex::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5));
                assert_eq!(cp.apply(z), crp.apply(z), "{} vs {} at {}", cp, crp, z);
            }
        }
    }

    #[test]
    fn prints_as_factors() {
        assert_eq!(
            rooted(&["1", "-1", "i", "-i"]).to_string(),
            "(z - 1)(z + 1)(z - i)(z + i)"
        );
        assert_eq!(
            rooted(&["1", "-1", "2+i", "-2-i"]).to_string(),
            "(z - 1)(z + 1)(z - 2 - i)(z + 2 + i)"
        );
    }
}
