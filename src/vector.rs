// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Three dimensional points and vectors, and rays built out of them.

use std::ops::{Add, Mul, Neg, Sub};

use crate::errors::{Error, Result};

/// Vectors shorter than this cannot be normalized.
const DEGENERATE_LENGTH: f64 = 1e-12;

/// A point or direction in 3D space.  Immutable; every operation
/// returns a fresh vector.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3 {
    /// x component
    pub x: f64,
    /// y component
    pub y: f64,
    /// z component
    pub z: f64,
}

impl Vector3 {
    /// Builds a vector out of its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }

    /// Scalar product.
    pub fn dot(&self, other: Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Vector product, `self × other`.
    pub fn cross(&self, other: Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    /// A unit vector pointing the same way.  Zero-length vectors have
    /// no direction and are refused.
    pub fn normalize(&self) -> Result<Vector3> {
        let norm = self.norm();
        if !(norm > DEGENERATE_LENGTH) {
            return Err(Error::DegenerateVector);
        }
        Ok(*self * (1.0 / norm))
    }

    /// Mirrors this vector about `normal`, which must be a unit vector.
    pub fn reflect(&self, normal: Vector3) -> Vector3 {
        normal * (2.0 * self.dot(normal)) - *self
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, s: f64) -> Vector3 {
        Vector3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

/// A half-line with a unit-length direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Where the ray starts.
    pub start: Vector3,
    /// Unit direction of travel.
    pub direction: Vector3,
}

impl Ray {
    /// The ray that leaves `start` and passes through `through`.
    pub fn from_points(start: Vector3, through: Vector3) -> Result<Ray> {
        Ok(Ray {
            start,
            direction: (through - start).normalize()?,
        })
    }

    /// The point `distance` units along the ray.
    pub fn at(&self, distance: f64) -> Vector3 {
        self.start + self.direction * distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(x.dot(y), 0.0);
        assert_eq!(Vector3::new(1.0, 2.0, 3.0).dot(Vector3::new(4.0, -5.0, 6.0)), 12.0);
    }

    #[test]
    fn normalizes() {
        let n = Vector3::new(3.0, 0.0, 4.0).normalize().unwrap();
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert!((n.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_has_no_direction() {
        match Vector3::default().normalize() {
            Err(Error::DegenerateVector) => {}
            other => panic!("expected a degenerate vector, got {:?}", other),
        }
    }

    #[test]
    fn reflects_about_a_normal() {
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let incoming = Vector3::new(1.0, 0.0, 1.0);
        assert_eq!(incoming.reflect(normal), Vector3::new(-1.0, 0.0, 1.0));
    }

    #[test]
    fn rays_between_points() {
        let ray = Ray::from_points(Vector3::default(), Vector3::new(0.0, 0.0, 5.0)).unwrap();
        assert_eq!(ray.direction, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(ray.at(2.0), Vector3::new(0.0, 0.0, 2.0));
        assert!(Ray::from_points(Vector3::default(), Vector3::default()).is_err());
    }
}
