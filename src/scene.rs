// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! What the ray tracer looks at: objects that can be hit by a ray,
//! the lights that illuminate them, and the record of a single hit.

use std::fmt::Debug;

use crate::errors::{Error, Result};
use crate::vector::{Ray, Vector3};

/// How a surface responds to light, per colour channel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    /// Diffuse coefficients, red, green and blue.
    pub diffuse: [f64; 3],
    /// Reflective (specular) coefficients, red, green and blue.
    pub reflective: [f64; 3],
    /// Specular exponent; larger is shinier.
    pub shininess: f64,
}

/// Everything the shader needs to know about one ray hitting one
/// object.  Built fresh for every cast and thrown away after shading.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayIntersection {
    /// Where the ray hit.
    pub point: Vector3,
    /// How far along the ray the hit is.
    pub distance: f64,
    /// True when the ray arrived from outside the object.
    pub outer: bool,
    /// Unit surface normal at the hit point.
    pub normal: Vector3,
    /// The surface material at the hit point.
    pub material: Material,
}

/// Anything a ray can hit.
pub trait SceneObject: Debug + Send + Sync {
    /// The nearest hit in front of the ray's start, if there is one.
    fn intersect(&self, ray: &Ray) -> Option<RayIntersection>;
}

/// A sphere with a single material.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    center: Vector3,
    radius: f64,
    material: Material,
}

impl Sphere {
    /// Radius must be positive.
    pub fn new(center: Vector3, radius: f64, material: Material) -> Result<Self> {
        if !(radius > 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "sphere radius must be positive, got {}",
                radius
            )));
        }
        Ok(Sphere {
            center,
            radius,
            material,
        })
    }
}

impl SceneObject for Sphere {
    fn intersect(&self, ray: &Ray) -> Option<RayIntersection> {
        let start_to_center = ray.start - self.center;

        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * ray.direction.dot(start_to_center);
        let c = start_to_center.dot(start_to_center) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let near = (-b - root) / (2.0 * a);
        let far = (-b + root) / (2.0 * a);

        // Both hits behind the start: the sphere is behind us.
        if far < 0.0 {
            return None;
        }

        // A negative near hit means we start inside the sphere.
        let (distance, outer) = if near >= 0.0 {
            (near, true)
        } else {
            (far, false)
        };

        let point = ray.at(distance);
        Some(RayIntersection {
            point,
            distance,
            outer,
            normal: (point - self.center) * (1.0 / self.radius),
            material: self.material,
        })
    }
}

/// A point light with an RGB intensity in `0..=255` per channel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightSource {
    /// Where the light is.
    pub position: Vector3,
    /// Red, green and blue intensity.
    pub intensity: [f64; 3],
}

impl LightSource {
    /// A light at `position`.
    pub fn new(position: Vector3, red: f64, green: f64, blue: f64) -> Self {
        LightSource {
            position,
            intensity: [red, green, blue],
        }
    }
}

/// The objects and lights of one picture.  Read-only while a frame
/// is being rendered.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<Box<dyn SceneObject>>,
    lights: Vec<LightSource>,
}

impl Scene {
    /// An empty scene.
    pub fn new() -> Self {
        Scene::default()
    }

    /// Adds an object.
    pub fn add_object<O: SceneObject + 'static>(&mut self, object: O) {
        self.objects.push(Box::new(object));
    }

    /// Adds a light.
    pub fn add_light(&mut self, light: LightSource) {
        self.lights.push(light);
    }

    /// All objects.
    pub fn objects(&self) -> &[Box<dyn SceneObject>] {
        &self.objects
    }

    /// All lights.
    pub fn lights(&self) -> &[LightSource] {
        &self.lights
    }

    /// The nearest hit along `ray` among all objects.  Earlier objects
    /// win ties.
    pub fn closest_intersection(&self, ray: &Ray) -> Option<RayIntersection> {
        self.objects
            .iter()
            .filter_map(|object| object.intersect(ray))
            .fold(None, |closest: Option<RayIntersection>, hit| match closest {
                Some(best) if best.distance <= hit.distance => Some(best),
                _ => Some(hit),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATTE: Material = Material {
        diffuse: [1.0, 1.0, 1.0],
        reflective: [0.5, 0.5, 0.5],
        shininess: 10.0,
    };

    fn along_z(start: f64) -> Ray {
        Ray::from_points(Vector3::new(0.0, 0.0, start), Vector3::new(0.0, 0.0, start + 1.0))
            .unwrap()
    }

    #[test]
    fn refuses_flat_spheres() {
        assert!(Sphere::new(Vector3::default(), 0.0, MATTE).is_err());
        assert!(Sphere::new(Vector3::default(), -1.0, MATTE).is_err());
    }

    #[test]
    fn hits_the_near_side_from_outside() {
        let sphere = Sphere::new(Vector3::default(), 1.0, MATTE).unwrap();
        let hit = sphere.intersect(&along_z(-5.0)).unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-12);
        assert!(hit.outer);
        assert_eq!(hit.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(hit.material, MATTE);
    }

    #[test]
    fn hits_the_far_side_from_inside() {
        let sphere = Sphere::new(Vector3::default(), 2.0, MATTE).unwrap();
        let hit = sphere.intersect(&along_z(0.0)).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-12);
        assert!(!hit.outer);
    }

    #[test]
    fn misses() {
        let sphere = Sphere::new(Vector3::new(5.0, 0.0, 0.0), 1.0, MATTE).unwrap();
        assert!(sphere.intersect(&along_z(-5.0)).is_none());

        let behind = Sphere::new(Vector3::new(0.0, 0.0, -10.0), 1.0, MATTE).unwrap();
        assert!(behind.intersect(&along_z(0.0)).is_none());
    }

    #[test]
    fn scene_keeps_the_closest_hit() {
        let mut scene = Scene::new();
        scene.add_object(Sphere::new(Vector3::new(0.0, 0.0, 10.0), 1.0, MATTE).unwrap());
        scene.add_object(Sphere::new(Vector3::new(0.0, 0.0, 4.0), 1.0, MATTE).unwrap());
        let hit = scene.closest_intersection(&along_z(0.0)).unwrap();
        assert!((hit.distance - 3.0).abs() < 1e-12);
        assert!(Scene::new().closest_intersection(&along_z(0.0)).is_none());
    }
}
