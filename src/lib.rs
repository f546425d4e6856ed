#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fractray: Newton fractals and ray casting, rendered in parallel
//!
//! Both renderers answer the same kind of request: draw a picture of
//! this many pixels, of this region, and tell me when it's done.  The
//! work is the same shape too.  Every pixel is an independent and
//! rather expensive little computation, so the raster is cut into
//! bands of rows and the bands are spread over a pool of threads.
//!
//! The Newton fractal starts Newton's method from every point of a
//! region of the complex plane, using a polynomial described by its
//! roots, and colours each point by the root it ends up at.  Points
//! that wander off, or that stall on a flat spot, get colour zero.
//!
//! The ray caster shoots one ray from the eye through every pixel of a
//! screen placed in a scene of spheres and point lights, and shades
//! the first thing each ray hits.

pub mod complex;
pub mod console;
pub mod engine;
pub mod errors;
pub mod newton;
pub mod planes;
pub mod polynomial;
pub mod raycast;
pub mod rooted;
pub mod scene;
pub mod vector;

pub use complex::Complex;
pub use engine::{Engine, EngineConfig, Partition, PixelKernel, Raster};
pub use errors::{Error, Result};
pub use newton::{FractalResultObserver, NewtonConfig, NewtonProducer, NewtonSession};
pub use planes::{PlaneMapper, Viewport};
pub use polynomial::ComplexPolynomial;
pub use raycast::{Camera, ChannelBuffers, RayCaster, RayTracerResultObserver, Shading};
pub use rooted::ComplexRootedPolynomial;
pub use scene::{LightSource, Material, Scene, SceneObject, Sphere};
pub use vector::{Ray, Vector3};
