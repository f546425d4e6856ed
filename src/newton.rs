// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Newton-Raphson fractals.  Every pixel is a starting point on the
//! complex plane; Newton's method is run from it against a polynomial
//! given as a set of roots, and the pixel records which root (if any)
//! the iteration settled on.
//!
//! A pixel value of `0` means the iteration converged to nothing we
//! know about; `k > 0` means it settled on root `k - 1`.  A picture
//! therefore needs `roots + 1` colours.

use std::convert::TryFrom;
use std::time::Instant;

use log::{debug, info};

use crate::complex::Complex;
use crate::engine::{Engine, EngineConfig, PixelKernel, Raster};
use crate::errors::{Error, Result};
use crate::planes::{Pixel, PlaneMapper, Viewport};
use crate::polynomial::ComplexPolynomial;
use crate::rooted::ComplexRootedPolynomial;

/// Tuning knobs for the iteration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NewtonConfig {
    /// Give up after this many steps.
    pub max_iterations: usize,
    /// Stop once a step moves `z` by no more than this.
    pub convergence_threshold: f64,
    /// How close the final `z` must be to a root to count as that root.
    pub root_threshold: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        NewtonConfig {
            max_iterations: 256,
            convergence_threshold: 0.001,
            root_threshold: 0.002,
        }
    }
}

impl NewtonConfig {
    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "at least one iteration is required".to_string(),
            ));
        }
        if !(self.convergence_threshold > 0.0) || !(self.root_threshold > 0.0) {
            return Err(Error::InvalidConfig(
                "thresholds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One set of roots, prepared for iteration.  The coefficient form and
/// its derivative are worked out once here and then only read.
#[derive(Clone, Debug)]
pub struct NewtonSession {
    rooted: ComplexRootedPolynomial,
    polynomial: ComplexPolynomial,
    derivative: ComplexPolynomial,
    config: NewtonConfig,
    color_count: u16,
}

impl NewtonSession {
    /// Prepares `rooted` for rendering.  Every root plus "no root"
    /// must fit in a `u16` pixel.
    pub fn new(rooted: ComplexRootedPolynomial, config: NewtonConfig) -> Result<NewtonSession> {
        config.validate()?;
        let color_count = u16::try_from(rooted.roots().len() + 1).map_err(|_| {
            Error::InvalidConfig(format!(
                "{} roots is too many, at most {} are supported",
                rooted.roots().len(),
                u16::MAX - 1
            ))
        })?;
        let polynomial = rooted.to_complex_polynomial();
        let derivative = polynomial.derive();
        debug!("newton session: f(z) = {}, f'(z) = {}", polynomial, derivative);
        Ok(NewtonSession {
            rooted,
            polynomial,
            derivative,
            config,
            color_count,
        })
    }

    /// The roots, as given.
    pub fn rooted(&self) -> &ComplexRootedPolynomial {
        &self.rooted
    }

    /// The roots multiplied out.
    pub fn polynomial(&self) -> &ComplexPolynomial {
        &self.polynomial
    }

    /// `f'(z)`.
    pub fn derivative(&self) -> &ComplexPolynomial {
        &self.derivative
    }

    /// The iteration settings.
    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Number of distinct pixel values a picture can hold: one per
    /// root, plus one for "no root".
    pub fn color_count(&self) -> u16 {
        self.color_count
    }

    /// Runs Newton's method from `start` and names the root it lands
    /// on.  A derivative too close to zero to divide by ends the
    /// iteration with no root.
    pub fn converge(&self, start: Complex) -> Option<usize> {
        let mut z = start;
        for _ in 0..self.config.max_iterations {
            let step = match self.polynomial.apply(z).divide(self.derivative.apply(z)) {
                Ok(step) => step,
                Err(_) => return None,
            };
            let next = z - step;
            let moved = next.distance(z);
            z = next;
            if moved <= self.config.convergence_threshold {
                break;
            }
        }
        self.rooted
            .index_of_closest_root_for(z, self.config.root_threshold)
    }
}

/// The pixel kernel for one frame: a session and where its pixels sit
/// on the complex plane.
pub struct NewtonKernel<'a> {
    session: &'a NewtonSession,
    mapper: PlaneMapper,
}

impl<'a> NewtonKernel<'a> {
    /// A kernel over `mapper`'s raster.
    pub fn new(session: &'a NewtonSession, mapper: PlaneMapper) -> Self {
        NewtonKernel { session, mapper }
    }
}

impl<'a> PixelKernel for NewtonKernel<'a> {
    type Pixel = u16;

    fn pixel(&self, x: usize, y: usize) -> Result<u16> {
        let start = self.mapper.pixel_to_point(&Pixel(x, y));
        Ok(self
            .session
            .converge(start)
            .and_then(|index| u16::try_from(index + 1).ok())
            .unwrap_or(0))
    }
}

/// Receives finished fractal pictures.
pub trait FractalResultObserver {
    /// Called once per successful request with the picture, the number
    /// of colours it needs, and the request's number.
    fn accept_result(&self, raster: Raster<u16>, color_count: u16, request_no: u64);
}

impl<F> FractalResultObserver for F
where
    F: Fn(Raster<u16>, u16, u64),
{
    fn accept_result(&self, raster: Raster<u16>, color_count: u16, request_no: u64) {
        self(raster, color_count, request_no)
    }
}

/// Renders Newton fractals for one set of roots on request.
#[derive(Clone, Debug)]
pub struct NewtonProducer {
    engine: Engine,
    session: NewtonSession,
}

impl NewtonProducer {
    /// Builds a producer with its own engine.
    pub fn new(session: NewtonSession, engine: EngineConfig) -> Result<NewtonProducer> {
        Ok(NewtonProducer {
            engine: Engine::new(engine)?,
            session,
        })
    }

    /// The session being rendered.
    pub fn session(&self) -> &NewtonSession {
        &self.session
    }

    /// Renders `viewport` into a `width × height` picture and hands
    /// it to `observer`.  On failure the observer is never called.
    pub fn produce<O>(
        &self,
        viewport: &Viewport,
        width: usize,
        height: usize,
        request_no: u64,
        observer: &O,
    ) -> Result<()>
    where
        O: FractalResultObserver + ?Sized,
    {
        let started = Instant::now();
        let mapper = PlaneMapper::new(width, height, *viewport)?;
        let kernel = NewtonKernel::new(&self.session, mapper);
        let raster = self.engine.render(&kernel, width, height)?;
        info!(
            "request {}: {}x{} newton fractal of {} in {:?}",
            request_no,
            width,
            height,
            self.session.rooted,
            started.elapsed()
        );
        observer.accept_result(raster, self.session.color_count(), request_no);
        Ok(())
    }
}
