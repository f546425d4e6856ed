// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 in
//! the top left, and a rectangle on the complex plane.  Row 0 of the
//! integral plane is the top of the picture, which is the *largest*
//! imaginary value, so the vertical axis is flipped.

use crate::complex::Complex;
use crate::errors::{Error, Result};

/// Describes the x, y of a pixel in a raster; x grows to the right
/// and y grows downwards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The region of the complex plane shown in a picture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Real value at the left edge.
    pub re_min: f64,
    /// Real value at the right edge.
    pub re_max: f64,
    /// Imaginary value at the bottom edge.
    pub im_min: f64,
    /// Imaginary value at the top edge.
    pub im_max: f64,
}

impl Viewport {
    /// Builds a viewport out of its left-lower and right-upper corners.
    pub fn from_corners(leftlower: Complex, rightupper: Complex) -> Self {
        Viewport {
            re_min: leftlower.re(),
            re_max: rightupper.re(),
            im_min: leftlower.im(),
            im_max: rightupper.im(),
        }
    }
}

/// How far along an axis of `count` pixels the pixel at `index` sits,
/// from 0.0 at the first pixel to 1.0 at the last.  A single-pixel axis
/// always sits at 0.0.
pub fn axis_fraction(index: usize, count: usize) -> f64 {
    if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        0.0
    }
}

/// Maps pixels of a `width × height` raster onto a viewport.  The
/// corner pixels land exactly on the corners of the viewport.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    width: usize,
    height: usize,
    viewport: Viewport,
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the
    /// viewport of the complex plane.
    pub fn new(width: usize, height: usize, viewport: Viewport) -> Result<PlaneMapper> {
        if viewport.re_max < viewport.re_min {
            return Err(Error::InvalidPlane(
                "The left edge is not to the left of the right edge.".to_string(),
            ));
        }

        if viewport.im_max < viewport.im_min {
            return Err(Error::InvalidPlane(
                "The bottom edge is not lower than the top edge.".to_string(),
            ));
        }

        Ok(PlaneMapper {
            width,
            height,
            viewport,
        })
    }

    /// Width of the integral plane.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the integral plane.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Given a pixel on the integral plane, map that to a point on the
    /// complex plane.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex {
        let vp = &self.viewport;
        let fx = axis_fraction(pixel.0, self.width);
        let fy = axis_fraction(pixel.1, self.height);
        Complex::new(
            vp.re_min + fx * (vp.re_max - vp.re_min),
            vp.im_min + (1.0 - fy) * (vp.im_max - vp.im_min),
        )
    }
}
