// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single error type shared by the whole crate.  Parsing, contract
//! violations, degenerate numerics and engine failures all end up here
//! so that callers can match on exactly what went wrong.

use failure::Fail;

use crate::complex::Complex;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building models or rendering.
#[derive(Debug, Fail)]
pub enum Error {
    /// The text handed to the complex parser was empty or blank.
    #[fail(display = "Cannot parse an empty string.")]
    EmptyInput,

    /// The text handed to the complex parser was not a complex number.
    #[fail(display = "Cannot parse \"{}\" as a complex number.", _0)]
    Format(String),

    /// A complex divisor whose magnitude is too small to divide by.
    #[fail(display = "Division by zero: {}", divisor)]
    DivisionByZero {
        /// The offending divisor.
        divisor: Complex,
    },

    /// Integer powers are only defined for `n >= 0`.
    #[fail(display = "Exponent must be non-negative, got {}.", _0)]
    NegativeExponent(i32),

    /// Roots are only defined for `n > 0`.
    #[fail(display = "Root degree must be positive, got {}.", _0)]
    InvalidRootDegree(i32),

    /// A polynomial needs at least one coefficient.
    #[fail(display = "A polynomial needs at least one coefficient.")]
    NoCoefficients,

    /// A rooted polynomial needs at least one root.
    #[fail(display = "A rooted polynomial needs at least one root.")]
    NoRoots,

    /// Attempted to normalize a vector of (near) zero length.
    #[fail(display = "Cannot normalize a zero-length vector.")]
    DegenerateVector,

    /// The viewport or raster dimensions do not describe a usable plane.
    #[fail(display = "Invalid plane: {}", _0)]
    InvalidPlane(String),

    /// A scene primitive with impossible dimensions.
    #[fail(display = "Invalid geometry: {}", _0)]
    InvalidGeometry(String),

    /// An engine or kernel setting outside of its valid range.
    #[fail(display = "Invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// A worker thread panicked before its band was finished.
    #[fail(display = "A render worker panicked.")]
    WorkerPanicked,

    /// Reading or writing at the console boundary failed.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
