// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parallel tile engine.  A raster is cut into horizontal bands
//! of rows, every band is handed to a worker thread which runs a
//! [`PixelKernel`] over each of its pixels, and the finished raster is
//! only handed back once every band has been joined.
//!
//! Bands are disjoint `&mut` slices of one buffer, so every pixel has
//! exactly one writer and no locking is needed on the pixels
//! themselves.  Two partitioning strategies are offered; because the
//! kernel is a pure function of `(x, y)` both produce the same bytes
//! for any worker count.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crossbeam::thread::{Scope, ScopedJoinHandle};
use itertools::iproduct;
use log::{debug, warn};

use crate::errors::{Error, Result};

/// Bands per worker for the fixed strategy.  Rows are not equally
/// expensive, so more bands than workers keeps everyone busy.
pub const DEFAULT_OVERSAMPLING: usize = 8;

/// Bands at most this many rows tall are not split further.
pub const DEFAULT_THRESHOLD: usize = 20;

/// How the raster's rows are cut into bands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Partition {
    /// `threads × oversampling` equal bands up front; the last band
    /// takes whatever rows are left over.
    Fixed {
        /// Bands per worker thread.
        oversampling: usize,
    },
    /// Halve the rows until a band is at most `threshold` rows tall,
    /// joining both halves before returning.
    Recursive {
        /// Largest band rendered without splitting.
        threshold: usize,
    },
}

impl Default for Partition {
    fn default() -> Self {
        Partition::Fixed {
            oversampling: DEFAULT_OVERSAMPLING,
        }
    }
}

impl FromStr for Partition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Partition> {
        match s {
            "fixed" => Ok(Partition::Fixed {
                oversampling: DEFAULT_OVERSAMPLING,
            }),
            "recursive" => Ok(Partition::Recursive {
                threshold: DEFAULT_THRESHOLD,
            }),
            other => Err(Error::InvalidConfig(format!(
                "unknown partition strategy \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Partition::Fixed { oversampling } => write!(f, "fixed (x{})", oversampling),
            Partition::Recursive { threshold } => write!(f, "recursive (<= {} rows)", threshold),
        }
    }
}

/// Settings for an [`Engine`].
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Upper bound on the worker threads busy at any one time.
    pub threads: usize,
    /// How rows are cut into bands.
    pub partition: Partition,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            threads: num_cpus::get(),
            partition: Partition::default(),
        }
    }
}

/// The per-pixel computation run inside every band.  Implementations
/// must be pure: the value of a pixel may depend on nothing but its
/// coordinates and the kernel's own read-only state.
pub trait PixelKernel: Sync {
    /// What one pixel holds.
    type Pixel: Copy + Default + Send;

    /// Computes the pixel at column `x`, row `y`.
    fn pixel(&self, x: usize, y: usize) -> Result<Self::Pixel>;
}

/// A finished, immutable picture; pixel `(x, y)` lives at `y * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster<T> {
    width: usize,
    height: usize,
    pixels: Vec<T>,
}

impl<T: Copy> Raster<T> {
    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row by row from the top.
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    /// The pixel at `(x, y)`, if it is inside the raster.
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Gives up the raster, keeping its pixels.
    pub fn into_pixels(self) -> Vec<T> {
        self.pixels
    }
}

/// The row ranges of the fixed strategy: `jobs` bands of
/// `height / jobs` rows each, the last one absorbing the remainder.
/// Together they cover `0..height` exactly once.  No jobs means no
/// bands.
pub fn fixed_bands(height: usize, jobs: usize) -> Vec<(usize, usize)> {
    if jobs == 0 {
        return Vec::new();
    }
    let band_height = height / jobs;
    (0..jobs)
        .map(|i| {
            let ymin = i * band_height;
            let ymax = if i == jobs - 1 {
                height
            } else {
                (i + 1) * band_height
            };
            (ymin, ymax)
        })
        .collect()
}

/// How many bands the fixed strategy cuts `height` rows into:
/// `threads × oversampling`, but never more bands than rows, so no
/// band is left empty.
fn fixed_jobs(threads: usize, oversampling: usize, height: usize) -> usize {
    (threads * oversampling).min(height.max(1))
}

/// Rows `ymin..ymax` of the raster and the slice of pixels they own.
struct Band<'a, T> {
    ymin: usize,
    ymax: usize,
    width: usize,
    pixels: &'a mut [T],
}

impl<'a, T> Band<'a, T> {
    fn rows(&self) -> usize {
        self.ymax - self.ymin
    }

    /// Cuts off the first `rows` rows.
    fn split(self, rows: usize) -> (Band<'a, T>, Band<'a, T>) {
        let Band {
            ymin,
            ymax,
            width,
            pixels,
        } = self;
        let (top, bottom) = pixels.split_at_mut(rows * width);
        (
            Band {
                ymin,
                ymax: ymin + rows,
                width,
                pixels: top,
            },
            Band {
                ymin: ymin + rows,
                ymax,
                width,
                pixels: bottom,
            },
        )
    }

    fn render<K: PixelKernel<Pixel = T>>(self, kernel: &K) -> Result<()> {
        let coordinates = iproduct!(self.ymin..self.ymax, 0..self.width);
        for ((y, x), pixel) in coordinates.zip(self.pixels.iter_mut()) {
            *pixel = kernel.pixel(x, y)?;
        }
        Ok(())
    }
}

/// Renders rasters with a bounded number of worker threads.  One
/// engine serves any number of requests; each request gets a fresh
/// buffer and nothing is shared between requests but the settings.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Checks the settings and builds an engine.
    pub fn new(config: EngineConfig) -> Result<Engine> {
        if config.threads == 0 {
            return Err(Error::InvalidConfig(
                "at least one worker thread is required".to_string(),
            ));
        }
        match config.partition {
            Partition::Fixed { oversampling: 0 } => Err(Error::InvalidConfig(
                "oversampling must be at least 1".to_string(),
            )),
            Partition::Recursive { threshold: 0 } => Err(Error::InvalidConfig(
                "the split threshold must be at least one row".to_string(),
            )),
            _ => Ok(Engine { config }),
        }
    }

    /// The engine's settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs `kernel` over every pixel of a `width × height` raster.
    /// Returns only after every band has been joined.  The first band
    /// failure is returned instead of a raster, and bands that have
    /// not started yet are skipped once a failure is seen.
    pub fn render<K: PixelKernel>(
        &self,
        kernel: &K,
        width: usize,
        height: usize,
    ) -> Result<Raster<K::Pixel>> {
        let started = Instant::now();
        let mut pixels = vec![K::Pixel::default(); width * height];
        {
            let whole = Band {
                ymin: 0,
                ymax: height,
                width,
                pixels: &mut pixels,
            };
            let outcome = match self.config.partition {
                Partition::Fixed { oversampling } => self.fan_out(kernel, whole, oversampling),
                Partition::Recursive { threshold } => self.fork_join(kernel, whole, threshold),
            };
            if let Err(err) = outcome {
                warn!("render of {}x{} failed: {}", width, height, err);
                return Err(err);
            }
        }
        debug!(
            "rendered {}x{} with {} workers, {}, in {:?}",
            width,
            height,
            self.config.threads,
            self.config.partition,
            started.elapsed()
        );
        Ok(Raster {
            width,
            height,
            pixels,
        })
    }

    fn fan_out<K: PixelKernel>(
        &self,
        kernel: &K,
        whole: Band<K::Pixel>,
        oversampling: usize,
    ) -> Result<()> {
        let jobs = fixed_jobs(self.config.threads, oversampling, whole.rows());
        let mut bands = Vec::with_capacity(jobs);
        let mut rest = whole;
        for (ymin, ymax) in fixed_bands(rest.rows(), jobs) {
            let (band, remainder) = rest.split(ymax - ymin);
            bands.push(band);
            rest = remainder;
        }

        let workers = self.config.threads.min(jobs);
        debug!("fixed fan-out: {} bands over {} workers", jobs, workers);

        let queue = &Mutex::new(bands.into_iter());
        let failed = &AtomicBool::new(false);

        crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<Result<()>>> = (0..workers)
                .map(|_| {
                    spawner.spawn(move |_| loop {
                        let band = match queue.lock() {
                            Ok(mut bands) => bands.next(),
                            Err(_) => return Err(Error::WorkerPanicked),
                        };
                        match band {
                            Some(_) if failed.load(Ordering::SeqCst) => return Ok(()),
                            Some(band) => {
                                if let Err(err) = band.render(kernel) {
                                    failed.store(true, Ordering::SeqCst);
                                    return Err(err);
                                }
                            }
                            None => return Ok(()),
                        }
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|_| Err(Error::WorkerPanicked)))
                .collect::<Vec<Result<()>>>()
        })
        .map_err(|_| Error::WorkerPanicked)?
        .into_iter()
        .collect()
    }

    fn fork_join<K: PixelKernel>(
        &self,
        kernel: &K,
        whole: Band<K::Pixel>,
        threshold: usize,
    ) -> Result<()> {
        let threads = self.config.threads;
        debug!(
            "recursive fan-out: {} rows, leaves of at most {} rows, {} workers",
            whole.rows(),
            threshold,
            threads
        );
        let failed = &AtomicBool::new(false);
        crossbeam::scope(|scope| {
            scope
                .spawn(move |scope| fork(scope, kernel, whole, threshold, threads, failed))
                .join()
                .unwrap_or_else(|_| Err(Error::WorkerPanicked))
        })
        .unwrap_or_else(|_| Err(Error::WorkerPanicked))
    }
}

/// Renders `band`, splitting it in half while it is taller than
/// `threshold`.  `budget` is the number of threads this call may keep
/// busy; with one left the halves are done one after the other.
/// Both halves are always joined before returning.  Once `failed` is
/// set, bands not yet rendered are skipped.
fn fork<'env, K: PixelKernel>(
    scope: &Scope<'env>,
    kernel: &'env K,
    band: Band<'env, K::Pixel>,
    threshold: usize,
    budget: usize,
    failed: &'env AtomicBool,
) -> Result<()> {
    if failed.load(Ordering::SeqCst) {
        return Ok(());
    }
    let rows = band.rows();
    if rows <= threshold {
        return band.render(kernel).map_err(|err| {
            failed.store(true, Ordering::SeqCst);
            err
        });
    }

    let (top, bottom) = band.split(rows / 2);
    if budget > 1 {
        let child =
            scope.spawn(move |scope| fork(scope, kernel, top, threshold, budget / 2, failed));
        let own = fork(scope, kernel, bottom, threshold, budget - budget / 2, failed);
        let forked = child.join().unwrap_or_else(|_| {
            failed.store(true, Ordering::SeqCst);
            Err(Error::WorkerPanicked)
        });
        forked.and(own)
    } else {
        fork(scope, kernel, top, threshold, 1, failed)?;
        fork(scope, kernel, bottom, threshold, 1, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    /// Every pixel records its own index.
    struct Indexer {
        width: usize,
    }

    impl PixelKernel for Indexer {
        type Pixel = u32;

        fn pixel(&self, x: usize, y: usize) -> Result<u32> {
            Ok((y * self.width + x) as u32 + 1)
        }
    }

    /// Fails on one row.
    struct BadRow(usize);

    impl PixelKernel for BadRow {
        type Pixel = u8;

        fn pixel(&self, _x: usize, y: usize) -> Result<u8> {
            if y == self.0 {
                Err(Error::DegenerateVector)
            } else {
                Ok(1)
            }
        }
    }

    /// Fails on row 0.  Every other pixel first waits for that failure,
    /// then counts itself.
    struct FailsFirst {
        failed: AtomicBool,
        after: AtomicUsize,
    }

    impl FailsFirst {
        fn new() -> Self {
            FailsFirst {
                failed: AtomicBool::new(false),
                after: AtomicUsize::new(0),
            }
        }
    }

    impl PixelKernel for FailsFirst {
        type Pixel = u8;

        fn pixel(&self, _x: usize, y: usize) -> Result<u8> {
            if y == 0 {
                self.failed.store(true, Ordering::SeqCst);
                return Err(Error::DegenerateVector);
            }
            let deadline = Instant::now() + Duration::from_secs(10);
            while !self.failed.load(Ordering::SeqCst) && Instant::now() < deadline {
                thread::yield_now();
            }
            self.after.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    struct Panics;

    impl PixelKernel for Panics {
        type Pixel = u8;

        fn pixel(&self, _x: usize, y: usize) -> Result<u8> {
            if y == 3 {
                panic!("kernel blew up");
            }
            Ok(0)
        }
    }

    fn engine(threads: usize, partition: Partition) -> Engine {
        Engine::new(EngineConfig { threads, partition }).unwrap()
    }

    fn strategies() -> Vec<Partition> {
        vec![
            Partition::Fixed { oversampling: 1 },
            Partition::Fixed { oversampling: 8 },
            Partition::Recursive { threshold: 1 },
            Partition::Recursive { threshold: 20 },
        ]
    }

    #[test]
    fn fixed_bands_cover_every_row_once() {
        for &(height, jobs) in &[(100, 8), (7, 8), (0, 4), (64, 64), (65, 64), (1, 1)] {
            let bands = fixed_bands(height, jobs);
            assert_eq!(bands.len(), jobs);
            assert_eq!(bands[0].0, 0);
            assert_eq!(bands[jobs - 1].1, height);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].1, pair[1].0);
            }
        }
    }

    #[test]
    fn last_fixed_band_takes_the_remainder() {
        assert_eq!(fixed_bands(10, 3), vec![(0, 3), (3, 6), (6, 10)]);
    }

    #[test]
    fn no_jobs_means_no_bands() {
        assert!(fixed_bands(10, 0).is_empty());
        assert!(fixed_bands(0, 0).is_empty());
    }

    #[test]
    fn short_rasters_get_one_band_per_row() {
        assert_eq!(fixed_jobs(8, 8, 3), 3);
        assert_eq!(fixed_jobs(2, 8, 100), 16);
        assert_eq!(fixed_jobs(4, 8, 0), 1);
        let bands = fixed_bands(3, fixed_jobs(8, 8, 3));
        assert_eq!(bands, vec![(0, 1), (1, 2), (2, 3)]);

        let raster = engine(8, Partition::Fixed { oversampling: 8 })
            .render(&Indexer { width: 4 }, 4, 3)
            .unwrap();
        let expected: Vec<u32> = (1..=12).collect();
        assert_eq!(raster.pixels(), &expected[..]);
    }

    #[test]
    fn every_pixel_written_by_every_strategy() {
        let (width, height) = (13, 57);
        let expected: Vec<u32> = (1..=(width * height) as u32).collect();
        for partition in strategies() {
            for &threads in &[1, 2, 3, 8] {
                let raster = engine(threads, partition)
                    .render(&Indexer { width }, width, height)
                    .unwrap();
                assert_eq!(raster.pixels(), &expected[..], "{} x{}", partition, threads);
            }
        }
    }

    #[test]
    fn degenerate_sizes() {
        for partition in strategies() {
            let e = engine(4, partition);
            assert!(e.render(&Indexer { width: 0 }, 0, 10).unwrap().pixels().is_empty());
            assert!(e.render(&Indexer { width: 10 }, 10, 0).unwrap().pixels().is_empty());
            let one = e.render(&Indexer { width: 1 }, 1, 1).unwrap();
            assert_eq!(one.get(0, 0), Some(1));
            assert_eq!(one.get(1, 0), None);
        }
    }

    #[test]
    fn first_failure_is_propagated() {
        for partition in strategies() {
            for &threads in &[1, 4] {
                match engine(threads, partition).render(&BadRow(17), 5, 40) {
                    Err(Error::DegenerateVector) => {}
                    other => panic!("{}: expected the kernel error, got {:?}", partition, other),
                }
            }
        }
    }

    #[test]
    fn recursive_strategy_stops_after_a_failure() {
        let (width, height, threshold) = (10, 200, 2);
        for &threads in &[2, 4] {
            let kernel = FailsFirst::new();
            let outcome = engine(threads, Partition::Recursive { threshold })
                .render(&kernel, width, height);
            assert!(matches!(outcome, Err(Error::DegenerateVector)));
            // Each other worker may finish the leaf it was in, nothing more.
            let after = kernel.after.load(Ordering::SeqCst);
            assert!(
                after <= (threads - 1) * threshold * width,
                "{} threads rendered {} pixels after the failure",
                threads,
                after
            );
        }
    }

    #[test]
    fn panics_become_errors() {
        for partition in strategies() {
            match engine(2, partition).render(&Panics, 4, 10) {
                Err(Error::WorkerPanicked) => {}
                other => panic!("{}: expected a worker panic, got {:?}", partition, other),
            }
        }
    }

    #[test]
    fn refuses_useless_settings() {
        let zero_threads = EngineConfig {
            threads: 0,
            partition: Partition::default(),
        };
        assert!(Engine::new(zero_threads).is_err());
        let no_bands = EngineConfig {
            threads: 2,
            partition: Partition::Fixed { oversampling: 0 },
        };
        assert!(Engine::new(no_bands).is_err());
        let no_leaves = EngineConfig {
            threads: 2,
            partition: Partition::Recursive { threshold: 0 },
        };
        assert!(Engine::new(no_leaves).is_err());
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!(
            "fixed".parse::<Partition>().unwrap(),
            Partition::Fixed {
                oversampling: DEFAULT_OVERSAMPLING
            }
        );
        assert_eq!(
            "recursive".parse::<Partition>().unwrap(),
            Partition::Recursive {
                threshold: DEFAULT_THRESHOLD
            }
        );
        assert!("sideways".parse::<Partition>().is_err());
    }
}
