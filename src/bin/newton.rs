// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use image::ColorType;
use log::info;
use num::clamp;
use std::cell::RefCell;
use std::io;
use std::str::FromStr;

use fractray::console::read_roots;
use fractray::{
    Complex, ComplexRootedPolynomial, EngineConfig, NewtonConfig, NewtonProducer, NewtonSession,
    Partition, Raster, Viewport,
};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex> {
    parse_pair(s, ',').map(|(re, im)| Complex::new(re, im))
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const STRATEGY: &str = "strategy";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("newton")
        .version("0.1.0")
        .about("Newton-Raphson fractal renderer.  Reads the roots of the polynomial from stdin.")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .required(false)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2,-2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the complex plane"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .required(false)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("2,2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the complex plane"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver [default: all cores]"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("256")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 100000",
                    )
                })
                .help("Maximum Newton steps per pixel"),
        )
        .arg(
            Arg::with_name(STRATEGY)
                .required(false)
                .long(STRATEGY)
                .takes_value(true)
                .possible_values(&["fixed", "recursive"])
                .default_value("fixed")
                .help("How rows are split between threads"),
        )
        .get_matches()
}

/// Fully saturated colour at `hue` degrees.
fn hue_to_rgb(hue: f64) -> [u8; 3] {
    let sector = (hue / 60.0) % 6.0;
    let rising = clamp(sector.fract() * 255.0, 0.0, 255.0) as u8;
    let falling = 255 - rising;
    match sector as usize {
        0 => [255, rising, 0],
        1 => [falling, 255, 0],
        2 => [0, 255, rising],
        3 => [0, falling, 255],
        4 => [rising, 0, 255],
        _ => [255, 0, falling],
    }
}

/// Colour 0 is black; the rest are spread evenly around the colour wheel.
fn palette(color_count: u16) -> Vec<[u8; 3]> {
    let hues = f64::from(color_count.saturating_sub(1).max(1));
    (0..color_count)
        .map(|k| match k {
            0 => [0, 0, 0],
            k => hue_to_rgb(f64::from(k - 1) * 360.0 / hues),
        })
        .collect()
}

fn colorize(raster: &Raster<u16>, color_count: u16) -> Vec<u8> {
    let palette = palette(color_count);
    raster
        .pixels()
        .iter()
        .flat_map(|&p| palette[p as usize].to_vec())
        .collect()
}

fn run() -> Result<(), failure::Error> {
    let matches = args();
    let (width, height) = parse_pair::<usize>(matches.value_of(SIZE).unwrap_or_default(), 'x')
        .ok_or_else(|| failure::err_msg("Error parsing image dimensions"))?;
    let leftlower = parse_complex(matches.value_of(LEFTLOWER).unwrap_or_default())
        .ok_or_else(|| failure::err_msg("Error parsing left lower point"))?;
    let rightupper = parse_complex(matches.value_of(RIGHTUPPER).unwrap_or_default())
        .ok_or_else(|| failure::err_msg("Error parsing right upper point"))?;
    let threads = match matches.value_of(THREADS) {
        Some(threads) => usize::from_str(threads)?,
        None => num_cpus::get(),
    };
    let max_iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap_or_default())?;
    let partition = Partition::from_str(matches.value_of(STRATEGY).unwrap_or_default())?;
    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| failure::err_msg("No output file given"))?;

    println!("Welcome to Newton-Raphson iteration-based fractal viewer.");
    println!("Please enter at least one root, one root per line. Enter 'done' when done.");
    let stdin = io::stdin();
    let roots = read_roots(stdin.lock(), io::stdout())?;
    let rooted = ComplexRootedPolynomial::new(roots)?;
    println!("Rendering {} into {}.", rooted, output);

    let session = NewtonSession::new(
        rooted,
        NewtonConfig {
            max_iterations,
            ..NewtonConfig::default()
        },
    )?;
    let producer = NewtonProducer::new(session, EngineConfig { threads, partition })?;
    let viewport = Viewport::from_corners(leftlower, rightupper);

    let written: RefCell<Result<(), failure::Error>> = RefCell::new(Ok(()));
    {
        let observer = |raster: Raster<u16>, color_count: u16, request_no: u64| {
            info!("request {} finished, saving {}", request_no, output);
            let pixels = colorize(&raster, color_count);
            *written.borrow_mut() = image::save_buffer(
                output,
                &pixels,
                raster.width() as u32,
                raster.height() as u32,
                ColorType::Rgb8,
            )
            .map_err(failure::Error::from);
        };
        producer.produce(&viewport, width, height, 1, &observer)?;
    }
    written.into_inner()
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
