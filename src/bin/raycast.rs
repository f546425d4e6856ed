// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use image::ColorType;
use log::info;
use std::cell::RefCell;
use std::str::FromStr;

use fractray::raycast::{predefined_camera, predefined_scene};
use fractray::{ChannelBuffers, EngineConfig, Partition, RayCaster, Shading};

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
const THREADS: &str = "threads";
const STRATEGY: &str = "strategy";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("raycast")
        .version("0.1.0")
        .about("Ray casts a small scene of spheres")
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
            Arg::with_name(STRATEGY)
                .required(false)
                .long(STRATEGY)
                .takes_value(true)
                .possible_values(&["fixed", "recursive"])
                .default_value("recursive")
                .help("How rows are split between threads"),
        )
        .get_matches()
}

fn run() -> Result<(), failure::Error> {
    let matches = args();
    let (width, height) = parse_pair::<usize>(matches.value_of(SIZE).unwrap_or_default(), 'x')
        .ok_or_else(|| failure::err_msg("Error parsing image dimensions"))?;
    let threads = match matches.value_of(THREADS) {
        Some(threads) => usize::from_str(threads)?,
        None => num_cpus::get(),
    };
    let partition = Partition::from_str(matches.value_of(STRATEGY).unwrap_or_default())?;
    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| failure::err_msg("No output file given"))?;

    let caster = RayCaster::new(
        predefined_scene()?,
        Shading::default(),
        EngineConfig { threads, partition },
    )?;

    // Keep the pixels square whatever the picture's shape.
    let mut camera = predefined_camera();
    if width > 0 {
        camera.vertical = camera.horizontal * height as f64 / width as f64;
    }

    let written: RefCell<Result<(), failure::Error>> = RefCell::new(Ok(()));
    {
        let observer = |buffers: ChannelBuffers, request_no: u64| {
            info!("request {} finished, saving {}", request_no, output);
            *written.borrow_mut() = image::save_buffer(
                output,
                &buffers.interleaved(),
                buffers.width as u32,
                buffers.height as u32,
                ColorType::Rgb8,
            )
            .map_err(failure::Error::from);
        };
        caster.produce(&camera, width, height, 1, &observer)?;
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
