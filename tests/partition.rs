// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Every strategy and every worker count must draw the same picture.

use rand::Rng;
use std::cell::RefCell;

use fractray::raycast::{predefined_camera, predefined_scene};
use fractray::{
    ChannelBuffers, Complex, ComplexRootedPolynomial, EngineConfig, NewtonConfig, NewtonProducer,
    NewtonSession, Partition, RayCaster, Raster, Shading, Viewport,
};

fn configs() -> Vec<EngineConfig> {
    let mut configs = Vec::new();
    for &threads in &[1, 2, 3, 7] {
        configs.push(EngineConfig {
            threads,
            partition: Partition::Fixed { oversampling: 8 },
        });
        configs.push(EngineConfig {
            threads,
            partition: Partition::Recursive { threshold: 20 },
        });
        configs.push(EngineConfig {
            threads,
            partition: Partition::Recursive { threshold: 3 },
        });
    }
    configs
}

fn newton_picture(
    session: &NewtonSession,
    config: EngineConfig,
    viewport: &Viewport,
    width: usize,
    height: usize,
) -> Raster<u16> {
    let producer = NewtonProducer::new(session.clone(), config).unwrap();
    let picture = RefCell::new(None);
    producer
        .produce(viewport, width, height, 0, &|raster: Raster<u16>, _: u16, _: u64| {
            *picture.borrow_mut() = Some(raster)
        })
        .unwrap();
    picture.into_inner().unwrap()
}

#[test]
fn newton_strategies_agree() {
    let mut rng = rand::thread_rng();
    for _ in 0..4 {
        let roots: Vec<Complex> = (0..rng.gen_range(2..6))
            .map(|_| Complex::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5)))
            .collect();
        let session = NewtonSession::new(
            ComplexRootedPolynomial::new(roots).unwrap(),
            NewtonConfig::default(),
        )
        .unwrap();

        let re_min = rng.gen_range(-3.0..0.0);
        let im_min = rng.gen_range(-3.0..0.0);
        let viewport = Viewport::from_corners(
            Complex::new(re_min, im_min),
            Complex::new(re_min + rng.gen_range(0.5..4.0), im_min + rng.gen_range(0.5..4.0)),
        );
        let (width, height) = (rng.gen_range(1..48), rng.gen_range(1..90));

        let reference = newton_picture(
            &session,
            EngineConfig {
                threads: 1,
                partition: Partition::Recursive { threshold: 1_000 },
            },
            &viewport,
            width,
            height,
        );
        for config in configs() {
            let picture = newton_picture(&session, config.clone(), &viewport, width, height);
            assert_eq!(picture, reference, "{:?} on {}x{}", config, width, height);
        }
    }
}

#[test]
fn raycast_strategies_agree() {
    let mut reference: Option<ChannelBuffers> = None;
    for config in configs() {
        let caster = RayCaster::new(predefined_scene().unwrap(), Shading::default(), config.clone())
            .unwrap();
        let picture = RefCell::new(None);
        caster
            .produce(&predefined_camera(), 61, 45, 0, &|buffers: ChannelBuffers, _: u64| {
                *picture.borrow_mut() = Some(buffers)
            })
            .unwrap();
        let picture = picture.into_inner().unwrap();
        if reference.is_none() {
            reference = Some(picture);
        } else {
            assert_eq!(reference.as_ref(), Some(&picture), "{:?}", config);
        }
    }
}
