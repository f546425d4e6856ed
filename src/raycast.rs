// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A ray caster: one ray per pixel from the eye through the screen,
//! Phong shading at the first hit, hard shadows, no secondary rays.

use std::time::Instant;

use log::{debug, info};

use crate::engine::{Engine, EngineConfig, PixelKernel, Raster};
use crate::errors::Result;
use crate::planes::axis_fraction;
use crate::scene::{LightSource, Material, RayIntersection, Scene, Sphere};
use crate::vector::{Ray, Vector3};

/// Hits this close together are the same hit.
const SAME_HIT: f64 = 1e-6;

/// Red, green and blue.
pub type Rgb = [u8; 3];

/// Where the viewer stands and what they see.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// The eye.
    pub eye: Vector3,
    /// The centre of the screen.
    pub view: Vector3,
    /// Roughly which way is up; need not be perpendicular to the view.
    pub view_up: Vector3,
    /// Width of the screen in scene units.
    pub horizontal: f64,
    /// Height of the screen in scene units.
    pub vertical: f64,
}

impl Camera {
    /// Works out the screen's axes and its upper left corner.  Fails
    /// when the eye sits on the screen or `view_up` is parallel to the
    /// line of sight.
    pub fn frame(&self) -> Result<ScreenFrame> {
        let up = self.view_up.normalize()?;
        let z_axis = (self.view - self.eye).normalize()?;
        let y_axis = (up - z_axis * z_axis.dot(up)).normalize()?;
        let x_axis = z_axis.cross(y_axis).normalize()?;
        let corner = self.view - x_axis * (self.horizontal / 2.0) + y_axis * (self.vertical / 2.0);
        Ok(ScreenFrame {
            corner,
            x_axis,
            y_axis,
            horizontal: self.horizontal,
            vertical: self.vertical,
        })
    }
}

/// The screen in scene space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenFrame {
    /// Upper left corner.
    pub corner: Vector3,
    /// Unit vector pointing right along the screen.
    pub x_axis: Vector3,
    /// Unit vector pointing up along the screen.
    pub y_axis: Vector3,
    horizontal: f64,
    vertical: f64,
}

impl ScreenFrame {
    /// The scene point under pixel `(x, y)` of a `width × height`
    /// raster; row 0 is the top of the screen.
    pub fn point(&self, x: usize, y: usize, width: usize, height: usize) -> Vector3 {
        let along = axis_fraction(x, width) * self.horizontal;
        let down = axis_fraction(y, height) * self.vertical;
        self.corner + self.x_axis * along - self.y_axis * down
    }
}

/// Colours used where no light is computed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shading {
    /// Pixels whose ray hits nothing.
    pub background: Rgb,
    /// Added to every hit, lit or not.
    pub ambient: Rgb,
}

impl Default for Shading {
    fn default() -> Self {
        Shading {
            background: [0, 0, 0],
            ambient: [15, 15, 15],
        }
    }
}

/// True when nothing stands between `light` and `hit`.  `to_light` is
/// the unit vector from the hit point towards the light.
fn is_lit(scene: &Scene, light: &LightSource, hit: &RayIntersection, to_light: Vector3) -> bool {
    let from_light = Ray {
        start: light.position,
        direction: -to_light,
    };
    match scene.closest_intersection(&from_light) {
        Some(blocker) => {
            let to_blocker = (light.position - blocker.point).norm();
            let to_hit = (light.position - hit.point).norm();
            (to_blocker - to_hit).abs() <= SAME_HIT
        }
        None => false,
    }
}

/// One light's diffuse and specular contribution at `hit`, per channel.
fn phong(
    light: &LightSource,
    hit: &RayIntersection,
    to_light: Vector3,
    from_eye: &Ray,
) -> [f64; 3] {
    let diffuse = to_light.dot(hit.normal).max(0.0);
    let reflected = to_light - hit.normal * (2.0 * diffuse);
    let specular = from_eye
        .direction
        .dot(reflected)
        .max(0.0)
        .powf(hit.material.shininess);

    let Material {
        diffuse: kd,
        reflective: kr,
        ..
    } = hit.material;
    let mut channels = [0.0; 3];
    for (c, channel) in channels.iter_mut().enumerate() {
        *channel = light.intensity[c] * (kd[c] * diffuse + kr[c] * specular);
    }
    channels
}

/// The colour seen along `ray`.  A light sitting exactly on the hit
/// point has no direction to shine from and adds nothing.
pub fn trace(scene: &Scene, shading: &Shading, ray: &Ray) -> Result<Rgb> {
    let hit = match scene.closest_intersection(ray) {
        Some(hit) => hit,
        None => return Ok(shading.background),
    };

    let mut sum = [0u16; 3];
    for (c, total) in sum.iter_mut().enumerate() {
        *total = u16::from(shading.ambient[c]);
    }

    for light in scene.lights() {
        let to_light = match (light.position - hit.point).normalize() {
            Ok(to_light) => to_light,
            Err(_) => continue,
        };
        if !is_lit(scene, light, &hit, to_light) {
            continue;
        }
        let contribution = phong(light, &hit, to_light, ray);
        for (total, value) in sum.iter_mut().zip(contribution.iter()) {
            *total = total.saturating_add(num::clamp(*value, 0.0, 255.0) as u16);
        }
    }

    Ok([
        sum[0].min(255) as u8,
        sum[1].min(255) as u8,
        sum[2].min(255) as u8,
    ])
}

/// The pixel kernel for one frame.
pub struct RayKernel<'a> {
    scene: &'a Scene,
    shading: Shading,
    eye: Vector3,
    frame: ScreenFrame,
    width: usize,
    height: usize,
}

impl<'a> RayKernel<'a> {
    /// A kernel looking at `scene` through `camera`.
    pub fn new(
        scene: &'a Scene,
        shading: Shading,
        camera: &Camera,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        Ok(RayKernel {
            scene,
            shading,
            eye: camera.eye,
            frame: camera.frame()?,
            width,
            height,
        })
    }
}

impl<'a> PixelKernel for RayKernel<'a> {
    type Pixel = Rgb;

    fn pixel(&self, x: usize, y: usize) -> Result<Rgb> {
        let through = self.frame.point(x, y, self.width, self.height);
        let ray = Ray::from_points(self.eye, through)?;
        trace(self.scene, &self.shading, &ray)
    }
}

/// A finished picture, one buffer per colour channel, row by row from
/// the top.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelBuffers {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Red channel.
    pub red: Vec<u8>,
    /// Green channel.
    pub green: Vec<u8>,
    /// Blue channel.
    pub blue: Vec<u8>,
}

impl ChannelBuffers {
    fn from_raster(raster: Raster<Rgb>) -> Self {
        let (width, height) = (raster.width(), raster.height());
        let pixels = raster.into_pixels();
        let mut buffers = ChannelBuffers {
            width,
            height,
            red: Vec::with_capacity(pixels.len()),
            green: Vec::with_capacity(pixels.len()),
            blue: Vec::with_capacity(pixels.len()),
        };
        for [r, g, b] in pixels {
            buffers.red.push(r);
            buffers.green.push(g);
            buffers.blue.push(b);
        }
        buffers
    }

    /// The channels interleaved as `RGBRGB...`.
    pub fn interleaved(&self) -> Vec<u8> {
        self.red
            .iter()
            .zip(self.green.iter())
            .zip(self.blue.iter())
            .flat_map(|((&r, &g), &b)| vec![r, g, b])
            .collect()
    }
}

/// Receives finished ray cast pictures.
pub trait RayTracerResultObserver {
    /// Called once per successful request.
    fn accept_result(&self, buffers: ChannelBuffers, request_no: u64);
}

impl<F> RayTracerResultObserver for F
where
    F: Fn(ChannelBuffers, u64),
{
    fn accept_result(&self, buffers: ChannelBuffers, request_no: u64) {
        self(buffers, request_no)
    }
}

/// Renders one scene from any camera on request.
#[derive(Debug)]
pub struct RayCaster {
    engine: Engine,
    scene: Scene,
    shading: Shading,
}

impl RayCaster {
    /// A caster with its own engine.
    pub fn new(scene: Scene, shading: Shading, engine: EngineConfig) -> Result<RayCaster> {
        debug!(
            "ray caster: {} objects, {} lights",
            scene.objects().len(),
            scene.lights().len()
        );
        Ok(RayCaster {
            engine: Engine::new(engine)?,
            scene,
            shading,
        })
    }

    /// The scene being rendered.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Renders the scene as seen by `camera` into a `width × height`
    /// picture and hands it to `observer`.  On failure the observer is
    /// never called.
    pub fn produce<O>(
        &self,
        camera: &Camera,
        width: usize,
        height: usize,
        request_no: u64,
        observer: &O,
    ) -> Result<()>
    where
        O: RayTracerResultObserver + ?Sized,
    {
        let started = Instant::now();
        let kernel = RayKernel::new(&self.scene, self.shading, camera, width, height)?;
        let raster = self.engine.render(&kernel, width, height)?;
        info!(
            "request {}: {}x{} ray cast in {:?}",
            request_no,
            width,
            height,
            started.elapsed()
        );
        observer.accept_result(ChannelBuffers::from_raster(raster), request_no);
        Ok(())
    }
}

fn sphere(center: Vector3, radius: f64, diffuse: f64, reflective: f64, shininess: f64) -> Result<Sphere> {
    Sphere::new(
        center,
        radius,
        Material {
            diffuse: [diffuse; 3],
            reflective: [reflective; 3],
            shininess,
        },
    )
}

/// A small ready-made scene of spheres and coloured lights, meant to be
/// looked at by [`predefined_camera`].
pub fn predefined_scene() -> Result<Scene> {
    let mut scene = Scene::new();
    scene.add_object(sphere(Vector3::new(0.0, 0.0, 0.0), 1.5, 1.0, 0.5, 10.0)?);
    scene.add_object(sphere(Vector3::new(0.0, 3.0, 2.0), 1.0, 0.8, 0.8, 50.0)?);
    scene.add_object(sphere(Vector3::new(-2.0, -3.0, -1.5), 1.2, 0.9, 0.2, 5.0)?);
    scene.add_object(sphere(Vector3::new(-4.0, 0.0, -60.0), 58.0, 0.6, 0.1, 2.0)?);
    scene.add_light(LightSource::new(Vector3::new(10.0, 5.0, 5.0), 100.0, 100.0, 100.0));
    scene.add_light(LightSource::new(Vector3::new(4.0, -6.0, 8.0), 180.0, 60.0, 60.0));
    scene.add_light(LightSource::new(Vector3::new(2.0, 8.0, -2.0), 40.0, 40.0, 160.0));
    Ok(scene)
}

/// A camera on the positive x axis looking at the origin, z up.
pub fn predefined_camera() -> Camera {
    Camera {
        eye: Vector3::new(10.0, 0.0, 0.0),
        view: Vector3::new(0.0, 0.0, 0.0),
        view_up: Vector3::new(0.0, 0.0, 10.0),
        horizontal: 20.0,
        vertical: 20.0,
    }
}
