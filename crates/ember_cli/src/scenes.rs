//! Built-in scenes.

use anyhow::{bail, Context, Result};
use ember_renderer::{
    Camera, Color, Dielectric, DiffuseLight, HittableList, HittableRef, ImageTexture, Lambertian,
    Material, Metal, RenderConfig, Rotate, Scene, Sphere, Texture, Translate, Triangle, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Arc;

pub const SCENE_NAMES: &[&str] = &["spheres", "cornell"];

/// Build the named scene.
pub fn build(name: &str, config: RenderConfig, texture: Option<&Path>) -> Result<Scene> {
    match name {
        "spheres" => spheres(config, texture),
        "cornell" => Ok(cornell(config)),
        _ => bail!(
            "unknown scene '{}', expected one of: {}",
            name,
            SCENE_NAMES.join(", ")
        ),
    }
}

/// Random small spheres around three large ones on a checkered ground.
fn spheres(config: RenderConfig, texture: Option<&Path>) -> Result<Scene> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut scene = Scene::new(config);

    let checker = Texture::Checker {
        scale: 0.32,
        even: Color::new(0.2, 0.3, 0.1),
        odd: Color::new(0.9, 0.9, 0.9),
    };
    scene.add_object(Arc::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Lambertian::with_texture(checker),
    )));

    scene.add_object(Arc::new(Sphere::new(
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        Dielectric::new(1.5),
    )));

    let center_albedo = match texture {
        Some(path) => {
            let image = ImageTexture::load(path)
                .with_context(|| format!("failed to load texture {}", path.display()))?;
            Lambertian::with_texture(image)
        }
        None => Lambertian::new(Color::new(0.4, 0.2, 0.1)),
    };
    scene.add_object(Arc::new(Sphere::new(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        center_albedo,
    )));

    scene.add_object(Arc::new(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Metal::new(Color::new(0.7, 0.6, 0.5), 0.0),
    )));

    for a in -5..5 {
        for b in -5..5 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat: f32 = rng.gen();
            let material: Material = if choose_mat < 0.8 {
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                Lambertian::new(albedo).into()
            } else if choose_mat < 0.95 {
                let albedo = Color::new(
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                );
                Metal::new(albedo, 0.5 * rng.gen::<f32>()).into()
            } else {
                Dielectric::new(1.5).into()
            };
            scene.add_object(Arc::new(Sphere::new(center, 0.2, material)));
        }
    }

    scene.set_camera(
        Camera::new()
            .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
            .with_lens(20.0, 0.6, 10.0),
    );
    log::info!("Built 'spheres' with {} objects", scene.objects().len());
    Ok(scene)
}

/// Two triangles spanning the parallelogram `q`, `q + u`, `q + v`, `q + u + v`.
fn quad(q: Vec3, u: Vec3, v: Vec3, material: impl Into<Material>) -> HittableList {
    let material = material.into();
    HittableList::from_objects(vec![
        Arc::new(Triangle::new(q, q + u, q + v, material.clone())) as HittableRef,
        Arc::new(Triangle::new(q + u, q + u + v, q + v, material)),
    ])
}

/// Closed box between corners `a` and `b` made of twelve triangles.
fn cuboid(a: Vec3, b: Vec3, material: impl Into<Material>) -> HittableList {
    let material = material.into();
    let min = a.min(b);
    let max = a.max(b);
    let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
    let dy = Vec3::new(0.0, max.y - min.y, 0.0);
    let dz = Vec3::new(0.0, 0.0, max.z - min.z);

    let faces = [
        quad(Vec3::new(min.x, min.y, max.z), dx, dy, material.clone()), // front
        quad(Vec3::new(max.x, min.y, max.z), -dz, dy, material.clone()), // right
        quad(Vec3::new(max.x, min.y, min.z), -dx, dy, material.clone()), // back
        quad(Vec3::new(min.x, min.y, min.z), dz, dy, material.clone()), // left
        quad(Vec3::new(min.x, max.y, max.z), dx, -dz, material.clone()), // top
        quad(Vec3::new(min.x, min.y, min.z), dx, dz, material),         // bottom
    ];

    let mut sides = HittableList::new();
    for face in faces {
        for triangle in face.objects() {
            sides.add(triangle.clone());
        }
    }
    sides
}

/// The Cornell box with two rotated boxes and a ceiling light.
fn cornell(config: RenderConfig) -> Scene {
    let mut scene = Scene::new(config);

    let red = Lambertian::new(Color::new(0.65, 0.05, 0.05));
    let white: Material = Lambertian::new(Color::new(0.73, 0.73, 0.73)).into();
    let green = Lambertian::new(Color::new(0.12, 0.45, 0.15));

    let walls = [
        quad(
            Vec3::new(555.0, 0.0, 0.0),
            Vec3::new(0.0, 555.0, 0.0),
            Vec3::new(0.0, 0.0, 555.0),
            green,
        ),
        quad(
            Vec3::ZERO,
            Vec3::new(0.0, 555.0, 0.0),
            Vec3::new(0.0, 0.0, 555.0),
            red,
        ),
        quad(
            Vec3::ZERO,
            Vec3::new(555.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 555.0),
            white.clone(),
        ),
        quad(
            Vec3::new(555.0, 555.0, 555.0),
            Vec3::new(-555.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -555.0),
            white.clone(),
        ),
        quad(
            Vec3::new(0.0, 0.0, 555.0),
            Vec3::new(555.0, 0.0, 0.0),
            Vec3::new(0.0, 555.0, 0.0),
            white.clone(),
        ),
    ];
    for wall in walls {
        for triangle in wall.objects() {
            scene.add_object(triangle.clone());
        }
    }

    let light = quad(
        Vec3::new(343.0, 554.0, 332.0),
        Vec3::new(-130.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -105.0),
        DiffuseLight::new(Color::splat(15.0)),
    );
    for triangle in light.objects() {
        scene.add_object(triangle.clone());
        scene.add_light(triangle.clone());
    }

    let tall: HittableRef = Arc::new(cuboid(
        Vec3::ZERO,
        Vec3::new(165.0, 330.0, 165.0),
        white.clone(),
    ));
    let tall: HittableRef = Arc::new(Rotate::y(tall, 15.0));
    scene.add_object(Arc::new(Translate::new(tall, Vec3::new(265.0, 0.0, 295.0))));

    let short: HittableRef = Arc::new(cuboid(Vec3::ZERO, Vec3::splat(165.0), white));
    let short: HittableRef = Arc::new(Rotate::y(short, -18.0));
    scene.add_object(Arc::new(Translate::new(short, Vec3::new(130.0, 0.0, 65.0))));

    scene.set_camera(
        Camera::new()
            .with_position(
                Vec3::new(278.0, 278.0, -800.0),
                Vec3::new(278.0, 278.0, 0.0),
                Vec3::Y,
            )
            .with_lens(40.0, 0.0, 10.0),
    );
    log::info!("Built 'cornell' with {} objects", scene.objects().len());
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_renderer::{HitRecord, Hittable, Interval, Ray};

    fn tiny_config() -> RenderConfig {
        RenderConfig {
            width: 8,
            height: 6,
            samples_per_pixel: 1,
            max_depth: 3,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_unknown_scene_is_an_error() {
        assert!(build("teapot", tiny_config(), None).is_err());
    }

    #[test]
    fn test_cuboid_is_closed() {
        let cube = cuboid(Vec3::ZERO, Vec3::ONE, Lambertian::new(Color::ONE));
        assert_eq!(cube.len(), 12);

        // Axis-aligned rays through an interior point enter through a face,
        // away from the triangle diagonals
        let inside = Vec3::new(0.3, 0.6, 0.45);
        for direction in [Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X, -Vec3::Y, -Vec3::Z] {
            let origin = inside - direction * 5.0;
            let mut rec = HitRecord::default();
            let ray = Ray::new_simple(origin, direction);
            assert!(cube.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
            assert!(rec.t > 4.0 && rec.t < 5.0, "t = {}", rec.t);
            assert!(rec.normal.dot(direction) < 0.0);
        }
    }

    #[test]
    fn test_builtin_scenes_render() {
        for name in SCENE_NAMES {
            let scene = build(name, tiny_config(), None).unwrap();
            let bytes = scene.render().unwrap();
            assert_eq!(bytes.len(), 8 * 6 * 3);
        }
    }
}
