//! Surface scattering: what a material emits, whether it scatters an
//! incoming ray, and with what density.

use crate::pdf::{CosinePdf, HittablePdf, MixturePdf, Pdf};
use crate::sampling::{gen_f32, random_unit_vector};
use crate::{HitRecord, Hittable, Texture};
use ember_math::{Color, Ray, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// Sampling density reported by perfectly specular materials. Together with
/// a scattering density of the same value it cancels out of the integrator's
/// importance-sampling weight, leaving `attenuation * incoming`.
pub const SPECULAR_PDF: f32 = 1.0;

/// Outcome of a successful scatter.
#[derive(Debug, Clone, Copy)]
pub struct ScatterRecord {
    /// Per-channel throughput of the bounce
    pub attenuation: Color,
    /// Outgoing ray, starting at the hit point
    pub scattered: Ray,
    /// Density with which `scattered` was sampled
    pub pdf_value: f32,
}

/// The closed set of surface materials.
#[derive(Clone, Debug)]
pub enum Material {
    Lambertian(Lambertian),
    Metal(Metal),
    Dielectric(Dielectric),
    DiffuseLight(DiffuseLight),
}

impl Material {
    /// Radiance emitted at the hit. Zero for everything except lights.
    pub fn emitted(&self, _ray_in: &Ray, rec: &HitRecord) -> Color {
        match self {
            Material::DiffuseLight(light) => light.emit.value(rec.u, rec.v, rec.p),
            _ => Color::ZERO,
        }
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` when the material absorbs the ray. `lights`, when
    /// present, is used by diffuse surfaces to bias half of their samples
    /// toward the light sources.
    pub fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        lights: Option<&dyn Hittable>,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        match self {
            Material::Lambertian(m) => Some(m.scatter(ray_in, rec, lights, rng)),
            Material::Metal(m) => m.scatter(ray_in, rec, rng),
            Material::Dielectric(m) => Some(m.scatter(ray_in, rec, rng)),
            Material::DiffuseLight(_) => None,
        }
    }

    /// Density of the physical scattering distribution for `scattered`.
    ///
    /// This can differ from the density used to draw it; the integrator
    /// divides one by the other.
    pub fn scattering_pdf(&self, _ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f32 {
        match self {
            Material::Lambertian(_) => {
                let cosine = rec.normal.dot(scattered.direction().normalize());
                if cosine > 0.0 {
                    cosine / PI
                } else {
                    0.0
                }
            }
            Material::Metal(_) | Material::Dielectric(_) => SPECULAR_PDF,
            Material::DiffuseLight(_) => 0.0,
        }
    }

    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::DiffuseLight(_))
    }
}

/// Lambertian (diffuse) material.
#[derive(Clone, Debug)]
pub struct Lambertian {
    albedo: Texture,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self {
            albedo: Texture::Solid(albedo),
        }
    }

    /// Diffuse material whose albedo comes from a texture.
    pub fn with_texture(albedo: impl Into<Texture>) -> Self {
        Self {
            albedo: albedo.into(),
        }
    }

    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        lights: Option<&dyn Hittable>,
        rng: &mut dyn RngCore,
    ) -> ScatterRecord {
        let cosine = Pdf::Cosine(CosinePdf::new(rec.normal));

        let (direction, pdf_value) = match lights {
            Some(lights) => {
                let toward_lights = Pdf::Hittable(HittablePdf::new(lights, rec.p));
                let mixture = MixturePdf::new(&cosine, &toward_lights);
                // Light samples come back as offsets to the light; a unit
                // direction keeps HIT_EPSILON a world-space distance
                let direction = mixture.generate(rng).normalize_or_zero();
                (direction, mixture.value(direction))
            }
            None => {
                let direction = cosine.generate(rng);
                (direction, cosine.value(direction))
            }
        };

        ScatterRecord {
            attenuation: self.albedo.value(rec.u, rec.v, rec.p),
            scattered: Ray::new(rec.p, direction, ray_in.time()),
            pdf_value,
        }
    }
}

/// Metal (specular) material.
#[derive(Clone, Debug)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let scattered_dir = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzz can push the ray below the surface; absorb it then
        if scattered_dir.dot(rec.normal) <= 0.0 {
            return None;
        }

        Some(ScatterRecord {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, scattered_dir, ray_in.time()),
            pdf_value: SPECULAR_PDF,
        })
    }
}

/// Dielectric (glass) material.
#[derive(Clone, Debug)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, ior: f32) -> f32 {
        let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }

    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> ScatterRecord {
        let refraction_ratio = if rec.front_face { 1.0 / self.ior } else { self.ior };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        // Total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction = if cannot_refract
            || Self::reflectance(cos_theta, refraction_ratio) > gen_f32(rng)
        {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, refraction_ratio)
        };

        ScatterRecord {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction, ray_in.time()),
            pdf_value: SPECULAR_PDF,
        }
    }
}

/// Diffuse light emitter. Emits on both faces and never scatters.
#[derive(Clone, Debug)]
pub struct DiffuseLight {
    emit: Texture,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub const fn new(emit: Color) -> Self {
        Self {
            emit: Texture::Solid(emit),
        }
    }

    pub fn with_texture(emit: impl Into<Texture>) -> Self {
        Self { emit: emit.into() }
    }
}

impl From<Lambertian> for Material {
    fn from(m: Lambertian) -> Self {
        Material::Lambertian(m)
    }
}

impl From<Metal> for Material {
    fn from(m: Metal) -> Self {
        Material::Metal(m)
    }
}

impl From<Dielectric> for Material {
    fn from(m: Dielectric) -> Self {
        Material::Dielectric(m)
    }
}

impl From<DiffuseLight> for Material {
    fn from(m: DiffuseLight) -> Self {
        Material::DiffuseLight(m)
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface.
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}
