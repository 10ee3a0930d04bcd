//! Sampling strategies for importance sampling scattered directions.
//!
//! Each strategy is built for one shading point and answers two questions:
//! "draw me a direction" and "how likely was that direction". The variants
//! form a closed set so the hot path dispatches with a `match`.

use crate::sampling::{gen_f32, near_zero, random_unit_vector};
use crate::Hittable;
use ember_math::Vec3;
use rand::RngCore;
use std::f32::consts::PI;

/// A direction sampling strategy.
pub enum Pdf<'a> {
    Cosine(CosinePdf),
    Hittable(HittablePdf<'a>),
    Mixture(MixturePdf<'a>),
}

impl<'a> Pdf<'a> {
    /// Probability density of generating `direction`.
    pub fn value(&self, direction: Vec3) -> f32 {
        match self {
            Pdf::Cosine(pdf) => pdf.value(direction),
            Pdf::Hittable(pdf) => pdf.value(direction),
            Pdf::Mixture(pdf) => pdf.value(direction),
        }
    }

    /// Draw one direction.
    pub fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            Pdf::Cosine(pdf) => pdf.generate(rng),
            Pdf::Hittable(pdf) => pdf.generate(rng),
            Pdf::Mixture(pdf) => pdf.generate(rng),
        }
    }
}

/// Cosine-weighted hemisphere around a surface normal.
#[derive(Debug, Clone, Copy)]
pub struct CosinePdf {
    normal: Vec3,
}

impl CosinePdf {
    pub fn new(normal: Vec3) -> Self {
        Self {
            normal: normal.normalize(),
        }
    }

    /// `max(0, cos θ) / π` where θ is measured from the normal.
    pub fn value(&self, direction: Vec3) -> f32 {
        let cosine = direction.normalize().dot(self.normal);
        if cosine.is_nan() {
            return 0.0;
        }
        cosine.max(0.0) / PI
    }

    /// Normal plus a uniform unit vector is cosine distributed. A sum that
    /// cancels out falls back to the normal itself.
    pub fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        let direction = self.normal + random_unit_vector(rng);
        if near_zero(direction) {
            return self.normal;
        }
        direction.normalize()
    }
}

/// Directions toward a target object (usually the lights) from an origin.
pub struct HittablePdf<'a> {
    target: &'a dyn Hittable,
    origin: Vec3,
}

impl<'a> HittablePdf<'a> {
    pub fn new(target: &'a dyn Hittable, origin: Vec3) -> Self {
        Self { target, origin }
    }

    /// Density implied by the target's solid angle as seen from the origin.
    pub fn value(&self, direction: Vec3) -> f32 {
        self.target.pdf_value(self.origin, direction)
    }

    pub fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.target.random(self.origin, rng)
    }
}

/// Equal-weight blend of two strategies.
pub struct MixturePdf<'a> {
    p0: &'a Pdf<'a>,
    p1: &'a Pdf<'a>,
}

impl<'a> MixturePdf<'a> {
    pub fn new(p0: &'a Pdf<'a>, p1: &'a Pdf<'a>) -> Self {
        Self { p0, p1 }
    }

    /// Mean of the two component densities.
    pub fn value(&self, direction: Vec3) -> f32 {
        0.5 * self.p0.value(direction) + 0.5 * self.p1.value(direction)
    }

    /// Coin flip picks which component draws the sample.
    pub fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        if gen_f32(rng) < 0.5 {
            self.p0.generate(rng)
        } else {
            self.p1.generate(rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::gen_range;
    use crate::{DiffuseLight, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn random_direction(rng: &mut StdRng) -> Vec3 {
        random_unit_vector(rng) * gen_range(rng, 0.1, 5.0)
    }

    #[test]
    fn test_cosine_value_along_normal() {
        let n = Vec3::new(0.3, -2.0, 1.0);
        let pdf = CosinePdf::new(n);
        assert!((pdf.value(n) - 1.0 / PI).abs() < 1e-6);
        // Length of the query direction does not matter
        assert!((pdf.value(n * 7.5) - 1.0 / PI).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_value_below_hemisphere_is_zero() {
        let pdf = CosinePdf::new(Vec3::Y);
        assert_eq!(pdf.value(-Vec3::Y), 0.0);
        assert_eq!(pdf.value(Vec3::new(1.0, -0.01, 0.0)), 0.0);
        assert!(pdf.value(Vec3::X).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_samples_have_non_negative_density() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let normal = random_unit_vector(&mut rng);
            let pdf = CosinePdf::new(normal);
            for _ in 0..20 {
                let d = pdf.generate(&mut rng);
                assert!((d.length() - 1.0).abs() < 1e-4);
                assert!(pdf.value(d) >= 0.0);
            }
        }
    }

    #[test]
    fn test_cosine_samples_mean_matches_distribution() {
        // E[cos θ] for a cosine-weighted hemisphere is 2/3
        let mut rng = StdRng::seed_from_u64(5);
        let pdf = CosinePdf::new(Vec3::Z);
        let n = 20_000;
        let mean: f32 = (0..n).map(|_| pdf.generate(&mut rng).z).sum::<f32>() / n as f32;
        assert!((mean - 2.0 / 3.0).abs() < 0.02, "mean cos = {mean}");
    }

    /// Replays a fixed sequence of words.
    struct Scripted {
        words: Vec<u32>,
        next: usize,
    }

    impl RngCore for Scripted {
        fn next_u32(&mut self) -> u32 {
            let word = self.words[self.next % self.words.len()];
            self.next += 1;
            word
        }

        fn next_u64(&mut self) -> u64 {
            u64::from(self.next_u32())
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for byte in dest {
                *byte = self.next_u32() as u8;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_cosine_generate_falls_back_to_normal() {
        // Floats 0.5, 0.0, 0.5 map to the unit vector (0, -1, 0)
        let mut rng = Scripted {
            words: vec![0x8000_0000, 0, 0x8000_0000],
            next: 0,
        };
        let pdf = CosinePdf::new(Vec3::Y);
        assert_eq!(pdf.generate(&mut rng), Vec3::Y);
    }

    #[test]
    fn test_mixture_value_is_mean_of_components() {
        let mut rng = StdRng::seed_from_u64(17);
        let light = Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, DiffuseLight::new(Vec3::ONE));

        for _ in 0..100 {
            let n0 = random_unit_vector(&mut rng);
            let origin = Vec3::new(
                gen_range(&mut rng, -2.0, 2.0),
                gen_range(&mut rng, -2.0, 2.0),
                gen_range(&mut rng, -2.0, 2.0),
            );
            let a = Pdf::Cosine(CosinePdf::new(n0));
            let b = Pdf::Hittable(HittablePdf::new(&light, origin));
            let mix = MixturePdf::new(&a, &b);

            // Mix some light-directed queries in so both components are non-zero
            let direction = if gen_f32(&mut rng) < 0.5 {
                b.generate(&mut rng)
            } else {
                random_direction(&mut rng)
            };
            let expected = 0.5 * (a.value(direction) + b.value(direction));
            assert!((mix.value(direction) - expected).abs() <= 1e-6 * expected.max(1.0));
        }
    }

    #[test]
    fn test_mixture_draws_from_both_components() {
        let mut rng = StdRng::seed_from_u64(23);
        let up = Pdf::Cosine(CosinePdf::new(Vec3::Y));
        let down = Pdf::Cosine(CosinePdf::new(-Vec3::Y));
        let mix = Pdf::Mixture(MixturePdf::new(&up, &down));

        let ups = (0..1000).filter(|_| mix.generate(&mut rng).y > 0.0).count();
        assert!(ups > 400 && ups < 600, "ups = {ups}");
    }

    #[test]
    fn test_hittable_pdf_targets_sphere() {
        let mut rng = StdRng::seed_from_u64(29);
        let light = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, DiffuseLight::new(Vec3::ONE));
        let pdf = HittablePdf::new(&light, Vec3::ZERO);

        let inside = (0..200).filter(|_| pdf.value(pdf.generate(&mut rng)) > 0.0).count();
        assert!(inside >= 198, "inside = {inside}");
        assert_eq!(pdf.value(Vec3::Z), 0.0);
    }
}
