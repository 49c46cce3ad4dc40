use std::f64::consts::TAU;

use super::hash::hash2;

/// Fractal sum of gradient noise octaves.
///
/// `scale` sets the base frequency in lattice cells per tile; smaller values give
/// larger continents. Each further octave multiplies frequency by `lacunarity`
/// and amplitude by `gain`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fbm {
    pub scale: f64,
    pub octaves: u32,
    pub lacunarity: f64,
    pub gain: f64,
}

impl Default for Fbm {
    fn default() -> Self {
        Self {
            scale: 0.008,
            octaves: 5,
            lacunarity: 2.0,
            gain: 0.5,
        }
    }
}

impl Fbm {
    /// Raw weighted octave sum, roughly in `[-1, 1]`.
    pub fn sample(&self, x: f64, y: f64, seed: i32) -> f64 {
        let mut amplitude = 1.0;
        let mut frequency = self.scale;
        let mut sum = 0.0;
        let mut norm = 0.0;
        for octave in 0..self.octaves {
            // Each octave gets its own lattice so octaves don't share zeros.
            let octave_seed = seed.wrapping_add(octave as i32 * 1013);
            sum += amplitude * gradient(x * frequency, y * frequency, octave_seed);
            norm += amplitude;
            amplitude *= self.gain;
            frequency *= self.lacunarity;
        }
        if norm > 0.0 {
            sum / norm
        } else {
            0.0
        }
    }

    /// Octave sum shifted into `[0, 1]` around 0.5. Not clamped.
    pub fn sample_unit(&self, x: f64, y: f64, seed: i32) -> f64 {
        (self.sample(x, y, seed) + 1.0) * 0.5
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Unit gradient at an integer lattice point.
fn lattice_gradient(ix: i32, iy: i32, seed: i32) -> (f64, f64) {
    let angle = hash2(ix, iy, seed) * TAU;
    (angle.cos(), angle.sin())
}

/// Single octave of 2D gradient noise, about `[-0.71, 0.71]`; zero at lattice points.
pub fn gradient(x: f64, y: f64, seed: i32) -> f64 {
    let fx = x.floor();
    let fy = y.floor();
    let x0 = fx as i32;
    let y0 = fy as i32;
    let x1 = x0.wrapping_add(1);
    let y1 = y0.wrapping_add(1);

    let dx0 = x - fx;
    let dy0 = y - fy;
    let dx1 = dx0 - 1.0;
    let dy1 = dy0 - 1.0;

    let dot = |ix: i32, iy: i32, dx: f64, dy: f64| {
        let (gx, gy) = lattice_gradient(ix, iy, seed);
        gx * dx + gy * dy
    };

    let n00 = dot(x0, y0, dx0, dy0);
    let n10 = dot(x1, y0, dx1, dy0);
    let n01 = dot(x0, y1, dx0, dy1);
    let n11 = dot(x1, y1, dx1, dy1);

    let sx = fade(dx0);
    let sy = fade(dy0);
    lerp(lerp(n00, n10, sx), lerp(n01, n11, sx), sy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::hash::DEFAULT_SEED;

    #[test]
    fn gradient_vanishes_on_lattice() {
        for i in -3..3 {
            assert!(gradient(i as f64, (i * 2) as f64, DEFAULT_SEED).abs() < 1e-12);
        }
    }

    #[test]
    fn fbm_is_smooth_between_neighbouring_tiles() {
        let fbm = Fbm::default();
        let mut worst: f64 = 0.0;
        for y in 0..60 {
            for x in 0..200 {
                let here = fbm.sample_unit(x as f64, y as f64, DEFAULT_SEED);
                let east = fbm.sample_unit(x as f64 + 1.0, y as f64, DEFAULT_SEED);
                worst = worst.max((here - east).abs());
            }
        }
        // White noise would jump by up to the full range.
        assert!(worst < 0.1, "largest step between neighbours: {worst}");
    }

    #[test]
    fn fbm_is_deterministic_and_seeded() {
        let fbm = Fbm::default();
        let a = fbm.sample(123.5, 77.25, 9);
        assert_eq!(a, fbm.sample(123.5, 77.25, 9));
        let differing = (0..50)
            .filter(|&i| {
                let x = 40.0 + i as f64 * 7.3;
                fbm.sample(x, 13.7, 9) != fbm.sample(x, 13.7, 10)
            })
            .count();
        assert!(differing > 45);
    }

    #[test]
    fn fbm_unit_range_is_bounded() {
        let fbm = Fbm::default();
        for y in (0..2000).step_by(37) {
            for x in (0..2000).step_by(41) {
                let v = fbm.sample_unit(x as f64, y as f64, DEFAULT_SEED);
                assert!((0.0..=1.0).contains(&v), "{v}");
            }
        }
    }

    #[test]
    fn zero_octaves_is_flat() {
        let fbm = Fbm {
            octaves: 0,
            ..Fbm::default()
        };
        assert_eq!(fbm.sample_unit(10.0, 10.0, DEFAULT_SEED), 0.5);
    }
}
