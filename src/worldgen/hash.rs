/// Seed used when a world does not specify one.
pub const DEFAULT_SEED: i32 = 1337;

const PRIME_X: u32 = 374_761_393;
const PRIME_Y: u32 = 668_265_263;
const PRIME_SEED: u32 = 0x9E37_79B9;

/// Map a coordinate pair to a reproducible value in `[0, 1)`.
///
/// Coordinates and seed are plain 32-bit integers; negative inputs and overflow
/// wrap. The lattice key is run through Jenkins' six-round integer avalanche so
/// neighbouring coordinates land far apart.
pub fn hash2(x: i32, y: i32, seed: i32) -> f64 {
    let key = (x as u32)
        .wrapping_mul(PRIME_X)
        .wrapping_add((y as u32).wrapping_mul(PRIME_Y))
        .wrapping_add((seed as u32).wrapping_mul(PRIME_SEED));
    mix32(key) as f64 / 4_294_967_296.0
}

fn mix32(mut n: u32) -> u32 {
    n = n.wrapping_add(0x7ed5_5d16).wrapping_add(n << 12);
    n = (n ^ 0xc761_c23c) ^ (n >> 19);
    n = n.wrapping_add(0x1656_67b1).wrapping_add(n << 5);
    n = n.wrapping_add(0xd3a2_646c) ^ (n << 9);
    n = n.wrapping_add(0xfd70_46c5).wrapping_add(n << 3);
    (n ^ 0xb55a_4f09) ^ (n >> 16)
}

/// Hash-derived offset in `[-magnitude / 2, magnitude / 2)`.
pub(crate) fn jitter(x: i32, y: i32, seed: i32, magnitude: f64) -> f64 {
    (hash2(x, y, seed) - 0.5) * magnitude
}
