use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random piecewise-constant texture: `block`×`block` tiles of random gray.
pub fn block_texture_u8(width: usize, height: usize, block: usize, seed: u64) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(block > 0, "block size must be positive");

    let bw = width.div_ceil(block);
    let bh = height.div_ceil(block);
    let mut rng = StdRng::seed_from_u64(seed);
    let tiles: Vec<u8> = (0..bw * bh).map(|_| rng.gen_range(20u8..=235)).collect();

    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            img[y * width + x] = tiles[(y / block) * bw + x / block];
        }
    }
    img
}

/// Content moved `dx` pixels to the right; the uncovered strip is filled with `fill`.
pub fn shift_right_u8(src: &[u8], width: usize, height: usize, dx: usize, fill: u8) -> Vec<u8> {
    let mut out = vec![fill; width * height];
    for y in 0..height {
        for x in dx..width {
            out[y * width + x] = src[y * width + x - dx];
        }
    }
    out
}

/// Black image with single-pixel dots `(x, y, intensity)`.
pub fn dot_image_u8(width: usize, height: usize, dots: &[(usize, usize, u8)]) -> Vec<u8> {
    let mut img = vec![0u8; width * height];
    for &(x, y, v) in dots {
        img[y * width + x] = v;
    }
    img
}

/// Replicate a gray buffer into interleaved BGR.
pub fn gray_to_bgr(gray: &[u8]) -> Vec<u8> {
    gray.iter().flat_map(|&v| [v, v, v]).collect()
}
