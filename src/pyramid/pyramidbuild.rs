use super::filters::{clamp_index, SeparableFilter, StaticSeparableFilter};
use super::options::PyramidOptions;
use crate::image::{ImageF32, ImageU8, ImageView, ImageViewMut};

#[derive(Clone, Debug, Default)]
pub struct Pyramid {
    /// Level 0 is full resolution; each next level halves both dimensions.
    pub levels: Vec<ImageF32>,
}

impl Pyramid {
    pub fn build_f32(image: ImageF32, options: PyramidOptions) -> Self {
        let level_count = options.levels.max(1);
        let mut levels = Vec::with_capacity(level_count);
        levels.push(image);
        if level_count == 1 {
            return Self { levels };
        }

        let mut horiz_cache = Vec::new();
        let mut cached_rows = Vec::new();
        for lvl in 1..level_count {
            let Some(prev) = levels.last() else { break };
            let (nw, nh) = (prev.w / 2, prev.h / 2);
            if nw == 0 || nh == 0 {
                break;
            }
            let mut down = ImageF32::new(nw, nh);
            if options.blurs_into(lvl) {
                downsample_with_filter(
                    prev,
                    &mut down,
                    options.filter,
                    &mut horiz_cache,
                    &mut cached_rows,
                );
            } else {
                downsample_without_filter(prev, &mut down);
            }
            levels.push(down);
        }

        Self { levels }
    }

    /// Build a pyramid from an 8-bit grayscale input using the provided options.
    pub fn build_u8(gray: ImageU8<'_>, options: PyramidOptions) -> Self {
        Pyramid::build_f32(ImageF32::from_u8(gray), options)
    }

    /// Factor mapping level-`index` coordinates back to level 0.
    pub fn scale_of(&self, index: usize) -> f32 {
        (1u32 << index.min(31)) as f32
    }
}

fn downsample_without_filter(src: &ImageF32, dst: &mut ImageF32) {
    if src.w == 0 || src.h == 0 {
        return;
    }
    let max_sx = src.w - 1;
    let max_sy = src.h - 1;
    for y in 0..dst.h {
        let src_row = src.row((y * 2).min(max_sy));
        for (x, dst_px) in dst.row_mut(y).iter_mut().enumerate() {
            *dst_px = src_row[(x * 2).min(max_sx)];
        }
    }
}

fn downsample_with_filter(
    src: &ImageF32,
    dst: &mut ImageF32,
    filter: StaticSeparableFilter,
    horiz_cache: &mut Vec<f32>,
    cached_rows: &mut Vec<isize>,
) {
    if src.w == 0 || src.h == 0 || dst.w == 0 || dst.h == 0 {
        return;
    }
    let taps = filter.taps();
    if taps.is_empty() {
        downsample_without_filter(src, dst);
        return;
    }
    let radius = taps.len() / 2;
    let taps_len = taps.len();
    let cache_width = dst.w;

    horiz_cache.resize(cache_width * taps_len, 0.0);
    cached_rows.clear();
    cached_rows.resize(taps_len, -1);

    for y in 0..dst.h {
        let center_sy = (y * 2) as isize;
        for ky in 0..taps_len {
            let offset = ky as isize - radius as isize;
            let sy = clamp_index(center_sy + offset, src.h) as isize;
            if cached_rows[ky] != sy {
                let src_row = src.row(sy as usize);
                let cache_row = &mut horiz_cache[ky * cache_width..(ky + 1) * cache_width];
                filter_row_downsample(src_row, cache_row, taps, radius);
                cached_rows[ky] = sy;
            }
        }
        let dst_row = dst.row_mut(y);
        for (x, dst_px) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (ky, &tap) in taps.iter().enumerate() {
                acc += tap * horiz_cache[ky * cache_width + x];
            }
            *dst_px = acc;
        }
    }
}

fn filter_row_downsample(row: &[f32], out: &mut [f32], taps: &[f32], radius: usize) {
    if row.is_empty() || out.is_empty() {
        return;
    }
    let mut sx = 0isize;
    for dst_px in out {
        let mut acc = 0.0f32;
        for (k, &tap) in taps.iter().enumerate() {
            let offset = k as isize - radius as isize;
            acc += tap * row[clamp_index(sx + offset, row.len())];
        }
        *dst_px = acc;
        sx += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_dimensions_and_stops_at_one_pixel() {
        let data = vec![128u8; 20 * 12];
        let view = ImageU8::new(20, 12, &data);
        let pyr = Pyramid::build_u8(view, PyramidOptions::new(6).with_blur_levels(6));
        let dims: Vec<(usize, usize)> = pyr.levels.iter().map(|l| (l.w, l.h)).collect();
        assert_eq!(dims, vec![(20, 12), (10, 6), (5, 3), (2, 1)]);
        assert_eq!(pyr.scale_of(2), 4.0);
    }

    #[test]
    fn plain_decimation_picks_even_pixels() {
        let data: Vec<u8> = (0..16u8).map(|v| v * 10).collect();
        let view = ImageU8::new(4, 4, &data);
        let pyr = Pyramid::build_u8(view, PyramidOptions::new(2));
        let l1 = &pyr.levels[1];
        assert!((l1.get(0, 0) - 0.0).abs() < 1e-6);
        assert!((l1.get(1, 0) - 20.0 / 255.0).abs() < 1e-6);
        assert!((l1.get(0, 1) - 80.0 / 255.0).abs() < 1e-6);
    }
}
