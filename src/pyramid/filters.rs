use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Trait implemented by separable 1D filters used for pyramid construction.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order). The kernel is assumed to be
    /// symmetric around its centre, but the implementation does not rely on it.
    fn taps(&self) -> &[f32];
}

/// Simple wrapper around a static filter kernel.
#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl Default for StaticSeparableFilter {
    fn default() -> Self {
        GAUSSIAN_5TAP
    }
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 5-tap Gaussian filter `[1, 4, 6, 4, 1] / 16`.
pub const GAUSSIAN_5TAP: StaticSeparableFilter =
    StaticSeparableFilter::new(&[0.0625, 0.25, 0.375, 0.25, 0.0625]);

/// Full-resolution separable blur with replicated borders.
///
/// BRIEF tests compare single pixels, so descriptors are computed on a
/// smoothed copy of each level.
pub fn blur(src: &ImageF32, filter: &dyn SeparableFilter) -> ImageF32 {
    let taps = filter.taps();
    let mut out = ImageF32::new(src.w, src.h);
    if src.w == 0 || src.h == 0 || taps.is_empty() {
        return out;
    }
    let radius = (taps.len() / 2) as isize;
    let mut horiz = ImageF32::new(src.w, src.h);
    for y in 0..src.h {
        let row = src.row(y);
        let dst = horiz.row_mut(y);
        for (x, px) in dst.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &tap) in taps.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - radius, src.w);
                acc += tap * row[sx];
            }
            *px = acc;
        }
    }
    for y in 0..src.h {
        for x in 0..src.w {
            let mut acc = 0.0f32;
            for (k, &tap) in taps.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - radius, src.h);
                acc += tap * horiz.get(x, sy);
            }
            out.set(x, y, acc);
        }
    }
    out
}

pub(crate) fn clamp_index(idx: isize, upper: usize) -> usize {
    if upper == 0 {
        return 0;
    }
    if idx < 0 {
        0
    } else if (idx as usize) >= upper {
        upper - 1
    } else {
        idx as usize
    }
}
