//! Sobel derivatives for the Harris corner score.
//!
//! Convolves the 3×3 Sobel pair with border clamping and keeps the per-pixel
//! `gx`, `gy` buffers. The structure tensor is accumulated from these by the
//! corner detector.
use crate::image::{ImageF32, ImageView, ImageViewMut};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

#[derive(Clone, Debug)]
pub struct Gradients {
    /// Horizontal derivative
    pub gx: ImageF32,
    /// Vertical derivative
    pub gy: ImageF32,
}

impl Gradients {
    /// Harris response `det(M) - k·trace(M)²` of the structure tensor summed
    /// over a `(2·radius+1)²` window. Window pixels outside the image are skipped.
    pub fn harris(&self, x: usize, y: usize, radius: usize, k: f32) -> f32 {
        let (w, h) = (self.gx.w, self.gx.h);
        if w == 0 || h == 0 {
            return 0.0;
        }
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(h - 1);
        let x0 = x.saturating_sub(radius);
        let x1 = (x + radius).min(w - 1);
        let (mut sxx, mut syy, mut sxy) = (0.0f32, 0.0f32, 0.0f32);
        for yy in y0..=y1 {
            let gx_row = &self.gx.row(yy)[x0..=x1];
            let gy_row = &self.gy.row(yy)[x0..=x1];
            for (&ix, &iy) in gx_row.iter().zip(gy_row) {
                sxx += ix * ix;
                syy += iy * iy;
                sxy += ix * iy;
            }
        }
        let det = sxx * syy - sxy * sxy;
        let trace = sxx + syy;
        det - k * trace * trace
    }
}

/// Compute Sobel gradients on a single-channel float image.
pub fn sobel_gradients(l: &ImageF32) -> Gradients {
    let w = l.w;
    let h = l.h;
    let mut gx = ImageF32::new(w, h);
    let mut gy = ImageF32::new(w, h);
    if w == 0 || h == 0 {
        return Gradients { gx, gy };
    }

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        let rows = [l.row(y_idx[0]), l.row(y_idx[1]), l.row(y_idx[2])];
        let out_gx = gx.row_mut(y);
        for (x, out) in out_gx.iter_mut().enumerate() {
            *out = convolve_at(&rows, x, w, &SOBEL_KERNEL_X);
        }
        let out_gy = gy.row_mut(y);
        for (x, out) in out_gy.iter_mut().enumerate() {
            *out = convolve_at(&rows, x, w, &SOBEL_KERNEL_Y);
        }
    }

    Gradients { gx, gy }
}

#[inline]
fn convolve_at(rows: &[&[f32]; 3], x: usize, w: usize, kernel: &Kernel3) -> f32 {
    let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
    let mut sum = 0.0;
    for (row, k_row) in rows.iter().zip(kernel.iter()) {
        sum += row[x_idx[0]] * k_row[0] + row[x_idx[1]] * k_row[1] + row[x_idx[2]] * k_row[2];
    }
    sum
}
