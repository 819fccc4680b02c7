//! Template overlay: warp the secondary image into the primary frame and
//! composite it on top.
//!
//! Every primary pixel is mapped back through the inverse transform and
//! bilinearly sampled from the template; pixels that land outside the
//! template keep the primary value. Without a usable transform the primary
//! frame passes through unchanged.
use crate::image::{GrayImageU8, ImageF32, ImageFrame};
use crate::types::Transform;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlayOptions {
    /// Weight of the warped template where it covers the frame. `1.0`
    /// replaces the frame, `0.5` blends evenly.
    pub opacity: f32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self { opacity: 1.0 }
    }
}

/// Warped template values in `[0, 1]` and coverage, both row-major at the
/// target size.
#[derive(Clone, Debug)]
pub struct Warped {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f32>,
    pub covered: Vec<bool>,
}

/// Warp `source` onto a `width × height` canvas. `None` when the transform
/// is not invertible.
pub fn warp_perspective(
    source: &ImageF32,
    transform: &Transform,
    width: usize,
    height: usize,
) -> Option<Warped> {
    let inverse = transform.matrix().try_inverse()?;
    if !inverse.iter().all(|v| v.is_finite()) {
        return None;
    }
    let len = width.checked_mul(height)?;
    let mut values = vec![0.0f32; len];
    let mut covered = vec![false; len];
    if source.w == 0 || source.h == 0 {
        return Some(Warped {
            width,
            height,
            values,
            covered,
        });
    }
    let max_x = (source.w - 1) as f64 + 1e-6;
    let max_y = (source.h - 1) as f64 + 1e-6;
    for y in 0..height {
        for x in 0..width {
            let p = inverse * Vector3::new(x as f64, y as f64, 1.0);
            if p.z.abs() < 1e-12 {
                continue;
            }
            let (sx, sy) = (p.x / p.z, p.y / p.z);
            if !(sx >= -1e-6 && sy >= -1e-6 && sx <= max_x && sy <= max_y) {
                continue;
            }
            let i = y * width + x;
            values[i] = source.sample_bilinear(sx as f32, sy as f32);
            covered[i] = true;
        }
    }
    Some(Warped {
        width,
        height,
        values,
        covered,
    })
}

/// Composite result and the number of primary pixels the template covered.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub image: GrayImageU8,
    pub covered: usize,
}

/// Draw `secondary`, warped by `transform`, over `primary`. Both frames are
/// converted to gray first.
pub fn overlay(
    primary: ImageFrame<'_>,
    secondary: ImageFrame<'_>,
    transform: Option<&Transform>,
    options: &OverlayOptions,
) -> Overlay {
    let base = primary.to_gray();
    let passthrough = |image: GrayImageU8| Overlay { image, covered: 0 };
    let Some(transform) = transform.filter(|t| t.is_finite()) else {
        return passthrough(base);
    };
    let template = ImageF32::from_u8(secondary.to_gray().as_view());
    let Some(warped) = warp_perspective(&template, transform, base.width(), base.height()) else {
        log::debug!("overlay: transform is not invertible, frame passed through");
        return passthrough(base);
    };

    let alpha = options.opacity.clamp(0.0, 1.0);
    let mut covered = 0;
    let data: Vec<u8> = base
        .as_view()
        .data
        .iter()
        .zip(warped.values.iter().zip(&warped.covered))
        .map(|(&px, (&v, &hit))| {
            if !hit {
                return px;
            }
            covered += 1;
            let mixed = alpha * v * 255.0 + (1.0 - alpha) * px as f32;
            mixed.round().clamp(0.0, 255.0) as u8
        })
        .collect();
    Overlay {
        image: GrayImageU8::new(base.width(), base.height(), data),
        covered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;
    use nalgebra::Matrix3;

    fn frame(w: usize, h: usize, data: &[u8]) -> ImageFrame<'_> {
        ImageFrame::new(w, h, PixelFormat::Gray8, data)
    }

    #[test]
    fn translated_template_lands_at_offset() {
        let primary = vec![10u8; 10 * 10];
        let template = vec![200u8; 4 * 4];
        let out = overlay(
            frame(10, 10, &primary),
            frame(4, 4, &template),
            Some(&Transform::translation(3.0, 2.0)),
            &OverlayOptions::default(),
        );
        assert_eq!(out.covered, 16);
        let view = out.image.as_view();
        for y in 0..10 {
            for x in 0..10 {
                let inside = (3..=6).contains(&x) && (2..=5).contains(&y);
                assert_eq!(view.get(x, y), if inside { 200 } else { 10 }, "({x},{y})");
            }
        }
    }

    #[test]
    fn half_opacity_blends() {
        let primary = vec![100u8; 4];
        let template = vec![200u8; 4];
        let out = overlay(
            frame(2, 2, &primary),
            frame(2, 2, &template),
            Some(&Transform::identity()),
            &OverlayOptions { opacity: 0.5 },
        );
        assert_eq!(out.image.as_view().data, &[150, 150, 150, 150]);
    }

    #[test]
    fn missing_or_singular_transform_passes_primary_through() {
        let primary: Vec<u8> = (0..16).collect();
        let template = vec![255u8; 16];
        let none = overlay(
            frame(4, 4, &primary),
            frame(4, 4, &template),
            None,
            &OverlayOptions::default(),
        );
        assert_eq!(none.image.as_view().data, primary.as_slice());
        assert_eq!(none.covered, 0);

        let mut m = Matrix3::identity();
        m[(0, 0)] = 0.0;
        let singular = overlay(
            frame(4, 4, &primary),
            frame(4, 4, &template),
            Some(&Transform::new(m)),
            &OverlayOptions::default(),
        );
        assert_eq!(singular.image.as_view().data, primary.as_slice());
    }
}
