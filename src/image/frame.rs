//! Multi-format frame view and grayscale conversion.
//!
//! Frames arrive from the caller in whatever layout the capture path
//! produced. The extractors only consume 8-bit gray, so every frame goes
//! through [`ImageFrame::to_gray`] once per cycle. Luma uses the BT.601
//! weights `0.299 R + 0.587 G + 0.114 B`, rounded to nearest.
use super::io::GrayImageU8;
use super::ImageU8;
use serde::{Deserialize, Serialize};

/// Interleaved 8-bit pixel layouts accepted by the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }

    /// Byte offsets of the red, green and blue samples inside one pixel.
    fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelFormat::Gray8 => [0, 0, 0],
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => [0, 1, 2],
            PixelFormat::Bgr8 | PixelFormat::Bgra8 => [2, 1, 0],
        }
    }
}

/// Borrowed image buffer handed to one tracking cycle.
#[derive(Clone, Copy, Debug)]
pub struct ImageFrame<'a> {
    pub width: usize,
    pub height: usize,
    /// Bytes between the starts of consecutive rows.
    pub stride: usize,
    pub format: PixelFormat,
    pub data: &'a [u8],
}

impl<'a> ImageFrame<'a> {
    /// Tightly packed frame. A row size that overflows saturates, which
    /// [`is_well_formed`](Self::is_well_formed) then rejects.
    pub fn new(width: usize, height: usize, format: PixelFormat, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            stride: width.saturating_mul(format.channels()),
            format,
            data,
        }
    }

    pub fn gray(view: ImageU8<'a>) -> Self {
        Self {
            width: view.w,
            height: view.h,
            stride: view.stride,
            format: PixelFormat::Gray8,
            data: view.data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `data` covers every row at the declared stride.
    pub fn is_well_formed(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(row_bytes) = self.width.checked_mul(self.format.channels()) else {
            return false;
        };
        let needed = (self.height - 1)
            .checked_mul(self.stride)
            .and_then(|n| n.checked_add(row_bytes));
        self.stride >= row_bytes && needed.is_some_and(|n| self.data.len() >= n)
    }

    /// Convert to an owned, tightly packed 8-bit grayscale buffer.
    ///
    /// Empty or malformed frames convert to an empty buffer.
    pub fn to_gray(&self) -> GrayImageU8 {
        if self.is_empty() || !self.is_well_formed() {
            return GrayImageU8::new(0, 0, Vec::new());
        }
        let channels = self.format.channels();
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            let start = y * self.stride;
            let row = &self.data[start..start + self.width * channels];
            if self.format == PixelFormat::Gray8 {
                out.extend_from_slice(row);
                continue;
            }
            let [ri, gi, bi] = self.format.rgb_offsets();
            for px in row.chunks_exact(channels) {
                out.push(luma(px[ri], px[gi], px[bi]));
            }
        }
        GrayImageU8::new(self.width, self.height, out)
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let v = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_and_rgb_agree_on_luma() {
        let rgb = [255u8, 0, 0, 0, 255, 0];
        let bgr = [0u8, 0, 255, 0, 255, 0];
        let a = ImageFrame::new(2, 1, PixelFormat::Rgb8, &rgb).to_gray();
        let b = ImageFrame::new(2, 1, PixelFormat::Bgr8, &bgr).to_gray();
        assert_eq!(a.as_view().data, b.as_view().data);
        assert_eq!(a.as_view().data, &[76, 150]);
    }

    #[test]
    fn strided_rgba_rows_skip_padding() {
        // 1x2 RGBA frame with 4 bytes of padding per row.
        let data = [
            10u8, 10, 10, 255, 0, 0, 0, 0, //
            200, 200, 200, 255, 0, 0, 0, 0,
        ];
        let frame = ImageFrame {
            width: 1,
            height: 2,
            stride: 8,
            format: PixelFormat::Rgba8,
            data: &data,
        };
        let gray = frame.to_gray();
        assert_eq!(gray.width(), 1);
        assert_eq!(gray.height(), 2);
        assert_eq!(gray.as_view().data, &[10, 200]);
    }

    #[test]
    fn overflowing_dimensions_are_malformed() {
        let data = [0u8; 16];
        let wide = ImageFrame::new(usize::MAX / 2, 1, PixelFormat::Rgba8, &data);
        assert!(!wide.is_well_formed());
        assert_eq!(wide.to_gray().width(), 0);

        let tall = ImageFrame {
            width: 4,
            height: usize::MAX,
            stride: 4,
            format: PixelFormat::Gray8,
            data: &data,
        };
        assert!(!tall.is_well_formed());
    }

    #[test]
    fn truncated_buffer_converts_to_empty() {
        let data = [0u8; 5];
        let frame = ImageFrame::new(4, 4, PixelFormat::Gray8, &data);
        assert!(!frame.is_well_formed());
        assert_eq!(frame.to_gray().width(), 0);
    }
}
