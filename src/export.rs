//! Conversion of sampled images to 8-bit output

use std::path::Path;

use image::RgbaImage;

use crate::error::RenderResult;
use crate::raycast::{Rgba, SampledImage};

/// Un-premultiply and quantize one pixel
pub fn to_straight_bytes(c: Rgba) -> [u8; 4] {
    let a = c.a.clamp(0.0, 1.0);
    let unweight = if a > 0.0 { 1.0 / a } else { 0.0 };
    let q = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    [q(c.r * unweight), q(c.g * unweight), q(c.b * unweight), q(a)]
}

pub fn to_rgba8(img: &SampledImage) -> RgbaImage {
    let mut out = RgbaImage::new(img.width as u32, img.height as u32);
    for (dst, src) in out.pixels_mut().zip(&img.pixels) {
        dst.0 = to_straight_bytes(*src);
    }
    out
}

pub fn save_png<P: AsRef<Path>>(img: &SampledImage, path: P) -> RenderResult<()> {
    to_rgba8(img).save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
