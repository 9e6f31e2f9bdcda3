use anyhow::{Result, anyhow};
use image::GrayImage;
use rayon::prelude::*;

use crate::types::DepthImage;

/// Sensor-defined 16 → 8 bit reduction: drop the low four bits and keep the
/// next eight. Ranges past 4 m wrap, as on the device's own preview.
#[inline]
pub fn depth_to_luma(sample: u16) -> u8 {
    (sample >> 4) as u8
}

pub fn depth_to_luminance(depth: &DepthImage) -> Result<GrayImage> {
    let expected_len = depth.width as usize * depth.height as usize;
    if depth.samples.len() < expected_len {
        return Err(anyhow!(
            "depth buffer too small: got {}, expected {}",
            depth.samples.len(),
            expected_len
        ));
    }

    let luma: Vec<u8> = depth.samples[..expected_len]
        .par_iter()
        .map(|&sample| depth_to_luma(sample))
        .collect();

    GrayImage::from_raw(depth.width, depth.height, luma).ok_or_else(|| {
        anyhow!(
            "depth image {}x{} does not fit its buffer",
            depth.width,
            depth.height
        )
    })
}

/// Stretches `gray` to exactly `width × height` with nearest sampling,
/// ignoring aspect ratio, and writes it as opaque RGBA into `rgba`.
pub fn stretch_gray_into_rgba(
    gray: &GrayImage,
    rgba: &mut [u8],
    width: u32,
    height: u32,
) -> Result<()> {
    let expected_len = width as usize * height as usize * 4;
    if rgba.len() < expected_len {
        return Err(anyhow!(
            "RGBA buffer too small: got {}, expected {}",
            rgba.len(),
            expected_len
        ));
    }
    let (src_w, src_h) = gray.dimensions();
    if width == 0 || height == 0 || src_w == 0 || src_h == 0 {
        return Ok(());
    }

    let src = gray.as_raw();
    let (dst_w, dst_h) = (width as usize, height as usize);
    let (src_w, src_h) = (src_w as usize, src_h as usize);
    rgba[..expected_len]
        .par_chunks_mut(dst_w * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[(y * src_h / dst_h) * src_w..][..src_w];
            for (x, dst) in row.chunks_exact_mut(4).enumerate() {
                let value = src_row[x * src_w / dst_w];
                dst[0] = value;
                dst[1] = value;
                dst[2] = value;
                dst[3] = 255;
            }
        });

    Ok(())
}
