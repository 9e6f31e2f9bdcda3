use super::{Arc, ImageBuffer, ImageFrame, RenderImage, Rgba};
use crate::{
    pipeline::depth_converter::stretch_gray_into_rgba,
    visualizer::{Canvas, Color},
};
use image::GrayImage;

const LINE_THICKNESS: i32 = 3;
const MAX_RADIUS: f32 = 1.0e6;

/// Software RGBA target the visualizer draws into each redraw.
pub(super) struct RgbaCanvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl RgbaCanvas {
    pub(super) fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            rgba: Vec::new(),
        }
    }

    /// Resizes to the window and clears to opaque black.
    pub(super) fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.rgba.clear();
        self.rgba.resize(width as usize * height as usize * 4, 0);
        for px in self.rgba.chunks_exact_mut(4) {
            px[3] = 255;
        }
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) as usize) * 4;
        [
            self.rgba[idx],
            self.rgba[idx + 1],
            self.rgba[idx + 2],
            self.rgba[idx + 3],
        ]
    }

    fn put_pixel_safe(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u32, y as u32);
        if ux >= self.width || uy >= self.height {
            return;
        }
        let idx = ((uy * self.width + ux) as usize) * 4;
        if idx + 3 >= self.rgba.len() {
            return;
        }

        let alpha = color[3] as u32;
        if alpha == 0 {
            return;
        }
        let dst = &mut self.rgba[idx..idx + 4];
        for channel in 0..3 {
            let src = color[channel] as u32;
            let old = dst[channel] as u32;
            dst[channel] = ((src * alpha + old * (255 - alpha) + 127) / 255) as u8;
        }
        dst[3] = 255;
    }
}

impl Canvas for RgbaCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw_luminance(&mut self, image: &GrayImage) {
        let (width, height) = (self.width, self.height);
        if let Err(err) = stretch_gray_into_rgba(image, &mut self.rgba, width, height) {
            log::debug!("skipping depth backdrop: {err:#}");
        }
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color) {
        if !center.0.is_finite() || !center.1.is_finite() || !radius.is_finite() {
            return;
        }
        let (cx, cy) = (center.0.round() as i64, center.1.round() as i64);
        let r = radius.round().clamp(1.0, MAX_RADIUS) as i64;
        let x_min = cx.saturating_sub(r).max(0);
        let x_max = cx.saturating_add(r).min(i64::from(self.width) - 1);
        let y_min = cy.saturating_sub(r).max(0);
        let y_max = cy.saturating_add(r).min(i64::from(self.height) - 1);

        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    self.put_pixel_safe(x as i32, y as i32, color);
                }
            }
        }
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Color) {
        let pad = LINE_THICKNESS as f32;
        let bounds = (
            -pad,
            -pad,
            self.width as f32 - 1.0 + pad,
            self.height as f32 - 1.0 + pad,
        );
        let Some((from, to)) = clip_segment(from, to, bounds) else {
            return;
        };

        let (mut x0, mut y0) = (from.0.round() as i32, from.1.round() as i32);
        let (x1, y1) = (to.0.round() as i32, to.1.round() as i32);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let radius = (LINE_THICKNESS.max(1) - 1) / 2;

        loop {
            self.put_pixel_safe(x0, y0, color);
            if radius > 0 {
                for ox in -radius..=radius {
                    for oy in -radius..=radius {
                        if ox == 0 && oy == 0 {
                            continue;
                        }
                        if ox.abs() + oy.abs() <= radius {
                            self.put_pixel_safe(x0 + ox, y0 + oy, color);
                        }
                    }
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

/// Liang-Barsky clip of a segment to `(x_min, y_min, x_max, y_max)`. Runs in
/// f64 so segments spanning far past the canvas keep their on-canvas part.
fn clip_segment(
    from: (f32, f32),
    to: (f32, f32),
    (x_min, y_min, x_max, y_max): (f32, f32, f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    let (fx, fy) = (f64::from(from.0), f64::from(from.1));
    let (dx, dy) = (f64::from(to.0) - fx, f64::from(to.1) - fy);
    if ![fx, fy, dx, dy].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, fx - f64::from(x_min)),
        (dx, f64::from(x_max) - fx),
        (-dy, fy - f64::from(y_min)),
        (dy, f64::from(y_max) - fy),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }

    Some((
        ((fx + t0 * dx) as f32, (fy + t0 * dy) as f32),
        ((fx + t1 * dx) as f32, (fy + t1 * dy) as f32),
    ))
}

pub(super) fn canvas_to_image(canvas: &RgbaCanvas) -> Option<Arc<RenderImage>> {
    if canvas.width == 0 || canvas.height == 0 {
        return None;
    }
    let mut bgra = canvas.rgba.clone();

    // GPUI expects BGRA; convert in place to avoid the async asset pipeline and flicker.
    for px in bgra.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let buffer = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(canvas.width, canvas.height, bgra)?;
    let frame = ImageFrame::new(buffer);

    Some(Arc::new(RenderImage::new(vec![frame])))
}
