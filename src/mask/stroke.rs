//! # 笔触画布
//!
//! ## 设计思路
//!
//! 遮罩编辑时用户在“显示分辨率”的画布上涂抹，而遮罩需要“原图分辨率”。
//! `StrokeCanvas` 是一次编辑会话内的局部绘制表面：创建、绘制、导出后即丢弃，不做全局共享。
//!
//! ## 实现思路
//!
//! - 画笔：以圆盘为单位填充不透明纯红；线段按半径一半的步长连续盖章（圆头圆角效果）。
//! - 橡皮：同样的圆盘，但清为完全透明，只影响笔触层。
//! - 导出：对原图分辨率的每个像素做最近邻映射回画布，再用笔触分类规则得到 `BitmapMask`。

use image::{Rgba, RgbaImage};

use super::bitmap::checked_pixel_count;
use super::classifier::STROKE_COLOR;
use super::{BitmapMask, MaskClassifier, MaskFormatError};
use crate::resample::Resampler;

const ERASED: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone)]
pub struct StrokeCanvas {
    layer: RgbaImage,
}

impl StrokeCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self, MaskFormatError> {
        checked_pixel_count(width, height)?;
        Ok(Self {
            layer: RgbaImage::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.layer.width()
    }

    pub fn height(&self) -> u32 {
        self.layer.height()
    }

    /// 笔触层的只读视图。
    pub fn layer(&self) -> &RgbaImage {
        &self.layer
    }

    pub fn paint_dot(&mut self, x: f32, y: f32, brush_size: f32) {
        self.stamp(x, y, brush_size, Rgba(STROKE_COLOR));
    }

    pub fn erase_dot(&mut self, x: f32, y: f32, brush_size: f32) {
        self.stamp(x, y, brush_size, ERASED);
    }

    pub fn paint_line(&mut self, from: (f32, f32), to: (f32, f32), brush_size: f32) {
        self.sweep(from, to, brush_size, Rgba(STROKE_COLOR));
    }

    pub fn erase_line(&mut self, from: (f32, f32), to: (f32, f32), brush_size: f32) {
        self.sweep(from, to, brush_size, ERASED);
    }

    pub fn clear(&mut self) {
        for pixel in self.layer.pixels_mut() {
            *pixel = ERASED;
        }
    }

    pub fn has_strokes(&self) -> bool {
        self.layer
            .pixels()
            .any(|pixel| MaskClassifier::PaintStroke.classify(pixel.0))
    }

    /// 按画布分辨率直接分类。
    pub fn to_mask(&self) -> Result<BitmapMask, MaskFormatError> {
        BitmapMask::from_rgba_image(&self.layer, MaskClassifier::PaintStroke)
    }

    /// 将笔触层缩放到原图分辨率后分类。
    pub fn to_mask_at(&self, native_width: u32, native_height: u32) -> Result<BitmapMask, MaskFormatError> {
        if (native_width, native_height) == self.layer.dimensions() {
            return self.to_mask();
        }

        checked_pixel_count(native_width, native_height)?;
        let resampler = Resampler::new(native_width, native_height, self.width(), self.height());
        let columns = resampler.columns();

        BitmapMask::from_fn(native_width, native_height, |x, y| {
            let pixel = self.layer.get_pixel(columns[x as usize], resampler.row(y));
            MaskClassifier::PaintStroke.classify(pixel.0)
        })
    }

    fn sweep(&mut self, from: (f32, f32), to: (f32, f32), brush_size: f32, color: Rgba<u8>) {
        let finite = [from.0, from.1, to.0, to.1, brush_size].iter().all(|v| v.is_finite());
        if !finite || brush_size <= 0.0 {
            return;
        }

        // 只在“画布 + 笔刷半径”范围内取样，远端点不会放大步数
        let radius = brush_size as f64 / 2.0;
        let (width, height) = (self.width() as f64, self.height() as f64);
        let Some(((x0, y0), (x1, y1))) = clip_segment(
            (from.0 as f64, from.1 as f64),
            (to.0 as f64, to.1 as f64),
            (-radius, -radius),
            (width + radius, height + radius),
        ) else {
            return;
        };

        let (dx, dy) = (x1 - x0, y1 - y0);
        let distance = (dx * dx + dy * dy).sqrt();
        let step = (brush_size as f64 / 4.0).max(1.0);
        // 裁剪后的线段不会长于扩展矩形的周长
        let max_steps = (2.0 * (width + height + 4.0 * radius) / step).ceil().max(1.0);
        let steps = (distance / step).ceil().clamp(1.0, max_steps) as u32;

        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.stamp((x0 + dx * t) as f32, (y0 + dy * t) as f32, brush_size, color);
        }
    }

    fn stamp(&mut self, cx: f32, cy: f32, brush_size: f32, color: Rgba<u8>) {
        if !cx.is_finite() || !cy.is_finite() || !brush_size.is_finite() || brush_size <= 0.0 {
            return;
        }

        let radius = brush_size / 2.0;
        let radius_sq = radius * radius;
        let (width, height) = self.layer.dimensions();

        let min_x = (cx - radius).floor().max(0.0) as u32;
        let min_y = (cy - radius).floor().max(0.0) as u32;
        let max_x = ((cx + radius).ceil().max(0.0) as u32).min(width);
        let max_y = ((cy + radius).ceil().max(0.0) as u32).min(height);

        for y in min_y..max_y {
            let py = y as f32 + 0.5 - cy;
            for x in min_x..max_x {
                let px = x as f32 + 0.5 - cx;
                if px * px + py * py <= radius_sq {
                    self.layer.put_pixel(x, y, color);
                }
            }
        }
    }
}

/// Liang–Barsky 线段裁剪，完全在矩形外时返回 `None`。
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [
        (-dx, from.0 - min.0),
        (dx, max.0 - from.0),
        (-dy, from.1 - min.1),
        (dy, max.1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }

        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}
