//! # 二值遮罩位图
//!
//! ## 设计思路
//!
//! `BitmapMask` 是遮罩在内存中的唯一规范表示：宽、高、逐像素布尔值（行优先，原点左上）。
//! 构造函数负责全部校验，之后不可变；任何变换都生成新实例。
//!
//! ## 实现思路
//!
//! - 尺寸必须为正，且 `width * height` 不溢出。
//! - `bits.len() == width * height` 在构造时检查，不满足则返回错误而非构造非法状态。
//! - 导出栅格（黑白遮罩 / 透明遮罩）是分类器的逆操作，供远端编辑接口使用。

use image::{Rgba, RgbaImage};

use super::{MaskClassifier, MaskFormatError};
use crate::resample::Resampler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

/// 校验尺寸并返回像素总数。
pub(crate) fn checked_pixel_count(width: u32, height: u32) -> Result<usize, MaskFormatError> {
    if width == 0 || height == 0 {
        return Err(MaskFormatError::InvalidDimensions(format!(
            "宽高必须为正：{}x{}",
            width, height
        )));
    }

    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| MaskFormatError::InvalidDimensions(format!("像素数溢出：{}x{}", width, height)))
}

impl BitmapMask {
    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Result<Self, MaskFormatError> {
        let expected = checked_pixel_count(width, height)?;
        if bits.len() != expected {
            return Err(MaskFormatError::LengthMismatch {
                width,
                height,
                actual: bits.len(),
            });
        }

        Ok(Self { width, height, bits })
    }

    /// 全部未选中的遮罩。
    pub fn blank(width: u32, height: u32) -> Result<Self, MaskFormatError> {
        let count = checked_pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            bits: vec![false; count],
        })
    }

    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self, MaskFormatError>
    where
        F: FnMut(u32, u32) -> bool,
    {
        let count = checked_pixel_count(width, height)?;
        let mut bits = Vec::with_capacity(count);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }

        Ok(Self { width, height, bits })
    }

    /// 对 RGBA 字节逐像素分类，得到遮罩。
    ///
    /// `rgba` 必须恰好是 `width * height * 4` 字节。
    pub fn from_rgba(
        width: u32,
        height: u32,
        rgba: &[u8],
        classifier: MaskClassifier,
    ) -> Result<Self, MaskFormatError> {
        let count = checked_pixel_count(width, height)?;
        if count.checked_mul(4) != Some(rgba.len()) {
            return Err(MaskFormatError::LengthMismatch {
                width,
                height,
                actual: rgba.len() / 4,
            });
        }

        let bits = rgba
            .chunks_exact(4)
            .map(|px| classifier.classify([px[0], px[1], px[2], px[3]]))
            .collect();

        Ok(Self { width, height, bits })
    }

    pub fn from_rgba_image(image: &RgbaImage, classifier: MaskClassifier) -> Result<Self, MaskFormatError> {
        Self::from_rgba(image.width(), image.height(), image.as_raw(), classifier)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn pixel_count(&self) -> u64 {
        self.bits.len() as u64
    }

    /// 读取单个像素。越界返回 `None`。
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.bits[y as usize * self.width as usize + x as usize])
    }

    pub fn selected_count(&self) -> u64 {
        self.bits.iter().filter(|&&bit| bit).count() as u64
    }

    pub fn has_selection(&self) -> bool {
        self.bits.iter().any(|&bit| bit)
    }

    /// 行切片，供逐行遍历的热循环使用。
    #[inline]
    pub(crate) fn row(&self, y: u32) -> &[bool] {
        let start = y as usize * self.width as usize;
        &self.bits[start..start + self.width as usize]
    }

    /// 最近邻缩放到新网格（例如画布分辨率 → 原图分辨率）。
    pub fn resized(&self, width: u32, height: u32) -> Result<Self, MaskFormatError> {
        if (width, height) == self.dimensions() {
            return Ok(self.clone());
        }

        checked_pixel_count(width, height)?;
        let resampler = Resampler::new(width, height, self.width, self.height);
        let columns = resampler.columns();

        Self::from_fn(width, height, |x, y| self.row(resampler.row(y))[columns[x as usize] as usize])
    }

    /// 导出黑白遮罩：选中为白色，未选中为不透明黑色。
    pub fn to_mask_image(&self) -> RgbaImage {
        self.render(Rgba([255, 255, 255, 255]), Rgba([0, 0, 0, 255]))
    }

    /// 导出透明遮罩：选中为不透明白色，未选中完全透明。
    pub fn to_alpha_mask(&self) -> RgbaImage {
        self.render(Rgba([255, 255, 255, 255]), Rgba([0, 0, 0, 0]))
    }

    fn render(&self, selected: Rgba<u8>, unselected: Rgba<u8>) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        for (pixel, &bit) in image.pixels_mut().zip(self.bits.iter()) {
            *pixel = if bit { selected } else { unselected };
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resized_keeps_selection_layout() {
        let mask = BitmapMask::from_bits(2, 1, vec![true, false]).expect("mask build failed");
        let up = mask.resized(4, 2).expect("resize failed");

        assert_eq!(up.dimensions(), (4, 2));
        assert_eq!(up.bits(), &[true, true, false, false, true, true, false, false]);
        assert_eq!(up.resized(2, 1).expect("resize failed"), mask);
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            BitmapMask::blank(0, 4),
            Err(MaskFormatError::InvalidDimensions(_))
        ));
        assert!(matches!(
            BitmapMask::from_bits(3, 0, Vec::new()),
            Err(MaskFormatError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn rejects_length_mismatch() {
        let result = BitmapMask::from_bits(2, 2, vec![true, false, true]);
        assert!(matches!(result, Err(MaskFormatError::LengthMismatch { actual: 3, .. })));
    }

    #[test]
    fn get_is_row_major() {
        let mask = BitmapMask::from_fn(3, 2, |x, y| x == 2 && y == 1).expect("mask build failed");
        assert_eq!(mask.get(2, 1), Some(true));
        assert_eq!(mask.get(1, 2), None);
        assert!(mask.bits()[5]);
        assert_eq!(mask.selected_count(), 1);
    }

    #[test]
    fn from_rgba_classifies_red_strokes() {
        let rgba = [
            255, 0, 0, 255, // stroke
            255, 255, 255, 255, // white
            0, 0, 0, 0, // empty
            230, 40, 40, 128, // faded stroke
        ];
        let mask = BitmapMask::from_rgba(2, 2, &rgba, MaskClassifier::PaintStroke)
            .expect("classification failed");

        assert_eq!(mask.bits(), &[true, false, false, true]);
    }

    #[test]
    fn mask_image_export_reclassifies_to_same_mask() {
        let mask = BitmapMask::from_fn(4, 3, |x, y| (x + y) % 2 == 0).expect("mask build failed");
        let raster = mask.to_mask_image();

        assert_eq!(raster.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(raster.get_pixel(1, 0).0, [0, 0, 0, 255]);

        let back = BitmapMask::from_rgba_image(&raster, MaskClassifier::MaskImage)
            .expect("reclassification failed");
        assert_eq!(back, mask);
    }

    #[test]
    fn alpha_mask_is_transparent_outside_selection() {
        let mask = BitmapMask::from_bits(2, 1, vec![false, true]).expect("mask build failed");
        let raster = mask.to_alpha_mask();

        assert_eq!(raster.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(raster.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }
}
