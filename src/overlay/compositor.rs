//! # 遮罩叠加合成
//!
//! ## 设计思路
//!
//! 合成本身是纯函数：输入原图像素、可选遮罩与预览框，输出新的像素缓冲。
//! 原图、遮罩、显示三者分辨率可以各不相同，只通过 `Resampler` 关联。
//!
//! ## 实现思路
//!
//! 1. `fit_within` 计算显示尺寸（保持宽高比，只缩不放）
//! 2. 原图缩放到显示尺寸（滤镜由配置决定）
//! 3. 逐像素最近邻取遮罩，选中处着色：R+100、G-50、B-50（饱和），Alpha 不变
//!
//! 着色只用整数饱和运算，列映射表在循环外预计算，热循环内无分配。

use image::imageops::FilterType;

use super::pipeline::resize_pixels;
use super::source::PixelBuffer;
use super::CompositeError;
use crate::mask::BitmapMask;
use crate::resample::{Resampler, fit_within};

pub const TINT_RED_BOOST: u8 = 100;
pub const TINT_GREEN_CUT: u8 = 50;
pub const TINT_BLUE_CUT: u8 = 50;

/// 对单个像素应用红色着色。
#[inline]
pub fn tint_pixel([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    [
        r.saturating_add(TINT_RED_BOOST),
        g.saturating_sub(TINT_GREEN_CUT),
        b.saturating_sub(TINT_BLUE_CUT),
        a,
    ]
}

/// 预览框内的显示尺寸。
pub fn display_size(
    original: &PixelBuffer,
    max_width: u32,
    max_height: u32,
) -> Result<(u32, u32), CompositeError> {
    fit_within(original.width(), original.height(), max_width, max_height).ok_or_else(|| {
        CompositeError::Render(format!(
            "无法计算显示尺寸：原图 {}x{}，预览框 {}x{}",
            original.width(),
            original.height(),
            max_width,
            max_height
        ))
    })
}

/// 在 `base` 的分辨率上叠加遮罩，返回新缓冲。
pub fn apply_mask_tint(base: &PixelBuffer, mask: &BitmapMask) -> PixelBuffer {
    let (width, height) = base.dimensions();
    let resampler = Resampler::new(width, height, mask.width(), mask.height());
    let columns = resampler.columns();

    let mut output = base.clone();
    let bytes = output.bytes_mut();
    let stride = width as usize * 4;

    for y in 0..height {
        let mask_row = mask.row(resampler.row(y));
        let row = &mut bytes[y as usize * stride..(y as usize + 1) * stride];

        for (pixel, &mask_x) in row.chunks_exact_mut(4).zip(columns) {
            if mask_row[mask_x as usize] {
                let tinted = tint_pixel([pixel[0], pixel[1], pixel[2], pixel[3]]);
                pixel.copy_from_slice(&tinted);
            }
        }
    }

    output
}

/// 完整合成：缩放原图，再按遮罩着色。
///
/// 遮罩为 `None` 时返回缩放后的原图（不做着色）。
pub fn composite_pixels(
    original: &PixelBuffer,
    mask: Option<&BitmapMask>,
    max_width: u32,
    max_height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, CompositeError> {
    let (display_width, display_height) = display_size(original, max_width, max_height)?;
    let resized = resize_pixels(original, display_width, display_height, filter)?;

    Ok(match mask {
        Some(mask) => apply_mask_tint(&resized, mask),
        None => resized,
    })
}
