//! # 最近邻坐标映射
//!
//! ## 设计思路
//!
//! 遮罩是二值的，不需要插值。所有跨分辨率取样统一走这里：
//! - 显示坐标 → 遮罩坐标（合成着色）
//! - 原图分辨率 → 画布坐标（笔触画布导出遮罩）
//!
//! ## 实现思路
//!
//! 纯整数运算（`u64` 中间值防溢出），结果钳制到源网格范围内。
//! `Resampler` 预先算好列映射表，热循环里只做查表，不再分配。

/// 把目标网格坐标映射回源网格（最近邻，向下取整并钳制）。
///
/// `dst_len` 为 0 时视为退化网格，返回 0。
#[inline]
pub fn map_axis(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    if dst_len == 0 || src_len == 0 {
        return 0;
    }
    let mapped = (dst as u64 * src_len as u64) / dst_len as u64;
    mapped.min(src_len as u64 - 1) as u32
}

/// `(display_x, display_y)` → `(source_x, source_y)`。
#[inline]
pub fn map_coord(
    display_x: u32,
    display_y: u32,
    display_width: u32,
    display_height: u32,
    source_width: u32,
    source_height: u32,
) -> (u32, u32) {
    (
        map_axis(display_x, display_width, source_width),
        map_axis(display_y, display_height, source_height),
    )
}

/// 固定两组网格尺寸后的映射器。
#[derive(Debug, Clone)]
pub struct Resampler {
    display_width: u32,
    display_height: u32,
    source_width: u32,
    source_height: u32,
    columns: Vec<u32>,
}

impl Resampler {
    pub fn new(display_width: u32, display_height: u32, source_width: u32, source_height: u32) -> Self {
        let columns = (0..display_width)
            .map(|x| map_axis(x, display_width, source_width))
            .collect();

        Self {
            display_width,
            display_height,
            source_width,
            source_height,
            columns,
        }
    }

    /// 预计算的列映射表，长度等于显示宽度。
    #[inline]
    pub fn columns(&self) -> &[u32] {
        &self.columns
    }

    #[inline]
    pub fn row(&self, display_y: u32) -> u32 {
        map_axis(display_y, self.display_height, self.source_height)
    }

    #[inline]
    pub fn map(&self, display_x: u32, display_y: u32) -> (u32, u32) {
        map_coord(
            display_x,
            display_y,
            self.display_width,
            self.display_height,
            self.source_width,
            self.source_height,
        )
    }
}

/// 保持宽高比、按上限缩小（从不放大）的显示尺寸。
///
/// 先取 `min(max_width, width)`，按比例求高；高度超限时改以高度为准回算宽度。
/// 结果四舍五入，且每边至少 1 像素。任一输入为 0 时返回 `None`。
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return None;
    }

    let (w, h) = (width as u64, height as u64);

    let mut display_width = (max_width as u64).min(w);
    let mut display_height = ((display_width * h + w / 2) / w).max(1);

    if display_height > max_height as u64 {
        display_height = max_height as u64;
        display_width = ((display_height * w + h / 2) / h).clamp(1, max_width as u64);
    }

    Some((display_width as u32, display_height as u32))
}
