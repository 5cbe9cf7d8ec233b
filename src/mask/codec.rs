//! # 游程编解码
//!
//! ## 设计思路
//!
//! 线上格式：`MASK:<width>x<height>:<r0>,<r1>,...`。
//! 解码时隐含值从 0（未选中）开始，每个游程结束后在 0/1 间翻转；
//! 首像素为 1 时，编码器必须输出长度为 0 的首游程。
//!
//! ## 实现思路
//!
//! - 编码：按行优先扫描，值变化时提交游程。
//! - 解码：先完整解析并求和（`checked_add`），总和与 `width * height` 一致后才分配内存，
//!   因此畸形输入既不会被截断/补齐，也不会触发超大分配。

use super::bitmap::checked_pixel_count;
use super::{BitmapMask, MaskFormatError};

/// 线上格式前缀。
pub const MASK_PREFIX: &str = "MASK:";

/// 默认解码像素上限，与图片解码上限保持一致。
pub const DEFAULT_MAX_MASK_PIXELS: u64 = 40_000_000;

/// 是否为遮罩线上字符串（只看前缀，不做完整校验）。
pub fn is_mask_string(value: &str) -> bool {
    value.trim_start().starts_with(MASK_PREFIX)
}

/// 计算游程序列，首游程恒表示值 0。
pub fn encode_runs(mask: &BitmapMask) -> Vec<u64> {
    let mut runs = Vec::new();
    let mut current = false;
    let mut run_length: u64 = 0;

    for &bit in mask.bits() {
        if bit == current {
            run_length += 1;
        } else {
            runs.push(run_length);
            current = bit;
            run_length = 1;
        }
    }
    runs.push(run_length);

    runs
}

/// 将遮罩编码为线上字符串。
///
/// # 示例
/// ```rust
/// use mask_overlay::mask::{BitmapMask, encode};
///
/// let mask = BitmapMask::from_bits(3, 1, vec![false, true, false])?;
/// assert_eq!(encode(&mask), "MASK:3x1:1,1,1");
/// # Ok::<(), mask_overlay::mask::MaskFormatError>(())
/// ```
pub fn encode(mask: &BitmapMask) -> String {
    let runs = encode_runs(mask)
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");

    format!("{}{}x{}:{}", MASK_PREFIX, mask.width(), mask.height(), runs)
}

/// 解码线上字符串，使用默认像素上限。
///
/// # 示例
/// ```rust
/// use mask_overlay::mask::decode;
///
/// let mask = decode("MASK:4x2:3,5")?;
/// assert_eq!(mask.bits(), &[false, false, false, true, true, true, true, true]);
/// # Ok::<(), mask_overlay::mask::MaskFormatError>(())
/// ```
pub fn decode(value: &str) -> Result<BitmapMask, MaskFormatError> {
    decode_with_limit(value, DEFAULT_MAX_MASK_PIXELS)
}

/// 同 `decode`，但 `width * height` 超过 `max_pixels` 时在解析游程与分配前返回 `TooLarge`。
pub fn decode_with_limit(value: &str, max_pixels: u64) -> Result<BitmapMask, MaskFormatError> {
    let body = value
        .trim()
        .strip_prefix(MASK_PREFIX)
        .ok_or(MaskFormatError::MissingPrefix)?;

    let (dimensions, run_list) = body
        .split_once(':')
        .ok_or_else(|| MaskFormatError::Malformed("缺少尺寸与游程之间的 `:`".to_string()))?;

    let (width, height) = parse_dimensions(dimensions)?;
    let expected = checked_pixel_count(width, height)? as u64;

    if expected > max_pixels {
        return Err(MaskFormatError::TooLarge {
            pixels: expected,
            limit: max_pixels,
        });
    }

    let runs = parse_runs(run_list)?;

    let mut actual: u64 = 0;
    for &run in &runs {
        actual = actual.checked_add(run).ok_or(MaskFormatError::RunSumMismatch {
            expected,
            actual: u64::MAX,
        })?;
    }

    if actual != expected {
        return Err(MaskFormatError::RunSumMismatch { expected, actual });
    }

    let mut bits = Vec::with_capacity(expected as usize);
    let mut value = false;
    for run in runs {
        bits.resize(bits.len() + run as usize, value);
        value = !value;
    }

    BitmapMask::from_bits(width, height, bits)
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), MaskFormatError> {
    let (width, height) = dimensions
        .split_once('x')
        .ok_or_else(|| MaskFormatError::InvalidDimensions(format!("缺少 `x` 分隔符：{:?}", dimensions)))?;

    let width = parse_decimal::<u32>(width)
        .ok_or_else(|| MaskFormatError::InvalidDimensions(format!("宽度不是整数：{:?}", width)))?;
    let height = parse_decimal::<u32>(height)
        .ok_or_else(|| MaskFormatError::InvalidDimensions(format!("高度不是整数：{:?}", height)))?;

    if width == 0 || height == 0 {
        return Err(MaskFormatError::InvalidDimensions(format!(
            "宽高必须为正：{}x{}",
            width, height
        )));
    }

    Ok((width, height))
}

fn parse_runs(run_list: &str) -> Result<Vec<u64>, MaskFormatError> {
    if run_list.is_empty() {
        return Err(MaskFormatError::InvalidRun("游程列表为空".to_string()));
    }

    run_list
        .split(',')
        .enumerate()
        .map(|(index, run)| {
            parse_decimal::<u64>(run).ok_or_else(|| {
                MaskFormatError::InvalidRun(format!("第 {} 个游程不是非负整数：{:?}", index + 1, run))
            })
        })
        .collect()
}

/// 只接受纯 ASCII 数字（拒绝符号、空白、空串）。
fn parse_decimal<T: std::str::FromStr>(text: &str) -> Option<T> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
