//! # 解码与缩放流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGBA”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素 / 内存上限快速拒绝
//! 3. 完整解码并转换 RGBA
//! 4. 缩放到显示尺寸：优先 `fast_image_resize`，失败回退 `image::imageops::resize`

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};
use std::io::Cursor;

use super::source::{PixelBuffer, RawImageData};
use super::{ImageError, OverlayConfig};

/// 将原始字节解码为 RGBA 像素。
pub(crate) fn decode_pixels(raw: &RawImageData, config: &OverlayConfig) -> Result<PixelBuffer, ImageError> {
    let (header_width, header_height) = probe_dimensions(&raw.bytes)?;
    validate_pixel_limits(config, header_width, header_height)?;
    validate_decoded_memory_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory(&raw.bytes)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    validate_pixel_limits(config, width, height)?;

    log::debug!(
        "🖼️ 原图解码完成 - 来源: {} 尺寸: {}x{}",
        raw.source_hint,
        width,
        height
    );

    PixelBuffer::from_rgba_image(rgba)
}

/// 仅通过图片头信息读取宽高，不做完整解码。
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(config: &OverlayConfig, width: u32, height: u32) -> Result<(), ImageError> {
    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

fn validate_decoded_memory_limits(config: &OverlayConfig, width: u32, height: u32) -> Result<(), ImageError> {
    let estimated = (width as u64)
        .checked_mul(height as u64)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| ImageError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(ImageError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

/// 将原图缩放到目标尺寸，返回新缓冲。尺寸一致时直接复制。
pub fn resize_pixels(
    source: &PixelBuffer,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, ImageError> {
    if source.dimensions() == (target_width, target_height) {
        return Ok(source.clone());
    }

    match resize_with_fast_image_resize(source, target_width, target_height, filter) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!(
                "⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}",
                err
            );
            let rgba = source.to_rgba_image()?;
            PixelBuffer::from_rgba_image(image::imageops::resize(
                &rgba,
                target_width,
                target_height,
                filter,
            ))
        }
    }
}

fn resize_with_fast_image_resize(
    source: &PixelBuffer,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, ImageError> {
    let src_image = fr::images::Image::from_vec_u8(
        source.width(),
        source.height(),
        source.as_bytes().to_vec(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ImageError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(to_fast_alg(filter));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    let rgba = RgbaImage::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| ImageError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

    PixelBuffer::from_rgba_image(rgba)
}

fn to_fast_alg(filter: FilterType) -> fr::ResizeAlg {
    match filter {
        FilterType::Nearest => fr::ResizeAlg::Nearest,
        FilterType::Triangle => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
        FilterType::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
        FilterType::Gaussian => fr::ResizeAlg::Convolution(fr::FilterType::Mitchell),
        FilterType::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
    }
}
