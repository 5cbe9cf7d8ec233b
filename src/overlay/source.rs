//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示图片引用（URL / Data URL / 文件 / 内存字节）
//! - `AcquireMode` 表示加载级别（读回 / 仅绘制）
//! - `RawImageData` 表示已加载但未解码的字节
//! - `PixelBuffer` 表示 RGBA8 像素，原图与合成输出共用
//! - `LoadedImage` 表示解码完成且带加载级别标记的原图

use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose};
use image::RgbaImage;

use super::ImageError;

/// 图片引用。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 网络地址来源（可能跨域）。
    Url(String),
    /// `data:image/...;base64,` 或纯 Base64。
    DataUrl(String),
    /// 本地文件路径来源。
    FilePath(PathBuf),
    /// 已在内存中的编码字节（PNG/JPEG/WebP）。
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// 按引用字符串的形态识别来源。
    pub fn from_reference(reference: &str) -> Self {
        let trimmed = reference.trim();
        let lower = trimmed.get(..8).unwrap_or(trimmed).to_ascii_lowercase();

        if lower.starts_with("data:") {
            Self::DataUrl(trimmed.to_string())
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::FilePath(PathBuf::from(trimmed))
        }
    }

    /// 来源提示（用于日志与诊断）。
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::DataUrl(_) => "data-url",
            Self::FilePath(_) => "file",
            Self::Bytes(_) => "bytes",
        }
    }
}

/// 加载级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    /// 第一级：要求跨域读回许可，结果可做像素检查。
    Readback,
    /// 第二级：不请求读回许可，结果只保证可绘制。
    DrawOnly,
}

impl AcquireMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Readback => "readback",
            Self::DrawOnly => "draw-only",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    pub(crate) bytes: Vec<u8>,
    pub(crate) source_hint: &'static str,
}

/// RGBA8 像素缓冲（行优先）。
///
/// 交给调用方后不再修改；合成输出总是新缓冲。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// 由原始 RGBA 字节构造，长度必须为 `width * height * 4`。
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidFormat(format!("像素缓冲尺寸无效：{}x{}", width, height)));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ImageError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if bytes.len() != expected_len {
            return Err(ImageError::Decode(format!(
                "像素数据长度异常：{}（期望 {}）",
                bytes.len(),
                expected_len
            )));
        }

        Ok(Self { width, height, bytes })
    }

    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self, ImageError>
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let image = RgbaImage::from_fn(width, height, |x, y| image::Rgba(f(x, y)));
        Self::from_raw(width, height, image.into_raw())
    }

    pub fn from_rgba_image(image: RgbaImage) -> Result<Self, ImageError> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.into_raw())
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

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 仅供生成新缓冲的流程（先克隆再写）使用。
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// 读取单个像素。越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.bytes[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn to_rgba_image(&self) -> Result<RgbaImage, ImageError> {
        RgbaImage::from_raw(self.width, self.height, self.bytes.clone())
            .ok_or_else(|| ImageError::Decode("像素缓冲长度异常".to_string()))
    }

    /// 编码为 PNG。
    pub fn to_png(&self) -> Result<Vec<u8>, ImageError> {
        encode_png(&self.to_rgba_image()?)
    }

    /// 编码为 `data:image/png;base64,...`。
    pub fn to_data_url(&self) -> Result<String, ImageError> {
        Ok(png_data_url(&self.to_png()?))
    }
}

/// 将 RGBA 图像编码为 PNG 字节。
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ImageError> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| ImageError::Decode(format!("PNG 编码失败：{}", e)))?;
    Ok(cursor.into_inner())
}

pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png))
}

/// 解码完成的原图。
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: PixelBuffer,
    /// 成功的加载级别。
    pub mode: AcquireMode,
    pub source_hint: &'static str,
}

impl LoadedImage {
    /// 是否允许像素检查（只有读回级别成功才允许）。
    pub fn is_readable(&self) -> bool {
        self.mode == AcquireMode::Readback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_sniffing() {
        assert!(matches!(
            ImageSource::from_reference("data:image/png;base64,AAAA"),
            ImageSource::DataUrl(_)
        ));
        assert!(matches!(
            ImageSource::from_reference("HTTPS://a.example/x.png"),
            ImageSource::Url(_)
        ));
        assert!(matches!(ImageSource::from_reference("./x.png"), ImageSource::FilePath(_)));
    }

    #[test]
    fn pixel_buffer_rejects_bad_length() {
        assert!(matches!(
            PixelBuffer::from_raw(2, 2, vec![0; 15]),
            Err(ImageError::Decode(_))
        ));
        assert!(matches!(
            PixelBuffer::from_raw(0, 2, Vec::new()),
            Err(ImageError::InvalidFormat(_))
        ));
    }

    #[test]
    fn png_export_decodes_back() {
        let buffer = PixelBuffer::from_fn(3, 2, |x, y| [x as u8 * 10, y as u8 * 20, 7, 255])
            .expect("buffer build failed");
        let png = buffer.to_png().expect("png encode failed");

        let decoded = image::load_from_memory(&png).expect("png decode failed").to_rgba8();
        assert_eq!(decoded.as_raw(), buffer.as_bytes());
        assert!(buffer.to_data_url().expect("data url failed").starts_with("data:image/png;base64,"));
    }
}
